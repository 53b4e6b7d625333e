//! HTML parsing utilities for provider pages.
//!
//! Thin wrappers over `scraper` CSS selectors, plus [`parse_items`] which parses
//! repeated result cards in parallel with `rayon`.
//!
//! `scraper::Html` is not `Send`, so provider code parses inside synchronous
//! functions and only carries owned results across `.await` points.
//!
//! # Examples
//!
//! ```rust
//! use anicine::net::html;
//!
//! let html_content = r#"
//!     <div class="lc-poster-col">
//!         <h4 class="title">Sousou no Frieren</h4>
//!         <a class="lc-btn-myanimelist" href="https://myanimelist.net/anime/52991">MAL</a>
//!     </div>
//! "#;
//!
//! let document = html::parse(html_content);
//! let title = html::select_text(&document, ".title").unwrap();
//! let mal = html::select_attr(&document, ".lc-btn-myanimelist", "href").unwrap();
//! assert_eq!(title, "Sousou no Frieren");
//! assert!(mal.ends_with("52991"));
//! ```

use rayon::prelude::*;
use scraper::{ElementRef, Html, Selector};

/// Parses an HTML document from a string.
///
/// ```rust
/// use anicine::net::html;
///
/// let document = html::parse("<div><p>Frieren</p></div>");
/// ```
pub fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

/// Trimmed text content of the first element matching `selector`.
///
/// Returns `None` if nothing matches or the selector is invalid.
///
/// ```rust
/// use anicine::net::html;
///
/// let document = html::parse(r#"<h1 class="title">Mushishi</h1>"#);
/// assert_eq!(html::select_text(&document, ".title"), Some("Mushishi".to_string()));
/// ```
pub fn select_text(html: &Html, selector: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    })
}

/// Attribute `attr` of the first element matching `selector`.
///
/// Returns `None` if nothing matches, the selector is invalid, or the first
/// match lacks the attribute.
pub fn select_attr(html: &Html, selector: &str, attr: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr).map(String::from))
    })
}

/// Attribute `attr` of the first element under `element` matching `selector`.
pub fn element_attr(element: ElementRef, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    element
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr).map(String::from))
}

/// Parses repeated items (search result cards) in parallel.
///
/// Every element matching `selector` is serialized, re-parsed as a fragment on
/// a rayon worker, and handed to `parser` as the fragment root. Items for which
/// `parser` returns `None` are dropped; document order is kept.
///
/// ```rust
/// use anicine::net::html;
///
/// let document = html::parse(r#"
///     <ul class="anime-list">
///         <li data-anime-id="11728" data-romaji="Sousou no Frieren"></li>
///         <li data-anime-id="12001" data-romaji="Dungeon Meshi"></li>
///         <li data-romaji="no id"></li>
///     </ul>
/// "#);
///
/// let ids = html::parse_items(&document, ".anime-list li", |item| {
///     html::element_attr(item, "li", "data-anime-id")
/// });
/// assert_eq!(ids, vec!["11728", "12001"]);
/// ```
pub fn parse_items<T, F>(html: &Html, selector: &str, parser: F) -> Vec<T>
where
    T: Send,
    F: Fn(ElementRef) -> Option<T> + Sync,
{
    Selector::parse(selector)
        .ok()
        .map(|sel| {
            let elements: Vec<String> = html.select(&sel).map(|el| el.html()).collect();

            elements
                .into_par_iter()
                .filter_map(|html_str| {
                    let doc = Html::parse_fragment(&html_str);
                    parser(doc.root_element())
                })
                .collect()
        })
        .unwrap_or_default()
}
