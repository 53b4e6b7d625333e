//! Images, trailers and external links.

use crate::text::clean_title;
use crate::types::{AnimeImage, AnimeLink, AnimeTrailer};

/// Known link hosts and their canonical site slug, matched by substring in
/// table order.
const EXTERNAL_SITES: [(&str, &str); 16] = [
    ("twitter", "x"),
    ("ja.wikipedia", "ja-wiki"),
    ("en.wikipedia", "en-wiki"),
    ("syoboi", "syoboi"),
    ("animenewsnetwork", "anime-news-network"),
    ("bangumi.tv", "bangumi"),
    ("bgm.tv", "bangumi"),
    ("crunchyroll", "crunchyroll"),
    ("netflix", "netflix"),
    ("hulu", "hulu"),
    ("bilibili", "bilibili"),
    ("primevideo", "prime-video"),
    ("hidive", "hidive"),
    ("funimation", "funimation"),
    ("iqiyi", "iqiyi"),
    ("wetv", "wetv"),
];

const OFFICIAL_MARKERS: [&str; 4] = [
    "official-website",
    "official-site",
    "official-webpage",
    "official-page",
];

/// Slug of links labelled as an official site.
pub const OFFICIAL_WEBSITE: &str = "official-website";

/// Deduplicates images by URL, keeping first-seen order.
///
/// A later duplicate fills the thumbnail, height or width its first occurrence
/// lacks. Images without a URL are dropped.
///
/// ```rust
/// use anicine::merge::merge_images;
/// use anicine::types::AnimeImage;
///
/// let merged = merge_images(&[AnimeImage::new("a.jpg", ""), AnimeImage::new("a.jpg", "t1")]);
/// assert_eq!(merged, vec![AnimeImage::new("a.jpg", "t1")]);
/// ```
pub fn merge_images<'a>(images: impl IntoIterator<Item = &'a AnimeImage>) -> Vec<AnimeImage> {
    let mut merged: Vec<AnimeImage> = Vec::new();

    for image in images {
        if image.image.is_empty() {
            continue;
        }

        match merged.iter_mut().find(|m| m.image == image.image) {
            Some(existing) => {
                if existing.thumbnail.is_empty() {
                    existing.thumbnail = image.thumbnail.clone();
                }
                if existing.height == 0 {
                    existing.height = image.height;
                }
                if existing.width == 0 {
                    existing.width = image.width;
                }
            }
            None => merged.push(image.clone()),
        }
    }

    merged
}

/// Picks the portrait or landscape image among the records' candidates.
///
/// A TMDB-hosted image wins, then AniList, then MyAnimeList. Without any of
/// those, the first image with a URL is taken and a missing thumbnail is filled
/// from the next candidate that has one.
pub fn pick_image<'a>(images: impl IntoIterator<Item = &'a AnimeImage>) -> AnimeImage {
    let images: Vec<&AnimeImage> = images
        .into_iter()
        .filter(|i| !i.image.is_empty())
        .collect();

    for host in ["tmdb", "anilist", "myanimelist"] {
        if let Some(found) = images.iter().find(|i| i.image.contains(host)) {
            return (*found).clone();
        }
    }

    let Some(first) = images.first() else {
        return AnimeImage::default();
    };
    let mut picked = (*first).clone();
    if picked.thumbnail.is_empty() {
        if let Some(other) = images.iter().find(|i| !i.thumbnail.is_empty()) {
            picked.thumbnail = other.thumbnail.clone();
        }
    }
    picked
}

/// Deduplicates trailers by host key, first occurrence wins.
pub fn merge_trailers<'a>(trailers: impl IntoIterator<Item = &'a AnimeTrailer>) -> Vec<AnimeTrailer> {
    let mut merged: Vec<AnimeTrailer> = Vec::new();
    for trailer in trailers {
        if !merged.iter().any(|t| t.host_key == trailer.host_key) {
            merged.push(trailer.clone());
        }
    }
    merged
}

/// Relabels links with their canonical site slug.
///
/// Links on a known host take that host's slug. Otherwise a site label naming
/// an official site/page/webpage/website becomes [`OFFICIAL_WEBSITE`]. Anything
/// else is dropped, as are exact duplicates.
///
/// ```rust
/// use anicine::merge::merge_externals;
/// use anicine::types::AnimeLink;
///
/// let link = |site: &str, url: &str| AnimeLink { site: site.into(), url: url.into() };
/// let merged = merge_externals(&[
///     link("Twitter", "https://twitter.com/frieren_PR"),
///     link("Official Site", " https://frieren-anime.jp/ "),
///     link("Fan Wiki", "https://frieren.fandom.com"),
/// ]);
///
/// assert_eq!(merged, vec![
///     link("x", "https://twitter.com/frieren_PR"),
///     link("official-website", "https://frieren-anime.jp/"),
/// ]);
/// ```
pub fn merge_externals<'a>(links: impl IntoIterator<Item = &'a AnimeLink>) -> Vec<AnimeLink> {
    let mut merged: Vec<AnimeLink> = Vec::new();

    for link in links {
        let url = link.url.trim();
        if url.is_empty() {
            continue;
        }

        let site = match EXTERNAL_SITES.iter().find(|(host, _)| url.contains(host)) {
            Some((_, slug)) => *slug,
            None => {
                let label = clean_title(&link.site);
                if OFFICIAL_MARKERS.iter().any(|marker| label.contains(marker)) {
                    OFFICIAL_WEBSITE
                } else {
                    continue;
                }
            }
        };

        let relabeled = AnimeLink {
            site: site.to_string(),
            url: url.to_string(),
        };
        if !merged.contains(&relabeled) {
            merged.push(relabeled);
        }
    }

    merged
}
