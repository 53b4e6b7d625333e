//! Title and overview translation into every catalog language.
//!
//! [`translate_all`] fans one record out into one concurrent translation per
//! target language and waits for all of them. Each result lands in the slot of
//! its language; a failing language is logged and its slot stays `None`.
//! Cancellation is not a per-language failure: it fails the whole call.
//!
//! ```rust,no_run
//! use anicine::config::ClientConfig;
//! use anicine::net::RetrievalClient;
//! use anicine::translate::{GoogleTranslator, translate_all};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anicine::Result<()> {
//! let translator = GoogleTranslator::new(RetrievalClient::new(&ClientConfig::default())?);
//! let metadata = translate_all(
//!     &translator,
//!     &CancellationToken::new(),
//!     "Frieren: Beyond Journey's End",
//!     "An elf mage outlives her party.",
//! )
//! .await?;
//!
//! for entry in metadata.into_iter().flatten() {
//!     println!("{}: {}", entry.language.iso639_1, entry.title);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures::future;
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

use crate::net::{Request, RetrievalClient, json};
use crate::types::{LANGUAGES, Language, MetaData};
use crate::{Error, Result};

const GOOGLE_ENDPOINT: &str = "https://translate.google.com/translate_a/single";

/// Payload sections requested from the translation endpoint.
const GOOGLE_SECTIONS: [&str; 10] = ["at", "bd", "ex", "ld", "md", "qca", "rw", "rm", "ss", "t"];

/// Translates a text between two ISO 639-1 languages.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, cancel: &CancellationToken, text: &str, from: &str, to: &str) -> Result<String>;
}

/// Google Translate web endpoint, reached through the proxy.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: RetrievalClient,
}

impl GoogleTranslator {
    pub fn new(client: RetrievalClient) -> Self {
        Self { client }
    }

    fn endpoint(text: &str, from: &str, to: &str) -> Result<Url> {
        let mut params: Vec<(&str, &str)> = vec![
            ("client", "gtx"),
            ("sl", from),
            ("tl", to),
            ("hl", to),
            ("ie", "UTF-8"),
            ("oe", "UTF-8"),
            ("otf", "1"),
            ("ssel", "0"),
            ("tsel", "0"),
            ("kc", "7"),
            ("q", text),
        ];
        params.extend(GOOGLE_SECTIONS.iter().map(|section| ("dt", *section)));

        Url::parse_with_params(GOOGLE_ENDPOINT, &params)
            .map_err(|e| Error::bad_data(format!("translation url: {e}")))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, cancel: &CancellationToken, text: &str, from: &str, to: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let mut request = Request::new(Self::endpoint(text, from, to)?).with_proxy();
        let raw: Value = self.client.get_json(cancel, &mut request).await?;

        Ok(join_segments(&raw))
    }
}

/// Concatenates the translated segments `raw[0][i][0]`, stopping at the first
/// empty segment.
fn join_segments(raw: &Value) -> String {
    let mut result = String::new();
    for segment in json::extract_array(raw, "0") {
        if segment.as_array().is_none_or(|parts| parts.is_empty()) {
            break;
        }
        if let Ok(text) = json::extract_as::<String>(&segment, "0") {
            result.push_str(&text);
        }
    }
    result
}

/// Translates an English title and overview into every catalog language.
///
/// Slot `i` belongs to `LANGUAGES[i]`; slot 0 holds the English input as-is.
///
/// # Errors
///
/// [`Error::Canceled`] if `cancel` fired or any translation reported it.
pub async fn translate_all(
    translator: &dyn Translator,
    cancel: &CancellationToken,
    title: &str,
    overview: &str,
) -> Result<Vec<Option<MetaData>>> {
    if cancel.is_cancelled() {
        return Err(Error::Canceled);
    }

    let source = Language::from_catalog(LANGUAGES[0]);
    let slots: Mutex<Vec<Option<MetaData>>> = Mutex::new(vec![None; LANGUAGES.len()]);
    slots.lock()[0] = Some(MetaData {
        language: source.clone(),
        title: title.to_string(),
        overview: overview.to_string(),
    });

    let tasks = LANGUAGES.iter().enumerate().skip(1).map(|(index, entry)| {
        let slots = &slots;
        let source = &source.iso639_1;
        async move {
            let language = Language::from_catalog(*entry);
            let translated = async {
                let title = translator.translate(cancel, title, source, &language.iso639_1).await?;
                let overview = translator
                    .translate(cancel, overview, source, &language.iso639_1)
                    .await?;
                Ok::<_, Error>((title, overview))
            }
            .await;

            match translated {
                Ok((title, overview)) => {
                    info!(language = %language.name, "title and overview translated");
                    slots.lock()[index] = Some(MetaData {
                        language,
                        title,
                        overview,
                    });
                    false
                }
                Err(e) if e.is_canceled() => true,
                Err(e) => {
                    error!(language = %language.name, error = %e, "cannot translate");
                    false
                }
            }
        }
    });
    let canceled = future::join_all(tasks).await.into_iter().any(|hit| hit);

    if canceled || cancel.is_cancelled() {
        return Err(Error::Canceled);
    }
    Ok(slots.into_inner())
}
