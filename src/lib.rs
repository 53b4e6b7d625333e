//! # Anicine - anime metadata aggregation core
//!
//! Anicine gathers what several public catalogs know about one anime and folds it
//! into a single record. It provides the pieces every aggregation run needs: a
//! resilient retrieval client, title similarity scoring, cross-provider identity
//! resolution and a field-by-field merge of per-source records.
//!
//! ## Features
//!
//! - **Resilient Retrieval**: Bounded retries with forbidden/rate-limit backoff,
//!   direct/proxy alternation, manual redirects and cancellation at every step
//! - **Identity Resolution**: Finds an anime's local id on LiveChart.me,
//!   notify.moe and Anime-Planet, anchored on its MyAnimeList id
//! - **Record Merging**: Majority votes, first-repeated picks and union-dedup
//!   rules per field, deterministic for a given input order
//! - **Similarity Scoring**: Token overlap and edit-distance scores on a 0..=100 scale
//! - **Translation**: Title and overview fan-out into every catalog language
//!
//! ## Quick Start
//!
//! ### Resolving provider ids
//!
//! ```rust,no_run
//! use anicine::prelude::*;
//! use anicine::resolve::{AnimePlanetResolver, LiveChartResolver, NotifyMoeResolver, Resolvers, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anicine::Result<()> {
//!     let client = RetrievalClient::new(&ClientConfig::default())?;
//!
//!     let mut resolvers = Resolvers::new();
//!     resolvers
//!         .add(LiveChartResolver::new(client.clone()))
//!         .add(NotifyMoeResolver::new(client.clone()))
//!         .add(AnimePlanetResolver::new(client));
//!
//!     let info = AnimeInfo {
//!         title: "Sousou no Frieren".into(),
//!         query: anicine::text::clean_title("Sousou no Frieren"),
//!         kind: "tv".into(),
//!         mal_id: 52991,
//!         start_date: AnimeDate::new(2023, 9, 29),
//!         ..Default::default()
//!     };
//!     let session = Session::new(info, CancellationToken::new());
//!     let resource = resolvers.resolve_merged(&session, &AnimeResource::default()).await?;
//!
//!     println!("livechart {} / notify.moe {}", resource.livechart, resource.notify_moe);
//!     Ok(())
//! }
//! ```
//!
//! ### Merging records
//!
//! ```rust
//! use anicine::prelude::*;
//!
//! let a = Anime { content_rating: "pg".into(), ..Default::default() };
//! let b = Anime { content_rating: "r".into(), ..Default::default() };
//! let c = Anime { content_rating: "pg".into(), ..Default::default() };
//!
//! let merged = merge_anime(&[Some(a), None, Some(b), Some(c)]);
//! assert_eq!(merged.content_rating, "pg");
//! ```
//!
//! ## Architecture
//!
//! - [`net`]: Retrieval client, retry state machine, HTML and JSON helpers
//! - [`resolve`]: Provider trait, resolution protocol and the providers
//! - [`merge`]: Record merge engine
//! - [`similarity`]: Title scoring
//! - [`text`]: Normalizers and extractors shared by providers and merging
//! - [`types`]: The anime data model and its language/country catalogs
//! - [`config`]: Environment file loading and client settings
//! - [`keyring`]: Round-robin API key rotation
//! - [`translate`]: Metadata translation
//! - [`error`]: Error kinds

pub mod config;
pub mod error;
pub mod keyring;
pub mod merge;
pub mod net;
pub mod resolve;
pub mod similarity;
pub mod text;
pub mod translate;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use anicine::prelude::*;
///
/// // Now you have access to:
/// // - RetrievalClient, Request, ClientConfig
/// // - Provider, Resolvers, Session
/// // - Anime, AnimeInfo, AnimeResource and friends
/// // - merge_anime, merge_resources, token_score, edit_score
/// ```
pub mod prelude {
    pub use crate::{
        config::{ClientConfig, ClientConfigBuilder, Config},
        error::{Error, Result},
        keyring::KeyRing,
        merge::{merge_anime, merge_ids, merge_resources},
        net::{Request, RetrievalClient},
        resolve::{Candidate, Provider, Resolvers, Session},
        similarity::{edit_score, token_score},
        types::{Anime, AnimeDate, AnimeId, AnimeInfo, AnimeResource},
    };
}

// Re-export main types at crate root for direct access
pub use error::{Error, Result};
pub use merge::{merge_anime, merge_resources};
pub use net::RetrievalClient;
pub use resolve::{Provider, Resolvers, Session};
pub use types::{Anime, AnimeInfo, AnimeResource};
