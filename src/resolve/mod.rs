//! Cross-provider identity resolution.
//!
//! Each external provider keys anime by its own ids. A [`Provider`] finds its
//! local id for an anime the caller already knows by a trusted anchor (the
//! MyAnimeList id in [`AnimeInfo::mal_id`]) and returns the references it can
//! confirm as an [`AnimeResource`].
//!
//! Every provider runs the same three phases, driven by [`resolve`]:
//!
//! 1. **Direct check**: with a previously known local id, load its detail view
//!    and validate it. Success skips the other phases.
//! 2. **Search**: submit the normalized query and keep the results whose date
//!    or title is close enough (thresholds per provider).
//! 3. **Confirm & extract**: load each candidate's detail view, re-validate it
//!    against the anchor, and extract the references on agreement.
//!
//! A failing candidate is logged and the next one is tried. [`Error::Canceled`]
//! aborts everything and comes back unchanged. When nothing survives the result
//! is [`Error::NotFound`].
//!
//! # Feature Flags
//!
//! Each provider is behind its own feature flag:
//! - `provider-livechart` - Enables [`LiveChartResolver`]
//! - `provider-notifymoe` - Enables [`NotifyMoeResolver`]
//! - `provider-animeplanet` - Enables [`AnimePlanetResolver`]
//! - `all-providers` - Enables all providers (default)
//!
//! # Examples
//!
//! ```rust,no_run
//! use anicine::prelude::*;
//! use anicine::resolve::{LiveChartResolver, NotifyMoeResolver, Resolvers, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(info: AnimeInfo) -> anicine::Result<()> {
//! let client = RetrievalClient::new(&ClientConfig::default())?;
//!
//! let mut resolvers = Resolvers::new();
//! resolvers
//!     .add(LiveChartResolver::new(client.clone()))
//!     .add(NotifyMoeResolver::new(client));
//!
//! let session = Session::new(info, CancellationToken::new());
//! let resource = resolvers.resolve_merged(&session, &AnimeResource::default()).await?;
//! println!("livechart id: {}", resource.livechart);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::merge::merge_resources;
use crate::types::{AnimeInfo, AnimeResource};
use crate::{Error, Result};

#[cfg(feature = "provider-animeplanet")]
pub mod animeplanet;
#[cfg(feature = "provider-livechart")]
pub mod livechart;
#[cfg(feature = "provider-notifymoe")]
pub mod notifymoe;

#[cfg(feature = "provider-animeplanet")]
pub use animeplanet::AnimePlanetResolver;
#[cfg(feature = "provider-livechart")]
pub use livechart::LiveChartResolver;
#[cfg(feature = "provider-notifymoe")]
pub use notifymoe::NotifyMoeResolver;

/// Context of one resolution: what is known about the anime and how to stop.
///
/// Passed by reference down every call of a resolution.
#[derive(Debug, Clone)]
pub struct Session {
    pub info: AnimeInfo,
    pub cancel: CancellationToken,
}

impl Session {
    pub fn new(info: AnimeInfo, cancel: CancellationToken) -> Self {
        Self { info, cancel }
    }

    /// `Err(Canceled)` once the token has fired.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Canceled);
        }
        Ok(())
    }
}

/// A search result worth confirming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Provider-local id
    pub id: String,
    pub title: String,
}

/// One external provider's search and detail surfaces.
///
/// Implementations issue all I/O through a
/// [`RetrievalClient`](crate::net::RetrievalClient) and validate candidates
/// against [`Session::info`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique identifier, e.g. `"livechart"`.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn base_url(&self) -> &str;

    /// This provider's id when `resource` already records it.
    fn known_id(&self, resource: &AnimeResource) -> Option<String>;

    /// Search results accepted by the provider's date/title rules.
    async fn search(&self, session: &Session) -> Result<Vec<Candidate>>;

    /// Loads `id`, validates it against the anchor and extracts references.
    ///
    /// A candidate that contradicts the anchor yields an error, never a
    /// partial resource.
    async fn check(&self, session: &Session, id: &str) -> Result<AnimeResource>;
}

/// Runs the three-phase protocol for one provider.
///
/// # Errors
///
/// * [`Error::Canceled`] - the session was canceled at any phase
/// * [`Error::NotFound`] - no candidate survived
pub async fn resolve(provider: &dyn Provider, session: &Session, known: Option<&str>) -> Result<AnimeResource> {
    session.checkpoint()?;

    if let Some(id) = known.filter(|id| !id.is_empty()) {
        match provider.check(session, id).await {
            Ok(resource) => return Ok(resource),
            Err(e) if e.is_canceled() => return Err(e),
            Err(e) => warn!(provider = provider.id(), id, error = %e, "known id rejected"),
        }
    }

    session.checkpoint()?;
    let candidates = match provider.search(session).await {
        Ok(candidates) => candidates,
        Err(e) if e.is_canceled() => return Err(e),
        Err(e) => {
            warn!(provider = provider.id(), query = %session.info.query, error = %e, "search failed");
            Vec::new()
        }
    };
    debug!(provider = provider.id(), count = candidates.len(), "search candidates");

    for candidate in &candidates {
        session.checkpoint()?;
        match provider.check(session, &candidate.id).await {
            Ok(resource) => return Ok(resource),
            Err(e) if e.is_canceled() => return Err(e),
            Err(e) => warn!(
                provider = provider.id(),
                id = %candidate.id,
                title = %candidate.title,
                error = %e,
                "candidate rejected"
            ),
        }
    }

    Err(Error::not_found(format!(
        "{}: no candidate confirmed for {:?}",
        provider.id(),
        session.info.title
    )))
}

/// A collection of providers resolved together.
///
/// ```rust
/// use anicine::resolve::Resolvers;
///
/// let resolvers = Resolvers::new();
/// assert!(resolvers.is_empty());
/// assert!(resolvers.get("livechart").is_none());
/// ```
pub struct Resolvers {
    providers: Vec<Box<dyn Provider>>,
    by_id: HashMap<String, usize>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Adds a provider; returns `self` for chaining.
    ///
    /// A provider with an already registered id replaces the old one in place.
    pub fn add(&mut self, provider: impl Provider + 'static) -> &mut Self {
        let id = provider.id().to_string();
        match self.by_id.get(&id) {
            Some(&index) => self.providers[index] = Box::new(provider),
            None => {
                self.by_id.insert(id, self.providers.len());
                self.providers.push(Box::new(provider));
            }
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&dyn Provider> {
        self.by_id
            .get(id)
            .and_then(|&index| self.providers.get(index))
            .map(|p| p.as_ref())
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Resolves every provider concurrently.
    ///
    /// Each provider starts from the id `known` records for it, if any.
    /// Results come back in registration order.
    pub async fn resolve_all(
        &self,
        session: &Session,
        known: &AnimeResource,
    ) -> Vec<(String, Result<AnimeResource>)> {
        let futures = self.providers.iter().map(|provider| async move {
            let id = provider.known_id(known);
            let result = resolve(provider.as_ref(), session, id.as_deref()).await;
            (provider.id().to_string(), result)
        });

        future::join_all(futures).await
    }

    /// Resolves every provider and votes their references into one bundle.
    ///
    /// # Errors
    ///
    /// * [`Error::Canceled`] - any provider saw the cancellation
    /// * [`Error::NotFound`] - no provider confirmed the anime
    pub async fn resolve_merged(&self, session: &Session, known: &AnimeResource) -> Result<AnimeResource> {
        let results = self.resolve_all(session, known).await;

        let mut found = Vec::new();
        let mut errors = Vec::new();
        for (provider, result) in results {
            match result {
                Ok(resource) => found.push(resource),
                Err(Error::Canceled) => return Err(Error::Canceled),
                Err(e) => errors.push(format!("{}: {}", provider, e)),
            }
        }

        if found.is_empty() {
            return Err(Error::not_found(format!(
                "All providers failed: {}",
                errors.join(", ")
            )));
        }

        Ok(merge_resources(&found))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for Resolvers {
    fn default() -> Self {
        Self::new()
    }
}
