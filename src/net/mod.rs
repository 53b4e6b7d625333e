//! Network layer: one resilient HTTP exchange per call, plus parsing helpers.
//!
//! This module provides the retrieval infrastructure for anicine:
//!
//! - **RetrievalClient**: executes a [`Request`] through the retry state machine of
//!   [`retry`], with backoff, proxy fallback, redirect following and cookie capture
//! - **Transport**: the seam between the state machine and the wire, implemented by
//!   [`ReqwestTransport`] in production and by scripted mocks in tests
//! - **Sleeper**: performs backoff waits, waking early on cancellation
//! - **Content Parsing**: HTML and JSON helpers in [`html`] and [`json`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use anicine::config::ClientConfig;
//! use anicine::net::{Request, RetrievalClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anicine::Result<()> {
//! let client = RetrievalClient::new(&ClientConfig::default())?;
//! let cancel = CancellationToken::new();
//!
//! let mut request = Request::parse("https://notify.moe/api/anime/0ZpGFaIiR")?;
//! let json: serde_json::Value = client.get_json(&cancel, &mut request).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::{Error, Result};

pub mod html;
pub mod json;
pub mod retry;

use retry::{FailureKind, RetryPolicy, Route, State, Terminal};

/// Desktop browser identity sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// A cookie captured from a successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// One logical exchange, reusable across attempts.
///
/// The body is buffered up front so every attempt resends the same bytes. A
/// redirect rewrites [`url`](Request::url) in place, and a successful exchange
/// leaves its cookies on the request:
///
/// ```rust
/// use anicine::net::Request;
///
/// let request = Request::parse("https://www.livechart.me/search?q=frieren")
///     .unwrap()
///     .with_proxy()
///     .with_header("Accept", "text/html");
///
/// assert!(request.use_proxy);
/// assert!(request.cookies().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    pub use_proxy: bool,
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    cookies: Vec<Cookie>,
}

impl Request {
    /// GET request against `url`.
    pub fn new(url: Url) -> Self {
        Self {
            use_proxy: false,
            method: Method::GET,
            url,
            headers: Vec::new(),
            body: None,
            cookies: Vec::new(),
        }
    }

    /// GET request against a textual URL.
    ///
    /// # Errors
    ///
    /// [`Error::BadData`] when `url` is not an absolute URL.
    pub fn parse(url: &str) -> Result<Self> {
        Url::parse(url)
            .map(Self::new)
            .map_err(|e| Error::bad_data(format!("invalid url {url:?}: {e}")))
    }

    /// Routes the first attempt through the proxy client.
    pub fn with_proxy(mut self) -> Self {
        self.use_proxy = true;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header after the browser identity header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Cookies of the most recent successful exchange.
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}

/// What a [`Transport`] puts on the wire for one attempt.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// What a [`Transport`] got back for one attempt.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub status: u16,
    /// Raw `Location` header
    pub location: Option<String>,
    pub cookies: Vec<Cookie>,
    pub body: Bytes,
}

/// Sends one attempt over a route.
///
/// Implementations must not follow redirects; the state machine does.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether a distinct proxied client exists.
    ///
    /// When it does not, proxy requests run entirely on the direct route.
    fn supports_proxy(&self) -> bool;

    async fn send(&self, route: Route, exchange: Exchange) -> Result<Reply>;
}

/// Performs backoff waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits `duration` or until `cancel` fires, whichever comes first.
    async fn sleep(&self, cancel: &CancellationToken, duration: Duration);
}

/// Production [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, cancel: &CancellationToken, duration: Duration) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

/// Production [`Transport`]: a direct reqwest client and an optional proxied one.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    direct: Client,
    proxied: Option<Client>,
}

impl ReqwestTransport {
    /// Builds both clients from `config`.
    ///
    /// Both clients use the configured timeout, gzip/brotli decoding and no
    /// redirect policy.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let direct = Self::builder(config).build()?;
        let proxied = match &config.proxy_url {
            Some(proxy_url) => Some(
                Self::builder(config)
                    .proxy(reqwest::Proxy::all(proxy_url.as_str())?)
                    .build()?,
            ),
            None => None,
        };

        Ok(Self { direct, proxied })
    }

    fn builder(config: &ClientConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(10)
            .gzip(true)
            .brotli(true)
    }

    fn client(&self, route: Route) -> &Client {
        match (route, &self.proxied) {
            (Route::Proxied, Some(proxied)) => proxied,
            _ => &self.direct,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn supports_proxy(&self) -> bool {
        self.proxied.is_some()
    }

    async fn send(&self, route: Route, exchange: Exchange) -> Result<Reply> {
        let mut builder = self.client(route).request(exchange.method, exchange.url);
        for (name, value) in &exchange.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = exchange.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let cookies = response
            .cookies()
            .map(|c| Cookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
            })
            .collect();
        let body = response.bytes().await?;

        Ok(Reply {
            status,
            location,
            cookies,
            body,
        })
    }
}

/// Executes requests through the retry state machine.
///
/// Cheap to clone; clones share the transport and sleeper.
///
/// # Examples
///
/// ```rust,no_run
/// use anicine::config::ClientConfigBuilder;
/// use anicine::net::{Request, RetrievalClient};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anicine::Result<()> {
/// let config = ClientConfigBuilder::default()
///     .proxy_url("http://127.0.0.1:8080")
///     .build()
///     .unwrap();
/// let client = RetrievalClient::new(&config)?;
///
/// let mut request = Request::parse("https://www.anime-planet.com/anime/frieren")?.with_proxy();
/// let html = client.get_text(&CancellationToken::new(), &mut request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetrievalClient {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    user_agent: String,
}

impl fmt::Debug for RetrievalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievalClient")
            .field("policy", &self.policy)
            .field("user_agent", &self.user_agent)
            .field("proxy", &self.transport.supports_proxy())
            .finish_non_exhaustive()
    }
}

impl RetrievalClient {
    /// Creates a client over a [`ReqwestTransport`] built from `config`.
    ///
    /// # Errors
    ///
    /// [`Error::Network`] when the proxy URL is rejected or a client cannot be
    /// built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self {
            transport: Arc::new(transport),
            sleeper: Arc::new(TokioSleeper),
            policy: config.policy.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Creates a client over an arbitrary transport with the default policy.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::default(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Replaces the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `request` to a terminal outcome and returns the response body.
    ///
    /// Cancellation is sampled at the top of every attempt, never mid-call. On
    /// success the response cookies are stored on `request`; on redirect its URL
    /// is rewritten.
    ///
    /// # Errors
    ///
    /// * [`Error::Canceled`] - `cancel` fired before an attempt
    /// * [`Error::BadData`] - the server answered 412 or 428
    /// * [`Error::NotFound`] - 400, 404, or a redirect without a usable target
    /// * [`Error::NoData`] - an empty success body, or the attempt budget ran out
    pub async fn fetch(&self, cancel: &CancellationToken, request: &mut Request) -> Result<Bytes> {
        let use_proxy = request.use_proxy && self.transport.supports_proxy();

        for attempt in 0..self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Canceled);
            }

            let route = retry::route_for(attempt, use_proxy);
            let exchange = Exchange {
                method: request.method.clone(),
                url: request.url.clone(),
                headers: self.headers(request),
                body: request.body.clone(),
            };

            let reply = match self.transport.send(route, exchange).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(url = %request.url, attempt, error = %e, "cannot get response");
                    continue;
                }
            };

            info!(
                proxy = route == Route::Proxied,
                code = reply.status,
                host = request.url.host_str().unwrap_or_default(),
                path = request.url.path(),
                "accepted response"
            );

            let state = retry::transition(
                &self.policy,
                route,
                reply.status,
                &request.url,
                reply.location.as_deref(),
            );

            match state {
                State::Terminal(Terminal::Success) => {
                    request.cookies = reply.cookies;
                    if reply.body.is_empty() {
                        return Err(Error::no_data(format!("empty body from {}", request.url)));
                    }
                    return Ok(reply.body);
                }
                State::Terminal(Terminal::Failure(kind)) => {
                    return Err(failure(kind, reply.status, &request.url));
                }
                State::Redirect(target) => {
                    debug!(from = %request.url, to = %target, "following redirect");
                    request.url = target;
                }
                State::Backoff(wait) => {
                    debug!(url = %request.url, code = reply.status, wait = ?wait, "backing off");
                    self.sleeper.sleep(cancel, wait).await;
                }
                State::Direct | State::Proxied => {}
            }
        }

        error!(url = %request.url, attempts = self.policy.max_attempts, "failed to complete the operation");
        Err(Error::no_data(format!("retry budget exhausted for {}", request.url)))
    }

    /// [`fetch`](Self::fetch) decoded as UTF-8 text.
    pub async fn get_text(&self, cancel: &CancellationToken, request: &mut Request) -> Result<String> {
        let body = self.fetch(cancel, request).await?;
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::parse(format!("non UTF-8 body from {}: {e}", request.url)))
    }

    /// [`fetch`](Self::fetch) deserialized from JSON.
    pub async fn get_json<T>(&self, cancel: &CancellationToken, request: &mut Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.fetch(cancel, request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn headers(&self, request: &Request) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(request.headers.len() + 1);
        headers.push(("User-Agent".to_string(), self.user_agent.clone()));
        headers.extend(request.headers.iter().cloned());
        headers
    }
}

fn failure(kind: FailureKind, status: u16, url: &Url) -> Error {
    match kind {
        FailureKind::BadData => Error::bad_data(format!("HTTP {status} from {url}")),
        FailureKind::NotFound => Error::not_found(format!("HTTP {status} from {url}")),
        FailureKind::NoData => Error::no_data(format!("HTTP {status} from {url}")),
    }
}
