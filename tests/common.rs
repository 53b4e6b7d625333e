//! Common test utilities
//!
//! Scripted transports and recording sleepers shared by the test modules.
// Common test utilities - all must be public

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anicine::net::retry::Route;
use anicine::net::{Cookie, Exchange, Reply, Sleeper, Transport};
use anicine::types::{AnimeDate, AnimeInfo};
use anicine::{Error, Result, RetrievalClient};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

#[allow(dead_code)]
pub const FRIEREN_MAL: u32 = 52991;

/// A reply with `status` and `body`.
#[allow(dead_code)]
pub fn reply(status: u16, body: &str) -> Reply {
    Reply {
        status,
        body: Bytes::from(body.to_string()),
        ..Default::default()
    }
}

/// A redirect reply pointing at `location`.
#[allow(dead_code)]
pub fn redirect(status: u16, location: &str) -> Reply {
    Reply {
        status,
        location: Some(location.to_string()),
        ..Default::default()
    }
}

/// A 200 reply carrying one cookie.
#[allow(dead_code)]
pub fn reply_with_cookie(body: &str, name: &str, value: &str) -> Reply {
    Reply {
        cookies: vec![Cookie {
            name: name.to_string(),
            value: value.to_string(),
        }],
        ..reply(200, body)
    }
}

/// One observed attempt.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Call {
    pub route: Route,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

/// A [`Transport`] answering from a script, then from pages keyed by URL path.
///
/// Scripted replies are consumed first, in order. A `None` script entry
/// simulates a network failure. Without a script entry or a page the answer
/// is 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Option<Reply>>>>,
    pages: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    count: Arc<AtomicUsize>,
    proxy: bool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretends a proxied client exists.
    pub fn with_proxy(mut self) -> Self {
        self.proxy = true;
        self
    }

    pub fn script(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.script.lock().extend(replies.into_iter().map(Some));
        self
    }

    /// Queues a transport error.
    pub fn fail_once(self) -> Self {
        self.script.lock().push_back(None);
        self
    }

    pub fn page(self, path: &str, reply: Reply) -> Self {
        self.pages.lock().insert(path.to_string(), reply);
        self
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls.lock().iter().map(|call| call.url.path().to_string()).collect()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.calls.lock().iter().map(|call| call.route).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn supports_proxy(&self) -> bool {
        self.proxy
    }

    async fn send(&self, route: Route, exchange: Exchange) -> Result<Reply> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(Call {
            route,
            url: exchange.url.clone(),
            headers: exchange.headers.clone(),
        });

        if let Some(next) = self.script.lock().pop_front() {
            return next.ok_or_else(|| Error::Other("connection reset".to_string()));
        }

        Ok(self
            .pages
            .lock()
            .get(exchange.url.path())
            .cloned()
            .unwrap_or_else(|| reply(404, "")))
    }
}

/// A [`Sleeper`] that records waits instead of sleeping.
///
/// With [`cancel_on_sleep`](Self::cancel_on_sleep) the first wait fires the
/// token, like a caller giving up during a backoff.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    cancel: Option<CancellationToken>,
}

#[allow(dead_code)]
impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_on_sleep(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, _cancel: &CancellationToken, duration: Duration) {
        self.sleeps.lock().push(duration);
        if let Some(token) = &self.cancel {
            token.cancel();
        }
    }
}

/// A client over `transport` that never really sleeps.
#[allow(dead_code)]
pub fn client(transport: &MockTransport, sleeper: &RecordingSleeper) -> RetrievalClient {
    RetrievalClient::with_transport(transport.clone()).with_sleeper(sleeper.clone())
}

/// Anchor of "Sousou no Frieren".
#[allow(dead_code)]
pub fn frieren() -> AnimeInfo {
    AnimeInfo {
        title: "Sousou no Frieren".to_string(),
        query: "sousou-no-frieren".to_string(),
        kind: "tv".to_string(),
        mal_id: FRIEREN_MAL,
        start_date: AnimeDate::new(2023, 9, 29),
        ..Default::default()
    }
}
