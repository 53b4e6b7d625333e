//! Retry state machine shared by every retrieval.
//!
//! One exchange runs up to [`RetryPolicy::max_attempts`] attempts. Each attempt
//! picks a [`Route`] with [`route_for`], sends the request, and feeds the status
//! code to [`transition`], which answers with the next [`State`]:
//!
//! | Status | Direct | Proxied |
//! |---|---|---|
//! | 200, 304 | `Terminal(Success)` | `Terminal(Success)` |
//! | 412, 428 | `Terminal(Failure(BadData))` | same |
//! | 400, 404 | `Terminal(Failure(NotFound))` | same |
//! | 301, 302 | `Redirect(target)` or `Failure(NotFound)` | same |
//! | 403 | `Backoff(15s)` | `Backoff(0)` then direct |
//! | 429 | `Backoff(60s)` | `Backoff(15s)` |
//! | other | `Direct` / `Proxied` (no wait) | same |
//!
//! Only the first attempt may be proxied; every later attempt is direct.

use std::time::Duration;

use url::Url;

/// Timing and budget of the retry loop.
///
/// The defaults are the production constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per exchange, redirects included
    pub max_attempts: usize,
    /// Wait after a 403 answered to the direct client
    pub forbidden_backoff: Duration,
    /// Wait after a 429 answered to the direct client
    pub direct_rate_limit_backoff: Duration,
    /// Wait after a 429 answered to the proxied client
    pub proxied_rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            forbidden_backoff: Duration::from_secs(15),
            direct_rate_limit_backoff: Duration::from_secs(60),
            proxied_rate_limit_backoff: Duration::from_secs(15),
        }
    }
}

/// Which client carries an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Proxied,
}

/// Why a terminal failure ended the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    BadData,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Success,
    Failure(FailureKind),
}

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Try again on the direct client without waiting
    Direct,
    /// Try again on the proxied client without waiting
    Proxied,
    /// Wait, then try again
    Backoff(Duration),
    /// Try again against a new target
    Redirect(Url),
    /// Stop
    Terminal(Terminal),
}

/// Route of attempt `attempt` (0-indexed).
///
/// ```rust
/// use anicine::net::retry::{route_for, Route};
///
/// assert_eq!(route_for(0, true), Route::Proxied);
/// assert_eq!(route_for(1, true), Route::Direct);
/// assert_eq!(route_for(0, false), Route::Direct);
/// ```
pub fn route_for(attempt: usize, use_proxy: bool) -> Route {
    if attempt == 0 && use_proxy {
        Route::Proxied
    } else {
        Route::Direct
    }
}

/// Next state after `status` was answered on `route`.
///
/// `location` is the raw `Location` header of the response, resolved against
/// `current`.
pub fn transition(
    policy: &RetryPolicy,
    route: Route,
    status: u16,
    current: &Url,
    location: Option<&str>,
) -> State {
    match status {
        412 | 428 => State::Terminal(Terminal::Failure(FailureKind::BadData)),
        200 | 304 => State::Terminal(Terminal::Success),
        404 | 400 => State::Terminal(Terminal::Failure(FailureKind::NotFound)),
        301 | 302 => match location.and_then(|target| current.join(target).ok()) {
            Some(target) => State::Redirect(target),
            None => State::Terminal(Terminal::Failure(FailureKind::NotFound)),
        },
        403 => match route {
            Route::Direct => State::Backoff(policy.forbidden_backoff),
            Route::Proxied => State::Backoff(Duration::ZERO),
        },
        429 => match route {
            Route::Direct => State::Backoff(policy.direct_rate_limit_backoff),
            Route::Proxied => State::Backoff(policy.proxied_rate_limit_backoff),
        },
        _ => match route {
            Route::Direct => State::Direct,
            Route::Proxied => State::Proxied,
        },
    }
}
