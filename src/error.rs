//! Error types and result handling for anicine operations.
//!
//! All fallible operations return a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Not Found**: a search or resolution ran out of candidates, or a provider
//!   answered 400/404
//! - **Bad Data**: malformed input, a refused precondition (412/428) or a failed
//!   cross-check against the anchor id
//! - **No Data**: the exchange succeeded but carried nothing, or the retry budget
//!   ran out
//! - **Canceled**: the caller aborted; never downgraded to another kind
//! - **Network / Parse / Json / Io / Config**: lower-level failures with context
//!
//! # Examples
//!
//! ```rust
//! use anicine::{Error, Result};
//!
//! fn classify(result: Result<String>) -> &'static str {
//!     match result {
//!         Ok(_) => "ok",
//!         Err(Error::Canceled) => "stop everything",
//!         Err(Error::NotFound(_)) => "try another provider",
//!         Err(_) => "log and move on",
//!     }
//! }
//!
//! assert_eq!(classify(Err(Error::Canceled)), "stop everything");
//! ```

use thiserror::Error;

/// Type alias for Results with anicine errors.
///
/// ```rust
/// use anicine::{Error, Result};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::bad_data("redirect without a location"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for every anicine operation.
///
/// The first four variants form the retrieval/resolution taxonomy. Callers treat
/// all of them except [`Canceled`](Error::Canceled) as local failures ("this
/// candidate failed, try the next one").
#[derive(Error, Debug)]
pub enum Error {
    /// Search or resolution exhausted without a confirmed match.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, an unparsable target, or a failed cross-check.
    #[error("Bad data: {0}")]
    BadData(String),

    /// A technically successful exchange with an empty payload, or an
    /// exhausted retry budget.
    #[error("No data: {0}")]
    NoData(String),

    /// Caller-initiated abort.
    ///
    /// This variant unwinds every enclosing loop and call level as-is.
    #[error("Operation canceled")]
    Canceled,

    /// Network-related errors from the HTTP client.
    ///
    /// Wraps connection timeouts, DNS failures and TLS errors raised by reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML/JSON/date parsing and data format errors.
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system and IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or incomplete configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a not found error with the given message.
    ///
    /// ```rust
    /// use anicine::Error;
    ///
    /// let error = Error::not_found("livechart: no candidate survived");
    /// assert!(error.to_string().contains("livechart"));
    /// ```
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a bad data error with the given message.
    pub fn bad_data(msg: impl Into<String>) -> Self {
        Error::BadData(msg.into())
    }

    /// Creates a no data error with the given message.
    pub fn no_data(msg: impl Into<String>) -> Self {
        Error::NoData(msg.into())
    }

    /// Creates a parse error with the given message.
    ///
    /// ```rust
    /// use anicine::Error;
    ///
    /// let error = Error::parse(format!("unexpected date {:?}", "2024/13/01"));
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Returns `true` for [`Error::Canceled`].
    ///
    /// Loops that swallow per-candidate failures check this first so a
    /// cancellation is re-raised unchanged.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}
