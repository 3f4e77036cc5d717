// src/fetch/mod.rs

//! Status query layer.
//!
//! - [`StatusQuery`] is the collaborator the engine uses to read one task's
//!   status. It is expected to be an idempotent, side-effect free read that
//!   is safe to call on every tick; timeouts are its own responsibility.
//! - [`fanout`] queries every active id concurrently and waits for all of
//!   them to settle, so one failing query never aborts or delays the others.
//! - [`http`] is the production implementation against the image task
//!   history API. Tests provide their own scripted implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::types::TaskSnapshot;

pub mod fanout;
pub mod http;

pub use fanout::{fetch_all, TickReport};
pub use http::HttpStatusQuery;

/// Errors from a single status query.
///
/// None of these are fatal to the poller: a failed query just means "no
/// observation for this task on this tick".
#[derive(Debug, Error)]
pub enum QueryError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The server answered but reported `success = false` or no data.
    #[error("query rejected: {0}")]
    Rejected(String),

    /// The response body could not be decoded into a snapshot.
    #[error("could not decode task snapshot: {0}")]
    Decode(String),

    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),

    /// Any other transport-level failure (used by non-HTTP backends).
    #[error("status backend unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by [`StatusQuery::query`].
pub type QueryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<TaskSnapshot, QueryError>> + Send + 'a>>;

/// Trait abstracting how a single task's status is read.
///
/// Production code uses [`HttpStatusQuery`]; tests can provide their own
/// implementation that doesn't touch the network.
pub trait StatusQuery: Send + Sync + 'static {
    fn query<'a>(&'a self, id: &'a str) -> QueryFuture<'a>;
}

impl<T: StatusQuery + ?Sized> StatusQuery for Arc<T> {
    fn query<'a>(&'a self, id: &'a str) -> QueryFuture<'a> {
        (**self).query(id)
    }
}

impl<T: StatusQuery + ?Sized> StatusQuery for Box<T> {
    fn query<'a>(&'a self, id: &'a str) -> QueryFuture<'a> {
        (**self).query(id)
    }
}
