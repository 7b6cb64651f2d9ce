//! HTTP types and the pluggable transport seam.
//!
//! # Design
//! The tracker protocol is GET-only with all semantics in the query
//! string, so a request is just a URL plus an optional per-call
//! deadline, and a response is just a status and body. The client never
//! parses a success body; the body only matters on failure, where the
//! tracker puts its rejection reason.
//!
//! `HttpTransport` is the one seam to the network. Production uses the
//! ureq-backed implementation in `transport`; tests swap in an
//! in-memory fake.

use std::time::Duration;

use crate::error::PostbackError;

/// A GET request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Full URL including the query string.
    pub url: String,
    /// Per-call deadline for the whole round-trip. `None` leaves the
    /// transport's own default in place.
    pub timeout: Option<Duration>,
}

/// The response to an executed GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Executes one GET round-trip.
///
/// Implementations return the response for any status code; status
/// interpretation belongs to the client. Connection failures and
/// body-read failures map to `PostbackError::Transport`.
pub trait HttpTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, PostbackError>;
}
