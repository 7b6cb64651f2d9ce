//! Synchronous client for a click tracker's postback API.
//!
//! # Overview
//! Reports clicks, conversions (payout, status), and up to 30 numeric
//! per-click events to a tracker by encoding them as URL query
//! parameters and issuing a single HTTP GET per operation. A 200
//! response is success; anything else surfaces the status and body.
//!
//! # Design
//! - `Event` / `Events` encode the 30-slot event window and its
//!   `event<N>` / `add_event<N>` wire parameters.
//! - `RequestBuilder` assembles an immutable `Request` from optional
//!   payout, status, and events; the click id is stamped at build time.
//! - `Client` owns the base URL, keys, and dry-run mode, and performs
//!   exactly one GET per operation through a pluggable `HttpTransport`.
//! - Dry-run mode validates and assembles requests as usual but never
//!   touches the network; the would-be URL is returned in `Dispatch`.

pub mod client;
pub mod error;
pub mod event;
pub mod http;
pub mod request;
pub mod transport;

pub use client::{Client, Config, Dispatch, SendOptions};
pub use error::PostbackError;
pub use event::{Event, Events, EVENT_SLOTS};
pub use http::{HttpRequest, HttpResponse, HttpTransport};
pub use request::{Request, RequestBuilder};
pub use transport::UreqTransport;
