//! Conversion/update requests and their builder.
//!
//! # Design
//! `Request` is an immutable snapshot of everything one postback carries:
//! the click id, an optional payout, an optional one- or two-part
//! conversion status, and an event collection. `RequestBuilder`
//! accumulates the optional fields; the click id is supplied at `build`
//! time so one configured builder can stamp many clicks. Building
//! clones the builder state, so later builder mutation never reaches an
//! already-built request.

use crate::error::PostbackError;
use crate::event::Events;

/// One outbound click update, immutable once built.
///
/// A request counts as a conversion when a status or payout is present
/// or the builder flagged it explicitly; otherwise it is a pure
/// click/event update.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    click_id: String,
    payout: Option<f64>,
    cnv_status: Option<String>,
    cnv_status2: Option<String>,
    conversion: bool,
    events: Events,
}

impl Request {
    pub fn click_id(&self) -> &str {
        &self.click_id
    }

    /// Payout as wire text: shortest decimal that round-trips the value,
    /// so `12.5` renders as `12.5` and `3.0` as `3`. Empty when unset.
    pub fn payout(&self) -> String {
        match self.payout {
            Some(p) => p.to_string(),
            None => String::new(),
        }
    }

    pub fn conversion_status(&self) -> &str {
        self.cnv_status.as_deref().unwrap_or("")
    }

    pub fn conversion_status2(&self) -> &str {
        self.cnv_status2.as_deref().unwrap_or("")
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn is_conversion(&self) -> bool {
        self.conversion
            || self.cnv_status.is_some()
            || self.cnv_status2.is_some()
            || self.payout.is_some()
    }

    // Tail of the parameter list: everything after the click identifier,
    // shared by the wire and debug renderings.
    fn tail_params(&self) -> Vec<String> {
        let mut params = Vec::new();
        if self.payout.is_some() {
            params.push(format!("payout={}", self.payout()));
        }
        if let Some(status) = &self.cnv_status {
            params.push(format!("cnv_status={status}"));
        }
        if let Some(status2) = &self.cnv_status2 {
            params.push(format!("cnv_status2={status2}"));
        }
        params.extend(self.events.params());
        params
    }

    /// Wire parameters in fixed order: `cnv_id`, then payout, primary
    /// status, secondary status (each if set), then event parameters.
    pub fn params(&self) -> Vec<String> {
        let mut params = vec![format!("cnv_id={}", self.click_id)];
        params.extend(self.tail_params());
        params
    }

    /// The full query string for this request, parameters joined with `&`.
    pub fn query_string(&self) -> String {
        self.params().join("&")
    }

    /// Log-friendly summary in the tracker's conversion-update notation:
    /// the bare click id and the remaining parameters joined with `:`.
    /// Not valid on the wire.
    pub fn debug_string(&self) -> String {
        let mut params = vec![self.click_id.clone()];
        params.extend(self.tail_params());
        params.join(":")
    }
}

/// Accumulates the optional parts of a `Request`.
///
/// All `with_*` methods consume and return the builder for chaining.
/// `build` borrows, so a fully configured builder can produce requests
/// for any number of click ids.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    payout: Option<f64>,
    cnv_status: Option<String>,
    cnv_status2: Option<String>,
    conversion: bool,
    events: Events,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversion payout. Last write wins.
    pub fn with_payout(mut self, payout: f64) -> Self {
        self.payout = Some(payout);
        self
    }

    /// Replace the whole event collection. No merge with a previously
    /// supplied collection.
    pub fn with_events(mut self, events: Events) -> Self {
        self.events = events;
        self
    }

    /// Set the primary conversion status and, when `secondary` is
    /// non-empty, the secondary status built by joining the fragments
    /// with `_`. No fragments means no secondary status, not an error.
    pub fn with_status(mut self, primary: &str, secondary: &[&str]) -> Self {
        self.cnv_status = Some(primary.to_string());
        if !secondary.is_empty() {
            self.cnv_status2 = Some(secondary.join("_"));
        }
        self
    }

    /// Mark the request as a conversion even without status or payout.
    pub fn conversion(mut self) -> Self {
        self.conversion = true;
        self
    }

    /// Produce a `Request` for `click_id`, snapshotting the builder
    /// state at call time. Fails with `MissingClickId` on an empty id.
    pub fn build(&self, click_id: &str) -> Result<Request, PostbackError> {
        if click_id.is_empty() {
            return Err(PostbackError::MissingClickId);
        }
        Ok(Request {
            click_id: click_id.to_string(),
            payout: self.payout,
            cnv_status: self.cnv_status.clone(),
            cnv_status2: self.cnv_status2.clone(),
            conversion: self.conversion,
            events: self.events.clone(),
        })
    }
}
