//! Dispatch client for the tracker's click endpoint.
//!
//! # Design
//! `Client` owns the transport configuration (base click URL, keys,
//! dry-run mode) and exposes the high-level operations: send a
//! conversion postback, send event updates, and the single-event
//! shorthands. Every operation funnels into `send_click`, which
//! performs exactly one GET and judges success purely by a 200 status,
//! and every operation has a `_with` variant taking `SendOptions` for
//! per-call base URL, deadline, and dry-run overrides.
//!
//! Dry-run is fixed at construction (`dry_run()` consumes the client),
//! so no call can observe a mode change mid-flight. In dry-run mode a
//! request is validated and assembled exactly as in live mode but the
//! transport is never touched; the would-be URL comes back in the
//! `Dispatch` value and is logged at info.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PostbackError;
use crate::event::{Event, Events};
use crate::http::{HttpRequest, HttpTransport};
use crate::request::Request;
use crate::transport::UreqTransport;

/// Transport configuration for a `Client`.
///
/// Serde-friendly so hosts can load it from their own config files.
/// `api_key` authorizes click creation through the tracker API,
/// `upd_key` authorizes click updates (event sends).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the tracker's click handler, e.g.
    /// `https://tracker.example/click`.
    pub click_base_url: String,
    pub api_key: String,
    pub upd_key: String,
    /// When true the client never performs network calls.
    #[serde(default)]
    pub dry_run: bool,
}

/// Per-call overrides for a single dispatch.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Send against a different click handler URL for this call only.
    pub click_base_url: Option<String>,
    /// Deadline for the whole round-trip.
    pub timeout: Option<Duration>,
    /// Override the client's dry-run mode for this call only.
    pub dry_run: Option<bool>,
}

/// Outcome of one successful dispatch: the exact URL the request was
/// (or in dry-run mode, would have been) sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub url: String,
    pub dry_run: bool,
}

/// Client for one tracker installation.
pub struct Client {
    click_base_url: String,
    #[allow(dead_code)] // reserved for click creation via the tracker API
    api_key: String,
    upd_key: String,
    dry_run: bool,
    transport: Box<dyn HttpTransport>,
}

impl Client {
    /// Client with the default ureq transport.
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Box::new(UreqTransport::new()))
    }

    /// Client with an injected transport.
    pub fn with_transport(config: Config, transport: Box<dyn HttpTransport>) -> Self {
        Self {
            click_base_url: config.click_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            upd_key: config.upd_key,
            dry_run: config.dry_run,
            transport,
        }
    }

    /// This client, fixed in dry-run mode: no dispatch operation will
    /// perform a network call, but all of them still validate and
    /// assemble requests as usual.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Update the click identified by `click_id` with `events`. Does not
    /// generate a conversion.
    pub fn send_events(&self, click_id: &str, events: &Events) -> Result<Dispatch, PostbackError> {
        self.send_events_with(click_id, events, &SendOptions::default())
    }

    pub fn send_events_with(
        &self,
        click_id: &str,
        events: &Events,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        let mut query = format!("upd_clickid={click_id}&upd_key={}", self.upd_key);
        if !events.is_empty() {
            query.push('&');
            query.push_str(&events.query());
        }

        self.send_click(&query, opts)
    }

    /// Send a single event at `index`. The event is wrapped in a fresh
    /// collection, so only the index bound can fail validation.
    pub fn send_event(
        &self,
        click_id: &str,
        index: u8,
        event: Event,
    ) -> Result<Dispatch, PostbackError> {
        self.send_event_with(click_id, index, event, &SendOptions::default())
    }

    pub fn send_event_with(
        &self,
        click_id: &str,
        index: u8,
        event: Event,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        let mut events = Events::new();
        events.set(index, event, false)?;

        self.send_events_with(click_id, &events, opts)
    }

    /// Add one to the event counter at `index`.
    pub fn add_event(&self, click_id: &str, index: u8) -> Result<Dispatch, PostbackError> {
        self.add_event_with(click_id, index, &SendOptions::default())
    }

    pub fn add_event_with(
        &self,
        click_id: &str,
        index: u8,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        self.send_event_with(click_id, index, Event::Add(1), opts)
    }

    /// Subtract one from the event counter at `index`.
    pub fn sub_event(&self, click_id: &str, index: u8) -> Result<Dispatch, PostbackError> {
        self.sub_event_with(click_id, index, &SendOptions::default())
    }

    pub fn sub_event_with(
        &self,
        click_id: &str,
        index: u8,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        self.send_event_with(click_id, index, Event::Add(-1), opts)
    }

    /// Set the event counter at `index` to one.
    pub fn setup_event(&self, click_id: &str, index: u8) -> Result<Dispatch, PostbackError> {
        self.setup_event_with(click_id, index, &SendOptions::default())
    }

    pub fn setup_event_with(
        &self,
        click_id: &str,
        index: u8,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        self.send_event_with(click_id, index, Event::Set(1), opts)
    }

    /// Reset the event counter at `index` to zero.
    pub fn reset_event(&self, click_id: &str, index: u8) -> Result<Dispatch, PostbackError> {
        self.reset_event_with(click_id, index, &SendOptions::default())
    }

    pub fn reset_event_with(
        &self,
        click_id: &str,
        index: u8,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        self.send_event_with(click_id, index, Event::Set(0), opts)
    }

    /// Send or update the conversion for `cnv_id=click_id`. Status and
    /// payout are only written when given; events may be added or
    /// replaced in the same call.
    pub fn send_postback(
        &self,
        click_id: &str,
        status: Option<&str>,
        payout: Option<f64>,
        events: &Events,
    ) -> Result<Dispatch, PostbackError> {
        self.send_postback_with(click_id, status, payout, events, &SendOptions::default())
    }

    pub fn send_postback_with(
        &self,
        click_id: &str,
        status: Option<&str>,
        payout: Option<f64>,
        events: &Events,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        let mut query = format!("cnv_id={click_id}");
        if let Some(status) = status {
            query.push_str(&format!("&cnv_status={status}"));
        }
        if let Some(payout) = payout {
            query.push_str(&format!("&payout={payout}"));
        }
        if !events.is_empty() {
            query.push('&');
            query.push_str(&events.query());
        }

        self.send_click(&query, opts)
    }

    /// Dispatch a built `Request`. The general entry point once a
    /// `RequestBuilder` has produced a request.
    pub fn send_postback_request(&self, request: &Request) -> Result<Dispatch, PostbackError> {
        self.send_postback_request_with(request, &SendOptions::default())
    }

    pub fn send_postback_request_with(
        &self,
        request: &Request,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        self.send_click(&request.query_string(), opts)
    }

    /// Update only the payout of an existing conversion.
    pub fn update_payout(&self, click_id: &str, payout: f64) -> Result<Dispatch, PostbackError> {
        self.update_payout_with(click_id, payout, &SendOptions::default())
    }

    pub fn update_payout_with(
        &self,
        click_id: &str,
        payout: f64,
        opts: &SendOptions,
    ) -> Result<Dispatch, PostbackError> {
        self.send_postback_with(click_id, None, Some(payout), &Events::new(), opts)
    }

    /// Register a base click on the campaign identified by
    /// `campaign_key`, optionally marking a landing-page click too.
    /// Not implemented by this client.
    pub fn send_base_click(
        &self,
        _campaign_key: &str,
        _lp_click: bool,
    ) -> Result<Dispatch, PostbackError> {
        Err(PostbackError::Unsupported("base click"))
    }

    /// Mark a landing-page click for an existing click. Not implemented
    /// by this client.
    pub fn set_lp_click(&self, _click_id: &str) -> Result<Dispatch, PostbackError> {
        Err(PostbackError::Unsupported("landing-page click"))
    }

    /// Register an offer click. Not implemented by this client.
    pub fn send_offer_click(&self) -> Result<Dispatch, PostbackError> {
        Err(PostbackError::Unsupported("offer click"))
    }

    // Every dispatch operation ends here: one GET against the click
    // handler, 200 is the only success.
    fn send_click(&self, query: &str, opts: &SendOptions) -> Result<Dispatch, PostbackError> {
        let base = opts
            .click_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or(&self.click_base_url);
        let url = format!("{base}?{query}");
        let dry_run = opts.dry_run.unwrap_or(self.dry_run);

        debug!(url = %url, dry_run, "dispatching tracker request");

        if dry_run {
            info!(url = %url, "dry run, skipping network call");
            return Ok(Dispatch { url, dry_run: true });
        }

        let response = self.transport.get(&HttpRequest {
            url: url.clone(),
            timeout: opts.timeout,
        })?;

        info!(url = %url, status = response.status, "tracker responded");

        if response.status != 200 {
            return Err(PostbackError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }

        Ok(Dispatch {
            url,
            dry_run: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::HttpResponse;
    use crate::request::RequestBuilder;

    /// Transport that answers from a canned response and records every
    /// request it was asked to execute.
    struct FakeTransport {
        status: u16,
        body: String,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn ok() -> Self {
            Self::with_response(200, "ok")
        }

        fn with_response(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.url.clone()).collect()
        }

        fn timeouts(&self) -> Vec<Option<Duration>> {
            self.requests.borrow().iter().map(|r| r.timeout).collect()
        }
    }

    impl HttpTransport for &FakeTransport {
        fn get(&self, request: &HttpRequest) -> Result<HttpResponse, PostbackError> {
            self.requests.borrow_mut().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn config() -> Config {
        Config {
            click_base_url: "http://tracker.local/click".to_string(),
            api_key: "api-key".to_string(),
            upd_key: "upd-key".to_string(),
            dry_run: false,
        }
    }

    fn client(transport: &'static FakeTransport) -> Client {
        Client::with_transport(config(), Box::new(transport))
    }

    fn leak(transport: FakeTransport) -> &'static FakeTransport {
        Box::leak(Box::new(transport))
    }

    #[test]
    fn send_events_builds_update_query() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let mut events = Events::new();
        events.set(3, Event::Set(7), false).unwrap();
        events.set(1, Event::Add(-2), false).unwrap();

        let dispatch = cli.send_events("abc123", &events).unwrap();
        assert_eq!(
            dispatch.url,
            "http://tracker.local/click?upd_clickid=abc123&upd_key=upd-key&add_event1=-2&event3=7"
        );
        assert!(!dispatch.dry_run);
        assert_eq!(transport.urls(), vec![dispatch.url.clone()]);
    }

    #[test]
    fn send_events_with_empty_collection_omits_event_params() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let dispatch = cli.send_events("abc123", &Events::new()).unwrap();
        assert_eq!(
            dispatch.url,
            "http://tracker.local/click?upd_clickid=abc123&upd_key=upd-key"
        );
    }

    #[test]
    fn send_event_rejects_out_of_range_index_before_dispatch() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let err = cli.send_event("abc", 30, Event::Add(1)).unwrap_err();
        assert!(matches!(err, PostbackError::IndexOutOfRange { index: 30 }));
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn event_shorthands_render_expected_params() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        assert!(cli.add_event("c", 5).unwrap().url.contains("add_event5=1"));
        assert!(cli.sub_event("c", 5).unwrap().url.contains("add_event5=-1"));
        assert!(cli.setup_event("c", 5).unwrap().url.contains("event5=1"));
        assert!(cli.reset_event("c", 5).unwrap().url.contains("event5=0"));
    }

    #[test]
    fn send_postback_builds_conversion_query() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let dispatch = cli
            .send_postback("abc123", Some("approved"), Some(12.5), &Events::new())
            .unwrap();
        assert_eq!(
            dispatch.url,
            "http://tracker.local/click?cnv_id=abc123&cnv_status=approved&payout=12.5"
        );
    }

    #[test]
    fn send_postback_appends_events_only_when_present() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let mut events = Events::new();
        events.set(2, Event::Add(3), false).unwrap();
        let dispatch = cli
            .send_postback("abc", None, None, &events)
            .unwrap();
        assert_eq!(
            dispatch.url,
            "http://tracker.local/click?cnv_id=abc&add_event2=3"
        );
    }

    #[test]
    fn update_payout_is_payout_only_postback() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let dispatch = cli.update_payout("abc", 3.0).unwrap();
        assert_eq!(dispatch.url, "http://tracker.local/click?cnv_id=abc&payout=3");
    }

    #[test]
    fn send_postback_request_uses_request_query_string() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let request = RequestBuilder::new()
            .with_payout(12.5)
            .with_status("approved", &[])
            .build("abc123")
            .unwrap();
        let dispatch = cli.send_postback_request(&request).unwrap();
        assert_eq!(
            dispatch.url,
            format!("http://tracker.local/click?{}", request.query_string())
        );
    }

    #[test]
    fn non_200_surfaces_status_and_body() {
        let transport = leak(FakeTransport::with_response(500, "rate limited"));
        let cli = client(transport);

        let err = cli.send_events("abc", &Events::new()).unwrap_err();
        match err {
            PostbackError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[test]
    fn dry_run_never_touches_the_transport() {
        let transport = leak(FakeTransport::with_response(500, "unreachable"));
        let cli = client(transport).dry_run();

        let dispatch = cli
            .send_postback("abc", Some("approved"), None, &Events::new())
            .unwrap();
        assert!(dispatch.dry_run);
        assert_eq!(
            dispatch.url,
            "http://tracker.local/click?cnv_id=abc&cnv_status=approved"
        );
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn dry_run_still_validates() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport).dry_run();

        let err = cli.send_event("abc", 99, Event::Set(1)).unwrap_err();
        assert!(matches!(err, PostbackError::IndexOutOfRange { index: 99 }));
    }

    #[test]
    fn per_call_dry_run_overrides_live_mode() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let opts = SendOptions {
            dry_run: Some(true),
            ..SendOptions::default()
        };
        let request = RequestBuilder::new().build("abc").unwrap();
        let dispatch = cli.send_postback_request_with(&request, &opts).unwrap();
        assert!(dispatch.dry_run);
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn per_call_timeout_reaches_the_transport() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let opts = SendOptions {
            timeout: Some(Duration::from_secs(5)),
            ..SendOptions::default()
        };
        cli.send_events_with("abc", &Events::new(), &opts).unwrap();
        assert_eq!(transport.timeouts(), vec![Some(Duration::from_secs(5))]);
    }

    #[test]
    fn timeout_defaults_to_transport_default() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        cli.send_events("abc", &Events::new()).unwrap();
        assert_eq!(transport.timeouts(), vec![None]);
    }

    #[test]
    fn timeout_propagates_through_shorthand_operations() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let opts = SendOptions {
            timeout: Some(Duration::from_millis(250)),
            ..SendOptions::default()
        };
        cli.add_event_with("c", 5, &opts).unwrap();
        cli.sub_event_with("c", 5, &opts).unwrap();
        cli.setup_event_with("c", 5, &opts).unwrap();
        cli.reset_event_with("c", 5, &opts).unwrap();
        cli.send_event_with("c", 6, Event::Add(3), &opts).unwrap();
        cli.send_postback_with("c", None, Some(1.5), &Events::new(), &opts)
            .unwrap();
        cli.update_payout_with("c", 2.5, &opts).unwrap();
        let request = RequestBuilder::new().build("c").unwrap();
        cli.send_postback_request_with(&request, &opts).unwrap();

        assert_eq!(
            transport.timeouts(),
            vec![Some(Duration::from_millis(250)); 8]
        );
    }

    #[test]
    fn per_call_dry_run_reaches_every_operation() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let opts = SendOptions {
            dry_run: Some(true),
            ..SendOptions::default()
        };
        assert!(cli.add_event_with("c", 1, &opts).unwrap().dry_run);
        assert!(cli.sub_event_with("c", 1, &opts).unwrap().dry_run);
        assert!(cli.setup_event_with("c", 1, &opts).unwrap().dry_run);
        assert!(cli.reset_event_with("c", 1, &opts).unwrap().dry_run);
        assert!(cli
            .send_event_with("c", 1, Event::Set(2), &opts)
            .unwrap()
            .dry_run);
        assert!(cli
            .send_postback_with("c", Some("ok"), None, &Events::new(), &opts)
            .unwrap()
            .dry_run);
        assert!(cli.update_payout_with("c", 1.0, &opts).unwrap().dry_run);
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn per_call_base_url_override() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        let opts = SendOptions {
            click_base_url: Some("http://other.local/click/".to_string()),
            ..SendOptions::default()
        };
        let dispatch = cli
            .send_events_with("abc", &Events::new(), &opts)
            .unwrap();
        assert!(dispatch.url.starts_with("http://other.local/click?"));
    }

    #[test]
    fn trailing_slash_on_base_url_is_stripped() {
        let transport = leak(FakeTransport::ok());
        let cli = Client::with_transport(
            Config {
                click_base_url: "http://tracker.local/click/".to_string(),
                ..config()
            },
            Box::new(transport),
        );
        let dispatch = cli.send_events("a", &Events::new()).unwrap();
        assert!(dispatch.url.starts_with("http://tracker.local/click?"));
    }

    #[test]
    fn unimplemented_click_operations_return_unsupported() {
        let transport = leak(FakeTransport::ok());
        let cli = client(transport);

        assert!(matches!(
            cli.send_base_click("campaign", true).unwrap_err(),
            PostbackError::Unsupported("base click")
        ));
        assert!(matches!(
            cli.set_lp_click("abc").unwrap_err(),
            PostbackError::Unsupported("landing-page click")
        ));
        assert!(matches!(
            cli.send_offer_click().unwrap_err(),
            PostbackError::Unsupported("offer click")
        ));
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn config_round_trips_through_serde() {
        let json = r#"{"click_base_url":"http://t/click","api_key":"a","upd_key":"u"}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(!cfg.dry_run, "dry_run defaults to false");
        let back = serde_json::to_string(&cfg).unwrap();
        let again: Config = serde_json::from_str(&back).unwrap();
        assert_eq!(again.click_base_url, "http://t/click");
        assert_eq!(again.upd_key, "u");
    }
}
