//! Mock click tracker for integration tests and local development.
//!
//! # Design
//! Stands in for the tracker's click handler: `GET /click` records the
//! raw query string and answers `200 ok`, or whatever failure response
//! a test preconfigured through the shared state. `GET /clicks` returns
//! the recorded queries as JSON so a host (or a curious developer
//! running the binary) can inspect what a client actually sent.
//!
//! State uses `std::sync::Mutex` rather than the async lock: tests read
//! it from a synchronous thread while the server runs on a tokio
//! runtime, and no lock is held across an await.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;

/// Recorded traffic plus an optional canned failure response.
#[derive(Debug, Default)]
pub struct Tracker {
    /// Raw query strings of every `/click` request, in arrival order.
    pub clicks: Mutex<Vec<String>>,
    /// When set, `/click` answers with this status and body instead of
    /// recording the request.
    pub fail_with: Mutex<Option<(u16, String)>>,
}

pub type SharedTracker = Arc<Tracker>;

impl Tracker {
    pub fn shared() -> SharedTracker {
        Arc::new(Tracker::default())
    }

    /// Make every subsequent `/click` answer `status` with `body`.
    pub fn fail_with(&self, status: u16, body: &str) {
        *self.fail_with.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Back to recording requests and answering `200 ok`.
    pub fn recover(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    /// Snapshot of the recorded query strings.
    pub fn recorded(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }
}

pub fn app(state: SharedTracker) -> Router {
    Router::new()
        .route("/click", get(click))
        .route("/clicks", get(list_clicks))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: SharedTracker) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

async fn click(
    State(tracker): State<SharedTracker>,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    if let Some((status, body)) = tracker.fail_with.lock().unwrap().clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, body);
    }
    tracker
        .clicks
        .lock()
        .unwrap()
        .push(query.unwrap_or_default());
    (StatusCode::OK, "ok".to_string())
}

async fn list_clicks(State(tracker): State<SharedTracker>) -> Json<Vec<String>> {
    Json(tracker.recorded())
}
