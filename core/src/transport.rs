//! Default ureq-backed transport.

use crate::error::PostbackError;
use crate::http::{HttpRequest, HttpResponse};

/// `HttpTransport` implementation on a blocking ureq agent.
///
/// Status-as-error is disabled so 4xx/5xx come back as data and the
/// client decides what a failure is. A per-request timeout, when given,
/// bounds the whole round-trip.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl crate::http::HttpTransport for UreqTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, PostbackError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.timeout)
            .build()
            .new_agent();

        let mut response = agent
            .get(&request.url)
            .call()
            .map_err(|e| PostbackError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| PostbackError::Transport(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}
