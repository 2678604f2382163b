//! HTTP plumbing shared by the service clients

use crate::types::AnalysisFailure;
use reqwest::{Client, Response};
use std::time::Duration;

/// Build an HTTP client with a per-request timeout
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Classify a transport error
pub fn map_transport_error(err: reqwest::Error) -> AnalysisFailure {
    if err.is_timeout() {
        AnalysisFailure::Timeout
    } else {
        AnalysisFailure::Network(err.to_string())
    }
}

/// Turn a non-success status into an `Api` failure carrying the body text
pub async fn ensure_success(response: Response) -> Result<Response, AnalysisFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(300).collect();
    Err(AnalysisFailure::Api {
        status: status.as_u16(),
        message,
    })
}

/// Join a base URL and an endpoint path without doubling slashes
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
