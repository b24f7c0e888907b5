use crate::error::FetchError;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Per-request timeout for image downloads
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

const MAX_REDIRECTS: usize = 10;

/// Get standard user agent string
pub fn get_user_agent() -> String {
    format!("ws-fetch/{}", env!("CARGO_PKG_VERSION"))
}

/// Shared client: follows redirects, bounded by a per-request timeout
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(get_user_agent())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Strip surrounding whitespace and line breaks that leak in from the markup
pub fn sanitize_url(url: &str) -> String {
    url.trim().replace(['\n', '\r'], "")
}
