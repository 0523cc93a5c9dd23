use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, ClientBuilder};

const APP_USER_AGENT: &str = concat!("runner-resolver/", env!("CARGO_PKG_VERSION"));

/// Longest silence tolerated between reads of a response.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    build_http_client_with_timeout(READ_TIMEOUT)
}

/// Same client with a custom per-read timeout. A stalled body fails with
/// an HTTP error instead of hanging.
pub fn build_http_client_with_timeout(read_timeout: Duration) -> Result<Client, reqwest::Error> {
    client_builder(read_timeout).build()
}

pub(crate) fn client_builder(read_timeout: Duration) -> ClientBuilder {
    let mut default_headers = HeaderMap::new();
    // Checksums are computed over the raw jar bytes.
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(Duration::from_secs(30))
        .read_timeout(read_timeout)
}
