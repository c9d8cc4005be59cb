pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use client::PlexClient;
pub use error::PlexError;

/// Product name announced to plex.tv and the media server.
pub const PRODUCT: &str = "PlexATV";

/// Stable client identifier sent with every request.
pub const CLIENT_IDENTIFIER: &str = "plexatv-sensor";

/// Build an HTTP client carrying the headers Plex expects on every call.
pub(crate) fn http_client() -> Result<reqwest::Client, PlexError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        "X-Plex-Product",
        reqwest::header::HeaderValue::from_static(PRODUCT),
    );
    headers.insert(
        "X-Plex-Client-Identifier",
        reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
    );
    headers.insert(
        "X-Plex-Version",
        reqwest::header::HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    let http = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;
    Ok(http)
}
