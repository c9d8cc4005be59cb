use reqwest::Client;
use tracing::{debug, info};

use super::error::PlexError;
use super::types::{PlexResource, SignInResponse};

const SIGN_IN_URL: &str = "https://plex.tv/users/sign_in.json";
const RESOURCES_URL: &str = "https://plex.tv/api/v2/resources";

/// Sign in to plex.tv with account credentials. Returns the account token.
pub async fn sign_in(http: &Client, username: &str, password: &str) -> Result<String, PlexError> {
    let resp = http
        .post(SIGN_IN_URL)
        .basic_auth(username, Some(password))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        // plex.tv answers bad credentials with 401 or 422.
        if status == 422 {
            return Err(PlexError::Auth(body));
        }
        return Err(PlexError::from_status(status, body));
    }

    let body: SignInResponse = resp
        .json()
        .await
        .map_err(|e| PlexError::Parse(e.to_string()))?;
    info!(username, "Signed in to plex.tv");
    Ok(body.user.auth_token)
}

/// List the devices registered on the account.
pub async fn resources(http: &Client, account_token: &str) -> Result<Vec<PlexResource>, PlexError> {
    let resp = http
        .get(RESOURCES_URL)
        .header("X-Plex-Token", account_token)
        .query(&[("includeHttps", "1"), ("includeRelay", "1")])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(PlexError::from_status(status, body));
    }

    let resources: Vec<PlexResource> = resp
        .json()
        .await
        .map_err(|e| PlexError::Parse(e.to_string()))?;
    debug!(count = resources.len(), "Fetched account resources");
    Ok(resources)
}

/// Pick the server to connect to: the one called `name`, or the first
/// server resource on the account.
pub fn select_server(
    resources: Vec<PlexResource>,
    name: Option<&str>,
) -> Result<PlexResource, PlexError> {
    let mut servers = resources.into_iter().filter(PlexResource::is_server);
    match name {
        Some(name) => servers
            .find(|r| r.name == name)
            .ok_or_else(|| PlexError::ServerNotFound(name.to_string())),
        None => servers
            .next()
            .ok_or_else(|| PlexError::ServerNotFound("<first server>".into())),
    }
}
