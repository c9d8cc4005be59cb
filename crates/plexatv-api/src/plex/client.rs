use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use plexatv_core::config::AuthMode;
use plexatv_core::models::{RawSession, SessionKind};

use super::auth;
use super::error::PlexError;
use super::types::{MediaContainerResponse, PlexMetadata, PlexResource, RawIndex};
use crate::traits::SessionSource;

/// Client for one Plex media server.
pub struct PlexClient {
    base_url: Url,
    token: Option<String>,
    http: Client,
}

impl PlexClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, PlexError> {
        Self::with_http(base_url, token, super::http_client()?)
    }

    fn with_http(base_url: &str, token: Option<String>, http: Client) -> Result<Self, PlexError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            token,
            http,
        })
    }

    /// Build a client for the configured authentication mode.
    ///
    /// Account mode signs in to plex.tv, picks the server resource and
    /// connects to the first of its addresses that answers.
    pub async fn connect(mode: &AuthMode) -> Result<Self, PlexError> {
        let http = super::http_client()?;
        match mode {
            AuthMode::Token { base_url, token } => {
                Self::with_http(base_url, Some(token.clone()), http)
            }
            AuthMode::Anonymous { base_url } => Self::with_http(base_url, None, http),
            AuthMode::Account {
                username,
                password,
                server,
            } => {
                let account_token = auth::sign_in(&http, username, password).await?;
                let resources = auth::resources(&http, &account_token).await?;
                let resource = auth::select_server(resources, server.as_deref())?;
                Self::connect_resource(resource, account_token, http).await
            }
        }
    }

    async fn connect_resource(
        resource: PlexResource,
        account_token: String,
        http: Client,
    ) -> Result<Self, PlexError> {
        let token = resource.access_token.clone().unwrap_or(account_token);

        for connection in &resource.connections {
            let client = Self::with_http(&connection.uri, Some(token.clone()), http.clone())?;
            match client.identity().await {
                Ok(()) => {
                    info!(server = %resource.name, uri = %connection.uri, "Connected to server");
                    return Ok(client);
                }
                Err(e) => {
                    debug!(uri = %connection.uri, local = connection.local, error = %e, "Connection attempt failed");
                }
            }
        }

        Err(PlexError::Connection(format!(
            "no reachable address for server {}",
            resource.name
        )))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, PlexError> {
        let url = self.base_url.join(path)?;
        let mut req = self.http.get(url);
        if let Some(token) = &self.token {
            req = req.header("X-Plex-Token", token);
        }
        Ok(req)
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PlexError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "Plex API error");
            Err(PlexError::from_status(status, body))
        }
    }

    async fn container(&self, path: &str) -> Result<MediaContainerResponse, PlexError> {
        let resp = self.get(path)?.send().await?;
        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| PlexError::Parse(e.to_string()))
    }

    /// Cheap reachability probe.
    pub async fn identity(&self) -> Result<(), PlexError> {
        let resp = self.get("identity")?.send().await?;
        Self::check_response(resp).await?;
        Ok(())
    }

    /// Load the season object an episode belongs to and return its index.
    async fn season_index(&self, rating_key: &RawIndex) -> Result<Option<u32>, PlexError> {
        let path = format!("library/metadata/{}", rating_key.to_text());
        let response = self.container(&path).await?;
        Ok(response
            .media_container
            .metadata
            .first()
            .and_then(|season| season.index.as_ref())
            .and_then(RawIndex::as_u32))
    }

    async fn resolve_session(&self, item: PlexMetadata) -> Result<RawSession, PlexError> {
        let computed = match (&item.parent_rating_key, SessionKind::from_tag(&item.kind)) {
            (Some(key), SessionKind::Episode) => self.season_index(key).await?,
            _ => None,
        };
        Ok(item.into_raw_session(computed))
    }

    /// Currently playing sessions, in server order.
    pub async fn sessions(&self) -> Result<Vec<RawSession>, PlexError> {
        let response = self.container("status/sessions").await?;
        let items = response.media_container.metadata;
        debug!(count = items.len(), "Fetched sessions");

        let mut sessions = Vec::with_capacity(items.len());
        for item in items {
            sessions.push(self.resolve_session(item).await?);
        }
        Ok(sessions)
    }
}

impl SessionSource for PlexClient {
    type Error = PlexError;

    async fn fetch_sessions(&self) -> Result<Vec<RawSession>, PlexError> {
        self.sessions().await
    }
}
