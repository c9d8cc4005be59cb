use serde::Deserialize;

use plexatv_core::models::{RawSession, SeasonSource, SessionKind};

// ── Media server responses ──────────────────────────────────────

/// Envelope of every JSON response from the media server.
#[derive(Debug, Deserialize)]
pub struct MediaContainerResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaContainer {
    /// Absent when nothing is playing.
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlexMetadata>,
}

/// One metadata item: a playing session on `/status/sessions`, or a
/// library item on `/library/metadata/<key>`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlexMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    pub year: Option<i32>,
    pub index: Option<RawIndex>,
    pub parent_index: Option<RawIndex>,
    pub parent_rating_key: Option<RawIndex>,
    pub grandparent_title: Option<String>,
    #[serde(rename = "User")]
    pub user: Option<OneOrMany<PlexUser>>,
}

#[derive(Debug, Deserialize)]
pub struct PlexUser {
    #[serde(default)]
    pub title: String,
}

/// Numeric field that some servers send as a number and others as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawIndex {
    Number(i64),
    Text(String),
}

impl RawIndex {
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => u32::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A JSON field that holds either a single object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

// ── plex.tv account responses ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    pub user: AccountUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub auth_token: String,
}

/// A device or server registered on a plex.tv account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlexResource {
    pub name: String,
    /// Comma separated capabilities, e.g. `"server"` or `"client,player"`.
    #[serde(default)]
    pub provides: String,
    pub access_token: Option<String>,
    #[serde(default)]
    pub connections: Vec<PlexConnection>,
}

impl PlexResource {
    pub fn is_server(&self) -> bool {
        self.provides.split(',').any(|p| p.trim() == "server")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexConnection {
    pub uri: String,
    #[serde(default)]
    pub local: bool,
}

// ── Conversions to core types ───────────────────────────────────

impl PlexMetadata {
    /// `computed_season` is the index of the season object loaded from the
    /// server, when one was loaded. It wins over `parentIndex`.
    pub fn into_raw_session(self, computed_season: Option<u32>) -> RawSession {
        let usernames = self
            .user
            .map(|u| u.into_vec().into_iter().map(|u| u.title).collect())
            .unwrap_or_default();

        RawSession {
            kind: SessionKind::from_tag(&self.kind),
            title: self.title,
            usernames,
            year: self.year,
            season: SeasonSource::resolve(
                computed_season,
                self.parent_index.as_ref().map(RawIndex::to_text),
            ),
            index: self.index.as_ref().map(RawIndex::to_text),
            grandparent_title: self.grandparent_title,
        }
    }
}
