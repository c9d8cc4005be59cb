use serde::{Deserialize, Serialize};

/// Type tag of a playback session as reported by the media server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Movie,
    Episode,
    Clip,
    /// Any other tag (track, photo, ...), kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl SessionKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "movie" => Self::Movie,
            "episode" => Self::Episode,
            "clip" => Self::Clip,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
            Self::Clip => "clip",
            Self::Other(tag) => tag,
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the season number of a session came from.
///
/// The fetcher resolves this before handing sessions to the summarizer:
/// `Computed` carries the index of a season object loaded from the server,
/// `Direct` the raw parent-index field of the session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonSource {
    Computed(u32),
    Direct(Option<String>),
}

impl SeasonSource {
    /// Pick the season source for a session: a computed season always wins
    /// over the direct parent index.
    pub fn resolve(computed: Option<u32>, direct: Option<String>) -> Self {
        match computed {
            Some(index) => Self::Computed(index),
            None => Self::Direct(direct),
        }
    }

    /// Raw season index text, if known.
    pub fn raw_index(&self) -> Option<String> {
        match self {
            Self::Computed(index) => Some(index.to_string()),
            Self::Direct(raw) => raw.clone(),
        }
    }
}

impl Default for SeasonSource {
    fn default() -> Self {
        Self::Direct(None)
    }
}

/// A single active playback session, as observed on one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSession {
    pub kind: SessionKind,
    /// Movie name, episode name or clip title.
    pub title: String,
    /// Users attached to the session. The first one is the active user.
    pub usernames: Vec<String>,
    /// Release year (movies).
    pub year: Option<i32>,
    #[serde(default)]
    pub season: SeasonSource,
    /// Episode number as delivered by the server, before formatting.
    pub index: Option<String>,
    /// Series title (episodes and clips).
    pub grandparent_title: Option<String>,
}

impl RawSession {
    /// Minimal session of the given kind; optional fields left empty.
    pub fn new(kind: SessionKind, title: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            usernames: vec![user.into()],
            year: None,
            season: SeasonSource::default(),
            index: None,
            grandparent_title: None,
        }
    }
}

/// Content classification used to pick a description format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    TvShow,
    Video,
}
