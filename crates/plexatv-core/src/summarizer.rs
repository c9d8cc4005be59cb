use std::collections::BTreeMap;

use tracing::debug;

use crate::error::CoreError;
use crate::models::{ContentType, RawSession, SessionKind, Summary};

/// Rendered in place of a season or episode number the server did not report.
pub const UNKNOWN_NUMBER: &str = "??";

/// Rendered in place of a missing series title.
pub const UNKNOWN_SERIES: &str = "Unknown";

/// Classification of one session, built fresh per session and dropped once
/// the description string exists.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaLabel {
    content_type: Option<ContentType>,
    title: String,
    season: Option<String>,
    episode: Option<String>,
    series_title: Option<String>,
}

impl MediaLabel {
    fn classify(session: &RawSession, position: usize) -> Result<Self, CoreError> {
        let mut label = MediaLabel {
            content_type: None,
            title: session.title.clone(),
            season: None,
            episode: None,
            series_title: None,
        };

        match session.kind {
            SessionKind::Episode | SessionKind::Clip => {
                label.content_type = Some(ContentType::TvShow);
                label.season = session
                    .season
                    .raw_index()
                    .map(|raw| zero_pad(&raw, position, "season"))
                    .transpose()?;
                label.series_title = session.grandparent_title.clone();
                label.episode = session
                    .index
                    .as_deref()
                    .map(|raw| zero_pad(raw, position, "episode"))
                    .transpose()?;
            }
            SessionKind::Movie => {
                label.content_type = Some(ContentType::Video);
                if let Some(year) = session.year {
                    if !label.title.is_empty() {
                        label.title = format!("{} ({year})", label.title);
                    }
                }
            }
            SessionKind::Other(_) => {}
        }

        Ok(label)
    }

    fn describe(&self, username: &str) -> String {
        match self.content_type {
            Some(ContentType::TvShow) => format!(
                "{username} - {} S{}E{} - {}",
                self.series_title.as_deref().unwrap_or(UNKNOWN_SERIES),
                self.season.as_deref().unwrap_or(UNKNOWN_NUMBER),
                self.episode.as_deref().unwrap_or(UNKNOWN_NUMBER),
                self.title,
            ),
            _ => format!("{username} - {}", self.title),
        }
    }
}

/// Left-pad a season/episode number with zeros to at least two digits
/// (`3` → `03`). Longer values, leading zeros included, pass through as-is.
fn zero_pad(raw: &str, position: usize, field: &'static str) -> Result<String, CoreError> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Format {
            position,
            field,
            value: raw.to_string(),
        });
    }
    Ok(format!("{digits:0>2}"))
}

/// Build the description of the session at 1-based `position`.
pub fn describe(session: &RawSession, position: usize) -> Result<String, CoreError> {
    let label = MediaLabel::classify(session, position)?;
    let username = session
        .usernames
        .first()
        .ok_or(CoreError::MissingField {
            position,
            field: "usernames",
        })?;
    Ok(label.describe(username))
}

/// Turn the sessions of one poll into a [`Summary`].
///
/// Fails on the first malformed session; no partial summary is returned.
pub fn summarize(sessions: &[RawSession]) -> Result<Summary, CoreError> {
    let mut descriptions = BTreeMap::new();

    for (i, session) in sessions.iter().enumerate() {
        let position = i + 1;
        let description = describe(session, position)?;
        debug!(position, kind = %session.kind, %description, "Described session");
        descriptions.insert(Summary::session_key(position), description);
    }

    Ok(Summary {
        session_count: sessions.len(),
        descriptions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeasonSource;

    fn movie(title: &str, year: Option<i32>) -> RawSession {
        RawSession {
            year,
            ..RawSession::new(SessionKind::Movie, title, "bob")
        }
    }

    fn episode(series: &str, season: SeasonSource, index: Option<&str>, title: &str) -> RawSession {
        RawSession {
            season,
            index: index.map(String::from),
            grandparent_title: Some(series.into()),
            ..RawSession::new(SessionKind::Episode, title, "alice")
        }
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[]).unwrap();
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.session_count, 0);
        assert!(summary.descriptions.is_empty());
    }

    #[test]
    fn test_movie_with_year() {
        let summary = summarize(&[movie("Dune", Some(2021))]).unwrap();
        assert_eq!(summary.descriptions["session_1"], "bob - Dune (2021)");
    }

    #[test]
    fn test_movie_without_year() {
        let summary = summarize(&[movie("Dune", None)]).unwrap();
        assert_eq!(summary.descriptions["session_1"], "bob - Dune");
    }

    #[test]
    fn test_movie_empty_title_keeps_no_year() {
        let summary = summarize(&[movie("", Some(2021))]).unwrap();
        assert_eq!(summary.descriptions["session_1"], "bob - ");
    }

    #[test]
    fn test_episode_description() {
        let session = episode("Foo", SeasonSource::Direct(Some("3".into())), Some("7"), "Bar");
        let summary = summarize(&[session]).unwrap();
        assert_eq!(summary.descriptions["session_1"], "alice - Foo S03E07 - Bar");
    }

    #[test]
    fn test_computed_season_used() {
        let session = episode("Foo", SeasonSource::Computed(12), Some("101"), "Bar");
        assert_eq!(describe(&session, 1).unwrap(), "alice - Foo S12E101 - Bar");
    }

    #[test]
    fn test_computed_season_precedence() {
        let season = SeasonSource::resolve(Some(2), Some("9".into()));
        let session = episode("Foo", season, Some("1"), "Bar");
        assert_eq!(describe(&session, 1).unwrap(), "alice - Foo S02E01 - Bar");
    }

    #[test]
    fn test_unknown_season_and_episode() {
        let session = episode("Foo", SeasonSource::Direct(None), None, "Bar");
        assert_eq!(describe(&session, 1).unwrap(), "alice - Foo S??E?? - Bar");
    }

    #[test]
    fn test_clip_is_tv_content() {
        let clip = RawSession {
            season: SeasonSource::Direct(Some("1".into())),
            index: Some("4".into()),
            ..RawSession::new(SessionKind::Clip, "Trailer", "carol")
        };
        assert_eq!(describe(&clip, 1).unwrap(), "carol - Unknown S01E04 - Trailer");
    }

    #[test]
    fn test_other_kind_uses_title() {
        let track = RawSession {
            year: Some(1999),
            ..RawSession::new(SessionKind::Other("track".into()), "Song", "dave")
        };
        assert_eq!(describe(&track, 1).unwrap(), "dave - Song");
    }

    #[test]
    fn test_keys_follow_input_order() {
        let sessions: Vec<RawSession> = (0..12)
            .map(|i| movie(&format!("Movie {i}"), None))
            .collect();
        let summary = summarize(&sessions).unwrap();

        assert_eq!(summary.session_count, 12);
        assert_eq!(summary.descriptions.len(), 12);
        for n in 1..=12 {
            let key = format!("session_{n}");
            assert_eq!(summary.descriptions[&key], format!("bob - Movie {}", n - 1));
        }
    }

    #[test]
    fn test_first_username_is_active_user() {
        let mut session = movie("Dune", None);
        session.usernames = vec!["erin".into(), "frank".into()];
        assert_eq!(describe(&session, 1).unwrap(), "erin - Dune");
    }

    #[test]
    fn test_empty_usernames_fails() {
        let mut bad = movie("Dune", None);
        bad.usernames.clear();
        let result = summarize(&[movie("Alien", None), bad]);
        match result {
            Err(CoreError::MissingField { position, field }) => {
                assert_eq!(position, 2);
                assert_eq!(field, "usernames");
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_season_fails() {
        let session = episode("Foo", SeasonSource::Direct(Some("special".into())), Some("1"), "Bar");
        assert!(matches!(
            summarize(&[session]),
            Err(CoreError::Format { field: "season", .. })
        ));
    }

    #[test]
    fn test_non_numeric_episode_fails() {
        let session = episode("Foo", SeasonSource::Computed(1), Some("x"), "Bar");
        assert!(matches!(
            summarize(&[session]),
            Err(CoreError::Format { field: "episode", .. })
        ));
    }

    #[test]
    fn test_padding_keeps_digits_verbatim() {
        let session = episode(
            "Foo",
            SeasonSource::Direct(Some("007".into())),
            Some("4294967296"),
            "Bar",
        );
        assert_eq!(
            describe(&session, 1).unwrap(),
            "alice - Foo S007E4294967296 - Bar"
        );
    }

    #[test]
    fn test_empty_episode_text_fails() {
        let session = episode("Foo", SeasonSource::Computed(1), Some(""), "Bar");
        assert!(matches!(
            summarize(&[session]),
            Err(CoreError::Format { field: "episode", .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let sessions = vec![
            movie("Dune", Some(2021)),
            episode("Foo", SeasonSource::Computed(3), Some("7"), "Bar"),
        ];
        assert_eq!(summarize(&sessions).unwrap(), summarize(&sessions).unwrap());
    }
}
