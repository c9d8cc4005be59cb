use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A session record lacks a field the description cannot do without.
    #[error("session {position} is missing field `{field}`")]
    MissingField { position: usize, field: &'static str },

    /// A season/episode value could not be zero-padded.
    #[error("session {position}: cannot format {field} value {value:?}")]
    Format {
        position: usize,
        field: &'static str,
        value: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
