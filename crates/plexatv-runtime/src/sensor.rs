use std::collections::BTreeMap;

use serde::Serialize;

use plexatv_core::models::Summary;

/// Observable "now playing" state handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSensor {
    name: String,
    state: usize,
    attributes: BTreeMap<String, String>,
}

impl SessionSensor {
    pub fn new(name: impl Into<String>, summary: Summary) -> Self {
        Self {
            name: name.into(),
            state: summary.session_count,
            attributes: summary.descriptions,
        }
    }

    /// Configured display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of active sessions at the last successful poll.
    pub fn state(&self) -> usize {
        self.state
    }

    /// `session_<N>` → description, from the last successful poll.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl std::fmt::Display for SessionSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.state)?;
        for (key, description) in &self.attributes {
            write!(f, "\n  {key}: {description}")?;
        }
        Ok(())
    }
}
