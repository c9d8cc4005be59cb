use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Poll-scoped output: how many sessions are active and what each one is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub session_count: usize,
    /// `session_<N>` → description, N being the 1-based poll position.
    pub descriptions: BTreeMap<String, String>,
}

impl Summary {
    /// Attribute key for the session at 1-based `position`.
    pub fn session_key(position: usize) -> String {
        format!("session_{position}")
    }
}
