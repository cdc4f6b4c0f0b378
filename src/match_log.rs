use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An audit record of one administrative action on a match. Write-only; the
/// scoring logic never reads these back.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub actor: String,
    pub action: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.actor,
            self.action
        )
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MatchLog(Vec<LogEntry>);

impl MatchLog {
    pub fn append(&mut self, actor: &str, action: String) {
        self.0.push(LogEntry {
            at: Utc::now(),
            actor: actor.to_string(),
            action,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.0.iter()
    }
}

impl fmt::Display for MatchLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.0 {
            writeln!(f, "{entry}")?;
        }

        Ok(())
    }
}
