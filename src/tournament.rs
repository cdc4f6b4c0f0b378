use serde::{Deserialize, Serialize};

use crate::{Id, error::ScoringError, rules::Rules};

/// The configuration schema this build reads and writes. Evolution is
/// additive only: new fields get `serde(default)` and a version bump, old
/// data keeps loading.
pub const SCHEMA_VERSION: u32 = 3;

/// Scheduling and rule configuration for one tournament. Immutable once
/// matches begin, except by administrative override.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Tournament {
    #[serde(default)]
    pub schema_version: u32,
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub sport: String,
    pub court_count: u8,
    /// Minutes a match occupies its court.
    pub match_duration: u16,
    /// Minutes a court stays free between matches.
    pub break_duration: u16,
    pub points_win: u16,
    pub points_draw: u16,
    pub points_loss: u16,
    pub rules: Rules,
}

impl Default for Tournament {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: 0,
            name: String::new(),
            sport: "table tennis".to_string(),
            court_count: 4,
            match_duration: 15,
            break_duration: 2,
            points_win: 1,
            points_draw: 1,
            points_loss: 0,
            rules: Rules::default(),
        }
    }
}

impl Tournament {
    /// Rejects configuration written by a newer build. Older versions load
    /// unchanged since evolution is additive.
    ///
    /// # Errors
    ///
    /// If the record's schema version is newer than this build understands.
    pub fn check_schema(&self) -> Result<(), ScoringError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(ScoringError::Persistence(format!(
                "tournament {} has schema version {}, this build reads up to {SCHEMA_VERSION}",
                self.id, self.schema_version
            )));
        }

        Ok(())
    }

    /// Minutes from the start of one time slot to the next on a court.
    #[must_use]
    pub fn slot_duration(&self) -> u16 {
        self.match_duration + self.break_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_schema_is_rejected() {
        let tournament = Tournament {
            schema_version: SCHEMA_VERSION + 1,
            ..Tournament::default()
        };

        assert!(tournament.check_schema().is_err());
        assert!(Tournament::default().check_schema().is_ok());
    }
}
