use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{rules::Rules, score::SetScore, side::Side};

/// What a submitted rally claims happened.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RallyOutcome {
    /// The side won the point just played.
    Point(Side),
    /// A compensating event: rally `of` was recorded for the wrong side and
    /// its point belongs to `winner`. The erroneous rally itself is never
    /// touched.
    Correction { of: u64, winner: Side },
}

impl RallyOutcome {
    #[must_use]
    pub fn winner(&self) -> Side {
        match self {
            Self::Point(side) => *side,
            Self::Correction { winner, .. } => *winner,
        }
    }
}

impl fmt::Display for RallyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point(side) => write!(f, "point {side}"),
            Self::Correction { of, winner } => write!(f, "correction {of} {winner}"),
        }
    }
}

/// One recorded point event. Immutable once appended to the ledger;
/// corrections are appended as new events.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Rally {
    /// 1-based, contiguous within the match.
    pub seq: u64,
    /// 1-based set this rally belongs to.
    pub set: u8,
    /// The side that served this rally.
    pub server: Side,
    pub outcome: RallyOutcome,
    /// Set score after this rally.
    pub score: SetScore,
    /// Serve rotations recorded for the match after this rally.
    pub swaps: u32,
    pub at: DateTime<Utc>,
}

impl Rally {
    #[must_use]
    pub fn winner(&self) -> Side {
        self.outcome.winner()
    }
}

impl fmt::Display for Rally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rally {} set {} server {} {} {}",
            self.seq, self.set, self.server, self.outcome, self.score
        )
    }
}

/// Append-only ordered log of the point events of one match. The sole
/// source of truth for score reconstruction; every derived figure can be
/// replayed from it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Ledger(Vec<Rally>);

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// All recorded rallies in submission order. Lazy and restartable.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &Rally> + '_ {
        self.0.iter()
    }

    #[must_use]
    pub fn tail(&self) -> Option<&Rally> {
        self.0.last()
    }

    /// Point score of the active set, read back from the last recorded
    /// event. Every rally carries its score-after, so the set total since
    /// the last boundary is the tail's score; a tail that decided its set
    /// means a fresh set stands at love-all.
    #[must_use]
    pub fn current_score(&self, rules: &Rules) -> SetScore {
        match self.0.last() {
            Some(rally) if rules.set_winner(&rally.score).is_none() => rally.score,
            _ => SetScore::default(),
        }
    }

    #[must_use]
    pub fn find(&self, seq: u64) -> Option<&Rally> {
        // seq is contiguous from 1, so the rally sits at seq - 1
        let index = usize::try_from(seq).ok()?.checked_sub(1)?;
        self.0.get(index)
    }

    /// Whether a correction referencing `seq` has already been appended.
    #[must_use]
    pub fn corrected(&self, seq: u64) -> bool {
        self.0
            .iter()
            .any(|rally| matches!(rally.outcome, RallyOutcome::Correction { of, .. } if of == seq))
    }

    pub(crate) fn push(&mut self, rally: Rally) {
        self.0.push(rally);
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.0.is_empty() {
            writeln!(f)?;
        }

        for rally in &self.0 {
            writeln!(f, "    {rally}")?;
        }

        Ok(())
    }
}
