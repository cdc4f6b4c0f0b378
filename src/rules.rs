use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{score::SetScore, side::Side};

/// How service moves between rallies.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum ServeRule {
    /// Service passes to the rally winner; it only changes hands when the
    /// receiving side wins.
    #[default]
    SideOut,
    /// Service alternates after every rally regardless of the winner.
    EveryRally,
}

impl fmt::Display for ServeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SideOut => write!(f, "side_out"),
            Self::EveryRally => write!(f, "every_rally"),
        }
    }
}

impl FromStr for ServeRule {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string {
            "side_out" => Ok(Self::SideOut),
            "every_rally" => Ok(Self::EveryRally),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a ServeRule!"
            ))),
        }
    }
}

/// Win conditions for a match. The defaults are first to eleven, win by
/// two, no cap, best of three sets; a tournament record overrides them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rules {
    pub points_to_win: u16,
    pub win_by: u16,
    pub cap: Option<u16>,
    pub sets_to_win: u8,
    pub serve_rule: ServeRule,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            points_to_win: 11,
            win_by: 2,
            cap: None,
            sets_to_win: 2,
            serve_rule: ServeRule::SideOut,
        }
    }
}

impl Rules {
    #[must_use]
    pub fn badminton() -> Self {
        Self {
            points_to_win: 21,
            win_by: 2,
            cap: Some(30),
            ..Self::default()
        }
    }

    /// The side that has won the set at `score`, if any. A set is decided
    /// once a side reaches `points_to_win` with a lead of at least `win_by`,
    /// or reaches the hard `cap` regardless of margin.
    #[must_use]
    pub fn set_winner(&self, score: &SetScore) -> Option<Side> {
        let leader = score.leader()?;
        let points = score.get(leader);

        if let Some(cap) = self.cap
            && points >= cap
        {
            return Some(leader);
        }

        if points >= self.points_to_win && score.margin() >= self.win_by {
            return Some(leader);
        }

        None
    }

    /// The most sets a match under these rules can run to.
    #[must_use]
    pub fn max_sets(&self) -> u8 {
        self.sets_to_win * 2 - 1
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cap = if let Some(cap) = self.cap {
            cap.to_string()
        } else {
            "_".to_string()
        };

        write!(
            f,
            "{} {} {cap} {}",
            self.points_to_win, self.sets_to_win, self.serve_rule
        )
    }
}
