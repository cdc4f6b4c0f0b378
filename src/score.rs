use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::side::Side;

/// Point score of a single set, recorded side one first.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SetScore {
    pub one: u16,
    pub two: u16,
}

impl SetScore {
    #[must_use]
    pub fn get(&self, side: Side) -> u16 {
        match side {
            Side::One => self.one,
            Side::Two => self.two,
        }
    }

    /// The score after `side` wins one more point.
    #[must_use]
    pub fn add(&self, side: Side) -> Self {
        match side {
            Side::One => Self {
                one: self.one + 1,
                two: self.two,
            },
            Side::Two => Self {
                one: self.one,
                two: self.two + 1,
            },
        }
    }

    /// Moves one point from the opposite side to `side`. Returns `None` when
    /// the opposite side has no point to give up.
    #[must_use]
    pub fn transfer(&self, side: Side) -> Option<Self> {
        if self.get(side.opposite()) == 0 {
            return None;
        }

        let mut score = *self;
        match side {
            Side::One => {
                score.one += 1;
                score.two -= 1;
            }
            Side::Two => {
                score.two += 1;
                score.one -= 1;
            }
        }

        Some(score)
    }

    #[must_use]
    pub fn leader(&self) -> Option<Side> {
        match self.one.cmp(&self.two) {
            std::cmp::Ordering::Greater => Some(Side::One),
            std::cmp::Ordering::Less => Some(Side::Two),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub fn margin(&self) -> u16 {
        self.one.abs_diff(self.two)
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::from(self.one) + u32::from(self.two)
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.one, self.two)
    }
}

impl FromStr for SetScore {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let Some((one, two)) = string.split_once(':') else {
            return Err(anyhow::Error::msg("expected: POINTS:POINTS"));
        };

        Ok(Self {
            one: one.parse()?,
            two: two.parse()?,
        })
    }
}

/// Sets won by each side over the whole match.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SetsWon {
    pub one: u8,
    pub two: u8,
}

impl SetsWon {
    #[must_use]
    pub fn get(&self, side: Side) -> u8 {
        match side {
            Side::One => self.one,
            Side::Two => self.two,
        }
    }

    #[must_use]
    pub fn add(&self, side: Side) -> Self {
        match side {
            Side::One => Self {
                one: self.one + 1,
                two: self.two,
            },
            Side::Two => Self {
                one: self.one,
                two: self.two + 1,
            },
        }
    }

    #[must_use]
    pub fn total(&self) -> u8 {
        self.one + self.two
    }
}

impl fmt::Display for SetsWon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.one, self.two)
    }
}

impl FromStr for SetsWon {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let Some((one, two)) = string.split_once(':') else {
            return Err(anyhow::Error::msg("expected: SETS:SETS"));
        };

        Ok(Self {
            one: one.parse()?,
            two: two.parse()?,
        })
    }
}
