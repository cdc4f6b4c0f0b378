//! Serve rotation, derived purely from ledger contents.
//!
//! The scoreline projection caches the current server and swap count and is
//! invalidated on every append; the functions here are the rule itself plus
//! full recomputations used to audit that cache.

use crate::{
    rally::Rally,
    rules::{Rules, ServeRule},
    side::Side,
};

/// Who serves the rally after one won by `winner`, `server` having served.
#[must_use]
pub fn next_server(rule: ServeRule, server: Side, winner: Side) -> Side {
    match rule {
        ServeRule::SideOut => winner,
        ServeRule::EveryRally => server.opposite(),
    }
}

/// Whether service changes hands after a rally won by `winner`.
#[must_use]
pub fn swaps(rule: ServeRule, server: Side, winner: Side) -> bool {
    next_server(rule, server, winner) != server
}

/// The server of the next rally, recomputed from the whole history.
///
/// Side one serves first; the winner of a set serves first in the set that
/// follows it.
#[must_use]
pub fn current_server<'a, I>(history: I, rules: &Rules) -> Side
where
    I: Iterator<Item = &'a Rally>,
{
    let mut server = Side::One;

    for rally in history {
        server = if rules.set_winner(&rally.score).is_some() {
            rally.winner()
        } else {
            next_server(rules.serve_rule, rally.server, rally.winner())
        };
    }

    server
}

/// Total serve rotations over the whole history. Service handed to the set
/// winner at a set boundary does not count as a rotation.
#[must_use]
pub fn rotation_count<'a, I>(history: I, rules: &Rules) -> u32
where
    I: Iterator<Item = &'a Rally>,
{
    let mut count = 0;

    for rally in history {
        if rules.set_winner(&rally.score).is_none()
            && swaps(rules.serve_rule, rally.server, rally.winner())
        {
            count += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_out_keeps_the_serve_on_a_won_point() {
        assert_eq!(
            next_server(ServeRule::SideOut, Side::One, Side::One),
            Side::One
        );
        assert_eq!(
            next_server(ServeRule::SideOut, Side::One, Side::Two),
            Side::Two
        );
        assert!(!swaps(ServeRule::SideOut, Side::Two, Side::Two));
        assert!(swaps(ServeRule::SideOut, Side::Two, Side::One));
    }

    #[test]
    fn every_rally_alternates_regardless_of_winner() {
        assert_eq!(
            next_server(ServeRule::EveryRally, Side::One, Side::One),
            Side::Two
        );
        assert_eq!(
            next_server(ServeRule::EveryRally, Side::Two, Side::Two),
            Side::One
        );
        assert!(swaps(ServeRule::EveryRally, Side::One, Side::One));
    }
}
