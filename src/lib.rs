//! A rally-scoring engine and server for multi-court racket-sport
//! tournaments.
//!
//! The engine ingests a stream of rally (point) events for a match, derives
//! set and match state from them, enforces the rules that decide when a set
//! or match ends, rotates serve, and produces the final authoritative
//! score. Matches are scheduled by an external collaborator and advance
//! through `scheduled`, `in_progress` and `completed`, with `cancelled` as
//! an administrative override.
//!
//! ## Feature Flags
//!
//! By default the `server` feature flag is enabled.
//!
//! * server - enable the `courtside-server` binary
//!
//! ## Referee Protocol
//!
//! The `courtside-referee` binary drives a single match over a
//! line-oriented protocol; see [`message::Message`].

// This file is part of courtside.
//
// courtside is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// courtside is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

#![deny(clippy::panic)]

pub mod error;
pub mod match_log;
pub mod match_state;
pub mod message;
pub mod participant;
pub mod rally;
pub mod rotation;
pub mod rules;
pub mod score;
pub mod scorekeeper;
pub mod side;
pub mod status;
pub mod store;
pub mod tournament;
pub mod utils;

pub type Id = u64;
pub const HOME: &str = "courtside";
pub const SERVER_PORT: &str = ":49172";

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2025-2026 Developers of the courtside project

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2025-2026 Developers of the courtside project
Licensed under the AGPLv3"
);

#[cfg(test)]
mod tests {
    use crate::{
        error::ScoringError,
        match_state::{Match, Scoreline},
        rally::RallyOutcome,
        rotation,
        rules::{Rules, ServeRule},
        score::{SetScore, SetsWon},
        side::Side,
        status::MatchStatus,
    };

    fn rally_out(record: &mut Match, winner: Side, points: u16) {
        for _ in 0..points {
            record.submit_rally(winner).unwrap();
        }
    }

    /// Best of three at eleven points: side one takes sets one and three.
    #[test]
    fn best_of_three_match() {
        let mut record = Match::scheduled(1, 1, "ada", "grace", Rules::default());
        assert_eq!(record.status, MatchStatus::Scheduled);

        rally_out(&mut record, Side::Two, 6);
        assert_eq!(record.status, MatchStatus::InProgress);
        rally_out(&mut record, Side::One, 11);
        assert_eq!(record.scoreline().sets_won, SetsWon { one: 1, two: 0 });
        assert_eq!(record.scoreline().score, SetScore::default());

        rally_out(&mut record, Side::One, 9);
        rally_out(&mut record, Side::Two, 11);
        assert_eq!(record.scoreline().sets_won, SetsWon { one: 1, two: 1 });

        rally_out(&mut record, Side::Two, 7);
        rally_out(&mut record, Side::One, 11);

        assert_eq!(record.status, MatchStatus::Completed);
        assert_eq!(record.winner, Some(Side::One));
        assert_eq!(record.scoreline().sets_won, SetsWon { one: 2, two: 1 });
        assert_eq!(
            record.scoreline().set_scores,
            vec![
                SetScore { one: 11, two: 6 },
                SetScore { one: 9, two: 11 },
                SetScore { one: 11, two: 7 },
            ]
        );

        let rallies = record.ledger().len();
        assert_eq!(
            record.submit_rally(Side::One),
            Err(ScoringError::MatchCompleted)
        );
        assert_eq!(record.ledger().len(), rallies);
    }

    #[test]
    fn deuce_continues_until_a_two_point_lead() {
        let rules = Rules {
            points_to_win: 21,
            sets_to_win: 1,
            ..Rules::default()
        };

        let mut record = Match::scheduled(2, 1, "ada", "grace", rules);
        for _ in 0..20 {
            record.submit_rally(Side::One).unwrap();
            record.submit_rally(Side::Two).unwrap();
        }
        assert_eq!(record.scoreline().score, SetScore { one: 20, two: 20 });

        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.status, MatchStatus::InProgress);
        assert_eq!(record.scoreline().score, SetScore { one: 21, two: 20 });

        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.status, MatchStatus::Completed);
        assert_eq!(
            record.scoreline().set_scores,
            vec![SetScore { one: 22, two: 20 }]
        );
    }

    #[test]
    fn twenty_one_nineteen_ends_the_set() {
        let rules = Rules {
            points_to_win: 21,
            sets_to_win: 1,
            ..Rules::default()
        };

        let mut record = Match::scheduled(3, 1, "ada", "grace", rules);
        for _ in 0..19 {
            record.submit_rally(Side::One).unwrap();
            record.submit_rally(Side::Two).unwrap();
        }
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.status, MatchStatus::InProgress);

        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.status, MatchStatus::Completed);
        assert_eq!(record.winner, Some(Side::One));
        assert_eq!(
            record.scoreline().set_scores,
            vec![SetScore { one: 21, two: 19 }]
        );
    }

    #[test]
    fn claimed_score_must_sit_one_point_above_the_tail() {
        let mut record = Match::scheduled(4, 1, "ada", "grace", Rules::default());

        assert_eq!(
            record.submit_scored(Side::One, SetScore { one: 2, two: 0 }),
            Err(ScoringError::InvalidEvent)
        );
        assert!(record.ledger().is_empty());
        assert_eq!(record.status, MatchStatus::Scheduled);

        record
            .submit_scored(Side::One, SetScore { one: 1, two: 0 })
            .unwrap();
        assert_eq!(record.ledger().len(), 1);
    }

    #[test]
    fn cancellation_is_terminal() {
        let mut record = Match::scheduled(5, 1, "ada", "grace", Rules::default());
        record.submit_rally(Side::Two).unwrap();

        record.cancel("admin", "rain on court 2").unwrap();
        assert_eq!(record.status, MatchStatus::Cancelled);
        assert_eq!(record.submit_rally(Side::One), Err(ScoringError::OutOfOrder));
        assert_eq!(
            record.cancel("admin", "again"),
            Err(ScoringError::OutOfOrder)
        );
        assert_eq!(record.ledger().len(), 1);

        let mut record = Match::scheduled(6, 1, "ada", "grace", Rules {
            points_to_win: 1,
            win_by: 1,
            sets_to_win: 1,
            ..Rules::default()
        });
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.status, MatchStatus::Completed);
        assert_eq!(
            record.cancel("admin", "too late"),
            Err(ScoringError::MatchCompleted)
        );
    }

    #[test]
    fn replaying_the_ledger_reproduces_the_live_state() {
        let rules = Rules {
            points_to_win: 5,
            sets_to_win: 2,
            ..Rules::default()
        };

        let mut record = Match::scheduled(7, 1, "ada", "grace", rules);
        let script = [
            Side::One,
            Side::Two,
            Side::Two,
            Side::One,
            Side::One,
            Side::One,
            Side::Two,
            Side::One,
            Side::Two,
            Side::Two,
            Side::Two,
            Side::One,
            Side::Two,
        ];
        for side in script {
            record.submit_rally(side).unwrap();
        }
        record.correct_rally(13, Side::One).unwrap();

        let replayed = Scoreline::replay(record.ledger().history(), &record.rules).unwrap();
        assert_eq!(&replayed, record.scoreline());
        assert_eq!(
            record.ledger().current_score(&record.rules),
            record.scoreline().score
        );
        assert_eq!(
            rotation::current_server(record.ledger().history(), &record.rules),
            record.scoreline().server
        );
        assert_eq!(
            rotation::rotation_count(record.ledger().history(), &record.rules),
            record.scoreline().swaps
        );
        record.verify().unwrap();
    }

    #[test]
    fn side_out_swaps_and_set_boundary_serve() {
        let rules = Rules {
            points_to_win: 3,
            win_by: 1,
            sets_to_win: 2,
            ..Rules::default()
        };

        let mut record = Match::scheduled(8, 1, "ada", "grace", rules);

        // side one serves first and holds serve while winning
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.scoreline().server, Side::One);
        assert_eq!(record.scoreline().swaps, 0);

        // receiver wins: service passes
        record.submit_rally(Side::Two).unwrap();
        assert_eq!(record.scoreline().server, Side::Two);
        assert_eq!(record.scoreline().swaps, 1);

        // side one takes the set 3:1; set winner serves the next set
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.scoreline().swaps, 2);
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.scoreline().sets_won, SetsWon { one: 1, two: 0 });
        assert_eq!(record.scoreline().server, Side::One);
        // handing the serve to the set winner is not a rotation
        assert_eq!(record.scoreline().swaps, 2);
    }

    #[test]
    fn every_rally_rule_alternates_service() {
        let rules = Rules {
            points_to_win: 5,
            sets_to_win: 1,
            serve_rule: ServeRule::EveryRally,
            ..Rules::default()
        };

        let mut record = Match::scheduled(9, 1, "ada", "grace", rules);
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.scoreline().server, Side::Two);
        record.submit_rally(Side::One).unwrap();
        assert_eq!(record.scoreline().server, Side::One);
        assert_eq!(record.scoreline().swaps, 2);
    }

    #[test]
    fn corrections_move_one_point_and_keep_history() {
        let rules = Rules {
            points_to_win: 5,
            sets_to_win: 1,
            ..Rules::default()
        };

        let mut record = Match::scheduled(10, 1, "ada", "grace", rules);
        rally_out(&mut record, Side::One, 3);

        let view = record.correct_rally(2, Side::Two).unwrap();
        assert_eq!(view.score, SetScore { one: 2, two: 1 });
        assert_eq!(record.ledger().len(), 4);
        assert!(matches!(
            record.ledger().tail().unwrap().outcome,
            RallyOutcome::Correction { of: 2, winner: Side::Two }
        ));

        // the erroneous rally still reads exactly as recorded
        assert_eq!(
            record.ledger().find(2).unwrap().outcome,
            RallyOutcome::Point(Side::One)
        );

        // a rally may only be corrected once, to the other side
        assert_eq!(
            record.correct_rally(2, Side::One),
            Err(ScoringError::InvalidEvent)
        );
        assert_eq!(
            record.correct_rally(99, Side::Two),
            Err(ScoringError::InvalidEvent)
        );
    }

    #[test]
    fn corrections_cannot_reach_into_a_decided_set() {
        let rules = Rules {
            points_to_win: 3,
            win_by: 1,
            sets_to_win: 2,
            ..Rules::default()
        };

        let mut record = Match::scheduled(11, 1, "ada", "grace", rules);
        rally_out(&mut record, Side::One, 3);
        assert_eq!(record.scoreline().sets_won, SetsWon { one: 1, two: 0 });

        assert_eq!(
            record.correct_rally(2, Side::Two),
            Err(ScoringError::SetAlreadyDecided)
        );
    }

    #[test]
    fn a_correction_can_decide_the_set() {
        let rules = Rules {
            points_to_win: 3,
            win_by: 1,
            sets_to_win: 1,
            ..Rules::default()
        };

        let mut record = Match::scheduled(12, 1, "ada", "grace", rules);
        record.submit_rally(Side::One).unwrap();
        record.submit_rally(Side::One).unwrap();
        record.submit_rally(Side::Two).unwrap();

        // 2:1; the disputed third rally belongs to side one after review
        let view = record.correct_rally(3, Side::One).unwrap();
        assert_eq!(view.status, MatchStatus::Completed);
        assert_eq!(view.winner, Some(Side::One));
        assert_eq!(view.set_scores, vec![SetScore { one: 3, two: 0 }]);
    }

    #[test]
    fn sets_won_never_exceed_the_match_frame() {
        let rules = Rules {
            points_to_win: 2,
            win_by: 1,
            sets_to_win: 2,
            ..Rules::default()
        };

        let mut record = Match::scheduled(13, 1, "ada", "grace", rules);
        rally_out(&mut record, Side::One, 2);
        rally_out(&mut record, Side::Two, 2);
        rally_out(&mut record, Side::One, 2);

        assert_eq!(record.status, MatchStatus::Completed);
        assert!(record.scoreline().sets_won.total() <= rules.max_sets());
    }

    #[test]
    fn referee_protocol_drives_a_match() {
        let mut record = Match::scheduled(14, 1, "ada", "grace", Rules::default());

        assert_eq!(
            record.read_line("rally one").unwrap(),
            Some("status in_progress sets 0:0 set 1 1:0 server one swaps 0".to_string())
        );
        assert_eq!(record.read_line("# just a comment").unwrap(), None);
        assert_eq!(
            record.read_line("final_status").unwrap(),
            Some("in_progress".to_string())
        );
        assert!(record.read_line("rally one 3:0").is_err());
        assert_eq!(
            record.read_line("known_command rally").unwrap(),
            Some("true".to_string())
        );
        assert_eq!(
            record.read_line("cancel light failure").unwrap(),
            Some(String::new())
        );
        assert!(record.read_line("rally two").is_err());
    }
}
