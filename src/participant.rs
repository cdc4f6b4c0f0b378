// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// An entrant in a tournament, individual or team, with its accumulated
/// standings figures.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Participant {
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.points, self.wins, self.losses)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Participants(pub HashMap<String, Participant>);

impl Participants {
    pub fn register(&mut self, name: &str) {
        self.0.entry(name.to_string()).or_default();
    }

    /// Applies a completed match to the standings: `points_win` to the
    /// winner, `points_loss` to the loser.
    pub fn record_result(&mut self, winner: &str, loser: &str, points_win: u16, points_loss: u16) {
        let entry = self.0.entry(winner.to_string()).or_default();
        entry.points += u32::from(points_win);
        entry.wins += 1;

        let entry = self.0.entry(loser.to_string()).or_default();
        entry.points += u32::from(points_loss);
        entry.losses += 1;
    }
}

impl fmt::Display for Participants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut standings: Vec<_> = self.0.iter().collect();
        standings.sort_by(|(name_a, a), (name_b, b)| {
            b.points.cmp(&a.points).then(name_a.cmp(name_b))
        });

        let standings: Vec<_> = standings
            .into_iter()
            .map(|(name, participant)| format!("{name} {participant}"))
            .collect();

        write!(f, "{}", standings.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standings_sort_by_points_then_name() {
        let mut participants = Participants::default();
        participants.register("carol");
        participants.record_result("alice", "bob", 2, 0);
        participants.record_result("bob", "carol", 2, 0);
        participants.record_result("alice", "carol", 2, 0);

        assert_eq!(
            participants.to_string(),
            "alice 4 2 0 bob 2 1 1 carol 0 0 2"
        );
    }
}
