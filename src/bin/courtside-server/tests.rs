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

#![allow(clippy::unwrap_used)]
#![cfg(test)]

use std::sync::mpsc::Receiver;

use super::*;

fn test_server() -> (Server, Receiver<MatchResult>) {
    let (tx, rx) = mpsc::channel();
    let server = Server::open(true, tx).unwrap();
    (server, rx)
}

#[test]
fn a_match_runs_from_schedule_to_standings() {
    let (server, rx) = test_server();

    assert_eq!(
        server
            .handle_line("tournament 1 5 1 _ side_out Spring Open")
            .unwrap(),
        "tournament 1"
    );
    assert_eq!(
        server.handle_line("schedule 10 1 ada grace 1").unwrap(),
        "schedule 10"
    );

    for _ in 0..4 {
        server.handle_line("rally 10 one").unwrap();
    }
    let reply = server.handle_line("rally 10 one").unwrap();
    assert!(reply.contains("status completed"), "{reply}");
    assert!(reply.contains("winner one"), "{reply}");

    server.apply_result(&rx.try_recv().unwrap());
    assert_eq!(
        server.handle_line("standings 1").unwrap(),
        "standings 1 ada 1 1 0 grace 0 0 1"
    );

    let reply = server.handle_line("view 10").unwrap();
    assert!(reply.starts_with("view 10 status completed"), "{reply}");
    assert!(server.handle_line("rally 10 two").is_err());
}

#[test]
fn scheduling_needs_a_tournament_and_a_real_court() {
    let (server, _rx) = test_server();

    assert!(server.handle_line("schedule 11 1 ada grace 1").is_err());

    server
        .handle_line("tournament 1 11 2 _ side_out Club Night")
        .unwrap();
    assert!(server.handle_line("schedule 11 1 ada grace 9").is_err());
    assert!(server.handle_line("schedule 11 1 ada grace 0").is_err());
    server.handle_line("schedule 11 1 ada grace 4").unwrap();

    assert_eq!(server.handle_line("matches").unwrap(), "matches 11 scheduled");
}

#[test]
fn cancel_and_errors_over_the_wire() {
    let (server, _rx) = test_server();

    server
        .handle_line("tournament 2 11 2 _ side_out Evening")
        .unwrap();
    server.handle_line("schedule 21 2 ada grace 1").unwrap();

    assert_eq!(
        server.handle_line("cancel 21 rain delay").unwrap(),
        "cancel 21"
    );
    assert!(server.handle_line("rally 21 one").is_err());
    assert!(server.handle_line("rally 99 one").is_err());
    assert!(server.handle_line("serve 21").is_err());
    assert_eq!(server.handle_line("ping").unwrap(), "pong");
}

#[test]
fn corrections_travel_over_the_wire() {
    let (server, _rx) = test_server();

    server
        .handle_line("tournament 3 11 2 _ side_out Open")
        .unwrap();
    server.handle_line("schedule 31 3 ada grace 2").unwrap();

    server.handle_line("rally 31 one 1:0").unwrap();
    server.handle_line("rally 31 one 2:0").unwrap();
    assert!(server.handle_line("rally 31 one 4:0").is_err());

    let reply = server.handle_line("correct 31 2 two").unwrap();
    assert!(reply.contains("set 1 1:1"), "{reply}");
}
