use std::{io::Cursor, str::FromStr};

use courtside::{
    match_state::{Match, Scoreline},
    rotation,
    rules::{Rules, ServeRule},
    score::{SetScore, SetsWon},
    side::Side,
    status::MatchStatus,
};

#[derive(Debug, serde::Deserialize)]
struct Record {
    points_to_win: u16,
    sets_to_win: u8,
    cap: u16,
    serve_rule: String,
    winners: String,
    status: String,
    sets_won: String,
    set_scores: String,
    score: String,
    swaps: u32,
}

fn play_record(i: usize, record: &Record) -> anyhow::Result<Match> {
    let rules = Rules {
        points_to_win: record.points_to_win,
        sets_to_win: record.sets_to_win,
        cap: match record.cap {
            0 => None,
            cap => Some(cap),
        },
        serve_rule: ServeRule::from_str(&record.serve_rule)?,
        ..Rules::default()
    };

    let mut played = Match::scheduled(i as u64 + 1, 1, "ada", "grace", rules);
    for winner in record.winners.split_ascii_whitespace() {
        played.submit_rally(Side::from_str(winner)?)?;
    }

    Ok(played)
}

/// Every recorded match, replayed rally by rally, must land exactly on the
/// recorded final state, and a from-scratch ledger replay must agree with
/// the live projection.
#[test]
fn recorded_matches_replay_exactly() -> anyhow::Result<()> {
    let matches_csv = include_str!("matches.csv");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(matches_csv));

    let mut seen = 0;
    for (i, result) in rdr.deserialize().enumerate() {
        let record: Record = result?;
        let played = play_record(i, &record)?;

        assert_eq!(played.status, MatchStatus::from_str(&record.status)?, "row {i}");
        assert_eq!(
            played.scoreline().sets_won,
            SetsWon::from_str(&record.sets_won)?,
            "row {i}"
        );
        assert_eq!(played.scoreline().score, SetScore::from_str(&record.score)?, "row {i}");
        assert_eq!(played.scoreline().swaps, record.swaps, "row {i}");

        let set_scores: Vec<SetScore> = record
            .set_scores
            .split_ascii_whitespace()
            .map(SetScore::from_str)
            .collect::<anyhow::Result<_>>()?;
        assert_eq!(played.scoreline().set_scores, set_scores, "row {i}");

        let replayed = Scoreline::replay(played.ledger().history(), &played.rules)?;
        assert_eq!(&replayed, played.scoreline(), "row {i}");
        if played.status == MatchStatus::InProgress {
            assert_eq!(
                played.ledger().current_score(&played.rules),
                played.scoreline().score,
                "row {i}"
            );
        }
        assert_eq!(
            rotation::current_server(played.ledger().history(), &played.rules),
            played.scoreline().server,
            "row {i}"
        );
        assert_eq!(
            rotation::rotation_count(played.ledger().history(), &played.rules),
            played.scoreline().swaps,
            "row {i}"
        );
        played.verify()?;

        seen += 1;
    }

    assert_eq!(seen, 6);
    Ok(())
}
