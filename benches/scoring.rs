use criterion::{Criterion, criterion_group, criterion_main};

use courtside::{
    match_state::{Match, Scoreline},
    rules::Rules,
    side::Side,
};

fn deuce_marathon() -> Match {
    let rules = Rules {
        points_to_win: 21,
        sets_to_win: 1,
        ..Rules::default()
    };

    let mut record = Match::scheduled(1, 1, "ada", "grace", rules);
    for _ in 0..28 {
        record.submit_rally(Side::One).unwrap();
        record.submit_rally(Side::Two).unwrap();
    }
    record.submit_rally(Side::One).unwrap();
    record.submit_rally(Side::One).unwrap();

    record
}

fn score_deuce_marathon(c: &mut Criterion) {
    c.bench_function("score_deuce_marathon", |b| {
        b.iter(deuce_marathon);
    });
}

fn replay_deuce_marathon(c: &mut Criterion) {
    let record = deuce_marathon();

    c.bench_function("replay_deuce_marathon", move |b| {
        b.iter(|| Scoreline::replay(record.ledger().history(), &record.rules).unwrap());
    });
}

criterion_group!(benches, score_deuce_marathon, replay_deuce_marathon);
criterion_main!(benches);
