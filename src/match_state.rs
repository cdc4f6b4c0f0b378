use std::{fmt, process::exit};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    error::ScoringError,
    match_log::MatchLog,
    message::{COMMANDS, Message},
    rally::{Ledger, Rally, RallyOutcome},
    rotation,
    rules::Rules,
    score::{SetScore, SetsWon},
    side::Side,
    status::MatchStatus,
};

/// Everything derived from the rally ledger: a materialized projection,
/// recomputed incrementally on every append and replayable from scratch.
/// The ledger stays the sole source of truth; this struct only avoids
/// walking it on every read.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Scoreline {
    pub sets_won: SetsWon,
    /// Final scores of completed sets, in order.
    pub set_scores: Vec<SetScore>,
    /// 1-based; stays on the last set once the match is decided.
    pub current_set: u8,
    /// Point score of the active set.
    pub score: SetScore,
    /// Server of the next rally.
    pub server: Side,
    pub swaps: u32,
}

impl Default for Scoreline {
    fn default() -> Self {
        Self {
            sets_won: SetsWon::default(),
            set_scores: Vec::new(),
            current_set: 1,
            score: SetScore::default(),
            server: Side::One,
            swaps: 0,
        }
    }
}

impl Scoreline {
    /// Folds one appended rally into the projection. The rally is trusted;
    /// validation happens before the append.
    pub fn apply(&mut self, rally: &Rally, rules: &Rules) {
        self.score = rally.score;
        self.swaps = rally.swaps;

        if let Some(winner) = rules.set_winner(&rally.score) {
            self.set_scores.push(rally.score);
            self.sets_won = self.sets_won.add(winner);
            self.server = winner;

            if self.sets_won.get(winner) < rules.sets_to_win {
                self.current_set += 1;
                self.score = SetScore::default();
            }
        } else {
            self.server = rotation::next_server(rules.serve_rule, rally.server, rally.winner());
        }
    }

    #[must_use]
    pub fn match_winner(&self, rules: &Rules) -> Option<Side> {
        if self.sets_won.one >= rules.sets_to_win {
            Some(Side::One)
        } else if self.sets_won.two >= rules.sets_to_win {
            Some(Side::Two)
        } else {
            None
        }
    }

    /// Rebuilds the projection from scratch, verifying every recorded rally
    /// against the ledger invariants on the way: contiguous sequence
    /// numbers, the declared server, a score moving by exactly one point for
    /// the declared winner, and the swap counter.
    ///
    /// # Errors
    ///
    /// If any recorded rally violates those invariants.
    pub fn replay<'a, I>(history: I, rules: &Rules) -> Result<Self, ScoringError>
    where
        I: Iterator<Item = &'a Rally>,
    {
        let mut line = Self::default();
        let mut seq = 0;

        for rally in history {
            seq += 1;

            if line.match_winner(rules).is_some() {
                return Err(ScoringError::MatchCompleted);
            }
            if rally.seq != seq || rally.server != line.server {
                return Err(ScoringError::InvalidEvent);
            }
            if rally.set != line.current_set {
                return Err(ScoringError::SetAlreadyDecided);
            }

            let score = match rally.outcome {
                RallyOutcome::Point(winner) => line.score.add(winner),
                RallyOutcome::Correction { winner, .. } => line
                    .score
                    .transfer(winner)
                    .ok_or(ScoringError::InvalidEvent)?,
            };
            if rally.score != score {
                return Err(ScoringError::InvalidEvent);
            }

            let mut swaps = line.swaps;
            if rules.set_winner(&score).is_none()
                && rotation::swaps(rules.serve_rule, rally.server, rally.winner())
            {
                swaps += 1;
            }
            if rally.swaps != swaps {
                return Err(ScoringError::InvalidEvent);
            }

            line.apply(rally, rules);
        }

        Ok(line)
    }
}

/// Read-only summary of a match, the shape every facade call returns.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchView {
    pub id: Id,
    pub status: MatchStatus,
    pub sets_won: SetsWon,
    pub set_scores: Vec<SetScore>,
    pub current_set: u8,
    pub score: SetScore,
    pub server: Side,
    pub swaps: u32,
    pub winner: Option<Side>,
}

impl fmt::Display for MatchView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status {} sets {} set {} {} server {} swaps {}",
            self.status, self.sets_won, self.current_set, self.score, self.server, self.swaps
        )?;

        if let Some(winner) = self.winner {
            write!(f, " winner {winner}")?;
        }

        Ok(())
    }
}

/// A scheduled contest between two sides on a court, with its rally ledger
/// and everything derived from it. The authoritative state machine over the
/// match lifecycle.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Match {
    pub id: Id,
    pub tournament: Id,
    /// Participant playing side one.
    pub one: String,
    /// Participant playing side two.
    pub two: String,
    pub court: u8,
    pub match_number: u32,
    pub scheduled_for: DateTime<Utc>,
    pub status: MatchStatus,
    pub rules: Rules,
    ledger: Ledger,
    scoreline: Scoreline,
    pub winner: Option<Side>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub log: MatchLog,
}

impl Default for Match {
    fn default() -> Self {
        Self::scheduled(0, 0, "one", "two", Rules::default())
    }
}

impl Match {
    /// A fresh match in the `scheduled` state with an empty ledger. Only the
    /// scheduling collaborator creates matches; the engine merely advances
    /// them.
    #[must_use]
    pub fn scheduled(id: Id, tournament: Id, one: &str, two: &str, rules: Rules) -> Self {
        let now = Utc::now();

        Self {
            id,
            tournament,
            one: one.to_string(),
            two: two.to_string(),
            court: 0,
            match_number: 0,
            scheduled_for: now,
            status: MatchStatus::Scheduled,
            rules,
            ledger: Ledger::new(),
            scoreline: Scoreline::default(),
            winner: None,
            created_at: now,
            updated_at: now,
            log: MatchLog::default(),
        }
    }

    /// Assigns the court and time slot.
    #[must_use]
    pub fn at(mut self, court: u8, match_number: u32, scheduled_for: DateTime<Utc>) -> Self {
        self.court = court;
        self.match_number = match_number;
        self.scheduled_for = scheduled_for;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn scoreline(&self) -> &Scoreline {
        &self.scoreline
    }

    #[must_use]
    pub fn participant(&self, side: Side) -> &str {
        match side {
            Side::One => &self.one,
            Side::Two => &self.two,
        }
    }

    #[must_use]
    pub fn view(&self) -> MatchView {
        MatchView {
            id: self.id,
            status: self.status,
            sets_won: self.scoreline.sets_won,
            set_scores: self.scoreline.set_scores.clone(),
            current_set: self.scoreline.current_set,
            score: self.scoreline.score,
            server: self.scoreline.server,
            swaps: self.scoreline.swaps,
            winner: self.winner,
        }
    }

    /// Records a rally won by `winner`.
    ///
    /// # Errors
    ///
    /// If the match is not accepting rallies or the event is inconsistent
    /// with the ledger tail.
    pub fn submit_rally(&mut self, winner: Side) -> Result<MatchView, ScoringError> {
        self.accept(RallyOutcome::Point(winner), None)
    }

    /// Records a rally won by `winner`, cross-checking the score the caller
    /// believes the set has reached.
    ///
    /// # Errors
    ///
    /// `InvalidEvent` when `claimed` does not sit exactly one point above
    /// the ledger tail for `winner`.
    pub fn submit_scored(
        &mut self,
        winner: Side,
        claimed: SetScore,
    ) -> Result<MatchView, ScoringError> {
        self.accept(RallyOutcome::Point(winner), Some(claimed))
    }

    /// Appends a compensating event: rally `of` was recorded for the wrong
    /// side and its point belongs to `winner`. History is never rewritten.
    ///
    /// # Errors
    ///
    /// `SetAlreadyDecided` when the referenced rally belongs to a finished
    /// set, `InvalidEvent` when it does not exist, was already corrected, or
    /// already names `winner`.
    pub fn correct_rally(&mut self, of: u64, winner: Side) -> Result<MatchView, ScoringError> {
        self.accept(RallyOutcome::Correction { of, winner }, None)
    }

    /// Administrative cancellation; terminal and irreversible.
    ///
    /// # Errors
    ///
    /// If the match already completed or was already cancelled.
    pub fn cancel(&mut self, actor: &str, reason: &str) -> Result<(), ScoringError> {
        match self.status {
            MatchStatus::Completed => Err(ScoringError::MatchCompleted),
            MatchStatus::Cancelled => Err(ScoringError::OutOfOrder),
            MatchStatus::Scheduled | MatchStatus::InProgress => {
                self.transition(MatchStatus::Cancelled, actor, &format!("cancelled: {reason}"))
            }
        }
    }

    /// Confirms the stored projection still matches a full ledger replay.
    /// Run after loading a match from the store; drift means the record was
    /// tampered with or written by a buggy build.
    ///
    /// # Errors
    ///
    /// If the ledger fails replay validation or diverges from the stored
    /// scoreline.
    pub fn verify(&self) -> Result<(), ScoringError> {
        let replayed = Scoreline::replay(self.ledger.history(), &self.rules)?;

        if replayed == self.scoreline {
            Ok(())
        } else {
            Err(ScoringError::Persistence(format!(
                "match {}: stored scoreline diverges from ledger replay",
                self.id
            )))
        }
    }

    fn accept(
        &mut self,
        outcome: RallyOutcome,
        claimed: Option<SetScore>,
    ) -> Result<MatchView, ScoringError> {
        match self.status {
            MatchStatus::Completed => return Err(ScoringError::MatchCompleted),
            MatchStatus::Cancelled => return Err(ScoringError::OutOfOrder),
            MatchStatus::Scheduled | MatchStatus::InProgress => {}
        }

        let rally = self.build_rally(outcome)?;
        if let Some(claimed) = claimed
            && claimed != rally.score
        {
            return Err(ScoringError::InvalidEvent);
        }

        if self.status == MatchStatus::Scheduled {
            self.transition(MatchStatus::InProgress, "engine", "first rally accepted")?;
        }

        if let RallyOutcome::Correction { of, winner } = rally.outcome {
            self.log
                .append("engine", format!("correction of rally {of} to {winner}"));
        }

        self.scoreline.apply(&rally, &self.rules);
        self.ledger.push(rally);

        if let Some(winner) = self.scoreline.match_winner(&self.rules) {
            self.winner = Some(winner);
            self.transition(
                MatchStatus::Completed,
                "engine",
                &format!("match won by {winner}"),
            )?;
        }

        self.updated_at = Utc::now();
        Ok(self.view())
    }

    /// Validates `outcome` against the ledger tail and stamps the finalized
    /// rally. The ledger is untouched on any error.
    fn build_rally(&self, outcome: RallyOutcome) -> Result<Rally, ScoringError> {
        let line = &self.scoreline;

        if self.rules.set_winner(&line.score).is_some() {
            return Err(ScoringError::SetAlreadyDecided);
        }

        let score = match outcome {
            RallyOutcome::Point(winner) => line.score.add(winner),
            RallyOutcome::Correction { of, winner } => {
                let Some(target) = self.ledger.find(of) else {
                    return Err(ScoringError::InvalidEvent);
                };
                if target.set != line.current_set {
                    return Err(ScoringError::SetAlreadyDecided);
                }
                match target.outcome {
                    RallyOutcome::Point(wrong) if wrong != winner => {}
                    _ => return Err(ScoringError::InvalidEvent),
                }
                if self.ledger.corrected(of) {
                    return Err(ScoringError::InvalidEvent);
                }

                line.score
                    .transfer(winner)
                    .ok_or(ScoringError::InvalidEvent)?
            }
        };

        let mut swaps = line.swaps;
        if self.rules.set_winner(&score).is_none()
            && rotation::swaps(self.rules.serve_rule, line.server, outcome.winner())
        {
            swaps += 1;
        }

        Ok(Rally {
            seq: self.ledger.len() as u64 + 1,
            set: line.current_set,
            server: line.server,
            outcome,
            score,
            swaps,
            at: Utc::now(),
        })
    }

    fn transition(
        &mut self,
        next: MatchStatus,
        actor: &str,
        action: &str,
    ) -> Result<(), ScoringError> {
        if !self.status.may_become(next) {
            return Err(ScoringError::OutOfOrder);
        }

        self.status = next;
        self.log.append(actor, action.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// # Errors
    ///
    /// If the command is illegal or invalid.
    pub fn read_line(&mut self, buffer: &str) -> anyhow::Result<Option<String>> {
        let mut buffer = std::borrow::Cow::from(buffer);
        if let Some(comment_offset) = buffer.find('#') {
            buffer.to_mut().replace_range(comment_offset.., "");
        }

        self.update(buffer.parse()?)
    }

    /// # Errors
    ///
    /// If the command is illegal or invalid.
    pub fn update(&mut self, message: Message) -> anyhow::Result<Option<String>> {
        match message {
            Message::Cancel(reason) => {
                self.cancel("referee", &reason)?;
                Ok(Some(String::new()))
            }
            Message::Correct { of, winner } => {
                let view = self.correct_rally(of, winner)?;
                Ok(Some(view.to_string()))
            }
            Message::Empty => Ok(None),
            Message::FinalStatus => Ok(Some(self.status.to_string())),
            Message::KnownCommand(command) => {
                if COMMANDS.contains(&command.as_str()) {
                    Ok(Some("true".to_string()))
                } else {
                    Ok(Some("false".to_string()))
                }
            }
            Message::ListCommands => {
                let mut commands = "\n".to_string();
                commands.push_str(&COMMANDS.join("\n"));
                Ok(Some(commands))
            }
            Message::Name => Ok(Some(env!("CARGO_PKG_NAME").to_string())),
            Message::ProtocolVersion => Ok(Some("1-beta".to_string())),
            Message::Quit => exit(0),
            Message::Rally { winner, claimed } => {
                let view = if let Some(claimed) = claimed {
                    self.submit_scored(winner, claimed)?
                } else {
                    self.submit_rally(winner)?
                };
                Ok(Some(view.to_string()))
            }
            Message::Rules(rules) => {
                let (one, two) = (self.one.clone(), self.two.clone());
                *self = Self::scheduled(self.id, self.tournament, &one, &two, rules);
                Ok(Some(String::new()))
            }
            Message::ShowMatch => Ok(Some(self.to_string())),
            Message::Version => Ok(Some(env!("CARGO_PKG_VERSION").to_string())),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "match {}: {} vs {}", self.id, self.one, self.two)?;
        writeln!(f, "status: {}", self.status)?;
        writeln!(f, "sets: {}", self.scoreline.sets_won)?;

        for (number, score) in self.scoreline.set_scores.iter().enumerate() {
            writeln!(f, "set {}: {score}", number + 1)?;
        }

        if self.status == MatchStatus::InProgress {
            writeln!(
                f,
                "set {}: {} (serving: {})",
                self.scoreline.current_set,
                self.scoreline.score,
                self.participant(self.scoreline.server)
            )?;
        }

        if let Some(winner) = self.winner {
            writeln!(f, "winner: {}", self.participant(winner))?;
        }

        write!(f, "rallies: {}", self.ledger)
    }
}
