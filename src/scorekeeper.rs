use std::sync::{Arc, Mutex, PoisonError, RwLock, mpsc::Sender};

use rustc_hash::FxHashMap;

use crate::{
    Id,
    error::ScoringError,
    match_state::{Match, MatchView},
    score::SetScore,
    side::Side,
    status::MatchStatus,
    store::MatchStore,
};

/// What the standings collaborator hears when a match completes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchResult {
    pub match_id: Id,
    pub tournament: Id,
    pub winner: String,
    pub loser: String,
}

/// Completion notifications, fired at most once per match. A scorekeeper
/// without a listener just drops them.
#[derive(Clone, Debug, Default)]
pub struct Notifier(Option<Sender<MatchResult>>);

impl Notifier {
    #[must_use]
    pub fn new(sender: Sender<MatchResult>) -> Self {
        Self(Some(sender))
    }

    pub fn send(&self, result: MatchResult) {
        if let Some(sender) = &self.0 {
            let _ok = sender.send(result);
        }
    }
}

/// The scoring facade: the one surface the rest of the application calls.
///
/// Holds no scoring state of its own. Every match sits behind its own
/// mutex, so submissions against one match serialize while other matches
/// proceed untouched; reads take the same lock briefly and therefore always
/// observe a fully applied rally or none of it.
pub struct Scorekeeper<S> {
    matches: RwLock<FxHashMap<Id, Arc<Mutex<Match>>>>,
    store: S,
    notifier: Notifier,
}

impl<S: MatchStore> Scorekeeper<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            matches: RwLock::new(FxHashMap::default()),
            store,
            notifier: Notifier::default(),
        }
    }

    #[must_use]
    pub fn with_notifier(store: S, sender: Sender<MatchResult>) -> Self {
        Self {
            matches: RwLock::new(FxHashMap::default()),
            store,
            notifier: Notifier::new(sender),
        }
    }

    /// Entry point for the scheduling collaborator: registers and persists a
    /// freshly scheduled match.
    ///
    /// # Errors
    ///
    /// `OutOfOrder` when the id is already taken, `Persistence` when the
    /// record cannot be written.
    pub fn schedule_match(&self, record: Match) -> Result<(), ScoringError> {
        let mut matches = self.matches.write().unwrap_or_else(PoisonError::into_inner);

        if matches.contains_key(&record.id) {
            return Err(ScoringError::OutOfOrder);
        }

        self.store.save(&record)?;
        matches.insert(record.id, Arc::new(Mutex::new(record)));
        Ok(())
    }

    /// Registers an already persisted match, the startup load path.
    pub fn adopt(&self, record: Match) {
        self.matches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id, Arc::new(Mutex::new(record)));
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown match id.
    pub fn match_view(&self, id: Id) -> Result<MatchView, ScoringError> {
        let record = self.lookup(id)?;
        let guard = record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.view())
    }

    /// # Errors
    ///
    /// See [`Match::submit_rally`].
    pub fn submit_rally(&self, id: Id, winner: Side) -> Result<MatchView, ScoringError> {
        self.commit(id, |record| record.submit_rally(winner))
    }

    /// # Errors
    ///
    /// See [`Match::submit_scored`].
    pub fn submit_scored(
        &self,
        id: Id,
        winner: Side,
        claimed: SetScore,
    ) -> Result<MatchView, ScoringError> {
        self.commit(id, |record| record.submit_scored(winner, claimed))
    }

    /// # Errors
    ///
    /// See [`Match::correct_rally`].
    pub fn correct_rally(&self, id: Id, of: u64, winner: Side) -> Result<MatchView, ScoringError> {
        self.commit(id, |record| record.correct_rally(of, winner))
    }

    /// # Errors
    ///
    /// See [`Match::cancel`].
    pub fn cancel_match(&self, id: Id, actor: &str, reason: &str) -> Result<(), ScoringError> {
        self.commit(id, |record| {
            record.cancel(actor, reason)?;
            Ok(record.view())
        })
        .map(|_view| ())
    }

    #[must_use]
    pub fn match_ids(&self) -> Vec<Id> {
        let mut ids: Vec<_> = self
            .matches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();

        ids.sort_unstable();
        ids
    }

    /// Clones of every registered match, for shutdown snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Match> {
        let matches = self.matches.read().unwrap_or_else(PoisonError::into_inner);

        let mut records: Vec<_> = matches
            .values()
            .map(|record| {
                record
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .collect();

        records.sort_by_key(|record| record.id);
        records
    }

    fn lookup(&self, id: Id) -> Result<Arc<Mutex<Match>>, ScoringError> {
        self.matches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(ScoringError::NotFound(id))
    }

    /// Runs one mutation under the match's lock. The mutation is applied to
    /// a staged copy and persisted before the live record is replaced, so a
    /// rejected event or a failed save leaves no trace.
    fn commit<F>(&self, id: Id, mutate: F) -> Result<MatchView, ScoringError>
    where
        F: FnOnce(&mut Match) -> Result<MatchView, ScoringError>,
    {
        let record = self.lookup(id)?;
        let mut guard = record.lock().unwrap_or_else(PoisonError::into_inner);

        let mut staged = guard.clone();
        let view = mutate(&mut staged)?;
        self.store.save(&staged)?;

        let finished =
            staged.status == MatchStatus::Completed && guard.status != MatchStatus::Completed;

        if finished && let Some(winner) = staged.winner {
            self.notifier.send(MatchResult {
                match_id: staged.id,
                tournament: staged.tournament,
                winner: staged.participant(winner).to_string(),
                loser: staged.participant(winner.opposite()).to_string(),
            });
        }

        *guard = staged;
        Ok(view)
    }
}
