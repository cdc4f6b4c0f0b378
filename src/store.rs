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

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use log::warn;

use crate::{Id, error::ScoringError, match_state::Match, utils};

/// The persistence collaborator. One `save` covers a whole submission: the
/// new rally and the updated match status land together or not at all, so a
/// failed save is indistinguishable from a rejected submission.
pub trait MatchStore {
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Persistence` for I/O or decode
    /// failures.
    fn load(&self, id: Id) -> Result<Match, ScoringError>;

    /// # Errors
    ///
    /// `Persistence` when the record could not be written durably.
    fn save(&self, record: &Match) -> Result<(), ScoringError>;
}

/// In-memory store holding serialized records; the default for tests and
/// the referee binary.
#[derive(Debug, Default)]
pub struct MemoryStore(Mutex<HashMap<Id, String>>);

impl MatchStore for MemoryStore {
    fn load(&self, id: Id) -> Result<Match, ScoringError> {
        let records = self.0.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(record) = records.get(&id) else {
            return Err(ScoringError::NotFound(id));
        };

        let record: Match =
            ron::from_str(record).map_err(|error| ScoringError::Persistence(error.to_string()))?;

        record.verify()?;
        Ok(record)
    }

    fn save(&self, record: &Match) -> Result<(), ScoringError> {
        let string = ron::ser::to_string(record)
            .map_err(|error| ScoringError::Persistence(error.to_string()))?;

        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id, string);

        Ok(())
    }
}

/// One `ron` file per match under the data folder. Saves go through a
/// temporary file and a rename so a crash never leaves a half-written
/// record.
#[derive(Clone, Debug)]
pub struct RonStore {
    dir: PathBuf,
}

impl RonStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Opens the store under the user's data folder, creating it if needed.
    ///
    /// # Errors
    ///
    /// If the data folder cannot be created.
    pub fn open() -> anyhow::Result<Self> {
        let dir = utils::create_data_folder()?.join("matches");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: Id) -> PathBuf {
        self.dir.join(format!("match-{id}.ron"))
    }

    /// Every readable match record in the store, for server startup.
    /// Unreadable files are logged and skipped rather than taking the whole
    /// server down.
    ///
    /// # Errors
    ///
    /// If the store directory cannot be listed.
    pub fn load_all(&self) -> anyhow::Result<Vec<Match>> {
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|extension| extension != "ron") {
                continue;
            }

            match fs::read_to_string(&path)
                .map_err(|error| ScoringError::Persistence(error.to_string()))
                .and_then(|string| {
                    ron::from_str::<Match>(&string)
                        .map_err(|error| ScoringError::Persistence(error.to_string()))
                })
                .and_then(|record| record.verify().map(|()| record))
            {
                Ok(record) => records.push(record),
                Err(error) => warn!("skipping {}: {error}", path.display()),
            }
        }

        records.sort_by_key(|record| record.id);
        Ok(records)
    }
}

impl MatchStore for RonStore {
    fn load(&self, id: Id) -> Result<Match, ScoringError> {
        let string = match fs::read_to_string(self.path(id)) {
            Ok(string) => string,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(ScoringError::NotFound(id));
            }
            Err(error) => return Err(ScoringError::Persistence(error.to_string())),
        };

        let record: Match =
            ron::from_str(&string).map_err(|error| ScoringError::Persistence(error.to_string()))?;

        record.verify()?;
        Ok(record)
    }

    fn save(&self, record: &Match) -> Result<(), ScoringError> {
        let string = ron::ser::to_string(record)
            .map_err(|error| ScoringError::Persistence(error.to_string()))?;

        let path = self.path(record.id);
        let temporary = path.with_extension("ron.tmp");

        fs::write(&temporary, string)
            .and_then(|()| fs::rename(&temporary, &path))
            .map_err(|error| ScoringError::Persistence(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rules::Rules, side::Side};

    fn played_match() -> Match {
        let mut record = Match::scheduled(7, 1, "ada", "grace", Rules::default());
        for _ in 0..5 {
            record.submit_rally(Side::One).unwrap();
        }
        record.submit_rally(Side::Two).unwrap();
        record
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        let record = played_match();

        store.save(&record).unwrap();
        let loaded = store.load(7).unwrap();

        assert_eq!(loaded, record);
        assert_eq!(loaded.view(), record.view());
        assert_eq!(store.load(8), Err(ScoringError::NotFound(8)));
    }

    #[test]
    fn ron_store_round_trips() {
        let dir = std::env::temp_dir().join(format!("courtside-store-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let store = RonStore::new(dir.clone());
        let record = played_match();

        store.save(&record).unwrap();
        assert_eq!(store.load(7).unwrap(), record);
        assert_eq!(store.load_all().unwrap(), vec![record]);
        assert_eq!(store.load(8), Err(ScoringError::NotFound(8)));

        let _ignored = fs::remove_dir_all(&dir);
    }
}
