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

use thiserror::Error;

use crate::Id;

/// Every way a scoring operation can fail. All of these surface
/// synchronously to the caller; the engine never retries on its own since a
/// blind retry risks double-counting a rally.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ScoringError {
    #[error("rally: the score delta is inconsistent with the ledger tail")]
    InvalidEvent,
    #[error("rally: the match is already completed")]
    MatchCompleted,
    #[error("match: no match with id {0}")]
    NotFound(Id),
    #[error("rally: the match is not accepting rallies")]
    OutOfOrder,
    #[error("store: {0}")]
    Persistence(String),
    #[error("rally: the set is already decided")]
    SetAlreadyDecided,
}
