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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;
mod tests;

use std::{
    collections::HashMap,
    fs,
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    process::exit,
    str::FromStr,
    sync::{
        Arc, PoisonError, RwLock,
        mpsc::{self, Receiver},
    },
    thread,
};

use chrono::Utc;
use clap::Parser;
use courtside::{
    Id, SERVER_PORT,
    match_state::Match,
    participant::Participants,
    rules::Rules,
    score::SetScore,
    scorekeeper::{MatchResult, Scorekeeper},
    side::Side,
    store::RonStore,
    tournament::Tournament,
    utils,
};
use log::{debug, error, info, warn};

use crate::command_line::Args;

const ACTIVE_MATCHES_FILE: &str = "active-matches.postcard";
const PARTICIPANTS_FILE: &str = "participants.ron";
const TOURNAMENTS_FILE: &str = "tournaments.ron";

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    let (tx, rx) = mpsc::channel();
    let server = Arc::new(Server::open(args.skip_the_data_files, tx)?);

    {
        let server = Arc::clone(&server);
        thread::spawn(move || server.apply_results(&rx));
    }

    {
        let server = Arc::clone(&server);
        ctrlc::set_handler(move || {
            if let Err(error) = server.save_data_files() {
                error!("save on shutdown: {error}");
            }
            exit(0);
        })?;
    }

    let mut address = "[::]".to_string();
    address.push_str(SERVER_PORT);

    let listener = match TcpListener::bind(&address) {
        Ok(listener) => listener,
        Err(error) => {
            error!("TcpListener::bind: {error}");
            exit(1);
        }
    };
    info!("listening on {address} ...");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let server = Arc::clone(&server);
                thread::spawn(move || handle_client(&server, stream));
            }
            Err(error) => error!("stream: {error}"),
        }
    }

    Ok(())
}

fn handle_client(server: &Server, stream: TcpStream) {
    let Ok(peer) = stream.peer_addr() else {
        return;
    };
    let Ok(read_stream) = stream.try_clone() else {
        return;
    };

    info!("{peer} connected");

    let mut writer = stream;
    let reader = BufReader::new(read_stream);

    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };

        debug!("{peer} {line}");

        let reply = match server.handle_line(&line) {
            Ok(reply) => format!("= {reply}"),
            Err(error) => format!("? {error}"),
        };

        if writeln!(writer, "{reply}").is_err() {
            break;
        }
    }

    info!("{peer} disconnected");
}

struct Server {
    keeper: Scorekeeper<RonStore>,
    tournaments: RwLock<HashMap<Id, Tournament>>,
    participants: RwLock<HashMap<Id, Participants>>,
    skip_the_data_files: bool,
}

impl Server {
    fn open(skip_the_data_files: bool, tx: mpsc::Sender<MatchResult>) -> anyhow::Result<Self> {
        let store = if skip_the_data_files {
            let dir = std::env::temp_dir().join(format!("courtside-{}", std::process::id()));
            fs::create_dir_all(&dir)?;
            RonStore::new(dir)
        } else {
            RonStore::open()?
        };

        let server = Self {
            keeper: Scorekeeper::with_notifier(store.clone(), tx),
            tournaments: RwLock::default(),
            participants: RwLock::default(),
            skip_the_data_files,
        };

        if !skip_the_data_files {
            server.load_data_files(&store)?;
        }

        Ok(server)
    }

    fn load_data_files(&self, store: &RonStore) -> anyhow::Result<()> {
        let snapshot = utils::data_file(ACTIVE_MATCHES_FILE)?;
        if snapshot.exists() {
            let records: Vec<Match> = postcard::from_bytes(&fs::read(&snapshot)?)?;
            info!("loaded {} matches from the shutdown snapshot", records.len());

            for record in records {
                match record.verify() {
                    Ok(()) => self.keeper.adopt(record),
                    Err(error) => warn!("skipping match {}: {error}", record.id),
                }
            }

            // a stale snapshot must not shadow the per-submission records
            fs::remove_file(&snapshot)?;
        } else {
            let records = store.load_all()?;
            info!("loaded {} matches", records.len());

            for record in records {
                self.keeper.adopt(record);
            }
        }

        let tournaments_file = utils::data_file(TOURNAMENTS_FILE)?;
        if tournaments_file.exists() {
            let tournaments: HashMap<Id, Tournament> =
                ron::from_str(&fs::read_to_string(&tournaments_file)?)?;

            for tournament in tournaments.values() {
                tournament.check_schema()?;
            }

            *self
                .tournaments
                .write()
                .unwrap_or_else(PoisonError::into_inner) = tournaments;
        }

        let participants_file = utils::data_file(PARTICIPANTS_FILE)?;
        if participants_file.exists() {
            *self
                .participants
                .write()
                .unwrap_or_else(PoisonError::into_inner) =
                ron::from_str(&fs::read_to_string(&participants_file)?)?;
        }

        Ok(())
    }

    fn save_data_files(&self) -> anyhow::Result<()> {
        if self.skip_the_data_files {
            return Ok(());
        }

        let records = self.keeper.snapshot();
        fs::write(
            utils::data_file(ACTIVE_MATCHES_FILE)?,
            postcard::to_allocvec(&records)?,
        )?;

        self.save_tournaments()?;
        self.save_participants()?;

        info!("saved {} matches", records.len());
        Ok(())
    }

    fn save_tournaments(&self) -> anyhow::Result<()> {
        if self.skip_the_data_files {
            return Ok(());
        }

        let tournaments = self
            .tournaments
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        fs::write(
            utils::data_file(TOURNAMENTS_FILE)?,
            ron::ser::to_string(&*tournaments)?,
        )?;
        Ok(())
    }

    fn save_participants(&self) -> anyhow::Result<()> {
        if self.skip_the_data_files {
            return Ok(());
        }

        let participants = self
            .participants
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        fs::write(
            utils::data_file(PARTICIPANTS_FILE)?,
            ron::ser::to_string(&*participants)?,
        )?;
        Ok(())
    }

    /// Applies completed matches to the standings as the scorekeeper
    /// reports them.
    fn apply_results(&self, rx: &Receiver<MatchResult>) {
        for result in rx {
            self.apply_result(&result);

            if let Err(error) = self.save_participants() {
                error!("save participants: {error}");
            }
        }
    }

    fn apply_result(&self, result: &MatchResult) {
        let (points_win, points_loss) = {
            let tournaments = self
                .tournaments
                .read()
                .unwrap_or_else(PoisonError::into_inner);

            tournaments
                .get(&result.tournament)
                .map_or((1, 0), |tournament| {
                    (tournament.points_win, tournament.points_loss)
                })
        };

        self.participants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(result.tournament)
            .or_default()
            .record_result(&result.winner, &result.loser, points_win, points_loss);

        info!(
            "match {} completed: {} beat {}",
            result.match_id, result.winner, result.loser
        );
    }

    fn handle_line(&self, line: &str) -> anyhow::Result<String> {
        let args: Vec<_> = line.split_ascii_whitespace().collect();

        let Some(command) = args.first() else {
            return Ok(String::new());
        };

        match *command {
            "cancel" => self.cancel(&args),
            "correct" => self.correct(&args),
            "matches" => self.matches(),
            "ping" => Ok("pong".to_string()),
            "rally" => self.rally(&args),
            "schedule" => self.schedule(&args),
            "standings" => self.standings(&args),
            "tournament" => self.create_tournament(&args),
            "view" => self.view(&args),
            _ => Err(anyhow::Error::msg(format!("unknown command: {command}"))),
        }
    }

    fn cancel(&self, args: &[&str]) -> anyhow::Result<String> {
        let Some(id) = args.get(1) else {
            return Err(anyhow::Error::msg("expected: 'cancel MATCH_ID REASON'"));
        };

        let id: Id = id.parse()?;
        let reason = args[2..].join(" ");
        self.keeper.cancel_match(id, "admin", &reason)?;

        info!("match {id} cancelled: {reason}");
        Ok(format!("cancel {id}"))
    }

    fn correct(&self, args: &[&str]) -> anyhow::Result<String> {
        let (Some(id), Some(of), Some(winner)) = (args.get(1), args.get(2), args.get(3)) else {
            return Err(anyhow::Error::msg("expected: 'correct MATCH_ID SEQ SIDE'"));
        };

        let id: Id = id.parse()?;
        let view = self
            .keeper
            .correct_rally(id, of.parse()?, Side::from_str(winner)?)?;

        info!("match {id} rally {of} corrected to {winner}");
        Ok(format!("correct {id} {view}"))
    }

    fn matches(&self) -> anyhow::Result<String> {
        let mut lines = Vec::new();
        for id in self.keeper.match_ids() {
            let view = self.keeper.match_view(id)?;
            lines.push(format!("{id} {}", view.status));
        }

        Ok(format!("matches {}", lines.join(" ")))
    }

    fn rally(&self, args: &[&str]) -> anyhow::Result<String> {
        let (Some(id), Some(winner)) = (args.get(1), args.get(2)) else {
            return Err(anyhow::Error::msg(
                "expected: 'rally MATCH_ID SIDE [POINTS:POINTS]'",
            ));
        };

        let id: Id = id.parse()?;
        let winner = Side::from_str(winner)?;

        let view = if let Some(claimed) = args.get(3) {
            self.keeper
                .submit_scored(id, winner, SetScore::from_str(claimed)?)?
        } else {
            self.keeper.submit_rally(id, winner)?
        };

        Ok(format!("rally {id} {view}"))
    }

    fn schedule(&self, args: &[&str]) -> anyhow::Result<String> {
        let (Some(id), Some(tournament_id), Some(one), Some(two), Some(court)) = (
            args.get(1),
            args.get(2),
            args.get(3),
            args.get(4),
            args.get(5),
        ) else {
            return Err(anyhow::Error::msg(
                "expected: 'schedule MATCH_ID TOURNAMENT_ID ONE TWO COURT'",
            ));
        };

        let id: Id = id.parse()?;
        let tournament_id: Id = tournament_id.parse()?;
        let court: u8 = court.parse()?;

        let rules = {
            let tournaments = self
                .tournaments
                .read()
                .unwrap_or_else(PoisonError::into_inner);

            let Some(tournament) = tournaments.get(&tournament_id) else {
                return Err(anyhow::Error::msg(format!(
                    "no tournament with id {tournament_id}"
                )));
            };

            if court == 0 || court > tournament.court_count {
                return Err(anyhow::Error::msg(format!(
                    "the tournament runs courts 1 to {}",
                    tournament.court_count
                )));
            }

            tournament.rules
        };

        let match_number = u32::try_from(self.keeper.match_ids().len())? + 1;
        let record =
            Match::scheduled(id, tournament_id, one, two, rules).at(court, match_number, Utc::now());
        self.keeper.schedule_match(record)?;

        {
            let mut participants = self
                .participants
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            let entry = participants.entry(tournament_id).or_default();
            entry.register(one);
            entry.register(two);
        }

        info!("scheduled match {id} ({one} vs {two}) on court {court}");
        Ok(format!("schedule {id}"))
    }

    fn standings(&self, args: &[&str]) -> anyhow::Result<String> {
        let Some(tournament_id) = args.get(1) else {
            return Err(anyhow::Error::msg("expected: 'standings TOURNAMENT_ID'"));
        };

        let tournament_id: Id = tournament_id.parse()?;
        let participants = self
            .participants
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(standings) = participants.get(&tournament_id) else {
            return Err(anyhow::Error::msg(format!(
                "no tournament with id {tournament_id}"
            )));
        };

        Ok(format!("standings {tournament_id} {standings}"))
    }

    fn create_tournament(&self, args: &[&str]) -> anyhow::Result<String> {
        let err_msg =
            "expected: 'tournament ID POINTS_TO_WIN SETS_TO_WIN CAP|_ side_out|every_rally NAME'";

        let (Some(id), Some(points), Some(sets), Some(cap), Some(serve)) = (
            args.get(1),
            args.get(2),
            args.get(3),
            args.get(4),
            args.get(5),
        ) else {
            return Err(anyhow::Error::msg(err_msg));
        };

        let id: Id = id.parse()?;
        let cap = match *cap {
            "_" => None,
            cap => Some(cap.parse()?),
        };

        let rules = Rules {
            points_to_win: points.parse()?,
            sets_to_win: sets.parse()?,
            cap,
            serve_rule: serve.parse()?,
            ..Rules::default()
        };

        let tournament = Tournament {
            id,
            name: args[6..].join(" "),
            rules,
            ..Tournament::default()
        };

        {
            let mut tournaments = self
                .tournaments
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            if tournaments.contains_key(&id) {
                return Err(anyhow::Error::msg(format!(
                    "tournament {id} already exists"
                )));
            }

            tournaments.insert(id, tournament);
        }

        self.save_tournaments()?;
        info!("created tournament {id}");
        Ok(format!("tournament {id}"))
    }

    fn view(&self, args: &[&str]) -> anyhow::Result<String> {
        let Some(id) = args.get(1) else {
            return Err(anyhow::Error::msg("expected: 'view MATCH_ID'"));
        };

        let id: Id = id.parse()?;
        let view = self.keeper.match_view(id)?;
        Ok(format!("view {id} {view}"))
    }
}
