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

use std::io::Write as _;

use clap::{CommandFactory, Parser};
use courtside::{COPYRIGHT, LONG_VERSION};

/// Courtside Tournament Server
///
/// This is a TCP server that scores tournament matches for referee clients.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Courtside Tournament Server")]
pub(crate) struct Args {
    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether to skip the data files
    #[arg(long)]
    pub skip_the_data_files: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command().name("courtside-server").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-07-14");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("courtside-server.1", buffer)?;
        Ok(())
    }
}
