use std::{
    io,
    process::{Command, ExitStatus},
};

use clap::Parser;

use courtside::{LONG_VERSION, match_state::Match, rules::Rules};

/// Courtside Referee
///
/// Scores a single match over the referee text protocol on stdin.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about)]
struct Args {
    /// Displays the scoreboard after every command
    #[arg(long)]
    display_match: bool,

    /// Score with badminton rules (21 points, cap at 30) instead of the
    /// default table-tennis rules
    #[arg(long)]
    badminton: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let rules = if args.badminton {
        Rules::badminton()
    } else {
        Rules::default()
    };

    referee(args.display_match, rules)
}

fn clear_screen() -> anyhow::Result<ExitStatus> {
    #[cfg(not(any(target_family = "unix", target_family = "windows")))]
    return Err(anyhow::Error::msg("no clear command on this platform"));

    #[cfg(target_family = "unix")]
    let exit_status = Command::new("clear").status()?;

    #[cfg(target_family = "windows")]
    let exit_status = Command::new("cls").status()?;

    Ok(exit_status)
}

fn referee(display_match: bool, rules: Rules) -> anyhow::Result<()> {
    let mut buffer = String::new();
    let stdin = io::stdin();
    let mut record = Match::scheduled(1, 1, "one", "two", rules);

    if display_match {
        clear_screen()?;
        println!("{record}\n");
        println!("Enter 'list_commands' for a list of commands.");
    }

    loop {
        if let Err(error) = stdin.read_line(&mut buffer) {
            println!("? {error}\n");
            buffer.clear();
            return Ok(());
        }

        let result = record.read_line(&buffer);

        if display_match {
            clear_screen()?;
            println!("{record}\n");
        }

        match result {
            Err(error) => println!("? {error}\n"),
            Ok(message) => {
                if let Some(message) = message {
                    println!("= {message}");
                }
            }
        }

        buffer.clear();
    }
}
