use std::{env, fs, io::Write, path::PathBuf};

use chrono::Utc;
use env_logger::Builder;
use log::LevelFilter;

use crate::HOME;

pub fn init_logger(debug: bool, systemd: bool) {
    let mut builder = Builder::new();

    if systemd {
        builder.format(|formatter, record| {
            writeln!(formatter, "[{}]: {}", record.level(), record.args())
        });
    } else {
        builder.format(|formatter, record| {
            writeln!(
                formatter,
                "{} [{}] ({}): {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S %z"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }

    if let Ok(var) = env::var("RUST_LOG") {
        builder.parse_filters(&var);
    } else if debug {
        builder.filter(None, LevelFilter::Debug);
    } else {
        // if no RUST_LOG provided, default to logging at the Info level
        builder.filter(None, LevelFilter::Info);
    }

    builder.init();
}

/// # Errors
///
/// If the data directory cannot be determined or created.
pub fn create_data_folder() -> anyhow::Result<PathBuf> {
    let Some(mut folder) = dirs::data_dir() else {
        return Err(anyhow::Error::msg("unable to determine the data directory"));
    };

    folder.push(HOME);
    fs::create_dir_all(&folder)?;
    Ok(folder)
}

/// # Errors
///
/// If the data directory cannot be determined or created.
pub fn data_file(name: &str) -> anyhow::Result<PathBuf> {
    Ok(create_data_folder()?.join(name))
}
