//! Hearth command-line front end.
//!
//! Opens the page model stored under the configured data directory and runs
//! one command given on the command line, or reads commands from stdin one
//! per line until EOF or `exit`. Type `help` for the command list.

mod commands;
mod icon_commands;
mod page_commands;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use commands::{CommandRegistry, format_output};
use hearth_core::PageModel;
use hearth_core::config::HearthConfig;
use hearth_core::store::{BackgroundStore, FileStore, StoreHandle};

const DEFAULT_CONFIG: &str = "hearth.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve config from HEARTH_CONFIG env var or the default path.
    let config_path = std::env::var_os("HEARTH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = HearthConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let file: StoreHandle = Arc::new(
        FileStore::open(&config.data_dir)
            .with_context(|| format!("opening {}", config.data_dir.display()))?,
    );
    let store: StoreHandle = if config.background_writes {
        Arc::new(BackgroundStore::spawn(file)?)
    } else {
        file
    };
    let mut model = PageModel::open(store, &config);
    log::info!(
        "Opened {} page(s) from {}",
        model.pages().len(),
        config.data_dir.display()
    );

    let registry = CommandRegistry::with_builtins();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = registry.run(&args, &mut model)?;
        for line in format_output(&output) {
            println!("{line}");
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        match registry.execute(&line, &mut model) {
            Ok(output) => {
                for l in format_output(&output) {
                    writeln!(stdout, "{l}")?;
                }
            },
            Err(e) => writeln!(stdout, "error: {e}")?,
        }
        stdout.flush()?;
    }
    Ok(())
}
