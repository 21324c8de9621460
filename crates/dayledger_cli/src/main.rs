//! `dayledger` operator binary.
//!
//! # Responsibility
//! - Resolve configuration, start optional file logging and open the ledger.
//! - Dispatch one subcommand and print its result as JSON.

mod commands;
mod config;
mod handlers;

use clap::Parser;
use commands::Cli;
use config::CliConfig;
use log::info;

fn main() {
    let cli = Cli::parse();
    let config = CliConfig::resolve(cli.db.clone(), cli.log_dir.clone(), cli.log_level.clone());

    if let Some(log_dir) = config.log_dir.as_deref() {
        // A broken log setup should not block ledger access.
        if let Err(err) = dayledger_core::init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        dayledger_core::core_version()
    );

    let conn = match dayledger_core::open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("error: cannot open {}: {err}", config.db_path.display());
            std::process::exit(1);
        }
    };

    if let Err(err) = handlers::dispatch(&conn, cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
