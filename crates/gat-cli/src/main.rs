use std::process;

use clap::Parser;
use gat_cli::cli::{Cli, Commands};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::commands::util::load_config;
use crate::commands::{completions, episode};

mod commands;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(2);
        }
    };

    let level = cli
        .log_level
        .or_else(|| config.logging.level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Some(Commands::Episode { command }) => episode::handle(command, &config),
        Some(Commands::Completions { shell, out }) => completions::handle(*shell, out.as_deref()),
        None => {
            info!("No subcommand provided. Use `gat-cli --help` for more information.");
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("command failed: {err:?}");
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
