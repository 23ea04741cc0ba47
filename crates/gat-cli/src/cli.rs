use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use gat_kpi::OutputFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (overrides `[logging] level` of the config file)
    #[arg(long)]
    pub log_level: Option<tracing::Level>,

    /// TOML configuration file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recorded episode analytics
    Episode {
        #[command(subcommand)]
        command: EpisodeCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum EpisodeCommands {
    /// Build the episode analytics tables and write them to a directory
    Tables {
        /// Episode record (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        episode: PathBuf,
        /// Output directory
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
        /// Table file format
        #[arg(long, value_enum)]
        format: Option<TableFormat>,
        /// Partition columns (comma separated, Parquet only)
        #[arg(long)]
        out_partitions: Option<String>,
    },
    /// Print episode totals and the distinct actions played
    Summary {
        /// Episode record (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        episode: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl From<TableFormat> for OutputFormat {
    fn from(format: TableFormat) -> Self {
        match format {
            TableFormat::Csv => OutputFormat::Csv,
            TableFormat::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryFormat {
    Table,
    Json,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
