use std::path::PathBuf;

use clap::{Parser, Subcommand};

const DEFAULT_CACHE_SIZE: usize = 1024;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the PoDA device against a single fixture message.
    #[command(name = "run")]
    Run(RunConfig),
}

#[derive(Debug, Parser)]
pub struct RunConfig {
    /// Directory holding the node's persistent wallet key. A new key is
    /// generated and saved there on first run; omit to use an ephemeral key.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to a JSON-encoded item describing the process this node is
    /// hosting — its `Authority`/`Quorum`/`Device` tags are parsed once, at
    /// startup, into the `DeviceOptions` every later `execute` call uses.
    #[arg(long)]
    pub process: PathBuf,

    /// Path to a JSON-encoded item to run through the device as the
    /// incoming message.
    #[arg(long)]
    pub fixture: PathBuf,

    /// Process cache capacity.
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE)]
    pub cache_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_command() {
        let cli = Cli::parse_from([
            "poda",
            "run",
            "--process",
            "process.json",
            "--fixture",
            "fixture.json",
        ]);
        match cli.command {
            Commands::Run(config) => {
                assert_eq!(config.process, PathBuf::from("process.json"));
                assert_eq!(config.fixture, PathBuf::from("fixture.json"));
                assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
            }
        }
    }
}
