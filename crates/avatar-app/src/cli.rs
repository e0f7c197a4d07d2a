use std::path::PathBuf;

use clap::Parser;

/// Avatar display controller: keeps the backend channel alive and projects
/// its events into display state.
#[derive(Parser, Debug)]
#[command(name = "avatar", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend WebSocket URL override.
    #[arg(long)]
    pub url: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
