// File: rotator/src/cli.rs
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};

use crate::constants::exit;
use crate::retention::Cadence;

#[derive(Parser, Debug)]
#[command(
    name = "rotator",
    about = "Creates snapshots of selected instances on a daily, weekly or monthly basis and purges expired ones",
    version
)]
#[command(group(
    ArgGroup::new("cadence")
        .required(true)
        .multiple(false)
        .args(["daily", "weekly", "monthly"])
))]
pub struct Cli {
    /// Daily backup
    #[arg(short = 'd', long)]
    pub daily: bool,

    /// Weekly backup
    #[arg(short = 'w', long)]
    pub weekly: bool,

    /// Monthly backup
    #[arg(short = 'm', long)]
    pub monthly: bool,
}

impl Cli {
    /// The single selected cadence, `None` unless exactly one flag is set
    pub fn cadence(&self) -> Option<Cadence> {
        match (self.daily, self.weekly, self.monthly) {
            (true, false, false) => Some(Cadence::Daily),
            (false, true, false) => Some(Cadence::Weekly),
            (false, false, true) => Some(Cadence::Monthly),
            _ => None,
        }
    }
}

/// Exit code for a failed parse, `None` when clap should print help or version and exit itself
pub fn usage_exit_code(err: &clap::Error) -> Option<u8> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => Some(exit::FATAL),
    }
}
