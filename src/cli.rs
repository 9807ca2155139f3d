use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cykel_engine::{CalendarDay, Symptom};

/// Privacy-first, on-device cycle tracker.
#[derive(Parser)]
#[command(name = "cykel", version, about = "Privacy-first, on-device cycle tracker")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file.
    #[arg(short, long, global = true, default_value = "cykel.toml")]
    pub config: PathBuf,

    /// Journal passphrase.
    #[arg(long, global = true, env = "CYKEL_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Treat this day (YYYY-MM-DD) as today.
    #[arg(long, global = true)]
    pub today: Option<CalendarDay>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty encrypted journal.
    Init,
    /// Mark or unmark a day as a period day.
    Toggle {
        /// Day to toggle, YYYY-MM-DD.
        date: CalendarDay,
    },
    /// Mark or unmark a symptom on a day.
    Symptom {
        /// Day to update, YYYY-MM-DD.
        date: CalendarDay,
        /// Symptom id, e.g. `cramps` or `mood_swings`.
        symptom: Symptom,
    },
    /// Show the current phase and predictions.
    Status,
    /// List past cycles, most recent first.
    History,
    /// Print one month's calendar data as JSON.
    Month { year: i32, month: u32 },
    /// Print the decrypted journal as JSON.
    Export,
    /// Delete the journal permanently.
    Wipe {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}
