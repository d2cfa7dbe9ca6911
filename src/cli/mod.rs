pub mod dashboard;
pub mod output;
pub mod rooms;
pub mod session;
pub mod toggle;
pub mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "roomctl",
    version,
    about = "Building lighting control - list rooms, switch lights, watch live state"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as human-readable table instead of JSON
    #[arg(short = 't', long = "table", global = true)]
    pub table: bool,

    /// Verbose output (log requests and sync cycles to stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Where the session marker is kept
    #[arg(long, global = true, env = "ROOMCTL_SESSION_FILE")]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a lighting controller or realtime store
    Connect(session::ConnectArgs),

    /// Forget the current connection
    Disconnect,

    /// Show connection status
    Status,

    /// List rooms and their light state
    Rooms,

    /// Summary of bulbs on/off and logged-in users
    Dashboard,

    /// Switch a room's light on
    On {
        /// Room name or number
        room: String,
    },

    /// Switch a room's light off
    Off {
        /// Room name or number
        room: String,
    },

    /// Switch every room at once
    All {
        /// Desired state
        #[arg(value_enum)]
        state: PowerAction,
    },

    /// Keep syncing and print every change until interrupted
    Watch(watch::WatchArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PowerAction {
    On,
    Off,
}

impl PowerAction {
    pub fn is_on(self) -> bool {
        matches!(self, PowerAction::On)
    }
}
