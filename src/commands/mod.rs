mod config_cmd;
mod status;
mod student;
mod token;

use clap::ValueEnum;
use roster_core::{LocalCache, RemoteDataSource, StudentState, SyncController};

pub use config_cmd::ConfigCommand;
pub use status::StatusCommand;
pub use student::StudentCommand;
pub use token::TokenCommand;

/// Controller wired to the HTTP backend and the SQLite cache.
pub type Controller = SyncController<RemoteDataSource<LocalCache>, LocalCache>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Prints the store's degraded-mode notice, if any, to stderr.
fn print_notice(state: &StudentState) {
    if let Some(notice) = &state.error {
        eprintln!("Warning: {}", notice);
    }
}
