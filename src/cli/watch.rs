use std::time::Duration;

use clap::Args;

use crate::cli::output::{print_json_line, print_table, room_rows};
use crate::config::{OutputMode, RuntimeConfig};
use crate::error::AppError;
use crate::resolve;
use crate::sync::{LoopOptions, Overlap, Snapshot};

#[derive(Args)]
pub struct WatchArgs {
    /// Poll period in milliseconds (controllers without push only)
    #[arg(
        long,
        default_value_t = 500,
        env = "ROOMCTL_POLL_MS",
        value_parser = clap::value_parser!(u64).range(100..=60_000)
    )]
    pub interval: u64,

    /// What to do when a poll is still running at the next tick
    #[arg(long, value_enum, default_value_t = Overlap::Skip)]
    pub overlap: Overlap,
}

fn render(snapshot: &Snapshot, config: &RuntimeConfig) -> Result<(), AppError> {
    if config.output_mode == OutputMode::Table {
        print_table(&room_rows(&snapshot.rooms));
    } else {
        print_json_line(&serde_json::to_value(snapshot)?);
    }
    Ok(())
}

pub async fn handle(args: &WatchArgs, config: &RuntimeConfig) -> Result<(), AppError> {
    let sync = resolve::open_sync(config)?;
    let mut updates = sync.watch();

    let options = LoopOptions {
        interval: Duration::from_millis(args.interval),
        overlap: args.overlap,
    };
    let mut handle = sync.start(options).await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, stopping sync");
                handle.stop().await;
                return Ok(());
            }
            result = handle.finished() => return result,
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.synced {
                    render(&snapshot, config)?;
                }
            }
        }
    }
}
