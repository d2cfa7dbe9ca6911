use serde_json::json;

use crate::cli::output::{print_json, print_table, room_rows};
use crate::config::{OutputMode, RuntimeConfig};
use crate::error::AppError;
use crate::resolve;

pub async fn handle(config: &RuntimeConfig) -> Result<(), AppError> {
    let sync = resolve::open_sync(config)?;
    sync.refresh().await?;
    let snapshot = sync.snapshot();

    if config.output_mode == OutputMode::Table {
        print_table(&room_rows(&snapshot.rooms));
    } else {
        print_json(&json!({
            "rooms": snapshot.rooms,
            "all_on": snapshot.aggregate.all_on,
        }));
    }
    Ok(())
}
