use serde_json::json;

use crate::cli::output::print_json;
use crate::config::RuntimeConfig;
use crate::error::AppError;
use crate::resolve;

use super::PowerAction;

pub async fn handle_room(room: &str, on: bool, config: &RuntimeConfig) -> Result<(), AppError> {
    let sync = resolve::open_sync(config)?;
    sync.refresh().await?;

    let id = {
        let snapshot = sync.snapshot();
        resolve::resolve_room(&snapshot.rooms, sync.key_scheme(), room)?
            .id
            .clone()
    };
    sync.toggle_room(&id, on).await?;

    // Push stores confirm through their subscription; there is none in a
    // one-shot command, so read back explicitly.
    if sync.store().capabilities().push {
        sync.refresh().await?;
    }

    let state = sync
        .snapshot()
        .rooms
        .get(&id)
        .map(|r| r.state_str())
        .unwrap_or("unknown");
    print_json(&json!({"room": id, "state": state}));
    Ok(())
}

pub async fn handle_all(action: PowerAction, config: &RuntimeConfig) -> Result<(), AppError> {
    let sync = resolve::open_sync(config)?;
    sync.refresh().await?;

    let count = sync.toggle_all(action.is_on()).await?;
    let state = if action.is_on() { "on" } else { "off" };
    print_json(&json!({"rooms": count, "state": state}));
    Ok(())
}
