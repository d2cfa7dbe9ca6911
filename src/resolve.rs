use std::sync::Arc;

use crate::api;
use crate::config::RuntimeConfig;
use crate::error::AppError;
use crate::models::{KeyScheme, Room, RoomCollection};
use crate::session::{SessionFile, SessionSource};
use crate::sync::RoomSync;

/// Build the sync core for the stored session. Fails with `NotConnected`
/// before any request is made when there is no session.
pub fn open_sync(config: &RuntimeConfig) -> Result<Arc<RoomSync>, AppError> {
    let session = SessionFile::new(&config.session_file);
    let ctx = session.require()?;
    tracing::debug!(
        "session {}: {} ({:?})",
        session.path().display(),
        ctx.target(),
        ctx.key_scheme()
    );
    let store = api::open_store(&ctx)?;
    Ok(Arc::new(RoomSync::new(store, Arc::new(session))))
}

/// Resolve what the user typed to a room in the current collection.
///
/// Resolution priority:
/// 1. Exact identifier (`Room3`)
/// 2. Case-insensitive identifier (`room3` against `Room3`)
/// 3. Bare number (`3`)
pub fn resolve_room<'a>(
    rooms: &'a RoomCollection,
    scheme: KeyScheme,
    name: &str,
) -> Result<&'a Room, AppError> {
    let name = name.trim();

    if let Some(room) = rooms.get(name) {
        return Ok(room);
    }

    let name_lower = name.to_lowercase();
    if let Some(room) = rooms.iter().find(|r| r.id.to_lowercase() == name_lower) {
        return Ok(room);
    }

    if let Ok(number) = name.parse::<u32>() {
        if let Some(room) = rooms.iter().find(|r| r.number == number) {
            return Ok(room);
        }
        return Err(AppError::RoomNotFound(scheme.key_for(number)));
    }

    Err(AppError::RoomNotFound(name.to_string()))
}
