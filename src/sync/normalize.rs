use crate::error::AppError;
use crate::models::payload::{self, RawPayload};
use crate::models::{KeyScheme, Room, RoomCollection};

/// Turn a raw payload into the ordered room list.
///
/// Keys without the scheme's prefix (the user counter, anything else the
/// store holds) are skipped. A prefixed key without a numeric suffix, or a
/// room whose value is not boolean/integer, means the backend is
/// misconfigured and fails the whole cycle.
pub fn normalize(payload: &RawPayload, scheme: KeyScheme) -> Result<RoomCollection, AppError> {
    let mut rooms = Vec::new();
    for (key, value) in payload.iter().filter(|(key, _)| scheme.is_room_key(key)) {
        let number = scheme
            .number(key)
            .ok_or_else(|| AppError::InvalidRoomKey(key.clone()))?;
        let on = payload::state_of(value)
            .ok_or_else(|| AppError::InvalidRoomKey(format!("{} has state {}", key, value)))?;
        rooms.push(Room {
            id: key.clone(),
            number,
            on,
        });
    }
    Ok(RoomCollection::new(rooms))
}
