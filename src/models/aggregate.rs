use serde::Serialize;

use super::room::RoomCollection;

/// Values derived from the current rooms. Never stored; recomputed
/// every time the collection changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateView {
    pub all_on: bool,
    pub on_count: usize,
    pub off_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_in_users: Option<i64>,
}

impl AggregateView {
    /// An empty collection is vacuously all-on.
    pub fn derive(rooms: &RoomCollection, logged_in_users: Option<i64>) -> Self {
        let on_count = rooms.iter().filter(|r| r.on).count();
        let off_count = rooms.len() - on_count;
        Self {
            all_on: off_count == 0,
            on_count,
            off_count,
            logged_in_users,
        }
    }
}
