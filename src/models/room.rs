use serde::Serialize;

/// Naming convention for room keys. Fixed for the lifetime of a session:
/// the device API reports `room<N>`, the realtime store holds `Room<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    Device,
    Realtime,
}

impl KeyScheme {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyScheme::Device => "room",
            KeyScheme::Realtime => "Room",
        }
    }

    /// Case-sensitive prefix test; anything else in the payload is not a room.
    pub fn is_room_key(&self, key: &str) -> bool {
        key.starts_with(self.prefix())
    }

    /// The digits after the prefix, exactly as written. This is the
    /// device API's addressable unit (`room05` is unit `05`).
    pub fn unit<'a>(&self, key: &'a str) -> Option<&'a str> {
        let unit = key.strip_prefix(self.prefix())?;
        (!unit.is_empty() && unit.bytes().all(|b| b.is_ascii_digit())).then_some(unit)
    }

    /// The suffix as an integer, used for ordering.
    pub fn number(&self, key: &str) -> Option<u32> {
        self.unit(key)?.parse().ok()
    }

    pub fn key_for(&self, number: u32) -> String {
        format!("{}{}", self.prefix(), number)
    }
}

/// One controllable light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    #[serde(rename = "room")]
    pub id: String,
    #[serde(skip)]
    pub number: u32,
    #[serde(rename = "state")]
    pub on: bool,
}

impl Room {
    pub fn state_str(&self) -> &'static str {
        if self.on {
            "on"
        } else {
            "off"
        }
    }
}

/// Rooms ordered by numeric suffix. Rebuilt wholesale on every fetch,
/// never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoomCollection {
    rooms: Vec<Room>,
}

impl RoomCollection {
    pub fn new(mut rooms: Vec<Room>) -> Self {
        // Numeric, not lexicographic: room10 sorts after room9.
        rooms.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
        Self { rooms }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Room> {
        self.rooms.iter()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(|r| r.id.as_str())
    }
}

impl<'a> IntoIterator for &'a RoomCollection {
    type Item = &'a Room;
    type IntoIter = std::slice::Iter<'a, Room>;

    fn into_iter(self) -> Self::IntoIter {
        self.rooms.iter()
    }
}
