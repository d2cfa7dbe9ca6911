pub mod aggregate;
pub mod payload;
pub mod room;

pub use aggregate::AggregateView;
pub use payload::RawPayload;
pub use room::{KeyScheme, Room, RoomCollection};
