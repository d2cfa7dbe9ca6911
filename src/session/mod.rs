pub mod context;
pub mod store;

pub use context::{ConnectionContext, SessionSource, StaticSession};
pub use store::SessionFile;
