use std::net::{Ipv4Addr, SocketAddrV4};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::KeyScheme;

pub const DEFAULT_DEVICE_PORT: u16 = 8081;

/// What the entry step established: which backend to talk to and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionContext {
    /// Pull variant: a controller on the local network.
    Device { address: SocketAddrV4 },

    /// Push variant: a logged-in session against the realtime store.
    User {
        store_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth: Option<String>,
        session_id: String,
        connected_at: DateTime<Utc>,
    },
}

impl ConnectionContext {
    pub fn key_scheme(&self) -> KeyScheme {
        match self {
            ConnectionContext::Device { .. } => KeyScheme::Device,
            ConnectionContext::User { .. } => KeyScheme::Realtime,
        }
    }

    pub fn target(&self) -> String {
        match self {
            ConnectionContext::Device { address } => address.to_string(),
            ConnectionContext::User { store_url, .. } => store_url.clone(),
        }
    }
}

/// Where the session marker comes from. Read before every fetch; `None`
/// sends the user back to `connect`.
pub trait SessionSource: Send + Sync {
    fn current(&self) -> Result<Option<ConnectionContext>, AppError>;

    fn require(&self) -> Result<ConnectionContext, AppError> {
        self.current()?.ok_or(AppError::NotConnected)
    }
}

/// A session that never changes, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<ConnectionContext>);

impl SessionSource for StaticSession {
    fn current(&self) -> Result<Option<ConnectionContext>, AppError> {
        Ok(self.0.clone())
    }
}

/// Parse `a.b.c.d` or `a.b.c.d:port`. Only dotted IPv4 literals are
/// accepted, matching what controllers announce on the LAN.
pub fn parse_device_address(input: &str) -> Result<SocketAddrV4, AppError> {
    let input = input.trim();
    if let Ok(addr) = input.parse::<SocketAddrV4>() {
        return Ok(addr);
    }
    input
        .parse::<Ipv4Addr>()
        .map(|ip| SocketAddrV4::new(ip, DEFAULT_DEVICE_PORT))
        .map_err(|_| AppError::InvalidInput(format!("Invalid device IP address: '{}'", input)))
}
