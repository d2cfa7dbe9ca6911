#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not connected. Run 'roomctl connect <address>' first.")]
    NotConnected,

    #[error("{message}")]
    DeviceUnreachable { message: String, address: String },

    #[error("Backend returned an empty payload")]
    EmptyPayload,

    #[error("Backend error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Write rejected for {0}")]
    WriteRejected(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Malformed room key: {0}")]
    InvalidRoomKey(String),

    #[error("Backend does not support this operation: {0}")]
    UnsupportedOperation(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Sync loop failed: {0}")]
    Task(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotConnected => 2,
            AppError::RoomNotFound(_) => 3,
            AppError::DeviceUnreachable { .. } | AppError::EmptyPayload => 4,
            _ => 1,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotConnected => "not_connected",
            AppError::DeviceUnreachable { .. } => "device_unreachable",
            AppError::EmptyPayload => "empty_payload",
            AppError::Api { .. } => "api",
            AppError::WriteRejected(_) => "write_rejected",
            AppError::RoomNotFound(_) => "room_not_found",
            AppError::InvalidRoomKey(_) => "invalid_room_key",
            AppError::UnsupportedOperation(_) => "unsupported_operation",
            AppError::Session(_) => "session",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Task(_) => "task",
            AppError::Http(_) => "http",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
        }
    }

    /// Transport-level failures: the backend could not be reached or gave
    /// back nothing usable. The sync loop keeps the last good state on these.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            AppError::DeviceUnreachable { .. }
                | AppError::EmptyPayload
                | AppError::Api { .. }
                | AppError::Http(_)
                | AppError::Json(_)
        )
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "error": self.error_type(),
            "message": self.to_string(),
        });
        match self {
            AppError::Api {
                status: Some(status),
                ..
            } => obj["status"] = serde_json::json!(status),
            AppError::DeviceUnreachable { address, .. } => {
                obj["address"] = serde_json::json!(address)
            }
            _ => {}
        }
        obj
    }
}
