use std::net::SocketAddrV4;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{BackingStore, Capabilities};
use crate::error::AppError;
use crate::models::payload::{self, RawPayload};
use crate::models::KeyScheme;

const PATH_CHECK: &str = "/check";
const PATH_STATUS: &str = "/status";

const MSG_WRONG_ADDRESS: &str = "Wrong Device IP Address. Please enter the correct one.";
const MSG_NO_NETWORK: &str = "Error connecting to device. Please check your network connection.";

/// Pull-variant adapter: the controller's plain HTTP API.
pub struct DeviceClient {
    client: reqwest::Client,
    address: SocketAddrV4,
    base_url: String,
}

impl DeviceClient {
    pub fn new(address: SocketAddrV4) -> Result<Self, AppError> {
        // No request timeout: a hung status call only stalls its own cycle.
        let client = reqwest::Client::builder()
            .user_agent(concat!("roomctl/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            address,
            base_url: format!("http://{}", address),
        })
    }

    pub fn address(&self) -> SocketAddrV4 {
        self.address
    }

    /// Probe used by the connect step. Only a 200 counts as a valid device.
    pub async fn check(&self) -> Result<(), AppError> {
        let url = format!("{}{}", self.base_url, PATH_CHECK);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!("Error connecting to device {}: {}", self.address, e);
            self.unreachable(MSG_NO_NETWORK)
        })?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            tracing::debug!("check returned {}", response.status());
            Err(self.unreachable(MSG_WRONG_ADDRESS))
        }
    }

    /// `GET /status`: `room<N>` → 0/1.
    pub async fn status(&self) -> Result<RawPayload, AppError> {
        let url = format!("{}{}", self.base_url, PATH_STATUS);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        tracing::debug!("status: {}", body);
        payload::from_value(body)
    }

    /// `GET /<unit>/<on|off>`. Returns whether the device acknowledged.
    pub async fn switch(&self, unit: &str, on: bool) -> Result<bool, AppError> {
        let action = if on { "on" } else { "off" };
        let url = format!("{}/{}/{}", self.base_url, unit, action);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;
        let acked = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => payload::is_truthy(&value),
            Err(_) => !text.trim().is_empty(),
        };
        tracing::debug!("switch {} {} -> {:?} (acked: {})", unit, action, text, acked);
        Ok(acked)
    }

    fn unreachable(&self, message: &str) -> AppError {
        AppError::DeviceUnreachable {
            message: message.to_string(),
            address: self.address.to_string(),
        }
    }
}

async fn api_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::Api {
        message: format!("{}: {}", status, body),
        status: Some(status.as_u16()),
    }
}

#[async_trait]
impl BackingStore for DeviceClient {
    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Device
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            push: false,
            bulk_write: false,
        }
    }

    async fn fetch_all(&self) -> Result<RawPayload, AppError> {
        self.status().await
    }

    async fn write_one(&self, key: &str, on: bool) -> Result<bool, AppError> {
        self.switch(key, on).await
    }
}
