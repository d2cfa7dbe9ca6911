use chrono::Utc;
use clap::Args;
use dialoguer::Input;
use serde_json::json;
use uuid::Uuid;

use crate::api::device_client::DeviceClient;
use crate::api::realtime::RealtimeClient;
use crate::cli::output::print_json;
use crate::config::RuntimeConfig;
use crate::error::AppError;
use crate::models::payload::LOGGED_IN_USERS_KEY;
use crate::session::context::parse_device_address;
use crate::session::{ConnectionContext, SessionFile};

#[derive(Args)]
pub struct ConnectArgs {
    /// Controller IP address (optionally with :port); prompted when omitted
    #[arg(conflicts_with = "store")]
    pub address: Option<String>,

    /// Realtime store URL instead of a local controller
    #[arg(long)]
    pub store: Option<String>,

    /// Store auth token
    #[arg(long, requires = "store", env = "ROOMCTL_STORE_AUTH", hide_env_values = true)]
    pub auth: Option<String>,
}

pub async fn handle_connect(args: &ConnectArgs, config: &RuntimeConfig) -> Result<(), AppError> {
    let session = SessionFile::new(&config.session_file);

    if let Some(store_url) = &args.store {
        return connect_store(store_url, args.auth.clone(), &session).await;
    }

    let input = match &args.address {
        Some(address) => address.clone(),
        None => Input::<String>::new()
            .with_prompt("Device IP address")
            .validate_with(|input: &String| -> Result<(), String> {
                parse_device_address(input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?,
    };
    let address = parse_device_address(&input)?;

    DeviceClient::new(address)?.check().await?;

    session.store(&ConnectionContext::Device { address })?;
    print_json(&json!({"status": "connected", "device": address.to_string()}));
    Ok(())
}

async fn connect_store(
    store_url: &str,
    auth: Option<String>,
    session: &SessionFile,
) -> Result<(), AppError> {
    let client = RealtimeClient::new(store_url, auth.clone())?;
    client.probe().await?;

    if let Err(e) = client.adjust_counter(LOGGED_IN_USERS_KEY, 1).await {
        tracing::warn!("Could not update {}: {}", LOGGED_IN_USERS_KEY, e);
    }

    let session_id = Uuid::new_v4().to_string();
    let ctx = ConnectionContext::User {
        store_url: store_url.trim_end_matches('/').to_string(),
        auth,
        session_id: session_id.clone(),
        connected_at: Utc::now(),
    };
    session.store(&ctx)?;

    print_json(&json!({
        "status": "connected",
        "store": ctx.target(),
        "session_id": session_id,
    }));
    Ok(())
}

pub async fn handle_disconnect(config: &RuntimeConfig) -> Result<(), AppError> {
    let session = SessionFile::new(&config.session_file);

    if let Some(ConnectionContext::User {
        store_url, auth, ..
    }) = session.load()?
    {
        // Counter update is best-effort; the marker is cleared regardless.
        match RealtimeClient::new(&store_url, auth) {
            Ok(client) => {
                if let Err(e) = client.adjust_counter(LOGGED_IN_USERS_KEY, -1).await {
                    tracing::warn!("Could not update {}: {}", LOGGED_IN_USERS_KEY, e);
                }
            }
            Err(e) => tracing::warn!("Could not reach store: {}", e),
        }
    }

    session.clear()?;
    print_json(&json!({"status": "disconnected"}));
    Ok(())
}

pub async fn handle_status(config: &RuntimeConfig) -> Result<(), AppError> {
    let session = SessionFile::new(&config.session_file);
    match session.load()? {
        Some(ConnectionContext::Device { address }) => print_json(&json!({
            "status": "connected",
            "backend": "device",
            "device": address.to_string(),
        })),
        Some(ConnectionContext::User {
            store_url,
            session_id,
            connected_at,
            ..
        }) => print_json(&json!({
            "status": "connected",
            "backend": "realtime",
            "store": store_url,
            "session_id": session_id,
            "connected_at": connected_at,
        })),
        None => print_json(&json!({"status": "not_connected"})),
    }
    Ok(())
}
