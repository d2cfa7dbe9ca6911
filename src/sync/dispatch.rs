use std::collections::BTreeMap;

use super::RoomSync;
use crate::error::AppError;
use crate::models::KeyScheme;

impl RoomSync {
    /// Ask the backend to switch one room. The local model is not patched:
    /// pull stores are re-fetched on a positive ack, push stores report the
    /// change back through the subscription.
    pub async fn toggle_room(&self, id: &str, on: bool) -> Result<(), AppError> {
        self.session.require()?;

        let scheme = self.store.key_scheme();
        let unit = scheme
            .unit(id)
            .ok_or_else(|| AppError::InvalidRoomKey(id.to_string()))?;
        let key = match scheme {
            KeyScheme::Device => unit.to_string(),
            KeyScheme::Realtime => id.to_string(),
        };

        let acked = self.store.write_one(&key, on).await?;
        if !acked {
            tracing::warn!("{} did not acknowledge switching {}", id, if on { "on" } else { "off" });
            return Err(AppError::WriteRejected(id.to_string()));
        }

        if !self.store.capabilities().push {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Set every known room at once. Only stores with an atomic multi-key
    /// write support this; the all-on flag flips immediately.
    pub async fn toggle_all(&self, on: bool) -> Result<usize, AppError> {
        self.session.require()?;

        if !self.store.capabilities().bulk_write {
            return Err(AppError::UnsupportedOperation(
                "switching all rooms at once (toggle rooms one at a time)".into(),
            ));
        }

        let updates: BTreeMap<String, bool> = self
            .snapshot()
            .rooms
            .ids()
            .map(|id| (id.to_string(), on))
            .collect();
        if updates.is_empty() {
            tracing::debug!("no rooms known, nothing to switch");
            return Ok(0);
        }

        self.store.write_many(&updates).await?;
        self.assume_all(on);
        Ok(updates.len())
    }
}
