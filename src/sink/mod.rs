//! Outbound side channels.
//!
//! Two seams sit next to the primary store: a live broadcast for
//! subscribers and a durable backup for full execution reports. Broadcast
//! delivery is fire-and-forget; backup delivery is not, because the backup
//! is the only place payload-bearing reports survive.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

/// Pushes state-change payloads to live subscribers.
///
/// Channels are tenant-scoped. Delivery is best effort; callers log
/// failures and move on, so an implementation must never be required for
/// correctness.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()>;
}

/// Writes full execution reports to durable secondary storage.
///
/// Keys follow `{projectId}/{category}/{ownerId}/{recordId}` so one
/// project's reports share a prefix and can be enumerated or expired
/// together.
#[async_trait]
pub trait BackupSink: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()>;
}
