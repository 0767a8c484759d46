//! Recording sink implementations for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::sink::{BackupSink, BroadcastSink};

/// Broadcast sink that records every published message.
#[derive(Default)]
pub struct MemoryBroadcast {
    published: RwLock<Vec<(String, serde_json::Value)>>,
    failing: AtomicBool,
}

impl MemoryBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published messages in publish order.
    pub async fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.read().await.clone()
    }

    /// Messages published to one channel.
    pub async fn on_channel(&self, channel: &str) -> Vec<serde_json::Value> {
        self.published
            .read()
            .await
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Make every subsequent publish fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

#[async_trait]
impl BroadcastSink for MemoryBroadcast {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Error::Persistence("injected broadcast failure".into()));
        }
        self.published
            .write()
            .await
            .push((channel.to_string(), payload));
        Ok(())
    }
}

/// Backup sink backed by an in-memory object map.
#[derive(Default)]
pub struct MemoryBackup {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryBackup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Make every subsequent put fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

#[async_trait]
impl BackupSink for MemoryBackup {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Error::Persistence("injected backup failure".into()));
        }
        self.objects.write().await.insert(key.to_string(), body);
        Ok(())
    }
}
