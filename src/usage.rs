//! Usage accounting.
//!
//! Usage events are immutable facts; the owning resource carries
//! denormalized running totals for fast reads. A batch is folded into one
//! delta and applied to the owner in a single atomic push/increment, so
//! the totals always equal the fold of exactly the referenced events.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{OwnerRef, TotalsDelta, UsageEvent, UsageId};
use crate::store::Store;

pub struct UsageAccumulator {
    store: Arc<dyn Store>,
}

impl UsageAccumulator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record a batch of usage events against one owner and fold them into
    /// the owner's running totals.
    ///
    /// Only events the store actually created are folded. On partial
    /// creation the created subset is still applied and the rest reported
    /// in [`Error::PartialBatch`]; an event is never totalled without its
    /// reference being listed, and never listed without being totalled.
    pub async fn apply_usage(
        &self,
        owner: OwnerRef,
        events: Vec<UsageEvent>,
    ) -> Result<Vec<UsageEvent>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let requested = events.len();

        let created = self.store.insert_usage_batch(&events).await?;

        let mut delta = TotalsDelta::default();
        let mut refs: Vec<UsageId> = Vec::with_capacity(created.len());
        for event in &created {
            delta.add(event);
            refs.push(event.id);
        }
        self.store.apply_usage(owner, &refs, delta).await?;

        tracing::debug!(
            owner = %owner,
            events = created.len(),
            bytes_up = delta.bytes_up,
            bytes_down = delta.bytes_down,
            ms = delta.ms,
            "usage applied"
        );

        if created.len() < requested {
            let applied: HashSet<UsageId> = created.iter().map(|e| e.id).collect();
            let missing: Vec<String> = events
                .iter()
                .filter(|e| !applied.contains(&e.id))
                .map(|e| e.id.to_string())
                .collect();
            tracing::warn!(requested, created = created.len(), missing = ?missing,
                "usage batch applied partially");
            return Err(Error::PartialBatch {
                requested,
                created: created.len(),
                missing,
            });
        }

        Ok(created)
    }
}
