//! Execution result recording.
//!
//! A finished task hands over a full report, payloads included. The
//! primary store only ever sees the redacted record; the complete report
//! goes to the backup sink under a project-scoped key. Primary-store
//! writes are never rolled back when the backup fails, and the live
//! broadcast goes out either way.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::projection::InstanceProjection;
use crate::model::{ExecutionRecord, ExecutionReport, Instance, InstanceId, StatId};
use crate::sink::{BackupSink, BroadcastSink};
use crate::store::Store;

const BACKUP_CATEGORY: &str = "instance-statistics";

/// Backup document: the full report plus the identifiers that key it.
#[derive(Serialize)]
struct BackupDoc<'a> {
    id: StatId,
    instance_id: InstanceId,
    #[serde(flatten)]
    report: &'a ExecutionReport,
}

pub struct ExecutionRecorder {
    store: Arc<dyn Store>,
    backup: Arc<dyn BackupSink>,
    broadcast: Arc<dyn BroadcastSink>,
}

impl ExecutionRecorder {
    pub fn new(
        store: Arc<dyn Store>,
        backup: Arc<dyn BackupSink>,
        broadcast: Arc<dyn BroadcastSink>,
    ) -> Self {
        Self {
            store,
            backup,
            broadcast,
        }
    }

    /// Persist the redacted record, attach it to its instance, back up the
    /// full report, and push the instance projection.
    ///
    /// A backup failure is surfaced as [`Error::BackupWrite`] after the
    /// broadcast; by then the record and instance update are durable and
    /// only the payload copy is missing.
    pub async fn record_execution(
        &self,
        instance_id: InstanceId,
        report: ExecutionReport,
    ) -> Result<ExecutionRecord> {
        let mut instance = self.store.instance(instance_id).await?;

        let record = report.redact(instance_id);
        self.store.insert_execution_record(&record).await?;
        self.store
            .append_instance_result(instance.id, record.id)
            .await?;
        instance.stats.push(record.id);
        instance.updated_at = record.created_at;

        tracing::info!(instance = %instance.id, record = %record.id, "execution recorded");

        let key = backup_key(&instance, record.id);
        let backup_result = self.write_backup(&key, &record, &report).await;

        self.publish(&instance).await;

        if let Err(e) = backup_result {
            tracing::warn!(key = %key, error = %e, "report backup failed");
            return Err(Error::BackupWrite {
                key,
                reason: e.to_string(),
            });
        }
        Ok(record)
    }

    async fn write_backup(
        &self,
        key: &str,
        record: &ExecutionRecord,
        report: &ExecutionReport,
    ) -> Result<()> {
        let doc = BackupDoc {
            id: record.id,
            instance_id: record.instance_id,
            report,
        };
        let body = serde_json::to_vec(&doc)
            .map_err(|e| Error::Persistence(format!("backup serialization failed: {e}")))?;
        self.backup.put(key, body).await
    }

    async fn publish(&self, instance: &Instance) {
        let projection = InstanceProjection::assemble(instance);
        let payload = match serde_json::to_value(&projection) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(instance = %instance.id, error = %e,
                    "projection serialization failed");
                return;
            }
        };
        if let Err(e) = self.broadcast.publish(&instance.sub, payload).await {
            tracing::warn!(instance = %instance.id, channel = %instance.sub, error = %e,
                "broadcast failed");
        }
    }
}

fn backup_key(instance: &Instance, record_id: StatId) -> String {
    format!(
        "{}/{}/{}/{}",
        instance.project_id, BACKUP_CATEGORY, instance.id, record_id
    )
}
