//! Broadcast payload projections.
//!
//! Subscribers receive these over the tenant channel on every state
//! change. Projections carry mutable bookkeeping fields and audit history
//! only — execution payloads never ride the broadcast. The live push is a
//! hint, not the source of truth; subscribers reconcile by re-fetching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AuditId, Instance, InstanceId, JobId, ProjectId, QueueJob, QueueStatus, QueueType, StatId,
    StatusAuditRecord, StorageId, WorkflowId,
};

/// Live view of a queue job pushed to its tenant channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueProjection {
    pub id: JobId,
    pub active: bool,
    pub status: QueueStatus,
    pub queue_type: QueueType,
    pub instance_id: InstanceId,
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub storage_instance_id: Option<StorageId>,
    pub date: DateTime<Utc>,
    pub history: Vec<AuditProjection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueProjection {
    /// Assemble from a job and its resolved audit history. In the batch
    /// path the history is a pre-bulk snapshot plus the new record and
    /// may be stale for concurrently mutated fields.
    pub fn assemble(job: &QueueJob, history: &[StatusAuditRecord]) -> Self {
        Self {
            id: job.id,
            active: job.active,
            status: job.status,
            queue_type: job.queue_type,
            instance_id: job.instance_id,
            workflow_id: job.workflow_id,
            workflow_name: job.workflow_name.clone(),
            storage_instance_id: job.storage_instance_id,
            date: job.date,
            history: history.iter().map(AuditProjection::from).collect(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Whitelisted view of one audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditProjection {
    pub id: AuditId,
    pub active: bool,
    pub status: QueueStatus,
    pub detail: String,
    pub error: bool,
    pub job_id: JobId,
    pub instance_id: InstanceId,
    pub created_at: DateTime<Utc>,
}

impl From<&StatusAuditRecord> for AuditProjection {
    fn from(record: &StatusAuditRecord) -> Self {
        Self {
            id: record.id,
            active: record.active,
            status: record.status,
            detail: record.detail.clone(),
            error: record.error,
            job_id: record.job_id,
            instance_id: record.instance_id,
            created_at: record.created_at,
        }
    }
}

/// Live view of an instance: result references and running totals only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceProjection {
    pub id: InstanceId,
    pub active: bool,
    pub project_id: ProjectId,
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub stats: Vec<StatId>,
    pub total_bytes_up: u64,
    pub total_bytes_down: u64,
    pub total_ms: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InstanceProjection {
    pub fn assemble(instance: &Instance) -> Self {
        Self {
            id: instance.id,
            active: instance.active,
            project_id: instance.project_id,
            workflow_id: instance.workflow_id,
            workflow_name: instance.workflow_name.clone(),
            stats: instance.stats.clone(),
            total_bytes_up: instance.totals.total_bytes_up,
            total_bytes_down: instance.totals.total_bytes_down,
            total_ms: instance.totals.total_ms,
            created_at: instance.created_at,
            updated_at: instance.updated_at,
        }
    }
}
