//! Persistence store contract.
//!
//! The engine never owns a database — it is handed a [`Store`] trait
//! object. Collections are typed, bulk inserts return the created subset
//! in request order, and aggregate mutations are atomic push/increment
//! operations issued by the store, never read-modify-write on whole
//! documents (that would reintroduce lost updates under concurrency).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    ApiToken, AuditId, ExecutionRecord, Instance, InstanceId, JobId, OwnerRef, QueueJob,
    QueueStatus, StatId, StatusAuditRecord, StorageAsset, StorageId, TotalsDelta, UsageEvent,
    UsageId,
};

/// One entry of a bulk conditional job update: filter by id, set the
/// status head, push the new audit reference.
#[derive(Debug, Clone)]
pub struct JobStatusUpdate {
    pub job_id: JobId,
    pub audit_id: AuditId,
    pub status: QueueStatus,
}

#[async_trait]
pub trait Store: Send + Sync {
    // -----------------------------------------------------------------------
    // Queue jobs
    // -----------------------------------------------------------------------

    async fn insert_job(&self, job: &QueueJob) -> Result<()>;

    async fn job(&self, id: JobId) -> Result<QueueJob>;

    /// Atomic head update: push the audit reference and set the status in
    /// one per-document operation, clearing `active` when the status is
    /// terminal. The audit record must already be persisted.
    async fn append_job_audit(&self, id: JobId, audit_id: AuditId, status: QueueStatus)
    -> Result<()>;

    /// One bulk conditional update over many jobs. Returns the number of
    /// jobs matched; each entry is an independent atomic per-document
    /// update, not a transaction.
    async fn update_jobs(&self, updates: &[JobStatusUpdate]) -> Result<u64>;

    // -----------------------------------------------------------------------
    // Audit records
    // -----------------------------------------------------------------------

    async fn insert_audit(&self, record: &StatusAuditRecord) -> Result<()>;

    /// Bulk insert. Returns the created records in request order; the
    /// result may be shorter than the request on partial failure, so
    /// callers must pair results back by record identity, never position.
    async fn insert_audit_batch(
        &self,
        records: &[StatusAuditRecord],
    ) -> Result<Vec<StatusAuditRecord>>;

    /// Full history for a job, ordered by creation time.
    async fn audit_history(&self, job_id: JobId) -> Result<Vec<StatusAuditRecord>>;

    // -----------------------------------------------------------------------
    // Usage events
    // -----------------------------------------------------------------------

    /// Bulk insert with the same partial-failure contract as
    /// [`Store::insert_audit_batch`].
    async fn insert_usage_batch(&self, events: &[UsageEvent]) -> Result<Vec<UsageEvent>>;

    /// Atomic owner update: push the applied references and increment the
    /// matching running totals in a single write.
    async fn apply_usage(&self, owner: OwnerRef, refs: &[UsageId], delta: TotalsDelta)
    -> Result<()>;

    // -----------------------------------------------------------------------
    // Instances and storage assets
    // -----------------------------------------------------------------------

    async fn insert_instance(&self, instance: &Instance) -> Result<()>;

    async fn instance(&self, id: InstanceId) -> Result<Instance>;

    /// Atomic push of an execution-record reference onto an instance.
    async fn append_instance_result(&self, id: InstanceId, stat_id: StatId) -> Result<()>;

    async fn insert_storage_asset(&self, asset: &StorageAsset) -> Result<()>;

    async fn storage_asset(&self, id: StorageId) -> Result<StorageAsset>;

    // -----------------------------------------------------------------------
    // Execution records
    // -----------------------------------------------------------------------

    async fn insert_execution_record(&self, record: &ExecutionRecord) -> Result<()>;

    async fn execution_record(&self, id: StatId) -> Result<ExecutionRecord>;

    // -----------------------------------------------------------------------
    // API tokens
    // -----------------------------------------------------------------------

    async fn insert_token(&self, token: &ApiToken) -> Result<()>;

    /// Active-token lookup by snippet. The snippet narrows the search;
    /// it is not the security check.
    async fn find_token_by_snippet(&self, snippet: &str) -> Result<Option<ApiToken>>;
}
