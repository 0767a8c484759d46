//! Job-lifecycle status engine.
//!
//! Every status change follows the same shape: write the immutable audit
//! record first, then update the job head to reference it, then push a
//! projection to the tenant channel. The audit trail is the source of
//! truth; a crash between the two writes leaves an extra audit record,
//! never a job head pointing at a record that does not exist.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::projection::QueueProjection;
use crate::model::{AuditId, JobId, QueueJob, QueueStatus, StatusAuditRecord};
use crate::sink::BroadcastSink;
use crate::store::{JobStatusUpdate, Store};

pub struct StatusEngine {
    store: Arc<dyn Store>,
    broadcast: Arc<dyn BroadcastSink>,
}

impl StatusEngine {
    pub fn new(store: Arc<dyn Store>, broadcast: Arc<dyn BroadcastSink>) -> Self {
        Self { store, broadcast }
    }

    /// Fetch a job together with its resolved audit history.
    pub async fn load_with_history(
        &self,
        id: JobId,
    ) -> Result<(QueueJob, Vec<StatusAuditRecord>)> {
        let job = self.store.job(id).await?;
        let history = self.store.audit_history(id).await?;
        Ok((job, history))
    }

    /// Advance one job to `status`.
    ///
    /// Any status may follow any non-terminal status; the progression is
    /// advisory, not an enforced automaton. Advancing an archived job is
    /// rejected before anything is written.
    pub async fn advance(
        &self,
        id: JobId,
        status: QueueStatus,
        detail: Option<String>,
        error: bool,
    ) -> Result<QueueJob> {
        let (mut job, mut history) = self.load_with_history(id).await?;
        if job.status.is_terminal() {
            return Err(Error::InvalidTransition {
                from: job.status,
                to: status,
            });
        }

        let record = StatusAuditRecord::for_job(&job, status, detail, error);
        self.store.insert_audit(&record).await?;
        self.store.append_job_audit(job.id, record.id, status).await?;

        apply_head(&mut job, &record);
        history.push(record);

        tracing::info!(job = %job.id, status = %job.status, "job status advanced");
        self.publish(&job, &history).await;
        Ok(job)
    }

    /// Advance many jobs to the same status in one pass.
    ///
    /// Audit records go in as one bulk insert, job heads as one bulk
    /// conditional update. When either bulk operation covers fewer jobs
    /// than asked, the jobs it did cover are still advanced and the rest
    /// are reported in [`Error::PartialBatch`]; results are paired back to
    /// jobs by record identity, never by position.
    pub async fn advance_batch(
        &self,
        ids: &[JobId],
        status: QueueStatus,
        detail: Option<String>,
        error: bool,
    ) -> Result<Vec<QueueJob>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Snapshot phase: any missing or archived job fails the whole
        // batch before a single write happens.
        let mut snapshots = Vec::with_capacity(ids.len());
        for &id in ids {
            let (job, history) = self.load_with_history(id).await?;
            if job.status.is_terminal() {
                return Err(Error::InvalidTransition {
                    from: job.status,
                    to: status,
                });
            }
            snapshots.push((job, history));
        }

        let records: Vec<StatusAuditRecord> = snapshots
            .iter()
            .map(|(job, _)| StatusAuditRecord::for_job(job, status, detail.clone(), error))
            .collect();
        let requested = records.len();

        let created = self.store.insert_audit_batch(&records).await?;
        let mut by_job: HashMap<JobId, StatusAuditRecord> =
            created.into_iter().map(|r| (r.job_id, r)).collect();

        let updates: Vec<JobStatusUpdate> = snapshots
            .iter()
            .filter_map(|(job, _)| {
                by_job.get(&job.id).map(|record| JobStatusUpdate {
                    job_id: job.id,
                    audit_id: record.id,
                    status: record.status,
                })
            })
            .collect();
        let matched = self.store.update_jobs(&updates).await?;
        // A short bulk update means some heads were never written. Only
        // then are the survivors identified by re-reading; the matched
        // count alone cannot say which jobs it covered.
        let verify_heads = (matched as usize) < updates.len();

        let mut advanced = Vec::with_capacity(updates.len());
        let mut missing = Vec::new();
        for (mut job, mut history) in snapshots {
            match by_job.remove(&job.id) {
                Some(record) => {
                    if verify_heads && !self.head_written(job.id, record.id).await? {
                        missing.push(job.id.to_string());
                        continue;
                    }
                    apply_head(&mut job, &record);
                    history.push(record);
                    self.publish(&job, &history).await;
                    advanced.push(job);
                }
                None => missing.push(job.id.to_string()),
            }
        }

        if missing.is_empty() {
            tracing::info!(count = advanced.len(), status = %status, "batch advanced");
            Ok(advanced)
        } else {
            tracing::warn!(
                requested,
                created = advanced.len(),
                missing = ?missing,
                "batch advanced partially"
            );
            Err(Error::PartialBatch {
                requested,
                created: advanced.len(),
                missing,
            })
        }
    }

    /// Whether a job's head references the given audit record.
    async fn head_written(&self, id: JobId, audit_id: AuditId) -> Result<bool> {
        Ok(self.store.job(id).await?.history.last() == Some(&audit_id))
    }

    /// Push the job projection to its tenant channel. Failures are logged,
    /// never surfaced; subscribers reconcile by re-fetching.
    async fn publish(&self, job: &QueueJob, history: &[StatusAuditRecord]) {
        let projection = QueueProjection::assemble(job, history);
        let payload = match serde_json::to_value(&projection) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(job = %job.id, error = %e, "projection serialization failed");
                return;
            }
        };
        if let Err(e) = self.broadcast.publish(&job.sub, payload).await {
            tracing::warn!(job = %job.id, channel = %job.sub, error = %e, "broadcast failed");
        }
    }
}

/// Mirror the store's head update on a local copy.
fn apply_head(job: &mut QueueJob, record: &StatusAuditRecord) {
    job.history.push(record.id);
    job.status = record.status;
    if record.status.is_terminal() {
        job.active = false;
    }
    job.updated_at = record.created_at;
}
