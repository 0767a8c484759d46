//! In-memory store backend.
//!
//! Twin of the Postgres backend for tests and local development. Audit and
//! usage collections are append-only vectors, so creation order is the
//! iteration order. Carries fault injection so partial bulk failures and
//! the pairing-by-identity rule are testable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::{
    ApiToken, AuditId, ExecutionRecord, Instance, InstanceId, JobId, OwnerRef, QueueJob,
    QueueStatus, StatId, StatusAuditRecord, StorageAsset, StorageId, TokenId, TotalsDelta,
    UsageEvent, UsageId,
};
use crate::store::{JobStatusUpdate, Store};

#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<JobId, QueueJob>>,
    audits: RwLock<Vec<StatusAuditRecord>>,
    usage: RwLock<Vec<UsageEvent>>,
    instances: RwLock<HashMap<InstanceId, Instance>>,
    storage_assets: RwLock<HashMap<StorageId, StorageAsset>>,
    records: RwLock<HashMap<StatId, ExecutionRecord>>,
    tokens: RwLock<HashMap<TokenId, ApiToken>>,
    /// Request indices the next bulk insert silently drops.
    skip_next_bulk: Mutex<Vec<usize>>,
    /// Entry indices the next bulk update silently leaves unmatched.
    skip_next_update: Mutex<Vec<usize>>,
    token_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next bulk insert drop the given request indices,
    /// simulating a backend that created fewer records than asked.
    pub fn skip_next_bulk_insert(&self, indices: Vec<usize>) {
        *self.skip_next_bulk.lock().unwrap_or_else(|e| e.into_inner()) = indices;
    }

    /// Make the next bulk conditional update skip the given entry
    /// indices, simulating a backend that matched fewer jobs than asked.
    pub fn skip_next_bulk_update(&self, indices: Vec<usize>) {
        *self
            .skip_next_update
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = indices;
    }

    /// Number of token lookups performed. Lets tests assert that the
    /// credential format gate runs before any store access.
    pub fn token_lookups(&self) -> usize {
        self.token_lookups.load(Ordering::Relaxed)
    }

    fn take_skips(&self) -> Vec<usize> {
        std::mem::take(&mut *self.skip_next_bulk.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn take_update_skips(&self) -> Vec<usize> {
        std::mem::take(
            &mut *self
                .skip_next_update
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        )
    }

    fn apply_head_update(job: &mut QueueJob, audit_id: AuditId, status: QueueStatus) {
        job.history.push(audit_id);
        job.status = status;
        if status.is_terminal() {
            job.active = false;
        }
        job.updated_at = Utc::now();
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_job(&self, job: &QueueJob) -> Result<()> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn job(&self, id: JobId) -> Result<QueueJob> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {id}")))
    }

    async fn append_job_audit(
        &self,
        id: JobId,
        audit_id: AuditId,
        status: QueueStatus,
    ) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("job {id}")))?;
        Self::apply_head_update(job, audit_id, status);
        Ok(())
    }

    async fn update_jobs(&self, updates: &[JobStatusUpdate]) -> Result<u64> {
        let skips = self.take_update_skips();
        let mut jobs = self.jobs.write().await;
        let mut matched = 0;
        for (idx, update) in updates.iter().enumerate() {
            if skips.contains(&idx) {
                continue;
            }
            if let Some(job) = jobs.get_mut(&update.job_id) {
                Self::apply_head_update(job, update.audit_id, update.status);
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn insert_audit(&self, record: &StatusAuditRecord) -> Result<()> {
        self.audits.write().await.push(record.clone());
        Ok(())
    }

    async fn insert_audit_batch(
        &self,
        records: &[StatusAuditRecord],
    ) -> Result<Vec<StatusAuditRecord>> {
        let skips = self.take_skips();
        let mut audits = self.audits.write().await;
        let mut created = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if skips.contains(&idx) {
                continue;
            }
            audits.push(record.clone());
            created.push(record.clone());
        }
        Ok(created)
    }

    async fn audit_history(&self, job_id: JobId) -> Result<Vec<StatusAuditRecord>> {
        Ok(self
            .audits
            .read()
            .await
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn insert_usage_batch(&self, events: &[UsageEvent]) -> Result<Vec<UsageEvent>> {
        let skips = self.take_skips();
        let mut usage = self.usage.write().await;
        let mut created = Vec::with_capacity(events.len());
        for (idx, event) in events.iter().enumerate() {
            if skips.contains(&idx) {
                continue;
            }
            usage.push(event.clone());
            created.push(event.clone());
        }
        Ok(created)
    }

    async fn apply_usage(
        &self,
        owner: OwnerRef,
        refs: &[UsageId],
        delta: TotalsDelta,
    ) -> Result<()> {
        match owner {
            OwnerRef::Instance(id) => {
                let mut instances = self.instances.write().await;
                let instance = instances
                    .get_mut(&id)
                    .ok_or_else(|| Error::NotFound(format!("instance {id}")))?;
                instance.totals.apply(refs, delta);
                instance.updated_at = Utc::now();
            }
            OwnerRef::Storage(id) => {
                let mut assets = self.storage_assets.write().await;
                let asset = assets
                    .get_mut(&id)
                    .ok_or_else(|| Error::NotFound(format!("storage {id}")))?;
                asset.totals.apply(refs, delta);
                asset.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn insert_instance(&self, instance: &Instance) -> Result<()> {
        self.instances
            .write()
            .await
            .insert(instance.id, instance.clone());
        Ok(())
    }

    async fn instance(&self, id: InstanceId) -> Result<Instance> {
        self.instances
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("instance {id}")))
    }

    async fn append_instance_result(&self, id: InstanceId, stat_id: StatId) -> Result<()> {
        let mut instances = self.instances.write().await;
        let instance = instances
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("instance {id}")))?;
        instance.stats.push(stat_id);
        instance.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_storage_asset(&self, asset: &StorageAsset) -> Result<()> {
        self.storage_assets
            .write()
            .await
            .insert(asset.id, asset.clone());
        Ok(())
    }

    async fn storage_asset(&self, id: StorageId) -> Result<StorageAsset> {
        self.storage_assets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("storage {id}")))
    }

    async fn insert_execution_record(&self, record: &ExecutionRecord) -> Result<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn execution_record(&self, id: StatId) -> Result<ExecutionRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("execution record {id}")))
    }

    async fn insert_token(&self, token: &ApiToken) -> Result<()> {
        self.tokens.write().await.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_token_by_snippet(&self, snippet: &str) -> Result<Option<ApiToken>> {
        self.token_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .find(|t| t.active && t.snippet == snippet)
            .cloned())
    }
}
