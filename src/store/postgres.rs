//! Postgres store backend.
//!
//! Durable twin of the in-memory backend. Audit/usage references live in
//! `uuid[]` columns on the owning document; the "push ref + set head"
//! update is a single `array_append` statement, and the batch path is one
//! `UNNEST`-driven conditional update rather than N sequential writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{
    ApiToken, AuditId, ExecutionRecord, Instance, InstanceId, JobId, OwnerRef, ProjectId,
    QueueJob, QueueStatus, RequestId, ResourceTotals, StatId, StatusAuditRecord, StorageAsset,
    StorageId, TaskId, TokenId, TotalsDelta, UsageEvent, UsageId, WorkflowId,
};
use crate::store::{JobStatusUpdate, Store};

/// Postgres-backed store. Owns the connection pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Persistence(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Simple health check.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_job(&self, job: &QueueJob) -> Result<()> {
        sqlx::query(
            "INSERT INTO queue_jobs (id, active, sub, instance_id, workflow_id, workflow_name, status, queue_type, date, storage_instance_id, history, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(job.id.0)
        .bind(job.active)
        .bind(&job.sub)
        .bind(job.instance_id.0)
        .bind(job.workflow_id.0)
        .bind(&job.workflow_name)
        .bind(job.status.as_str())
        .bind(job.queue_type.as_str())
        .bind(job.date)
        .bind(job.storage_instance_id.map(|id| id.0))
        .bind(job.history.iter().map(|id| id.0).collect::<Vec<Uuid>>())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn job(&self, id: JobId) -> Result<QueueJob> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT id, active, sub, instance_id, workflow_id, workflow_name, status, queue_type, date, storage_instance_id, history, created_at, updated_at
             FROM queue_jobs WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("job {id}")))?
            .try_into_job()
    }

    async fn append_job_audit(
        &self,
        id: JobId,
        audit_id: AuditId,
        status: QueueStatus,
    ) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE queue_jobs
             SET status = $2, history = array_append(history, $3),
                 active = active AND ($2 <> 'archived'), updated_at = now()
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(status.as_str())
        .bind(audit_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("job {id}")));
        }
        Ok(())
    }

    async fn update_jobs(&self, updates: &[JobStatusUpdate]) -> Result<u64> {
        if updates.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = updates.iter().map(|u| u.job_id.0).collect();
        let audit_ids: Vec<Uuid> = updates.iter().map(|u| u.audit_id.0).collect();
        let statuses: Vec<String> = updates.iter().map(|u| u.status.to_string()).collect();

        let rows_affected = sqlx::query(
            "UPDATE queue_jobs AS q
             SET status = u.status, history = array_append(q.history, u.audit_id),
                 active = q.active AND (u.status <> 'archived'), updated_at = now()
             FROM UNNEST($1::uuid[], $2::uuid[], $3::text[]) AS u(id, audit_id, status)
             WHERE q.id = u.id",
        )
        .bind(&ids)
        .bind(&audit_ids)
        .bind(&statuses)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    async fn insert_audit(&self, record: &StatusAuditRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO queue_audit (id, active, sub, job_id, instance_id, status, detail, error, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.id.0)
        .bind(record.active)
        .bind(&record.sub)
        .bind(record.job_id.0)
        .bind(record.instance_id.0)
        .bind(record.status.as_str())
        .bind(&record.detail)
        .bind(record.error)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_audit_batch(
        &self,
        records: &[StatusAuditRecord],
    ) -> Result<Vec<StatusAuditRecord>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        // One multi-row insert; the statement is atomic, so a failure
        // rolls back every row and the per-row fallback can retry from
        // the top while preserving the ordered partial contract.
        let bulk = sqlx::query(
            "INSERT INTO queue_audit (id, active, sub, job_id, instance_id, status, detail, error, created_at)
             SELECT * FROM UNNEST($1::uuid[], $2::bool[], $3::text[], $4::uuid[], $5::uuid[], $6::text[], $7::text[], $8::bool[], $9::timestamptz[])",
        )
        .bind(records.iter().map(|r| r.id.0).collect::<Vec<Uuid>>())
        .bind(records.iter().map(|r| r.active).collect::<Vec<bool>>())
        .bind(records.iter().map(|r| r.sub.clone()).collect::<Vec<String>>())
        .bind(records.iter().map(|r| r.job_id.0).collect::<Vec<Uuid>>())
        .bind(records.iter().map(|r| r.instance_id.0).collect::<Vec<Uuid>>())
        .bind(records.iter().map(|r| r.status.to_string()).collect::<Vec<String>>())
        .bind(records.iter().map(|r| r.detail.clone()).collect::<Vec<String>>())
        .bind(records.iter().map(|r| r.error).collect::<Vec<bool>>())
        .bind(records.iter().map(|r| r.created_at).collect::<Vec<DateTime<Utc>>>())
        .execute(&self.pool)
        .await;

        if let Err(e) = bulk {
            tracing::warn!(error = %e, "bulk audit insert failed, retrying row by row");
            let mut created = Vec::with_capacity(records.len());
            for record in records {
                match self.insert_audit(record).await {
                    Ok(()) => created.push(record.clone()),
                    Err(e) => {
                        tracing::warn!(record = %record.id, error = %e,
                            "bulk audit insert stopped");
                        if created.is_empty() {
                            return Err(e);
                        }
                        break;
                    }
                }
            }
            return Ok(created);
        }
        Ok(records.to_vec())
    }

    async fn audit_history(&self, job_id: JobId) -> Result<Vec<StatusAuditRecord>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            "SELECT id, active, sub, job_id, instance_id, status, detail, error, created_at
             FROM queue_audit WHERE job_id = $1 ORDER BY created_at ASC",
        )
        .bind(job_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::try_into_record).collect()
    }

    async fn insert_usage_batch(&self, events: &[UsageEvent]) -> Result<Vec<UsageEvent>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let bulk = sqlx::query(
            "INSERT INTO usage_events (id, active, sub, kind, direction, amount, unit, location, owner_kind, owner_id, detail, created_at)
             SELECT * FROM UNNEST($1::uuid[], $2::bool[], $3::text[], $4::text[], $5::text[], $6::bigint[], $7::text[], $8::text[], $9::text[], $10::uuid[], $11::text[], $12::timestamptz[])",
        )
        .bind(events.iter().map(|e| e.id.0).collect::<Vec<Uuid>>())
        .bind(events.iter().map(|e| e.active).collect::<Vec<bool>>())
        .bind(events.iter().map(|e| e.sub.clone()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| e.kind.to_string()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| e.direction.to_string()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| e.amount as i64).collect::<Vec<i64>>())
        .bind(events.iter().map(|e| e.unit.to_string()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| e.location.to_string()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| owner_parts(e.owner).0.to_string()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| owner_parts(e.owner).1).collect::<Vec<Uuid>>())
        .bind(events.iter().map(|e| e.detail.clone()).collect::<Vec<String>>())
        .bind(events.iter().map(|e| e.created_at).collect::<Vec<DateTime<Utc>>>())
        .execute(&self.pool)
        .await;

        if let Err(e) = bulk {
            tracing::warn!(error = %e, "bulk usage insert failed, retrying row by row");
            let mut created = Vec::with_capacity(events.len());
            for event in events {
                let (owner_kind, owner_id) = owner_parts(event.owner);
                let inserted = sqlx::query(
                    "INSERT INTO usage_events (id, active, sub, kind, direction, amount, unit, location, owner_kind, owner_id, detail, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                )
                .bind(event.id.0)
                .bind(event.active)
                .bind(&event.sub)
                .bind(event.kind.as_str())
                .bind(event.direction.as_str())
                .bind(event.amount as i64)
                .bind(event.unit.as_str())
                .bind(event.location.as_str())
                .bind(owner_kind)
                .bind(owner_id)
                .bind(&event.detail)
                .bind(event.created_at)
                .execute(&self.pool)
                .await;

                match inserted {
                    Ok(_) => created.push(event.clone()),
                    Err(e) => {
                        tracing::warn!(event = %event.id, error = %e,
                            "bulk usage insert stopped");
                        if created.is_empty() {
                            return Err(e.into());
                        }
                        break;
                    }
                }
            }
            return Ok(created);
        }
        Ok(events.to_vec())
    }

    async fn apply_usage(
        &self,
        owner: OwnerRef,
        refs: &[UsageId],
        delta: TotalsDelta,
    ) -> Result<()> {
        let ref_ids: Vec<Uuid> = refs.iter().map(|id| id.0).collect();
        let (sql, id) = match owner {
            OwnerRef::Instance(id) => (
                "UPDATE instances
                 SET usage = usage || $2::uuid[], total_bytes_up = total_bytes_up + $3,
                     total_bytes_down = total_bytes_down + $4, total_ms = total_ms + $5,
                     updated_at = now()
                 WHERE id = $1",
                id.0,
            ),
            OwnerRef::Storage(id) => (
                "UPDATE storage_assets
                 SET usage = usage || $2::uuid[], total_bytes_up = total_bytes_up + $3,
                     total_bytes_down = total_bytes_down + $4, total_ms = total_ms + $5,
                     updated_at = now()
                 WHERE id = $1",
                id.0,
            ),
        };

        let rows_affected = sqlx::query(sql)
            .bind(id)
            .bind(&ref_ids)
            .bind(delta.bytes_up as i64)
            .bind(delta.bytes_down as i64)
            .bind(delta.ms as i64)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("usage owner {owner}")));
        }
        Ok(())
    }

    async fn insert_instance(&self, instance: &Instance) -> Result<()> {
        sqlx::query(
            "INSERT INTO instances (id, active, sub, project_id, workflow_id, workflow_name, stats, usage, total_bytes_up, total_bytes_down, total_ms, queue_id, queue_type, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(instance.id.0)
        .bind(instance.active)
        .bind(&instance.sub)
        .bind(instance.project_id.0)
        .bind(instance.workflow_id.0)
        .bind(&instance.workflow_name)
        .bind(instance.stats.iter().map(|id| id.0).collect::<Vec<Uuid>>())
        .bind(
            instance
                .totals
                .usage
                .iter()
                .map(|id| id.0)
                .collect::<Vec<Uuid>>(),
        )
        .bind(instance.totals.total_bytes_up as i64)
        .bind(instance.totals.total_bytes_down as i64)
        .bind(instance.totals.total_ms as i64)
        .bind(instance.queue_id.map(|id| id.0))
        .bind(instance.queue_type.map(|t| t.as_str()))
        .bind(instance.created_at)
        .bind(instance.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn instance(&self, id: InstanceId) -> Result<Instance> {
        let row: Option<InstanceRow> = sqlx::query_as(
            "SELECT id, active, sub, project_id, workflow_id, workflow_name, stats, usage, total_bytes_up, total_bytes_down, total_ms, queue_id, queue_type, created_at, updated_at
             FROM instances WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("instance {id}")))?
            .try_into_instance()
    }

    async fn append_instance_result(&self, id: InstanceId, stat_id: StatId) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE instances SET stats = array_append(stats, $2), updated_at = now() WHERE id = $1",
        )
        .bind(id.0)
        .bind(stat_id.0)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("instance {id}")));
        }
        Ok(())
    }

    async fn insert_storage_asset(&self, asset: &StorageAsset) -> Result<()> {
        sqlx::query(
            "INSERT INTO storage_assets (id, active, sub, project_id, name, usage, total_bytes_up, total_bytes_down, total_ms, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(asset.id.0)
        .bind(asset.active)
        .bind(&asset.sub)
        .bind(asset.project_id.0)
        .bind(&asset.name)
        .bind(
            asset
                .totals
                .usage
                .iter()
                .map(|id| id.0)
                .collect::<Vec<Uuid>>(),
        )
        .bind(asset.totals.total_bytes_up as i64)
        .bind(asset.totals.total_bytes_down as i64)
        .bind(asset.totals.total_ms as i64)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn storage_asset(&self, id: StorageId) -> Result<StorageAsset> {
        let row: Option<AssetRow> = sqlx::query_as(
            "SELECT id, active, sub, project_id, name, usage, total_bytes_up, total_bytes_down, total_ms, created_at, updated_at
             FROM storage_assets WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .ok_or_else(|| Error::NotFound(format!("storage {id}")))?
            .into_asset())
    }

    async fn insert_execution_record(&self, record: &ExecutionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO execution_records (id, active, instance_id, task_id, task_field, request_id, request_name, request_type, status, status_text, start_time, end_time, duration_ms, request_size, response_size, response_type, error, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(record.id.0)
        .bind(record.active)
        .bind(record.instance_id.0)
        .bind(record.task_id.0)
        .bind(record.task_field.as_str())
        .bind(record.request_id.0)
        .bind(&record.request_name)
        .bind(&record.request_type)
        .bind(record.status as i32)
        .bind(&record.status_text)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.duration_ms as i64)
        .bind(record.request_size as i64)
        .bind(record.response_size as i64)
        .bind(&record.response_type)
        .bind(record.error)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn execution_record(&self, id: StatId) -> Result<ExecutionRecord> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT id, active, instance_id, task_id, task_field, request_id, request_name, request_type, status, status_text, start_time, end_time, duration_ms, request_size, response_size, response_type, error, created_at, updated_at
             FROM execution_records WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("execution record {id}")))?
            .try_into_record()
    }

    async fn insert_token(&self, token: &ApiToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO api_tokens (id, active, sub, snippet, hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(token.id.0)
        .bind(token.active)
        .bind(&token.sub)
        .bind(&token.snippet)
        .bind(&token.hash)
        .bind(token.created_at)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_token_by_snippet(&self, snippet: &str) -> Result<Option<ApiToken>> {
        let row: Option<TokenRow> = sqlx::query_as(
            "SELECT id, active, sub, snippet, hash, created_at, updated_at
             FROM api_tokens WHERE snippet = $1 AND active LIMIT 1",
        )
        .bind(snippet)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TokenRow::into_token))
    }
}

fn owner_parts(owner: OwnerRef) -> (&'static str, Uuid) {
    match owner {
        OwnerRef::Instance(id) => ("instance", id.0),
        OwnerRef::Storage(id) => ("storage", id.0),
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    active: bool,
    sub: String,
    instance_id: Uuid,
    workflow_id: Uuid,
    workflow_name: String,
    status: String,
    queue_type: String,
    date: DateTime<Utc>,
    storage_instance_id: Option<Uuid>,
    history: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobRow {
    fn try_into_job(self) -> Result<QueueJob> {
        Ok(QueueJob {
            id: JobId(self.id),
            active: self.active,
            sub: self.sub,
            instance_id: InstanceId(self.instance_id),
            workflow_id: WorkflowId(self.workflow_id),
            workflow_name: self.workflow_name,
            status: self.status.parse()?,
            queue_type: self.queue_type.parse()?,
            date: self.date,
            storage_instance_id: self.storage_instance_id.map(StorageId),
            history: self.history.into_iter().map(AuditId).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    active: bool,
    sub: String,
    job_id: Uuid,
    instance_id: Uuid,
    status: String,
    detail: String,
    error: bool,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn try_into_record(self) -> Result<StatusAuditRecord> {
        Ok(StatusAuditRecord {
            id: AuditId(self.id),
            active: self.active,
            sub: self.sub,
            job_id: JobId(self.job_id),
            instance_id: InstanceId(self.instance_id),
            status: self.status.parse()?,
            detail: self.detail,
            error: self.error,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InstanceRow {
    id: Uuid,
    active: bool,
    sub: String,
    project_id: Uuid,
    workflow_id: Uuid,
    workflow_name: String,
    stats: Vec<Uuid>,
    usage: Vec<Uuid>,
    total_bytes_up: i64,
    total_bytes_down: i64,
    total_ms: i64,
    queue_id: Option<Uuid>,
    queue_type: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InstanceRow {
    fn try_into_instance(self) -> Result<Instance> {
        Ok(Instance {
            id: InstanceId(self.id),
            active: self.active,
            sub: self.sub,
            project_id: ProjectId(self.project_id),
            workflow_id: WorkflowId(self.workflow_id),
            workflow_name: self.workflow_name,
            stats: self.stats.into_iter().map(StatId).collect(),
            totals: ResourceTotals {
                usage: self.usage.into_iter().map(UsageId).collect(),
                total_bytes_up: self.total_bytes_up as u64,
                total_bytes_down: self.total_bytes_down as u64,
                total_ms: self.total_ms as u64,
            },
            queue_id: self.queue_id.map(JobId),
            queue_type: self.queue_type.map(|t| t.parse()).transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    active: bool,
    sub: String,
    project_id: Uuid,
    name: String,
    usage: Vec<Uuid>,
    total_bytes_up: i64,
    total_bytes_down: i64,
    total_ms: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AssetRow {
    fn into_asset(self) -> StorageAsset {
        StorageAsset {
            id: StorageId(self.id),
            active: self.active,
            sub: self.sub,
            project_id: ProjectId(self.project_id),
            name: self.name,
            totals: ResourceTotals {
                usage: self.usage.into_iter().map(UsageId).collect(),
                total_bytes_up: self.total_bytes_up as u64,
                total_bytes_down: self.total_bytes_down as u64,
                total_ms: self.total_ms as u64,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    active: bool,
    instance_id: Uuid,
    task_id: Uuid,
    task_field: String,
    request_id: Uuid,
    request_name: String,
    request_type: String,
    status: i32,
    status_text: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_ms: i64,
    request_size: i64,
    response_size: i64,
    response_type: String,
    error: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn try_into_record(self) -> Result<ExecutionRecord> {
        Ok(ExecutionRecord {
            id: StatId(self.id),
            active: self.active,
            instance_id: InstanceId(self.instance_id),
            task_id: TaskId(self.task_id),
            task_field: self.task_field.parse()?,
            request_id: RequestId(self.request_id),
            request_name: self.request_name,
            request_type: self.request_type,
            status: self.status as u16,
            status_text: self.status_text,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_ms: self.duration_ms as u64,
            request_size: self.request_size as u64,
            response_size: self.response_size as u64,
            response_type: self.response_type,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: Uuid,
    active: bool,
    sub: String,
    snippet: String,
    hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TokenRow {
    fn into_token(self) -> ApiToken {
        ApiToken {
            id: TokenId(self.id),
            active: self.active,
            sub: self.sub,
            snippet: self.snippet,
            hash: self.hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
