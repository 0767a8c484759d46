use chrono::Utc;

use runledger::model::{
    Instance, InstanceId, OwnerRef, ProjectId, QueueJob, QueueStatus, QueueType,
    StatusAuditRecord, TotalsDelta, UsageEvent, UsageDirection, UsageKind, UsageLocation,
    UsageUnit, WorkflowId,
};
use runledger::store::postgres::PgStore;
use runledger::store::{JobStatusUpdate, Store};

async fn connect() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&url).await.expect("connect");
    store.migrate().await.expect("migrate");
    store
}

fn sample_job(sub: &str) -> QueueJob {
    QueueJob::new(
        sub,
        InstanceId::new(),
        WorkflowId::new(),
        "Sample Workflow",
        QueueType::Queue,
        Utc::now(),
    )
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn job_roundtrip_and_audit_append() {
    let store = connect().await;
    let job = sample_job("tenant-pg");
    store.insert_job(&job).await.unwrap();

    let record = StatusAuditRecord::for_job(&job, QueueStatus::Queued, None, false);
    store.insert_audit(&record).await.unwrap();
    store
        .append_job_audit(job.id, record.id, QueueStatus::Queued)
        .await
        .unwrap();

    let stored = store.job(job.id).await.unwrap();
    assert_eq!(stored.status, QueueStatus::Queued);
    assert_eq!(stored.history, vec![record.id]);
    assert!(stored.active);

    let history = store.audit_history(job.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn archival_clears_active_flag() {
    let store = connect().await;
    let job = sample_job("tenant-pg");
    store.insert_job(&job).await.unwrap();

    let record = StatusAuditRecord::for_job(&job, QueueStatus::Archived, None, false);
    store.insert_audit(&record).await.unwrap();
    store
        .append_job_audit(job.id, record.id, QueueStatus::Archived)
        .await
        .unwrap();

    let stored = store.job(job.id).await.unwrap();
    assert_eq!(stored.status, QueueStatus::Archived);
    assert!(!stored.active);
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn bulk_update_matches_each_listed_job() {
    let store = connect().await;
    let jobs: Vec<QueueJob> = (0..3).map(|_| sample_job("tenant-pg")).collect();
    let mut updates = Vec::new();
    for job in &jobs {
        store.insert_job(job).await.unwrap();
        let record = StatusAuditRecord::for_job(job, QueueStatus::Queued, None, false);
        store.insert_audit(&record).await.unwrap();
        updates.push(JobStatusUpdate {
            job_id: job.id,
            audit_id: record.id,
            status: QueueStatus::Queued,
        });
    }

    let matched = store.update_jobs(&updates).await.unwrap();
    assert_eq!(matched, 3);

    for update in &updates {
        let stored = store.job(update.job_id).await.unwrap();
        assert_eq!(stored.status, QueueStatus::Queued);
        assert_eq!(stored.history, vec![update.audit_id]);
    }
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn bulk_audit_insert_creates_every_record() {
    let store = connect().await;
    let job = sample_job("tenant-pg");
    store.insert_job(&job).await.unwrap();

    let records: Vec<StatusAuditRecord> =
        [QueueStatus::Queued, QueueStatus::Running, QueueStatus::Complete]
            .into_iter()
            .map(|status| StatusAuditRecord::for_job(&job, status, None, false))
            .collect();

    let created = store.insert_audit_batch(&records).await.unwrap();
    assert_eq!(created.len(), 3);
    assert_eq!(store.audit_history(job.id).await.unwrap().len(), 3);
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn usage_push_and_increment_is_atomic_per_owner() {
    let store = connect().await;
    let instance = Instance::new("tenant-pg", ProjectId::new(), WorkflowId::new(), "Sample");
    store.insert_instance(&instance).await.unwrap();
    let owner = OwnerRef::Instance(instance.id);

    let event = UsageEvent::new(
        "tenant-pg",
        owner,
        UsageKind::Request,
        UsageDirection::Up,
        512,
        UsageUnit::Byte,
        UsageLocation::Instance,
    );
    let created = store.insert_usage_batch(&[event.clone()]).await.unwrap();
    assert_eq!(created.len(), 1);

    store
        .apply_usage(
            owner,
            &[event.id],
            TotalsDelta {
                bytes_up: 512,
                bytes_down: 0,
                ms: 0,
            },
        )
        .await
        .unwrap();

    let stored = store.instance(instance.id).await.unwrap();
    assert_eq!(stored.totals.total_bytes_up, 512);
    assert_eq!(stored.totals.usage, vec![event.id]);
}
