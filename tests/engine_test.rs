use std::sync::Arc;

use chrono::Utc;

use runledger::engine::StatusEngine;
use runledger::error::Error;
use runledger::model::{InstanceId, QueueJob, QueueStatus, QueueType, WorkflowId};
use runledger::sink::memory::MemoryBroadcast;
use runledger::store::Store;
use runledger::store::memory::MemoryStore;

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

fn setup() -> (Arc<MemoryStore>, Arc<MemoryBroadcast>, StatusEngine) {
    let store = Arc::new(MemoryStore::new());
    let broadcast = Arc::new(MemoryBroadcast::new());
    let engine = StatusEngine::new(store.clone(), broadcast.clone());
    (store, broadcast, engine)
}

#[tokio::test]
async fn advance_appends_audit_records_in_order() {
    let (store, _, engine) = setup();
    let job = sample_job("tenant-a");
    let id = job.id;
    store.insert_job(&job).await.unwrap();

    engine
        .advance(id, QueueStatus::Queued, None, false)
        .await
        .unwrap();
    engine
        .advance(id, QueueStatus::Running, Some("worker-3".into()), false)
        .await
        .unwrap();
    let advanced = engine
        .advance(id, QueueStatus::Complete, None, false)
        .await
        .unwrap();

    assert_eq!(advanced.status, QueueStatus::Complete);
    assert!(advanced.active);
    assert_eq!(advanced.history.len(), 3);

    let stored = store.job(id).await.unwrap();
    assert_eq!(stored.status, QueueStatus::Complete);
    assert_eq!(stored.history, advanced.history);

    let history = store.audit_history(id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history.iter().map(|r| r.status).collect::<Vec<_>>(),
        vec![
            QueueStatus::Queued,
            QueueStatus::Running,
            QueueStatus::Complete
        ]
    );
    assert_eq!(history[1].detail, "worker-3");
    // head always references the newest audit record
    assert_eq!(stored.history.last(), Some(&history[2].id));
    assert_eq!(stored.status, history[2].status);
}

#[tokio::test]
async fn advance_publishes_projection_on_tenant_channel() {
    let (store, broadcast, engine) = setup();
    let job = sample_job("tenant-b");
    let id = job.id;
    store.insert_job(&job).await.unwrap();

    engine
        .advance(id, QueueStatus::Running, None, false)
        .await
        .unwrap();

    let messages = broadcast.on_channel("tenant-b").await;
    assert_eq!(messages.len(), 1);
    let payload = messages[0].as_object().unwrap();
    assert_eq!(payload["status"], "running");
    assert_eq!(payload["id"], serde_json::json!(id));
    assert_eq!(payload["history"].as_array().unwrap().len(), 1);
    assert!(!payload.contains_key("request_payload"));
    assert!(!payload.contains_key("response_payload"));
    assert!(!payload.contains_key("headers"));
}

#[tokio::test]
async fn archived_jobs_reject_further_advances() {
    let (store, _, engine) = setup();
    let job = sample_job("tenant-a");
    let id = job.id;
    store.insert_job(&job).await.unwrap();

    let archived = engine
        .advance(id, QueueStatus::Archived, None, false)
        .await
        .unwrap();
    assert!(!archived.active);

    let err = engine
        .advance(id, QueueStatus::Running, None, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: QueueStatus::Archived,
            to: QueueStatus::Running
        }
    ));

    // the rejected advance wrote nothing
    let history = store.audit_history(id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn advance_unknown_job_is_not_found() {
    let (_, _, engine) = setup();
    let err = engine
        .advance(
            runledger::model::JobId::new(),
            QueueStatus::Queued,
            None,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn broadcast_failure_does_not_fail_the_advance() {
    let (store, broadcast, engine) = setup();
    let job = sample_job("tenant-a");
    let id = job.id;
    store.insert_job(&job).await.unwrap();

    broadcast.set_failing(true);
    let advanced = engine
        .advance(id, QueueStatus::Queued, None, false)
        .await
        .unwrap();
    assert_eq!(advanced.status, QueueStatus::Queued);

    // the primary write happened despite the dead channel
    assert_eq!(store.job(id).await.unwrap().status, QueueStatus::Queued);
    assert!(broadcast.published().await.is_empty());
}

#[tokio::test]
async fn batch_advances_every_job_with_its_own_record() {
    let (store, broadcast, engine) = setup();
    let jobs: Vec<QueueJob> = (0..3).map(|_| sample_job("tenant-a")).collect();
    let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
    for job in &jobs {
        store.insert_job(job).await.unwrap();
    }

    let advanced = engine
        .advance_batch(&ids, QueueStatus::Queued, None, false)
        .await
        .unwrap();

    assert_eq!(advanced.len(), 3);
    for job in &advanced {
        assert_eq!(job.status, QueueStatus::Queued);
        assert_eq!(job.history.len(), 1);
        let history = store.audit_history(job.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].job_id, job.id);
        assert_eq!(Some(&history[0].id), job.history.last());
    }
    assert_eq!(broadcast.on_channel("tenant-a").await.len(), 3);
}

#[tokio::test]
async fn partial_batch_applies_created_subset_and_reports_the_rest() {
    let (store, broadcast, engine) = setup();
    let jobs: Vec<QueueJob> = (0..3).map(|_| sample_job("tenant-a")).collect();
    let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
    for job in &jobs {
        store.insert_job(job).await.unwrap();
    }

    // the middle job's audit record fails to persist
    store.skip_next_bulk_insert(vec![1]);
    let err = engine
        .advance_batch(&ids, QueueStatus::Queued, None, false)
        .await
        .unwrap_err();

    match err {
        Error::PartialBatch {
            requested,
            created,
            missing,
        } => {
            assert_eq!(requested, 3);
            assert_eq!(created, 2);
            assert_eq!(missing, vec![ids[1].to_string()]);
        }
        other => panic!("expected PartialBatch, got {other:?}"),
    }

    // successful jobs advanced and are paired with their own records
    for &id in [ids[0], ids[2]].iter() {
        let job = store.job(id).await.unwrap();
        assert_eq!(job.status, QueueStatus::Queued);
        let history = store.audit_history(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].job_id, id);
        assert_eq!(job.history, vec![history[0].id]);
    }

    // the skipped job is untouched
    let skipped = store.job(ids[1]).await.unwrap();
    assert_eq!(skipped.status, QueueStatus::Received);
    assert!(skipped.history.is_empty());
    assert!(store.audit_history(ids[1]).await.unwrap().is_empty());

    // only advanced jobs were broadcast
    assert_eq!(broadcast.on_channel("tenant-a").await.len(), 2);
}

#[tokio::test]
async fn short_bulk_update_surfaces_the_unwritten_jobs() {
    let (store, broadcast, engine) = setup();
    let jobs: Vec<QueueJob> = (0..3).map(|_| sample_job("tenant-a")).collect();
    let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
    for job in &jobs {
        store.insert_job(job).await.unwrap();
    }

    // every audit record persists, but the last job's head update is lost
    store.skip_next_bulk_update(vec![2]);
    let err = engine
        .advance_batch(&ids, QueueStatus::Queued, None, false)
        .await
        .unwrap_err();

    match err {
        Error::PartialBatch {
            requested,
            created,
            missing,
        } => {
            assert_eq!(requested, 3);
            assert_eq!(created, 2);
            assert_eq!(missing, vec![ids[2].to_string()]);
        }
        other => panic!("expected PartialBatch, got {other:?}"),
    }

    for &id in [ids[0], ids[1]].iter() {
        let job = store.job(id).await.unwrap();
        assert_eq!(job.status, QueueStatus::Queued);
        assert_eq!(job.history.len(), 1);
    }

    // the unwritten job keeps its old head; the orphaned audit record is
    // tolerated (history without status, self-healing on the next advance)
    let unwritten = store.job(ids[2]).await.unwrap();
    assert_eq!(unwritten.status, QueueStatus::Received);
    assert!(unwritten.history.is_empty());
    assert_eq!(store.audit_history(ids[2]).await.unwrap().len(), 1);

    // no broadcast for a job that never advanced
    assert_eq!(broadcast.on_channel("tenant-a").await.len(), 2);
}

#[tokio::test]
async fn batch_with_archived_member_writes_nothing() {
    let (store, _, engine) = setup();
    let healthy = sample_job("tenant-a");
    let dead = sample_job("tenant-a");
    store.insert_job(&healthy).await.unwrap();
    store.insert_job(&dead).await.unwrap();
    engine
        .advance(dead.id, QueueStatus::Archived, None, false)
        .await
        .unwrap();

    let err = engine
        .advance_batch(
            &[healthy.id, dead.id],
            QueueStatus::Queued,
            None,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));

    // snapshot phase failed before any write
    let untouched = store.job(healthy.id).await.unwrap();
    assert_eq!(untouched.status, QueueStatus::Received);
    assert!(untouched.history.is_empty());
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let (_, broadcast, engine) = setup();
    let advanced = engine
        .advance_batch(&[], QueueStatus::Queued, None, false)
        .await
        .unwrap();
    assert!(advanced.is_empty());
    assert!(broadcast.published().await.is_empty());
}
