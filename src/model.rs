//! Core data model.
//!
//! Every entity the engine touches is a fixed-field struct, and every
//! enumerated wire value is a closed sum type. Unknown values are rejected
//! at the parse boundary, never passed through.

pub mod projection;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_id!(JobId, "Identifier of a queued job.");
uuid_id!(AuditId, "Identifier of a status audit record.");
uuid_id!(UsageId, "Identifier of a usage event.");
uuid_id!(StatId, "Identifier of a persisted execution record.");
uuid_id!(InstanceId, "Identifier of a workflow instance.");
uuid_id!(StorageId, "Identifier of a storage asset.");
uuid_id!(WorkflowId, "Identifier of a workflow definition.");
uuid_id!(ProjectId, "Identifier of a project; scopes backup keys.");
uuid_id!(TokenId, "Identifier of an API token.");
uuid_id!(TaskId, "Identifier of a task within a workflow.");
uuid_id!(RequestId, "Identifier of a request definition.");

// ---------------------------------------------------------------------------
// Wire enums
// ---------------------------------------------------------------------------

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Stable wire value. Must not be renamed.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(crate::error::Error::InvalidFormat(format!(
                        concat!("unknown ", stringify!($name), " value: {}"),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Lifecycle status of a queued job.
    ///
    /// The order below is the advisory progression emitted by the
    /// execution engine; it is not enforced as a strict automaton. Only
    /// `archived` is terminal.
    QueueStatus {
        Received => "received",
        Uploading => "uploading",
        Pending => "pending",
        Queued => "queued",
        Starting => "starting",
        Initializing => "initializing",
        Loading => "loading",
        Running => "running",
        Webhook => "webhook",
        Complete => "complete",
        Error => "error",
        Archived => "archived",
    }
}

impl QueueStatus {
    /// Terminal statuses accept no further audit records.
    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Archived)
    }
}

wire_enum! {
    /// How a job entered the queue.
    QueueType {
        Queue => "queue",
        Schedule => "schedule",
        Return => "return",
        StatusCheck => "statuscheck",
    }
}

wire_enum! {
    /// What kind of consumption a usage event measures.
    UsageKind {
        Storage => "storage",
        Request => "request",
        Webhook => "webhook",
        Stat => "stat",
    }
}

wire_enum! {
    /// Direction of the measured quantity.
    UsageDirection {
        Up => "up",
        Down => "down",
        Time => "time",
    }
}

wire_enum! {
    /// Measurement unit of a usage event.
    UsageUnit {
        Byte => "byte",
        Ms => "ms",
    }
}

wire_enum! {
    /// Where the usage was incurred.
    UsageLocation {
        Api => "api",
        Instance => "instance",
        Queue => "queue",
    }
}

wire_enum! {
    /// Which workflow list a task came from.
    TaskField {
        Payloads => "payloads",
        Tasks => "tasks",
        Webhooks => "webhooks",
    }
}

// ---------------------------------------------------------------------------
// Queue job
// ---------------------------------------------------------------------------

/// A unit of scheduled workflow work whose lifecycle this engine tracks.
///
/// `status` always equals the status of the most recently appended audit
/// record; the audit list is append-only. Jobs are soft-retired via the
/// `archived` status, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: JobId,
    /// Cleared on archival.
    pub active: bool,
    /// Owning tenant.
    pub sub: String,
    pub instance_id: InstanceId,
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    pub status: QueueStatus,
    pub queue_type: QueueType,
    /// Scheduled execution date.
    pub date: DateTime<Utc>,
    pub storage_instance_id: Option<StorageId>,
    /// Ordered references to this job's audit history.
    pub history: Vec<AuditId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueJob {
    /// A freshly enqueued job in its initial status.
    pub fn new(
        sub: impl Into<String>,
        instance_id: InstanceId,
        workflow_id: WorkflowId,
        workflow_name: impl Into<String>,
        queue_type: QueueType,
        date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            active: true,
            sub: sub.into(),
            instance_id,
            workflow_id,
            workflow_name: workflow_name.into(),
            status: QueueStatus::Received,
            queue_type,
            date,
            storage_instance_id: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Status audit record
// ---------------------------------------------------------------------------

/// One immutable fact: job X was in status S at time T.
///
/// Creation-only. Ordering is defined by `created_at`; the union of a
/// job's records is its full history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusAuditRecord {
    pub id: AuditId,
    pub active: bool,
    pub sub: String,
    pub job_id: JobId,
    pub instance_id: InstanceId,
    pub status: QueueStatus,
    /// Free-text detail; empty when the transition carries none.
    pub detail: String,
    pub error: bool,
    pub created_at: DateTime<Utc>,
}

impl StatusAuditRecord {
    /// Record the given status against a job.
    pub fn for_job(
        job: &QueueJob,
        status: QueueStatus,
        detail: Option<String>,
        error: bool,
    ) -> Self {
        Self {
            id: AuditId::new(),
            active: true,
            sub: job.sub.clone(),
            job_id: job.id,
            instance_id: job.instance_id,
            status,
            detail: detail.unwrap_or_default(),
            error,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// Reference to a resource that accrues usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OwnerRef {
    Instance(InstanceId),
    Storage(StorageId),
}

impl std::fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerRef::Instance(id) => write!(f, "instance/{id}"),
            OwnerRef::Storage(id) => write!(f, "storage/{id}"),
        }
    }
}

/// One measured consumption quantity. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: UsageId,
    pub active: bool,
    pub sub: String,
    pub kind: UsageKind,
    pub direction: UsageDirection,
    /// Measured amount in `unit`. Non-negative by construction.
    pub amount: u64,
    pub unit: UsageUnit,
    pub location: UsageLocation,
    pub owner: OwnerRef,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(
        sub: impl Into<String>,
        owner: OwnerRef,
        kind: UsageKind,
        direction: UsageDirection,
        amount: u64,
        unit: UsageUnit,
        location: UsageLocation,
    ) -> Self {
        Self {
            id: UsageId::new(),
            active: true,
            sub: sub.into(),
            kind,
            direction,
            amount,
            unit,
            location,
            owner,
            detail: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Increments produced by folding a batch of usage events.
///
/// The fold rule: byte+up and byte+down go to their own buckets, ms goes
/// to the time bucket regardless of direction, and every other
/// combination is recorded without being totalled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalsDelta {
    pub bytes_up: u64,
    pub bytes_down: u64,
    pub ms: u64,
}

impl TotalsDelta {
    pub fn add(&mut self, event: &UsageEvent) {
        match (event.unit, event.direction) {
            (UsageUnit::Byte, UsageDirection::Up) => self.bytes_up += event.amount,
            (UsageUnit::Byte, UsageDirection::Down) => self.bytes_down += event.amount,
            (UsageUnit::Ms, _) => self.ms += event.amount,
            _ => {}
        }
    }
}

/// Running usage sums denormalized onto a resource for fast reads.
///
/// Invariant: the sums equal exactly the fold of the events referenced in
/// `usage` — no event is double-counted or counted without being listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTotals {
    /// References to every applied usage event.
    pub usage: Vec<UsageId>,
    pub total_bytes_up: u64,
    pub total_bytes_down: u64,
    pub total_ms: u64,
}

impl ResourceTotals {
    /// Apply one folded batch: push the references, add the increments.
    pub fn apply(&mut self, refs: &[UsageId], delta: TotalsDelta) {
        self.usage.extend_from_slice(refs);
        self.total_bytes_up += delta.bytes_up;
        self.total_bytes_down += delta.bytes_down;
        self.total_ms += delta.ms;
    }
}

// ---------------------------------------------------------------------------
// Instance and storage asset (usage owners)
// ---------------------------------------------------------------------------

/// A workflow execution instance: the owner of execution records and the
/// primary usage accruer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub active: bool,
    pub sub: String,
    pub project_id: ProjectId,
    pub workflow_id: WorkflowId,
    pub workflow_name: String,
    /// References to persisted execution records.
    pub stats: Vec<StatId>,
    pub totals: ResourceTotals,
    pub queue_id: Option<JobId>,
    pub queue_type: Option<QueueType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    pub fn new(
        sub: impl Into<String>,
        project_id: ProjectId,
        workflow_id: WorkflowId,
        workflow_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InstanceId::new(),
            active: true,
            sub: sub.into(),
            project_id,
            workflow_id,
            workflow_name: workflow_name.into(),
            stats: Vec::new(),
            totals: ResourceTotals::default(),
            queue_id: None,
            queue_type: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A stored value or uploaded file; the second kind of usage owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAsset {
    pub id: StorageId,
    pub active: bool,
    pub sub: String,
    pub project_id: ProjectId,
    pub name: String,
    pub totals: ResourceTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageAsset {
    pub fn new(sub: impl Into<String>, project_id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: StorageId::new(),
            active: true,
            sub: sub.into(),
            project_id,
            name: name.into(),
            totals: ResourceTotals::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Execution results
// ---------------------------------------------------------------------------

/// Full outcome of one executed task, payloads included.
///
/// Never persisted as-is in the primary store — see
/// [`ExecutionReport::redact`]. The complete report only ever reaches the
/// backup sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub task_id: TaskId,
    pub task_field: TaskField,
    pub request_id: RequestId,
    pub request_name: String,
    pub request_type: String,
    /// HTTP-like status code.
    pub status: u16,
    pub status_text: String,
    pub request_payload: serde_json::Value,
    pub response_payload: serde_json::Value,
    pub headers: serde_json::Value,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub request_size: u64,
    pub response_size: u64,
    pub response_type: String,
    pub error: bool,
}

impl ExecutionReport {
    /// Derive the persisted record. Payload-bearing fields are not
    /// blanked — they are structurally absent from the record type.
    pub fn redact(&self, instance_id: InstanceId) -> ExecutionRecord {
        let now = Utc::now();
        ExecutionRecord {
            id: StatId::new(),
            active: true,
            instance_id,
            task_id: self.task_id,
            task_field: self.task_field,
            request_id: self.request_id,
            request_name: self.request_name.clone(),
            request_type: self.request_type.clone(),
            status: self.status,
            status_text: self.status_text.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            duration_ms: self.duration_ms,
            request_size: self.request_size,
            response_size: self.response_size,
            response_type: self.response_type.clone(),
            error: self.error,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The queryable execution record held in the primary store. Carries no
/// request/response payloads or headers by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: StatId,
    pub active: bool,
    pub instance_id: InstanceId,
    pub task_id: TaskId,
    pub task_field: TaskField,
    pub request_id: RequestId,
    pub request_name: String,
    pub request_type: String,
    pub status: u16,
    pub status_text: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub request_size: u64,
    pub response_size: u64,
    pub response_type: String,
    pub error: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// API token
// ---------------------------------------------------------------------------

/// Maps an opaque bearer key to a tenant. The raw key is never stored:
/// only the leading snippet (an index accelerator, not a secret) and a
/// salted one-way hash of the full key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: TokenId,
    pub active: bool,
    /// Owning tenant.
    pub sub: String,
    /// First characters of the key, indexed for lookup.
    pub snippet: String,
    /// PHC-format hash; salt and parameters are embedded.
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_values_are_stable() {
        let wire = [
            "received",
            "uploading",
            "pending",
            "queued",
            "starting",
            "initializing",
            "loading",
            "running",
            "webhook",
            "complete",
            "error",
            "archived",
        ];
        for value in wire {
            let status: QueueStatus = value.parse().unwrap();
            assert_eq!(status.as_str(), value);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(value.to_string())
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("paused".parse::<QueueStatus>().is_err());
        assert!("".parse::<QueueStatus>().is_err());
        assert!(serde_json::from_str::<QueueStatus>("\"paused\"").is_err());
    }

    #[test]
    fn only_archived_is_terminal() {
        assert!(QueueStatus::Archived.is_terminal());
        assert!(!QueueStatus::Complete.is_terminal());
        assert!(!QueueStatus::Error.is_terminal());
    }

    #[test]
    fn statuscheck_wire_value() {
        assert_eq!(QueueType::StatusCheck.as_str(), "statuscheck");
        assert_eq!("statuscheck".parse::<QueueType>().unwrap(), QueueType::StatusCheck);
    }

    #[test]
    fn totals_delta_fold_rule() {
        let owner = OwnerRef::Instance(InstanceId::new());
        let mut delta = TotalsDelta::default();
        let up = UsageEvent::new(
            "tenant",
            owner,
            UsageKind::Request,
            UsageDirection::Up,
            100,
            UsageUnit::Byte,
            UsageLocation::Instance,
        );
        let down = UsageEvent::new(
            "tenant",
            owner,
            UsageKind::Request,
            UsageDirection::Down,
            40,
            UsageUnit::Byte,
            UsageLocation::Instance,
        );
        let time = UsageEvent::new(
            "tenant",
            owner,
            UsageKind::Stat,
            UsageDirection::Time,
            250,
            UsageUnit::Ms,
            UsageLocation::Instance,
        );
        // byte+time is a legal event the accumulator does not total
        let odd = UsageEvent::new(
            "tenant",
            owner,
            UsageKind::Stat,
            UsageDirection::Time,
            7,
            UsageUnit::Byte,
            UsageLocation::Instance,
        );

        delta.add(&up);
        delta.add(&down);
        delta.add(&time);
        delta.add(&odd);

        assert_eq!(delta.bytes_up, 100);
        assert_eq!(delta.bytes_down, 40);
        assert_eq!(delta.ms, 250);
    }

    #[test]
    fn redaction_strips_payload_fields() {
        let report = ExecutionReport {
            task_id: TaskId::new(),
            task_field: TaskField::Tasks,
            request_id: RequestId::new(),
            request_name: "Sample Request".to_string(),
            request_type: "GET".to_string(),
            status: 200,
            status_text: "OK".to_string(),
            request_payload: serde_json::json!({"secret": "hunter2"}),
            response_payload: serde_json::json!({"body": "sensitive"}),
            headers: serde_json::json!({"authorization": "Bearer x"}),
            start_time: Utc::now(),
            end_time: Utc::now(),
            duration_ms: 12,
            request_size: 64,
            response_size: 512,
            response_type: "json".to_string(),
            error: false,
        };

        let record = report.redact(InstanceId::new());
        let value = serde_json::to_value(&record).unwrap();
        let keys = value.as_object().unwrap();
        assert!(!keys.contains_key("request_payload"));
        assert!(!keys.contains_key("response_payload"));
        assert!(!keys.contains_key("headers"));
        assert_eq!(record.status, 200);
        assert_eq!(record.response_size, 512);
    }
}
