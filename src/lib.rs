//! Job-lifecycle status engine and usage accounting for a multi-tenant
//! workflow platform.
//!
//! The crate tracks queued workflow jobs through their lifecycle with an
//! append-only audit trail, folds usage events into denormalized running
//! totals on the owning resource, persists redacted execution records
//! while backing up the full payload-bearing reports, and verifies opaque
//! API keys against salted hashes.
//!
//! Persistence and the outbound side channels are trait seams
//! ([`store::Store`], [`sink::BroadcastSink`], [`sink::BackupSink`]) with
//! in-memory and Postgres/recording implementations.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod recorder;
pub mod sink;
pub mod store;
pub mod telemetry;
pub mod token;
pub mod usage;

pub use config::Config;
pub use engine::StatusEngine;
pub use error::{Error, Result};
pub use recorder::ExecutionRecorder;
pub use token::TokenVerifier;
pub use usage::UsageAccumulator;
