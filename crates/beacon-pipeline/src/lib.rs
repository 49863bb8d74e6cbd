//! Event-telemetry pipeline for host applications embedding Beacon.
//!
//! Accepts structured events from application code, persists them durably
//! on-device, and ships them in batches to a remote ingestion endpoint. No
//! event is lost across process restarts, and no duplicate submission occurs
//! for an event once the server has acknowledged it (at-least-once delivery).
//!
//! # Architecture
//!
//! ```text
//! host code ──log(topic, props)──► Telemetry (facade)
//!                                      │ build envelope, serialize
//!                                      ▼
//!                                  EventQueue ── SQLite, WAL, fsync
//!                                      │ request_flush()
//!                                      ▼
//!                                 FlushScheduler ── one task, single-flight
//!                                      │ drain cycle
//!                                      ▼
//!                                  Uploader ── POST /v1/humio, batches of 50
//! ```
//!
//! The scheduler task is the only thing that ever drains: it reads a batch of
//! at most 50, POSTs it, deletes up to the batch's highest id on a 2xx, and
//! repeats until empty. Any failure stops the cycle and leaves the remainder
//! queued for the next trigger.
//!
//! # Usage
//!
//! ```rust,ignore
//! use beacon_pipeline::{load_config, AppIdentity, Telemetry};
//! use beacon_types::NoDeviceEnvironment;
//! use std::sync::Arc;
//!
//! let config = load_config(Some("beacon.toml"))?;
//! let telemetry = Telemetry::initialize(
//!     &config,
//!     &AppIdentity {
//!         name: "com.example.host".into(),
//!         version: "2.3.1".into(),
//!         build: "231".into(),
//!         locale: "en_US".into(),
//!     },
//!     Arc::new(NoDeviceEnvironment),
//!     None,
//! )?;
//!
//! telemetry.log("transfer_started", None);
//! telemetry.flush();
//! ```

mod config;
mod error;
mod logger;
mod queue;
mod scheduler;
mod uploader;

pub use config::{
    init_tracing, load_config, AppIdentity, ConfigError, Domain, LoggingConfig, TelemetryConfig,
};
pub use error::PipelineError;
pub use logger::{global, install, Telemetry};
pub use queue::{EventQueue, QueuedEvent};
pub use scheduler::FlushScheduler;
pub use uploader::{Uploader, MAX_BATCH};
