//! Shared types for the Beacon telemetry pipeline.
//!
//! Defines the event envelope (the fully enriched, serialized representation
//! of one telemetry event), the pure envelope builder, the host-event model
//! for traffic flowing back toward the embedding application, and the
//! collaborator traits the pipeline consumes ([`DeviceEnvironmentSource`])
//! and exposes ([`EventHooks`]).
//!
//! # Envelope shape
//!
//! ```json
//! {
//!   "timestamp": "2026-08-27T10:15:30.123Z",
//!   "attributes": {
//!     "@timestamp": "2026-08-27T10:15:30.123Z",
//!     "topic": "transfer_started",
//!     "data": { "corridor": "USA-PHL" },
//!     "sdk": "ConnectedExperience",
//!     "forge": { "app": "beacon-client", "domain": "prod" },
//!     "env": { "appName": "...", "platform": "rust-sdk", "locale": "en_US", ... },
//!     "device_environment_id": "de-123"
//!   }
//! }
//! ```
//!
//! The two timestamp fields are captured once at build time and are always
//! identical: one is read by the ingest endpoint, the other by the event
//! parser behind it.

mod device;
mod envelope;
mod hooks;
mod host_event;

pub use device::{DeviceEnvironment, DeviceEnvironmentSource, NoDeviceEnvironment};
pub use envelope::{build_envelope, Attributes, Envelope, EnvelopeIdentity, Provenance, SDK_NAME};
pub use hooks::{EventHooks, HookError};
pub use host_event::{HostEvent, HostEventType, ParseHostEventTypeError};
