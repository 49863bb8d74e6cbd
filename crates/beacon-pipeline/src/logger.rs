//! The telemetry facade handed to host application code.
//!
//! [`Telemetry`] is an explicitly constructed, caller-owned context: the host
//! builds it once at startup and owns its lifetime. An optional process-wide
//! accessor ([`install`] / [`global`]) exists for hosts that want singleton
//! ergonomics; installing twice is an explicit error, never a silent
//! replacement.
//!
//! `log` is fire-and-forget by design: rejecting telemetry calls would
//! pollute the host application's control flow, so every failure past this
//! point is logged internally instead of returned.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde_json::{json, Map, Value};

use beacon_types::{
    build_envelope, DeviceEnvironmentSource, EnvelopeIdentity, EventHooks, HookError, HostEvent,
    HostEventType,
};

use crate::config::{AppIdentity, TelemetryConfig};
use crate::error::PipelineError;
use crate::queue::EventQueue;
use crate::scheduler::FlushScheduler;
use crate::uploader::Uploader;

/// Fixed `forge.app` provenance tag.
const FORGE_APP: &str = "beacon-client";

/// Platform tag written into `env.platform`.
const PLATFORM: &str = "rust-sdk";

/// State shared by a facade and all of its merged-property children.
struct Shared {
    queue: EventQueue,
    scheduler: FlushScheduler,
    /// Handle onto the runtime that owns the pipeline tasks. Captured at
    /// initialization so `log` works from threads outside the runtime.
    runtime: tokio::runtime::Handle,
    identity: EnvelopeIdentity,
    device_env: Arc<dyn DeviceEnvironmentSource>,
    hooks: Option<Arc<dyn EventHooks>>,
    batch_mode: bool,
}

/// The telemetry pipeline facade.
///
/// Cloning (and [`Telemetry::with_merged_properties`]) shares the underlying
/// queue and scheduler; only the overlaid default properties differ between
/// instances.
#[derive(Clone)]
pub struct Telemetry {
    shared: Arc<Shared>,
    /// Instance-specific default properties overlaid onto `env`.
    overlay: Map<String, Value>,
}

impl Telemetry {
    /// Builds the pipeline: validates config, opens the durable store, sets
    /// up its schema, and spawns the flush scheduler task.
    ///
    /// Must be called within a tokio runtime. A failing store open fails
    /// initialization — the host decides its own fallback rather than this
    /// pipeline silently degrading to a no-op logger.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` for invalid configuration and the
    /// corresponding storage error when the event store cannot be opened or
    /// migrated.
    pub fn initialize(
        config: &TelemetryConfig,
        app: &AppIdentity,
        device_env: Arc<dyn DeviceEnvironmentSource>,
        hooks: Option<Arc<dyn EventHooks>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::current();

        let pool =
            beacon_db::create_pool(&config.db_path, beacon_db::DbRuntimeSettings::default())?;
        {
            let conn = pool.get()?;
            beacon_db::ensure_schema(&conn)?;
        }

        let queue = EventQueue::new(pool);
        let uploader = Uploader::new(config.ingest_endpoint());
        let batch_interval = Duration::from_secs(config.batch_interval_secs);
        let scheduler = FlushScheduler::spawn(queue.clone(), uploader, batch_interval);

        let mut app_props = Map::new();
        app_props.insert("appName".into(), json!(app.name));
        app_props.insert("appVersion".into(), json!(app.version));
        app_props.insert("appBuild".into(), json!(app.build));
        app_props.insert("appId".into(), json!(config.app_id));

        let identity = EnvelopeIdentity {
            forge_app: FORGE_APP.to_string(),
            forge_domain: config.domain.to_string(),
            platform: PLATFORM.to_string(),
            locale: app.locale.clone(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            app_props,
        };

        tracing::info!(
            domain = %config.domain,
            batch_interval_secs = config.batch_interval_secs,
            "telemetry pipeline initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                queue,
                scheduler,
                runtime,
                identity,
                device_env,
                hooks,
                batch_mode: !batch_interval.is_zero(),
            }),
            overlay: Map::new(),
        })
    }

    /// Emits one event.
    ///
    /// Builds the envelope synchronously (the timestamp is captured here),
    /// then persists and schedules the flush off the caller's path. Callable
    /// from any thread, inside or outside the runtime that initialized the
    /// pipeline. Never fails from the caller's perspective; serialization and
    /// storage errors drop the event with a log line.
    pub fn log(&self, topic: &str, props: Option<&Map<String, Value>>) {
        let device_env_id = self
            .shared
            .device_env
            .device_environment()
            .map(|device_env| device_env.id);

        let envelope = build_envelope(
            topic,
            props,
            &self.shared.identity,
            &self.overlay,
            device_env_id.as_deref(),
        );

        let json = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(%error, topic, "failed to serialize event, dropping");
                return;
            }
        };

        self.enqueue(json, topic.to_string());
    }

    /// Queues a pre-built envelope, bypassing envelope construction. Used to
    /// replay raw events handed over by the embedded experience.
    pub fn log_raw(&self, envelope_json: String) {
        self.enqueue(envelope_json, String::from("<raw>"));
    }

    fn enqueue(&self, json: String, topic: String) {
        let queue = self.shared.queue.clone();
        let scheduler = self.shared.scheduler.clone();

        // Spawn through the handle captured at initialization: the caller
        // may be a plain host thread with no runtime context of its own.
        // Disk I/O happens on the blocking pool; the caller never waits.
        self.shared.runtime.spawn(async move {
            match tokio::task::spawn_blocking(move || queue.append(&json)).await {
                Ok(Ok(id)) => {
                    tracing::trace!(id, topic = %topic, "event queued");
                    scheduler.request_flush();
                }
                Ok(Err(error)) => {
                    tracing::error!(%error, topic = %topic, "failed to persist event, dropping");
                }
                Err(error) => {
                    tracing::error!(%error, topic = %topic, "event append task failed, dropping");
                }
            }
        });
    }

    /// Returns a new facade sharing this one's queue and scheduler, with
    /// `extra` overlaid onto the instance default properties (extra wins).
    pub fn with_merged_properties(&self, extra: Map<String, Value>) -> Telemetry {
        let mut overlay = self.overlay.clone();
        for (key, value) in extra {
            overlay.insert(key, value);
        }
        Telemetry {
            shared: Arc::clone(&self.shared),
            overlay,
        }
    }

    /// Requests an immediate flush of the queued backlog.
    ///
    /// Meaningful only in batch-interval mode; in immediate mode every
    /// append already posts eagerly, so this is a no-op.
    pub fn flush(&self) {
        if self.shared.batch_mode {
            self.shared.scheduler.flush_now();
        }
    }

    /// Routes a host-bound event to the registered [`EventHooks`] handler.
    ///
    /// `Launch` and `Close` navigation events are accepted but have no hook.
    pub fn dispatch(&self, event: &HostEvent) {
        let Some(hooks) = &self.shared.hooks else {
            return;
        };

        match event.event_type {
            HostEventType::UserActivity => hooks.on_user_activity(),
            HostEventType::TransferSubmitted => hooks.on_transfer_submitted(event),
            HostEventType::Error => {
                let error = HookError {
                    message: "embedded experience reported an error".to_string(),
                    detail: Value::Object(event.data.clone()).to_string(),
                };
                hooks.on_error(&error);
            }
            HostEventType::Launch | HostEventType::Close => {}
        }
    }
}

static GLOBAL: OnceLock<Telemetry> = OnceLock::new();

/// Installs a process-wide telemetry context.
///
/// # Errors
///
/// Returns `PipelineError::AlreadyInitialized` if a context was already
/// installed — a second initialization signals an integration error and is
/// surfaced explicitly rather than replacing state.
pub fn install(telemetry: Telemetry) -> Result<(), PipelineError> {
    GLOBAL
        .set(telemetry)
        .map_err(|_| PipelineError::AlreadyInitialized)
}

/// Returns the installed process-wide telemetry context, if any.
pub fn global() -> Option<&'static Telemetry> {
    GLOBAL.get()
}
