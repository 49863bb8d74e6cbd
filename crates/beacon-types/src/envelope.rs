//! The event envelope and its builder.
//!
//! [`build_envelope`] is a pure function: it borrows all of its inputs,
//! mutates none of them, and captures the timestamp exactly once so the
//! ingest-level and parser-level fields can never disagree.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed `sdk` provenance tag written into every envelope.
pub const SDK_NAME: &str = "ConnectedExperience";

/// A fully enriched event, ready for persistence and upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Ingest-level timestamp, ISO 8601 UTC with millisecond precision.
    pub timestamp: String,
    /// Parser-level attributes carrying the event itself.
    pub attributes: Attributes,
}

/// The attribute block of an [`Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attributes {
    /// Parser-level timestamp; always identical to the outer `timestamp`.
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    /// Event type string.
    pub topic: String,
    /// Caller-supplied properties. Lives in its own object so caller data
    /// can never shadow the fixed provenance keys.
    pub data: Map<String, Value>,
    /// Fixed SDK tag ([`SDK_NAME`]).
    pub sdk: String,
    /// Fixed application provenance.
    pub forge: Provenance,
    /// Merged environment properties: app identity, instance overlays, and
    /// the fixed platform/locale/sdkVersion keys (written last).
    pub env: Map<String, Value>,
    /// Device environment identifier, when one was available at build time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_environment_id: Option<String>,
}

/// The fixed `forge` provenance block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    /// Application tag.
    pub app: String,
    /// Deployment domain (e.g. `prod`, `staging`, `dev`).
    pub domain: String,
}

/// Process-wide fixed values captured once at pipeline initialization and
/// folded into every envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeIdentity {
    /// Value of `forge.app`.
    pub forge_app: String,
    /// Value of `forge.domain`.
    pub forge_domain: String,
    /// Platform tag written into `env.platform`.
    pub platform: String,
    /// Host locale written into `env.locale`.
    pub locale: String,
    /// Pipeline version written into `env.sdkVersion`.
    pub sdk_version: String,
    /// Host application identity properties (appName, appVersion, appBuild,
    /// appId), the base layer of `env`.
    pub app_props: Map<String, Value>,
}

/// Builds the canonical envelope for one event.
///
/// `env` key precedence, lowest to highest: `identity.app_props`, then
/// `overlay` (logger-instance defaults, last write wins), then the fixed
/// `platform` / `locale` / `sdkVersion` keys, which callers can never
/// override. `caller_props` becomes `data` verbatim.
///
/// The timestamp is captured here, synchronously, not at persistence or
/// upload time.
pub fn build_envelope(
    topic: &str,
    caller_props: Option<&Map<String, Value>>,
    identity: &EnvelopeIdentity,
    overlay: &Map<String, Value>,
    device_environment_id: Option<&str>,
) -> Envelope {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut env = identity.app_props.clone();
    for (key, value) in overlay {
        env.insert(key.clone(), value.clone());
    }
    // Fixed keys go in last so neither app_props nor overlays can shadow them.
    env.insert("platform".into(), Value::String(identity.platform.clone()));
    env.insert("locale".into(), Value::String(identity.locale.clone()));
    env.insert(
        "sdkVersion".into(),
        Value::String(identity.sdk_version.clone()),
    );

    Envelope {
        timestamp: timestamp.clone(),
        attributes: Attributes {
            timestamp,
            topic: topic.to_string(),
            data: caller_props.cloned().unwrap_or_default(),
            sdk: SDK_NAME.to_string(),
            forge: Provenance {
                app: identity.forge_app.clone(),
                domain: identity.forge_domain.clone(),
            },
            env,
            device_environment_id: device_environment_id.map(str::to_string),
        },
    }
}
