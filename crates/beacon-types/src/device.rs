//! Device environment collaborator seam.

/// Device environment identifiers maintained by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEnvironment {
    /// Stable device environment identifier; flows into envelopes.
    pub id: String,
    /// Integrity hash accompanying the identifier.
    pub hash: String,
}

/// Source of the optional device environment, supplied by the host.
///
/// Consulted once per envelope build; returning `None` simply omits
/// `device_environment_id` from that envelope.
pub trait DeviceEnvironmentSource: Send + Sync {
    /// Returns the current device environment, if one is known.
    fn device_environment(&self) -> Option<DeviceEnvironment>;
}

/// A source that never yields a device environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeviceEnvironment;

impl DeviceEnvironmentSource for NoDeviceEnvironment {
    fn device_environment(&self) -> Option<DeviceEnvironment> {
        None
    }
}
