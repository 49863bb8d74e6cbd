//! Host-application callback capability.
//!
//! The host supplies one handler object at initialization instead of
//! subclassing the facade; every method has a no-op default so hosts
//! implement only what they care about.

use crate::host_event::HostEvent;

/// Callbacks a host application can register to observe activity inside the
/// embedded experience.
pub trait EventHooks: Send + Sync {
    /// The user interacted with the experience.
    fn on_user_activity(&self) {}

    /// A transfer was submitted; `event.data` carries the experience payload.
    fn on_transfer_submitted(&self, _event: &HostEvent) {}

    /// The experience surfaced an error to the user.
    fn on_error(&self, _error: &HookError) {}
}

/// Error details forwarded to [`EventHooks::on_error`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}: {detail}")]
pub struct HookError {
    /// Short description of what went wrong.
    pub message: String,
    /// Raw error payload from the experience, serialized as JSON text.
    pub detail: String,
}
