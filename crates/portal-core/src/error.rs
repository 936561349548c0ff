use thiserror::Error;

/// Failure modes of the portal. None of these are fatal to the hosting page:
/// each degrades to a strictly simpler but fully functional visual mode.
#[derive(Debug, Error)]
pub enum PortalError {
    /// No compute-capable adapter was found at probe time.
    #[error("no compute-capable graphics adapter")]
    CapabilityUnavailable,
    /// Adapter found but device creation failed during init.
    #[error("device creation failed: {0}")]
    DeviceCreation(String),
    /// Output surface could not be created or configured.
    #[error("surface error: {0}")]
    Surface(String),
    /// Microphone access denied or unavailable.
    #[error("microphone permission denied")]
    PermissionDenied,
}
