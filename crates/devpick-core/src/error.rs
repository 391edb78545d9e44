// ── Core error types ──
//
// Errors surfaced by devpick-core. Consumers never see raw process exit
// codes or ini parse failures; the `From<devpick_bridge::Error>` impl
// translates bridge-level failures into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Device bridge error: {message}")]
    Bridge { message: String },

    #[error("Device bridge unavailable: {message}")]
    BridgeUnavailable { message: String },

    #[error("Virtual device catalog error: {message}")]
    Catalog { message: String },

    #[error("Device query failed for {serial}: {message}")]
    DeviceQuery { serial: String, message: String },

    // ── Cache errors ─────────────────────────────────────────────────
    /// A completed producer's result could not be retrieved.
    #[error("Result of the '{cache}' refresh could not be retrieved")]
    Interrupted { cache: String },

    #[error("Producer for '{cache}' panicked")]
    ProducerPanicked { cache: String },

    #[error("Timed out after {timeout_secs}s waiting for {what}")]
    Timeout { what: String, timeout_secs: u64 },

    // ── Model errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.into(),
            reason: "required field not set".into(),
        }
    }
}

// ── Conversion from bridge-layer errors ──────────────────────────────

impl From<devpick_bridge::Error> for CoreError {
    fn from(err: devpick_bridge::Error) -> Self {
        use devpick_bridge::Error as BridgeError;

        match err {
            BridgeError::AdbNotFound { .. } => CoreError::BridgeUnavailable {
                message: err.to_string(),
            },
            BridgeError::Timeout {
                command,
                timeout_secs,
            } => CoreError::Timeout {
                what: format!("`adb {command}`"),
                timeout_secs,
            },
            BridgeError::CommandFailed { .. } | BridgeError::Parse { .. } => CoreError::Bridge {
                message: err.to_string(),
            },
            BridgeError::AvdHomeMissing { .. } | BridgeError::ScanAborted(_) => {
                CoreError::Catalog {
                    message: err.to_string(),
                }
            }
            BridgeError::Io(e) => CoreError::Internal(format!("IO error: {e}")),
        }
    }
}
