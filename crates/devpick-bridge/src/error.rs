use thiserror::Error;

/// Top-level error type for the `devpick-bridge` crate.
///
/// Covers every failure mode of the two external systems: the `adb`
/// executable and the AVD catalog on disk. `devpick-core` maps these
/// into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── adb ─────────────────────────────────────────────────────────
    /// The configured `adb` executable could not be launched.
    #[error("adb executable not found at '{path}'")]
    AdbNotFound { path: String },

    /// `adb` ran but exited unsuccessfully.
    #[error("`adb {command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// `adb` did not finish within the configured timeout.
    #[error("`adb {command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// Output from `adb` could not be understood.
    #[error("Unexpected adb output: {message}")]
    Parse { message: String },

    // ── AVD catalog ─────────────────────────────────────────────────
    /// The AVD home directory does not exist or is not a directory.
    #[error("AVD home '{path}' is not a directory")]
    AvdHomeMissing { path: String },

    /// A background catalog scan was cancelled or panicked.
    #[error("AVD catalog scan aborted: {0}")]
    ScanAborted(String),

    // ── Generic ─────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
