//! Error types for device probing and scan replay.
//!
//! This module defines all errors that can occur while invoking the external
//! scanner tool, interpreting its result, and replaying recorded scan
//! transcripts.

use thiserror::Error;

/// Errors that can occur during device probing.
///
/// Every failure is local to the probe call that produced it; nothing here
/// is fatal to the embedding process. Callers that only care about
/// success/failure can treat any variant as "this device yielded nothing" —
/// diagnostic detail is additionally emitted through the [`log`] facade.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The scanner tool could not be started, or its output pipes could not
    /// be read.
    ///
    /// This typically means the tool binary is not installed or not on
    /// `PATH`.
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The scanner tool ran but exited with a non-zero code.
    ///
    /// A timed-out scan is reported here as well: the runner kills the
    /// child on deadline and folds the kill into a sentinel exit code.
    #[error("{tool} exited with code {code}")]
    ToolFailed {
        tool: String,
        code: i32,
        /// Captured stderr text, empty if the tool printed nothing.
        stderr: String,
    },

    /// The scanner tool ran cleanly but its output contained no usable
    /// configuration section for the device.
    #[error("no suggestions for device {0}")]
    NoSuggestions(String),

    /// A replayed invocation did not match the next recorded exchange.
    #[error("replay mismatch: {0}")]
    ReplayMismatch(String),

    /// A scan transcript could not be parsed.
    #[error("invalid scan transcript: {0}")]
    Transcript(#[from] serde_json::Error),
}
