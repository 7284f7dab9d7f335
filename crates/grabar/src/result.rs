//! Result and error types for Grabar.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Grabar operations
pub type GrabarResult<T> = Result<T, GrabarError>;

/// Errors that can occur in the recording-to-spec pipeline.
///
/// Static passes (navigation cleanup, parameter detection) never produce
/// these — they degrade to "no transformation applied". Errors are reserved
/// for bundle I/O, structural edits that cannot locate their target, and
/// probe failures the caller asked to be surfaced.
#[derive(Debug, Error)]
pub enum GrabarError {
    /// Script parse/emit error
    #[error("script error: {0}")]
    Script(#[from] grabar_script::ScriptError),

    /// I/O error without artifact context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a bundle artifact failed
    #[error("{operation} failed for bundle '{slug}' at {path}: {message}")]
    ArtifactWrite {
        /// Bundle slug
        slug: String,
        /// Artifact path
        path: PathBuf,
        /// Operation name (generate, update-step, ...)
        operation: &'static str,
        /// Underlying error message
        message: String,
    },

    /// A step edit could not locate its target step
    #[error("step {index} not found in bundle '{slug}'")]
    StepNotFound {
        /// Requested step index
        index: usize,
        /// Bundle slug
        slug: String,
    },

    /// No step carries the requested anchor fingerprint
    #[error("step anchor '{fingerprint}' not found in bundle '{slug}'")]
    AnchorNotFound {
        /// The requested fingerprint
        fingerprint: String,
        /// Bundle slug
        slug: String,
    },

    /// A step anchor matched more than one region
    #[error("step {index} is ambiguous in bundle '{slug}': {matches} anchors match")]
    AmbiguousStep {
        /// Requested step index
        index: usize,
        /// Bundle slug
        slug: String,
        /// Number of matching anchors
        matches: usize,
    },

    /// A bundle directory is missing one of its required artifacts
    #[error("bundle '{slug}' is incomplete: missing {missing}")]
    BundleIncomplete {
        /// Bundle slug
        slug: String,
        /// Which artifact is missing
        missing: &'static str,
    },

    /// Another writer holds the bundle
    #[error("bundle '{slug}' has an operation in flight")]
    BundleBusy {
        /// Bundle slug
        slug: String,
    },

    /// The DOM probe did not answer in time
    #[error("DOM probe timed out after {ms}ms")]
    ProbeTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The DOM probe failed
    #[error("DOM probe failed: {message}")]
    Probe {
        /// Error message
        message: String,
    },

    /// A test or parameter name was rejected
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}
