//! Error types for `grabar-script`.

use thiserror::Error;

/// Result type alias for script operations.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors that can occur while parsing or emitting recorded scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The document as a whole could not be treated as a recorded script.
    ///
    /// Individual unrecognized statements degrade to [`Stmt::Raw`] instead;
    /// this variant is reserved for input that has no statement structure at
    /// all (binary content, missing test scaffold, ...).
    ///
    /// [`Stmt::Raw`]: crate::stmt::Stmt::Raw
    #[error("source is not a recorded script: {reason}")]
    Unparseable {
        /// Why the document was rejected
        reason: String,
    },

    /// A test-file scaffold marker (test open / close) was not found.
    #[error("spec scaffold not found: {missing}")]
    ScaffoldNotFound {
        /// Which marker is missing
        missing: &'static str,
    },

    /// Invalid parameter reference name for a data binding.
    #[error("invalid parameter name '{name}': {reason}")]
    InvalidParamName {
        /// The rejected name
        name: String,
        /// Why it's invalid
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_display() {
        let err = ScriptError::Unparseable {
            reason: "embedded NUL byte".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "source is not a recorded script: embedded NUL byte"
        );
    }

    #[test]
    fn scaffold_display() {
        let err = ScriptError::ScaffoldNotFound {
            missing: "test body open",
        };
        assert!(err.to_string().contains("test body open"));
    }
}
