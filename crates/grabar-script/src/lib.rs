//! Grabar script model: typed statements for recorded browser tests.
//!
//! Captured interactions arrive as Playwright-flavoured JavaScript. This
//! crate parses that text into a typed statement tree, lets passes transform
//! the tree, and emits trees back to text deterministically.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐    ┌──────────────┐
//! │ Captured     │    │ ScriptDocument │    │ Emitted      │
//! │ source text  │───►│ (typed stmts + │───►│ source text  │
//! │              │    │  origin spans) │    │ (canonical)  │
//! └──────────────┘    └────────────────┘    └──────────────┘
//! ```
//!
//! Parsing is fail-soft: unrecognized statements are carried as
//! [`stmt::Stmt::Raw`] and re-emitted byte-identically, so a pass can never
//! destroy content it does not understand.

#![warn(missing_docs)]

pub mod emit;
pub mod error;
pub mod parse;
pub mod stmt;
pub mod transform;

pub use error::{Result, ScriptError};

/// Commonly used items.
pub mod prelude {
    pub use crate::emit::{emit_locator, emit_spec_file, emit_stmt, quote, validate_param_name};
    pub use crate::error::{Result as ScriptResult, ScriptError};
    pub use crate::parse::{parse_statement, spec_sections, ParsedStmt, ScriptDocument};
    pub use crate::stmt::{ActionCall, Arg, ExpectCall, LocatorExpr, LocatorSegment, Stmt};
    pub use crate::transform::{LineSpan, SourceTransform, TransformOutcome};
}
