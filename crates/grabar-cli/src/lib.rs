//! Grabar CLI: command-line interface for the recording-to-spec pipeline.
//!
//! ## Usage
//!
//! ```bash
//! grabar generate --request capture.json --root ./tests   # Build a bundle
//! grabar update create-sales-order --root ./tests delete-step 2
//! grabar refine raw-capture.js                            # Cleanup + candidates
//! grabar inspect --strategy label --selector 'Customer Name' --snapshot dom.json
//! grabar list --root ./tests                              # Bundles + state
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

pub use commands::{Cli, Commands};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
