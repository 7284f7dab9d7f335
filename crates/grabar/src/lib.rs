//! Grabar: the recording-to-spec compilation pipeline.
//!
//! Grabar (Spanish: "to record") turns a raw, noisy stream of captured
//! browser interactions plus a human's refinements into a clean,
//! parameterized, versionable test bundle — and keeps that bundle editable
//! afterwards without destroying unrelated content.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     GRABAR Pipeline                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐  │
//! │  │ Recording │──►│ Navigation│──►│ Parameter │──►│ Spec      │  │
//! │  │ Session   │   │ Cleanup   │   │ Detector  │   │ Generator │  │
//! │  └───────────┘   └───────────┘   └───────────┘   └─────┬─────┘  │
//! │        │                                               ▼        │
//! │  ┌───────────┐                                   ┌───────────┐  │
//! │  │ Locator   │  (hover-time grading,             │ Test      │  │
//! │  │ Evaluator │   live DOM via `browser` feature) │ Bundle    │  │
//! │  └───────────┘                                   └─────┬─────┘  │
//! │                                                        ▼        │
//! │                                                  ┌───────────┐  │
//! │                                                  │ Spec      │  │
//! │                                                  │ Updater   │  │
//! │                                                  └───────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The static passes (cleanup, detection) are fail-soft: they degrade to
//! "no transformation applied" instead of erroring. Bundle writes are
//! atomic and serialized per bundle.

#![warn(missing_docs)]

pub mod bundle;
pub mod cleanup;
pub mod evaluator;
pub mod generate;
pub mod index;
pub mod locator;
pub mod params;
pub mod result;
pub mod session;
pub mod step;
pub mod update;

pub use result::{GrabarError, GrabarResult};

/// Commonly used items.
pub mod prelude {
    pub use crate::bundle::{
        bundle_paths, bundle_state, list_bundles, slug, BundleState, BundleSummary, TestBundle,
    };
    pub use crate::cleanup::{CleanupConfig, NavigationCleanup};
    pub use crate::evaluator::{
        evaluate, DomProbe, EvaluationSession, EvaluatorOptions, FixtureElement, Level,
        LocatorEvaluation, StaticDomProbe,
    };
    pub use crate::generate::{
        GenerateRequest, ParameterBinding, RunStatus, SpecGenerator, TestMeta,
    };
    pub use crate::index::{
        recover_from_spec, LocatorIndex, LocatorIndexEntry, MaintenanceStatus, MaintenanceStore,
    };
    pub use crate::locator::{Locator, Strategy, Strength};
    pub use crate::params::{detect, ParameterCandidate};
    pub use crate::result::{GrabarError, GrabarResult};
    pub use crate::session::{CapturedEvent, RecordingSession, SessionConfig, StepSink};
    pub use crate::step::{ActionKind, FrameContext, RecordedStep};
    pub use crate::update::{SpecUpdater, StepEdit};
    pub use grabar_script::transform::{SourceTransform, TransformOutcome};
}
