//! High-level orchestration layer over the lower-level crates.
//! Intentionally thin: exposes stable functions used by the CLI.

pub use swiftloc_core::Result;

mod artifacts;
mod check;
mod pipeline;
mod project;
mod scan;

pub use artifacts::{write_candidates_artifact, write_candidates_csv, write_results_artifact};
pub use check::{run_check, Violation};
pub use pipeline::{run_onboard, OnboardOptions, OnboardOutcome};
pub use project::{ProjectError, ProjectLayout, ProjectOverrides};
pub use scan::{collect_candidates, ScanOutcome};
