//! CLI Layer
//!
//! Thin driver over the library: flag handling, console output, and the
//! watch loop. All user-facing printing lives here; the engine only emits
//! tracing events.

pub mod output;
pub mod run;

pub use run::{RunOptions, RunOutcome, run};
