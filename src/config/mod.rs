//! Configuration
//!
//! Settings types and the figment-based loader. Precedence, low to high:
//! defaults, config file, environment, CLI flags.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AnalysisSettings, Config, CosmosSettings, CustomPatternEntry, OutputSettings,
    SnapshotSettings,
};
