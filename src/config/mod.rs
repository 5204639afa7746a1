//! Configuration module for Vibra.
//!
//! Settings come from a TOML file, with a few `VIBRA_*` environment overrides.

mod settings;

pub use settings::{
    AmbiguityMode, AnalysisSettings, DatabaseSettings, GeneralSettings, LlmSettings,
    ServerSettings, Settings,
};
