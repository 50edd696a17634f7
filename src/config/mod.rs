//! Engine configuration
//!
//! Loaded once at startup from a JSON file, validated, then passed by
//! reference. Nothing here is reloaded at runtime.

mod engine;
mod errors;

pub use engine::EngineConfig;
pub use errors::{ConfigError, ConfigResult};
