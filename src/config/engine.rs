//! Engine configuration file
//!
//! Every field is optional in the file and falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};
use crate::observability::{Event, Logger, Severity};
use crate::schema::{CompactOptions, MergeMode};
use crate::serialization::SerializationConfig;
use crate::spill::DEFAULT_CACHE_SIZE;

const MAX_TEXT_INDENT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Elements a spilled array keeps in memory before spilling
    #[serde(default = "default_spill_cache_size")]
    pub spill_cache_size: usize,

    /// Directory for spill files (default: system temp dir)
    #[serde(default)]
    pub spill_dir: Option<PathBuf>,

    /// Indent step of the text serializer; 0 writes compact text
    #[serde(default = "default_text_indent")]
    pub text_indent: usize,

    /// "lenient" or "strict"
    #[serde(default = "default_merge_mode")]
    pub merge_mode: String,

    /// Compaction threshold for record schemas
    #[serde(default = "default_max_record_fields")]
    pub max_record_fields: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_spill_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}
fn default_text_indent() -> usize {
    2
}
fn default_merge_mode() -> String {
    "lenient".to_string()
}
fn default_max_record_fields() -> usize {
    64
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spill_cache_size: default_spill_cache_size(),
            spill_dir: None,
            text_indent: default_text_indent(),
            merge_mode: default_merge_mode(),
            max_record_fields: default_max_record_fields(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&content)?;
        Logger::info(
            Event::ConfigLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("spill_cache_size", config.spill_cache_size.to_string().as_str()),
            ],
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.text_indent > MAX_TEXT_INDENT {
            return Err(ConfigError::invalid(format!(
                "text_indent must be <= {}, got {}",
                MAX_TEXT_INDENT, self.text_indent
            )));
        }
        if self.max_record_fields == 0 {
            return Err(ConfigError::invalid("max_record_fields must be > 0"));
        }
        self.merge_mode()?;
        self.log_severity()?;
        Ok(())
    }

    pub fn merge_mode(&self) -> ConfigResult<MergeMode> {
        match self.merge_mode.as_str() {
            "lenient" => Ok(MergeMode::Lenient),
            "strict" => Ok(MergeMode::Strict),
            other => Err(ConfigError::invalid(format!(
                "merge_mode must be 'lenient' or 'strict', got '{}'",
                other
            ))),
        }
    }

    pub fn log_severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level)
            .ok_or_else(|| ConfigError::invalid(format!("unknown log_level '{}'", self.log_level)))
    }

    /// Set the process-wide logger threshold from `log_level`
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.log_severity()?);
        Ok(())
    }

    pub fn compact_options(&self) -> ConfigResult<CompactOptions> {
        Ok(CompactOptions {
            max_record_fields: self.max_record_fields,
            mode: self.merge_mode()?,
        })
    }

    /// Serialization settings derived from this config
    pub fn serialization_config(&self) -> SerializationConfig {
        SerializationConfig::new().with_indent(self.text_indent)
    }

    pub fn spill_dir(&self) -> Option<&Path> {
        self.spill_dir.as_deref()
    }
}
