use crate::ScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs for one interpretation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Deepest subdirectory nesting that is walked. The root is depth 0.
    pub max_depth: u32,
    /// Treat entries whose first name byte is 0xE5 as unused.
    pub skip_deleted: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: 32,
            skip_deleted: true,
        }
    }
}

impl WalkOptions {
    pub fn from_json_str(json: &str) -> Result<Self, ScanError> {
        let options: WalkOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.max_depth == 0 {
            return Err(ScanError::Configuration(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
