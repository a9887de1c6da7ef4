//! file: core/src/config.rs
//! description: options controlling lowering and execution.
//!
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::source::LoadError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenOptions {
    /// Run the optimization pipeline over each lowered function.
    pub optimize: bool,
    /// Validate each function before (and after) optimization.
    pub verify: bool,
    pub max_call_depth: usize,
    pub max_steps: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            optimize: true,
            verify: true,
            max_call_depth: 1024,
            max_steps: 10_000_000,
        }
    }
}

impl CodegenOptions {
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        serde_json::from_str(text).map_err(|e| LoadError::new(None, format!("invalid options: {}", e)))
    }

    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoadError::new(Some(path.to_path_buf()), format!("cannot read options: {}", e)))?;
        let options = Self::from_json_str(&text).map_err(|e| e.with_path(path.to_path_buf()))?;
        log::debug!("loaded options from {:?}: {:?}", path, options);
        Ok(options)
    }
}
