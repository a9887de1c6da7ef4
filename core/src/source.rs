use std::path::{Path, PathBuf};

use crate::ast::Item;
use crate::{KaleidoErrorExt, Level};

/// Read a JSON array of items from a file.
pub fn load_items(path: &Path) -> Result<Vec<Item>, LoadError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| LoadError::new(Some(path.to_path_buf()), format!("cannot read source: {}", e)))?;
    parse_items(&content).map_err(|e| e.with_path(path.to_path_buf()))
}

pub fn parse_items(text: &str) -> Result<Vec<Item>, LoadError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| LoadError::new(None, format!("malformed item list: {}", e)))
}

/// Parse a single item, e.g. one REPL line.
pub fn parse_item(text: &str) -> Result<Item, LoadError> {
    serde_json::from_str(text.trim()).map_err(|e| LoadError::new(None, format!("malformed item: {}", e)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadError {
    pub path: Option<PathBuf>,
    pub message: String,
}

impl LoadError {
    pub fn new(path: Option<PathBuf>, message: String) -> Self {
        LoadError { path, message }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} (in {:?})", self.message, path),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for LoadError {}

impl KaleidoErrorExt for LoadError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        "kaleido.source".to_string()
    }
}
