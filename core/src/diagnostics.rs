//! file: core/src/diagnostics.rs
//! description: diagnostic channel used by lowering.
//!
//! Lowering never aborts on a user error. It writes one human-readable
//! message to a `DiagnosticSink` at the point of detection and returns the
//! failure to its caller. `LogSink` forwards to the `log` facade and
//! `MemorySink` keeps the messages around for inspection.
//!
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Level;

pub trait DiagnosticSink {
    fn emit(&mut self, level: Level, issuer: &str, message: &str);
}

/// Forwards every diagnostic to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, level: Level, issuer: &str, message: &str) {
        match level {
            Level::Info => log::info!("[{}] {}", issuer, message),
            Level::Warning => log::warn!("[{}] {}", issuer, message),
            Level::Error | Level::Critical => log::error!("[{}] {}", issuer, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub issuer: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.level, self.issuer, self.message)
    }
}

/// Buffers diagnostics in memory. Clones share the same buffer, so a clone
/// can be handed to a `CodegenContext` while the caller keeps reading.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|d| d.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&mut self, level: Level, issuer: &str, message: &str) {
        log::debug!("[{}] buffered diagnostic: {}", issuer, message);
        self.entries.borrow_mut().push(Diagnostic {
            level,
            issuer: issuer.to_string(),
            message: message.to_string(),
        });
    }
}
