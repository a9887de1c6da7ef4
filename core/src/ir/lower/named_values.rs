use std::collections::HashMap;

use crate::ir::value::Value;

/// Variable name to current SSA value, valid within one function body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues {
    values: HashMap<String, Value>,
}

impl NamedValues {
    pub fn new() -> Self {
        NamedValues::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Bind `name`, returning the value it shadowed.
    pub fn bind(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.insert(name.to_string(), value)
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> NamedValues {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: NamedValues) {
        *self = snapshot;
    }
}
