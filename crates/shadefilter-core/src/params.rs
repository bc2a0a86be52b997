use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A typed uniform value cached until the next `process()`.
///
/// JSON form is externally tagged: `{"f2": [0.5, 0.5]}`, `{"i1": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    F2([f32; 2]),
    I2([i32; 2]),
    F1(f32),
    I1(i32),
}

/// Program-scoped parameter entries, keyed by uniform name.
///
/// Last write for a name wins. The whole table is dropped whenever the shader source changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTable {
    entries: HashMap<String, ParamValue>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry. Returns the previous value, if any.
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.entries.get(name).copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
