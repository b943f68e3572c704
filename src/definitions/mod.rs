//! Block definition tables.
//!
//! The table maps block names to their parsed blockstate definition. It is
//! built once, then shared read-only with every resolver call.

pub mod blockstate;

pub use blockstate::{BlockDefinition, BlockVariant, Condition, MultipartRule};

use crate::error::{Result, SchematicError};
use serde::Deserialize;
use std::collections::HashMap;

/// One table entry. Parsing straight from the JSON text keeps the
/// declaration order of variant keys, which a `serde_json::Value` would not.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableEntry {
    Valid(BlockDefinition),
    Invalid(serde_json::Value),
}

fn invalid_reason(value: serde_json::Value) -> String {
    match serde_json::from_value::<BlockDefinition>(value) {
        Err(e) => e.to_string(),
        Ok(_) => "unrecognised blockstate".to_string(),
    }
}

/// Block name to definition lookup.
#[derive(Debug, Default, Clone)]
pub struct BlockDefinitions {
    definitions: HashMap<String, BlockDefinition>,
}

impl BlockDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `name -> blockstate`. Any invalid entry fails
    /// the whole table.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, TableEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (name, entry) in raw {
            match entry {
                TableEntry::Valid(definition) => table.insert(name, definition),
                TableEntry::Invalid(value) => {
                    return Err(SchematicError::definition(&name, invalid_reason(value)))
                }
            }
        }
        Ok(table)
    }

    /// Parse a JSON object of `name -> blockstate`, skipping entries that
    /// fail to parse.
    pub fn from_json_lenient(json: &str) -> Result<Self> {
        let raw: HashMap<String, TableEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (name, entry) in raw {
            match entry {
                TableEntry::Valid(definition) => table.insert(name, definition),
                TableEntry::Invalid(value) => {
                    log::warn!("Failed to load definition {}: {}", name, invalid_reason(value));
                }
            }
        }
        Ok(table)
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, name: impl Into<String>, definition: BlockDefinition) {
        self.definitions.insert(name.into(), definition);
    }

    /// Get a definition by block name.
    ///
    /// "minecraft:stone" and "stone" find each other, so tables keyed either
    /// way work with palette names.
    pub fn get(&self, name: &str) -> Option<&BlockDefinition> {
        if let Some(def) = self.definitions.get(name) {
            return Some(def);
        }
        match name.strip_prefix("minecraft:") {
            Some(bare) => self.definitions.get(bare),
            None if !name.contains(':') => {
                self.definitions.get(&format!("minecraft:{}", name))
            }
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Block names in the table, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.definitions.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}
