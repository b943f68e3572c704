//! Shared types used throughout the library.

use serde::Serialize;
use std::sync::OnceLock;

/// A block with its property values, as stored in a region palette.
///
/// Properties keep the order they were decoded in, but equality only looks
/// at the name and the set of `(key, value)` pairs.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct BlockState {
    /// Block name, e.g., "minecraft:oak_stairs"
    pub name: String,
    /// Block properties, e.g., [("facing", "north"), ("half", "bottom")]
    pub properties: Vec<(String, String)>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// The default palette entry.
    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    /// Set a property, replacing any existing value for the same key.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    /// Look up a property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Get the namespace (e.g., "minecraft").
    pub fn namespace(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(ns, _)| ns)
            .unwrap_or("minecraft")
    }

    /// Get the block ID without namespace (e.g., "stone").
    pub fn block_id(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, id)| id)
            .unwrap_or(&self.name)
    }

    /// Check if this is an air block.
    pub fn is_air(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air" | "air"
        )
    }
}

impl PartialEq for BlockState {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .all(|(k, v)| other.property(k) == Some(v.as_str()))
    }
}

impl std::fmt::Display for BlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if self.has_properties() {
            let props: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "[{}]", props.join(","))?;
        }
        Ok(())
    }
}

/// Shared air state handed out when a palette has no usable entry.
pub(crate) fn fallback_air() -> &'static BlockState {
    static AIR: OnceLock<BlockState> = OnceLock::new();
    AIR.get_or_init(BlockState::air)
}
