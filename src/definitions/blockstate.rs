//! Blockstate definition parsing.
//!
//! Blockstates define how block properties map to model variants.
//! There are two formats: "variants" and "multipart".

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A blockstate definition from blockstates/*.json.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockDefinition {
    /// Property combinations mapped to models, in declaration order.
    Variants(Vec<(String, Vec<BlockVariant>)>),
    /// Conditional model application.
    Multipart(Vec<MultipartRule>),
}

impl<'de> Deserialize<'de> for BlockDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawBlockstate {
            variants: Option<OrderedVariants>,
            multipart: Option<Vec<MultipartRule>>,
        }

        let raw = RawBlockstate::deserialize(deserializer)?;

        match (raw.variants, raw.multipart) {
            (Some(variants), None) => Ok(BlockDefinition::Variants(variants.0)),
            (None, Some(multipart)) => Ok(BlockDefinition::Multipart(multipart)),
            (Some(_), Some(_)) => Err(de::Error::custom(
                "blockstate has both `variants` and `multipart`",
            )),
            (None, None) => Err(de::Error::custom(
                "blockstate has neither `variants` nor `multipart`",
            )),
        }
    }
}

/// Variant table that keeps the JSON key order.
struct OrderedVariants(Vec<(String, Vec<BlockVariant>)>);

impl<'de> Deserialize<'de> for OrderedVariants {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedVariants;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of variant keys to models")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, OneOrMany>()? {
                    entries.push((key, value.into_vec()));
                }
                Ok(OrderedVariants(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// A variant value can be a single model or an array of models.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Single(BlockVariant),
    Multiple(Vec<BlockVariant>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<BlockVariant> {
        match self {
            OneOrMany::Single(v) => vec![v],
            OneOrMany::Multiple(v) => v,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<BlockVariant>, D::Error>
where
    D: Deserializer<'de>,
{
    OneOrMany::deserialize(deserializer).map(OneOrMany::into_vec)
}

/// A model variant reference with optional rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockVariant {
    /// Model resource location (e.g., "block/stone" or "minecraft:block/stone").
    pub model: String,
    /// X rotation in degrees.
    #[serde(default)]
    pub x: f32,
    /// Y rotation in degrees.
    #[serde(default)]
    pub y: f32,
    /// If true, UV coordinates don't rotate with the block.
    #[serde(default)]
    pub uvlock: bool,
    /// Weight for random selection (default 1). Parsed, not used for sampling.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl BlockVariant {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            x: 0.0,
            y: 0.0,
            uvlock: false,
            weight: default_weight(),
        }
    }

    /// Get the full resource location for the model.
    pub fn model_location(&self) -> String {
        if self.model.contains(':') {
            self.model.clone()
        } else {
            format!("minecraft:{}", self.model)
        }
    }
}

/// A multipart rule with an optional condition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultipartRule {
    /// Condition for when this rule applies; `None` always applies.
    #[serde(default)]
    pub when: Option<Condition>,
    /// Model(s) to choose from when the condition holds.
    #[serde(deserialize_with = "one_or_many")]
    pub apply: Vec<BlockVariant>,
}

/// Multipart `when` clause.
///
/// Direct fields, `AND` and `OR` may all appear together; see
/// [`Condition::matches`](crate::resolver::multipart) for the evaluation rules.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Condition {
    /// Each element is a conjunction of property constraints.
    #[serde(rename = "AND", default)]
    pub and: Vec<HashMap<String, String>>,
    /// Each element is satisfied by any one of its constraints.
    #[serde(rename = "OR", default)]
    pub or: Option<Vec<HashMap<String, String>>>,
    /// Direct `property: value` constraints.
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}
