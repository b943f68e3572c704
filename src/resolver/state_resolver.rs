//! Block state to variant resolution.

use crate::definitions::{BlockDefinition, BlockDefinitions, BlockVariant, MultipartRule};
use crate::error::{Result, SchematicError};
use crate::types::BlockState;
use rand::Rng;

/// Resolves block states to the variants of their block definition.
///
/// The resolver only borrows the table. Randomness comes from the caller so
/// results can be pinned with a seeded generator.
pub struct StateResolver<'a> {
    definitions: &'a BlockDefinitions,
}

impl<'a> StateResolver<'a> {
    pub fn new(definitions: &'a BlockDefinitions) -> Self {
        Self { definitions }
    }

    /// Resolve a block to the variants that apply to it.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        block: &BlockState,
        rng: &mut R,
    ) -> Result<Vec<BlockVariant>> {
        let definition = self
            .definitions
            .get(&block.name)
            .ok_or_else(|| SchematicError::UnknownBlock(block.name.clone()))?;

        resolve_definition(definition, block, rng)
    }
}

/// Resolve a block against a single definition.
pub fn resolve_definition<R: Rng + ?Sized>(
    definition: &BlockDefinition,
    block: &BlockState,
    rng: &mut R,
) -> Result<Vec<BlockVariant>> {
    match definition {
        BlockDefinition::Variants(variants) => {
            resolve_variants(variants, block, rng).map(|v| vec![v])
        }
        BlockDefinition::Multipart(rules) => resolve_multipart(rules, block, rng),
    }
}

/// Count the `property=value` constraints of a variant key the block satisfies.
fn variant_key_score(key: &str, block: &BlockState) -> i64 {
    key.split(',')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(prop, value)| block.property(prop) == Some(*value))
        .count() as i64
}

/// Pick the best scoring key. Ties go to the key declared first.
fn resolve_variants<R: Rng + ?Sized>(
    variants: &[(String, Vec<BlockVariant>)],
    block: &BlockState,
    rng: &mut R,
) -> Result<BlockVariant> {
    let mut best: Option<&(String, Vec<BlockVariant>)> = None;
    let mut best_score = i64::MIN;

    for entry in variants {
        let score = variant_key_score(&entry.0, block);
        if score > best_score {
            best_score = score;
            best = Some(entry);
        }
    }

    let (key, choices) = best.ok_or_else(|| {
        SchematicError::definition(&block.name, "variants table has no entries")
    })?;

    log::trace!("{} matched variant key '{}' (score {})", block, key, best_score);

    choose(choices, rng).ok_or_else(|| {
        SchematicError::definition(&block.name, format!("variant '{}' has no models", key))
    })
}

/// Apply every rule whose condition holds, in declaration order.
fn resolve_multipart<R: Rng + ?Sized>(
    rules: &[MultipartRule],
    block: &BlockState,
    rng: &mut R,
) -> Result<Vec<BlockVariant>> {
    let mut result = Vec::new();

    for (i, rule) in rules.iter().enumerate() {
        let applies = match &rule.when {
            Some(condition) => condition.matches(block),
            None => true,
        };

        if applies {
            let variant = choose(&rule.apply, rng).ok_or_else(|| {
                SchematicError::definition(
                    &block.name,
                    format!("multipart rule {} has an empty apply list", i),
                )
            })?;
            result.push(variant);
        }
    }

    Ok(result)
}

/// Uniform choice; `weight` is not applied.
fn choose<R: Rng + ?Sized>(choices: &[BlockVariant], rng: &mut R) -> Option<BlockVariant> {
    match choices.len() {
        0 => None,
        1 => Some(choices[0].clone()),
        n => Some(choices[rng.gen_range(0..n)].clone()),
    }
}
