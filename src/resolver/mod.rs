//! Block state to variant resolution.
//!
//! Given a block state and a table of block definitions, this module computes
//! which model variants apply: the best scoring key of a `variants` table, or
//! every passing rule of a `multipart` list.

pub mod multipart;
pub mod state_resolver;

pub use state_resolver::{resolve_definition, StateResolver};

use crate::definitions::{BlockDefinitions, BlockVariant};
use crate::error::Result;
use crate::types::BlockState;

/// Resolve a block using the thread-local random generator.
pub fn resolve_block(
    definitions: &BlockDefinitions,
    block: &BlockState,
) -> Result<Vec<BlockVariant>> {
    StateResolver::new(definitions).resolve(block, &mut rand::thread_rng())
}
