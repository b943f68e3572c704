//! # Schematic Reader
//!
//! A Rust library for decoding Litematica schematics and resolving block
//! states to their blockstate model variants.
//!
//! ## Overview
//!
//! Schematic files are NBT tag trees, usually gzip compressed. This library
//! reads and writes NBT, decodes the schematic layout into regions with
//! bit-packed block palettes, and resolves each block state against a table
//! of blockstate definitions. Turning the variants into geometry is left to
//! the caller.
//!
//! ## Quick Start
//!
//! ```ignore
//! use schematic_reader::{BlockDefinitions, Schematic, StateResolver};
//!
//! let schematic = Schematic::from_bytes(&std::fs::read("house.litematic")?)?;
//! let definitions = BlockDefinitions::from_json(&blockstates_json)?;
//! let resolver = StateResolver::new(&definitions);
//!
//! let mut rng = rand::thread_rng();
//! for region in &schematic.regions {
//!     for (pos, block) in region.blocks().filter(|(_, b)| !b.is_air()) {
//!         let variants = resolver.resolve(block, &mut rng)?;
//!         // hand `variants` at `region.position + pos` to a mesh builder
//!     }
//! }
//! ```

pub mod definitions;
pub mod error;
pub mod nbt;
pub mod resolver;
pub mod schematic;
pub mod types;

// Re-export main types for convenience
pub use definitions::{BlockDefinition, BlockDefinitions, BlockVariant, Condition, MultipartRule};
pub use error::{Result, SchematicError};
pub use nbt::{
    parse_nbt, Compound, Compression, List, NbtReader, NbtRoot, NbtWriter, ReaderConfig, Tag,
    TagKind,
};
pub use resolver::{resolve_block, StateResolver};
pub use schematic::{Region, Schematic, SchematicMetadata};
pub use types::BlockState;

/// Load a schematic from a file path.
pub fn load_schematic<P: AsRef<std::path::Path>>(path: P) -> Result<Schematic> {
    let bytes = std::fs::read(path)?;
    Schematic::from_bytes(&bytes)
}
