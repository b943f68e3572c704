//! Litematica schematic decoding.
//!
//! A schematic is a root compound holding format versions, a `Metadata`
//! compound and a `Regions` compound of named regions. Each region carries a
//! block-state palette and a bit-packed array of palette indices, one per
//! voxel.

pub mod bits;
mod fields;
pub mod region;

pub use region::{adjusted_extent, Region, RegionBlocks};

use crate::error::{Result, SchematicError};
use crate::nbt::{parse_nbt, Compound, NbtRoot, Tag};
use fields::Fields;
use glam::IVec3;
use region::vec3_compound;
use serde::Serialize;

/// Descriptive information stored alongside the regions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchematicMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    /// Size of the box enclosing all regions.
    pub enclosing_size: IVec3,
    pub region_count: i32,
    /// Non-air block count as recorded by the writer.
    pub total_blocks: i32,
    pub total_volume: i32,
    /// Milliseconds since the Unix epoch.
    pub time_created: i64,
    /// Milliseconds since the Unix epoch.
    pub time_modified: i64,
}

impl SchematicMetadata {
    fn from_compound(compound: &Compound, path: &str) -> Result<Self> {
        let fields = Fields::new(compound, path);
        Ok(Self {
            name: fields.string("Name")?.to_string(),
            author: fields.string("Author")?.to_string(),
            description: fields.string("Description")?.to_string(),
            enclosing_size: fields.vec3("EnclosingSize")?,
            region_count: fields.int("RegionCount")?,
            total_blocks: fields.int("TotalBlocks")?,
            total_volume: fields.int("TotalVolume")?,
            time_created: fields.long("TimeCreated")?,
            time_modified: fields.long("TimeModified")?,
        })
    }

    fn to_compound(&self) -> Compound {
        Compound::new()
            .with("TimeCreated", self.time_created)
            .with("TimeModified", self.time_modified)
            .with("EnclosingSize", vec3_compound(self.enclosing_size))
            .with("Description", self.description.as_str())
            .with("RegionCount", self.region_count)
            .with("TotalBlocks", self.total_blocks)
            .with("Author", self.author.as_str())
            .with("TotalVolume", self.total_volume)
            .with("Name", self.name.as_str())
    }
}

/// A decoded schematic.
#[derive(Debug, Clone, PartialEq)]
pub struct Schematic {
    pub minecraft_data_version: i32,
    pub version: i32,
    pub metadata: SchematicMetadata,
    /// Regions in file order.
    pub regions: Vec<Region>,
}

impl Schematic {
    /// Decode a schematic from file bytes, inflating gzip or zlib input first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let root = parse_nbt(bytes)?;
        Self::from_nbt(&root)
    }

    /// Decode a schematic from an already parsed tag tree.
    pub fn from_nbt(root: &NbtRoot) -> Result<Self> {
        let fields = Fields::new(&root.compound, "");

        let metadata = SchematicMetadata::from_compound(fields.compound("Metadata")?, "Metadata")?;

        let mut regions = Vec::new();
        for (name, tag) in fields.compound("Regions")?.iter() {
            let path = format!("Regions.{}", name);
            let compound = Fields::expect_compound(tag, &path)?;
            regions.push(Region::from_compound(name, compound, &path)?);
        }

        if metadata.region_count as usize != regions.len() {
            log::warn!(
                "Metadata declares {} regions but {} were found",
                metadata.region_count,
                regions.len()
            );
        }

        Ok(Self {
            minecraft_data_version: fields.int("MinecraftDataVersion")?,
            version: fields.int("Version")?,
            metadata,
            regions,
        })
    }

    /// Encode back into a tag tree.
    pub fn to_nbt(&self) -> NbtRoot {
        let regions: Compound = self
            .regions
            .iter()
            .map(|r| (r.name.as_str(), Tag::Compound(r.to_compound())))
            .collect();

        NbtRoot::new(
            "",
            Compound::new()
                .with("MinecraftDataVersion", self.minecraft_data_version)
                .with("Version", self.version)
                .with("Metadata", self.metadata.to_compound())
                .with("Regions", regions),
        )
    }

    /// Encode as uncompressed bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_nbt().to_bytes()
    }

    /// Look up a region by name.
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Total voxel count across all regions, or `None` if it overflows.
    pub fn volume(&self) -> Option<usize> {
        self.regions
            .iter()
            .try_fold(0usize, |total, r| total.checked_add(r.volume()?))
    }

    /// Non-air voxels across all regions.
    pub fn non_air_count(&self) -> usize {
        self.regions.iter().map(Region::non_air_count).sum()
    }
}
