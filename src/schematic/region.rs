//! Schematic regions: palette, packed indices and voxel lookup.

use super::bits::{bits_per_entry, pack_indices, unpack_index};
use super::fields::Fields;
use crate::error::{Result, SchematicError};
use crate::nbt::{Compound, List, Tag, TagKind};
use crate::types::{fallback_air, BlockState};
use glam::IVec3;

/// Iteration extent along one axis for a signed size anchored at `position`.
///
/// Negative sizes extend from `position` toward lower coordinates. The
/// arithmetic matches the files Litematica writes, including the result of 2
/// for a zero size; keep it as is. Returns `None` when the far corner or the
/// extent does not fit in an `i32`.
pub fn adjusted_extent(size: i32, position: i32) -> Option<i32> {
    let span = if size >= 0 { size - 1 } else { size + 1 };
    let relative = span.checked_add(position)?;
    relative
        .max(position)
        .checked_sub(relative.min(position))?
        .checked_add(1)
}

/// A named sub-volume of a schematic.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    /// Signed size; negative components extend away from `position`.
    pub size: IVec3,
    pub position: IVec3,
    /// Palette, entry 0 being the default (air) state.
    pub palette: Vec<BlockState>,
    /// Bit-packed palette indices, see [`super::bits`].
    pub block_states: Vec<i64>,
    pub entities: List,
    pub tile_entities: List,
    pub pending_block_ticks: List,
    pub pending_fluid_ticks: List,
}

impl Region {
    /// Build a region from per-voxel palette indices in Y, Z, X order.
    pub fn from_indices(
        name: impl Into<String>,
        size: IVec3,
        position: IVec3,
        palette: Vec<BlockState>,
        indices: &[u64],
    ) -> Self {
        let bits = bits_per_entry(palette.len());
        Self {
            name: name.into(),
            size,
            position,
            palette,
            block_states: pack_indices(indices, bits),
            entities: List::new(TagKind::Compound),
            tile_entities: List::new(TagKind::Compound),
            pending_block_ticks: List::new(TagKind::Compound),
            pending_fluid_ticks: List::new(TagKind::Compound),
        }
    }

    pub(crate) fn from_compound(name: &str, compound: &Compound, path: &str) -> Result<Self> {
        let fields = Fields::new(compound, path);

        let palette = fields
            .list("BlockStatePalette")?
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                let entry_path = format!("{}.BlockStatePalette[{}]", path, i);
                let entry = Fields::expect_compound(tag, &entry_path)?;
                block_state_from_compound(entry, &entry_path)
            })
            .collect::<Result<Vec<_>>>()?;

        let region = Self {
            name: name.to_string(),
            size: fields.vec3("Size")?,
            position: fields.vec3("Position")?,
            palette,
            block_states: fields.long_array("BlockStates")?.to_vec(),
            entities: fields.opaque_list("Entities")?,
            tile_entities: fields.opaque_list("TileEntities")?,
            pending_block_ticks: fields.opaque_list("PendingBlockTicks")?,
            pending_fluid_ticks: fields.opaque_list("PendingFluidTicks")?,
        };

        if region.volume().is_none() {
            return Err(SchematicError::schema(
                format!("{}.Size", path),
                format!(
                    "size {} at position {} overflows the addressable volume",
                    region.size, region.position
                ),
            ));
        }

        log::debug!(
            "Decoded region '{}': size {}, {} palette entries, {} words",
            region.name,
            region.size,
            region.palette.len(),
            region.block_states.len()
        );

        Ok(region)
    }

    pub(crate) fn to_compound(&self) -> Compound {
        let palette = List::from_parts(
            TagKind::Compound,
            self.palette
                .iter()
                .map(|state| Tag::Compound(block_state_to_compound(state)))
                .collect(),
        );

        Compound::new()
            .with("BlockStates", Tag::LongArray(self.block_states.clone()))
            .with("PendingBlockTicks", self.pending_block_ticks.clone())
            .with("Position", vec3_compound(self.position))
            .with("BlockStatePalette", palette)
            .with("Size", vec3_compound(self.size))
            .with("PendingFluidTicks", self.pending_fluid_ticks.clone())
            .with("TileEntities", self.tile_entities.clone())
            .with("Entities", self.entities.clone())
    }

    /// Iteration extent on each axis, or `None` if an axis overflows.
    pub fn extent(&self) -> Option<IVec3> {
        Some(IVec3::new(
            adjusted_extent(self.size.x, self.position.x)?,
            adjusted_extent(self.size.y, self.position.y)?,
            adjusted_extent(self.size.z, self.position.z)?,
        ))
    }

    /// Number of voxels covered by the extent, or `None` if it overflows.
    pub fn volume(&self) -> Option<usize> {
        self.dimensions().map(|(_, volume)| volume)
    }

    fn dimensions(&self) -> Option<(IVec3, usize)> {
        let e = self.extent()?;
        let volume = (e.x as usize)
            .checked_mul(e.y as usize)?
            .checked_mul(e.z as usize)?;
        Some((e, volume))
    }

    /// Bits per packed entry for this region's palette.
    pub fn bits_per_entry(&self) -> u32 {
        bits_per_entry(self.palette.len())
    }

    fn linear_index(&self, extent: IVec3, x: i32, y: i32, z: i32) -> Option<usize> {
        if x < 0 || y < 0 || z < 0 || x >= extent.x || y >= extent.y || z >= extent.z {
            return None;
        }
        // In bounds of a representable volume, so this cannot overflow.
        let (ex, ez) = (extent.x as usize, extent.z as usize);
        Some(x as usize + z as usize * ex + y as usize * ex * ez)
    }

    /// Raw palette index stored for a voxel, or `None` outside the extent.
    pub fn palette_index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let (extent, _) = self.dimensions()?;
        let index = self.linear_index(extent, x, y, z)?;
        Some(unpack_index(&self.block_states, self.bits_per_entry(), index) as usize)
    }

    /// Block state at region-local coordinates.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&BlockState> {
        let index = self.palette_index(x, y, z)?;
        Some(self.state_for(index))
    }

    /// Palette entry for an index; indices past the palette fall back to entry 0.
    fn state_for(&self, index: usize) -> &BlockState {
        match self.palette.get(index) {
            Some(state) => state,
            None => {
                log::trace!(
                    "Palette index {} out of range in region '{}' ({} entries)",
                    index,
                    self.name,
                    self.palette.len()
                );
                self.palette.first().unwrap_or_else(|| fallback_air())
            }
        }
    }

    /// All voxels in Y-outer, Z-middle, X-inner order.
    ///
    /// Yields nothing when the dimensions overflow.
    pub fn blocks(&self) -> RegionBlocks<'_> {
        let (extent, volume) = self.dimensions().unwrap_or((IVec3::ZERO, 0));
        RegionBlocks {
            region: self,
            extent,
            bits: self.bits_per_entry(),
            next: 0,
            volume,
        }
    }

    /// Count of voxels that are not air.
    pub fn non_air_count(&self) -> usize {
        self.blocks().filter(|(_, state)| !state.is_air()).count()
    }
}

/// Iterator over the voxels of a region.
pub struct RegionBlocks<'a> {
    region: &'a Region,
    extent: IVec3,
    bits: u32,
    next: usize,
    volume: usize,
}

impl<'a> Iterator for RegionBlocks<'a> {
    type Item = (IVec3, &'a BlockState);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.volume {
            return None;
        }
        let i = self.next;
        self.next += 1;

        let (ex, ez) = (self.extent.x as usize, self.extent.z as usize);
        let pos = IVec3::new((i % ex) as i32, (i / (ex * ez)) as i32, ((i / ex) % ez) as i32);
        let index = unpack_index(&self.region.block_states, self.bits, i) as usize;
        Some((pos, self.region.state_for(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.volume - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RegionBlocks<'_> {}

fn block_state_from_compound(compound: &Compound, path: &str) -> Result<BlockState> {
    let fields = Fields::new(compound, path);
    let mut state = BlockState::new(fields.string("Name")?);

    if let Some(props) = fields.optional_compound("Properties")? {
        for (key, value) in props.iter() {
            let value = Fields::expect_string(value, &format!("{}.Properties.{}", path, key))?;
            state.properties.push((key.to_string(), value.to_string()));
        }
    }

    Ok(state)
}

fn block_state_to_compound(state: &BlockState) -> Compound {
    let mut compound = Compound::new().with("Name", state.name.as_str());
    if state.has_properties() {
        let props: Compound = state
            .properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        compound.insert("Properties", props);
    }
    compound
}

pub(crate) fn vec3_compound(v: IVec3) -> Compound {
    Compound::new().with("x", v.x).with("y", v.y).with("z", v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<BlockState> {
        vec![
            BlockState::air(),
            BlockState::new("minecraft:stone"),
            BlockState::new("minecraft:dirt"),
            BlockState::new("minecraft:oak_log").with_property("axis", "y"),
            BlockState::new("minecraft:glass"),
        ]
    }

    #[test]
    fn test_adjusted_extent() {
        assert_eq!(adjusted_extent(5, 0), Some(5));
        assert_eq!(adjusted_extent(1, 0), Some(1));
        assert_eq!(adjusted_extent(-3, 0), Some(3));
        assert_eq!(adjusted_extent(-3, 10), Some(3));
        assert_eq!(adjusted_extent(-3, -7), Some(3));
        assert_eq!(adjusted_extent(4, -2), Some(4));
        // Zero size keeps the sign-adjusted arithmetic.
        assert_eq!(adjusted_extent(0, 0), Some(2));
        assert_eq!(adjusted_extent(0, 12), Some(2));
    }

    #[test]
    fn test_adjusted_extent_overflow() {
        assert_eq!(adjusted_extent(i32::MIN, -5), None);
        assert_eq!(adjusted_extent(5, i32::MAX), None);
        assert_eq!(adjusted_extent(i32::MIN, 0), None);
        assert_eq!(adjusted_extent(i32::MAX, 0), Some(i32::MAX));
        assert_eq!(adjusted_extent(-1, i32::MIN), Some(1));
        assert_eq!(adjusted_extent(i32::MIN + 2, -1), Some(i32::MAX - 1));
    }

    #[test]
    fn test_region_extent() {
        let region = Region::from_indices(
            "main",
            IVec3::new(5, 5, 5),
            IVec3::ZERO,
            palette(),
            &[],
        );
        assert_eq!(region.extent(), Some(IVec3::new(5, 5, 5)));
        assert_eq!(region.volume(), Some(125));

        let negative = Region::from_indices(
            "neg",
            IVec3::new(-3, 2, -4),
            IVec3::new(6, 1, -2),
            palette(),
            &[],
        );
        assert_eq!(negative.extent(), Some(IVec3::new(3, 2, 4)));
    }

    #[test]
    fn test_overflowing_dimensions() {
        let far_corner = Region::from_indices(
            "far",
            IVec3::new(i32::MIN, 1, 1),
            IVec3::new(-5, 0, 0),
            palette(),
            &[1],
        );
        let too_big = Region::from_indices(
            "big",
            IVec3::splat(1 << 30),
            IVec3::ZERO,
            palette(),
            &[1],
        );

        assert_eq!(far_corner.extent(), None);
        assert_eq!(too_big.extent(), Some(IVec3::splat(1 << 30)));

        for region in [&far_corner, &too_big] {
            assert_eq!(region.volume(), None);
            assert_eq!(region.palette_index(0, 0, 0), None);
            assert_eq!(region.block_at(0, 0, 0), None);
            assert_eq!(region.blocks().len(), 0);
            assert_eq!(region.non_air_count(), 0);

            match Region::from_compound(&region.name, &region.to_compound(), "Regions.r") {
                Err(SchematicError::SchemaMismatch { path, .. }) => {
                    assert_eq!(path, "Regions.r.Size")
                }
                other => panic!("Expected SchemaMismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_block_lookup_order() {
        // 2 x 2 x 3 (x, y, z); index = x + z*2 + y*6
        let indices: Vec<u64> = (0..12).map(|i| i % 5).collect();
        let region = Region::from_indices(
            "main",
            IVec3::new(2, 2, 3),
            IVec3::ZERO,
            palette(),
            &indices,
        );

        assert_eq!(region.bits_per_entry(), 3);
        assert_eq!(region.palette_index(0, 0, 0), Some(0));
        assert_eq!(region.palette_index(1, 0, 0), Some(1));
        assert_eq!(region.palette_index(0, 0, 1), Some(2));
        assert_eq!(region.palette_index(1, 1, 2), Some(11 % 5));
        assert_eq!(region.block_at(1, 0, 0).unwrap().name, "minecraft:stone");
        assert_eq!(region.block_at(2, 0, 0), None);
        assert_eq!(region.block_at(0, -1, 0), None);

        let visited: Vec<IVec3> = region.blocks().map(|(pos, _)| pos).collect();
        assert_eq!(visited.len(), 12);
        assert_eq!(visited[0], IVec3::new(0, 0, 0));
        assert_eq!(visited[1], IVec3::new(1, 0, 0));
        assert_eq!(visited[2], IVec3::new(0, 0, 1));
        assert_eq!(visited[6], IVec3::new(0, 1, 0));
        for (pos, state) in region.blocks() {
            assert_eq!(Some(state), region.block_at(pos.x, pos.y, pos.z));
        }
    }

    #[test]
    fn test_out_of_range_index_uses_default_entry() {
        // Palette of 3 -> 2 bits, so index 3 is representable but invalid.
        let palette = vec![
            BlockState::air(),
            BlockState::new("minecraft:stone"),
            BlockState::new("minecraft:dirt"),
        ];
        let region = Region::from_indices(
            "main",
            IVec3::new(4, 1, 1),
            IVec3::ZERO,
            palette,
            &[1, 3, 2, 3],
        );

        assert_eq!(region.palette_index(1, 0, 0), Some(3));
        assert!(region.block_at(1, 0, 0).unwrap().is_air());
        assert_eq!(region.block_at(2, 0, 0).unwrap().name, "minecraft:dirt");
        assert_eq!(region.non_air_count(), 2);
    }

    #[test]
    fn test_empty_palette_falls_back_to_air() {
        let region = Region::from_indices("main", IVec3::ONE, IVec3::ZERO, Vec::new(), &[0]);
        assert!(region.block_at(0, 0, 0).unwrap().is_air());
    }

    #[test]
    fn test_compound_round_trip() {
        let region = Region::from_indices(
            "main",
            IVec3::new(2, 1, 2),
            IVec3::new(0, 64, 0),
            palette(),
            &[0, 1, 3, 4],
        );
        let compound = region.to_compound();
        let decoded = Region::from_compound("main", &compound, "Regions.main").unwrap();
        assert_eq!(decoded, region);
        assert_eq!(
            decoded.block_at(0, 0, 1).unwrap().property("axis"),
            Some("y")
        );
    }

    #[test]
    fn test_missing_field() {
        let compound = Region::from_indices("main", IVec3::ONE, IVec3::ZERO, palette(), &[0])
            .to_compound();
        let mut broken = compound.clone();
        broken.remove("BlockStates");
        match Region::from_compound("main", &broken, "Regions.main") {
            Err(SchematicError::SchemaMismatch { path, .. }) => {
                assert_eq!(path, "Regions.main.BlockStates")
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }

        let mut wrong_kind = compound;
        wrong_kind.insert("Size", 3);
        assert!(matches!(
            Region::from_compound("main", &wrong_kind, "Regions.main"),
            Err(SchematicError::SchemaMismatch { .. })
        ));
    }
}
