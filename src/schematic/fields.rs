//! Typed field access over compounds with path-aware errors.

use crate::error::{Result, SchematicError};
use crate::nbt::{Compound, List, Tag, TagKind};
use glam::IVec3;

/// Borrowed view of a compound that reports missing or mistyped fields
/// as [`SchematicError::SchemaMismatch`] with a dotted path.
pub(crate) struct Fields<'a> {
    compound: &'a Compound,
    path: &'a str,
}

impl<'a> Fields<'a> {
    pub fn new(compound: &'a Compound, path: &'a str) -> Self {
        Self { compound, path }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn require(&self, key: &str) -> Result<&'a Tag> {
        self.compound
            .get(key)
            .ok_or_else(|| SchematicError::schema(self.child_path(key), "missing field"))
    }

    fn mismatch(path: String, expected: TagKind, found: &Tag) -> SchematicError {
        SchematicError::schema(
            path,
            format!("expected {}, found {}", expected, found.kind()),
        )
    }

    pub fn expect_compound<'t>(tag: &'t Tag, path: &str) -> Result<&'t Compound> {
        tag.as_compound()
            .ok_or_else(|| Self::mismatch(path.to_string(), TagKind::Compound, tag))
    }

    pub fn expect_string<'t>(tag: &'t Tag, path: &str) -> Result<&'t str> {
        tag.as_str()
            .ok_or_else(|| Self::mismatch(path.to_string(), TagKind::String, tag))
    }

    pub fn compound(&self, key: &str) -> Result<&'a Compound> {
        let tag = self.require(key)?;
        Self::expect_compound(tag, &self.child_path(key))
    }

    pub fn optional_compound(&self, key: &str) -> Result<Option<&'a Compound>> {
        match self.compound.get(key) {
            Some(tag) => Self::expect_compound(tag, &self.child_path(key)).map(Some),
            None => Ok(None),
        }
    }

    pub fn list(&self, key: &str) -> Result<&'a List> {
        let tag = self.require(key)?;
        tag.as_list()
            .ok_or_else(|| Self::mismatch(self.child_path(key), TagKind::List, tag))
    }

    /// A list kept uninterpreted; absent lists read as empty.
    pub fn opaque_list(&self, key: &str) -> Result<List> {
        match self.compound.get(key) {
            Some(Tag::List(list)) => Ok(list.clone()),
            Some(other) => Err(Self::mismatch(self.child_path(key), TagKind::List, other)),
            None => Ok(List::new(TagKind::Compound)),
        }
    }

    pub fn string(&self, key: &str) -> Result<&'a str> {
        let tag = self.require(key)?;
        Self::expect_string(tag, &self.child_path(key))
    }

    pub fn int(&self, key: &str) -> Result<i32> {
        let tag = self.require(key)?;
        tag.as_i32()
            .ok_or_else(|| Self::mismatch(self.child_path(key), TagKind::Int, tag))
    }

    pub fn long(&self, key: &str) -> Result<i64> {
        let tag = self.require(key)?;
        tag.as_i64()
            .ok_or_else(|| Self::mismatch(self.child_path(key), TagKind::Long, tag))
    }

    pub fn long_array(&self, key: &str) -> Result<&'a [i64]> {
        let tag = self.require(key)?;
        tag.as_long_array()
            .ok_or_else(|| Self::mismatch(self.child_path(key), TagKind::LongArray, tag))
    }

    /// A `{x, y, z}` compound of ints.
    pub fn vec3(&self, key: &str) -> Result<IVec3> {
        let path = self.child_path(key);
        let inner = Fields::new(self.compound(key)?, &path);
        Ok(IVec3::new(inner.int("x")?, inner.int("y")?, inner.int("z")?))
    }
}
