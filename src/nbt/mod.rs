//! Named Binary Tag (NBT) codec.
//!
//! This module handles the tagged binary tree format used by Minecraft and
//! Litematica files: the tag model, a slice-based reader, a buffer-owning
//! writer, and detection of gzip/zlib framing.

pub mod compression;
pub mod reader;
pub mod writer;

pub use compression::Compression;
pub use reader::{NbtReader, ReaderConfig};
pub use writer::NbtWriter;

use crate::error::{Result, SchematicError};
use std::collections::HashMap;

/// Tag kinds with their wire ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    /// The numeric id written on the wire.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Lower camel case name, as used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            TagKind::End => "end",
            TagKind::Byte => "byte",
            TagKind::Short => "short",
            TagKind::Int => "int",
            TagKind::Long => "long",
            TagKind::Float => "float",
            TagKind::Double => "double",
            TagKind::ByteArray => "byteArray",
            TagKind::String => "string",
            TagKind::List => "list",
            TagKind::Compound => "compound",
            TagKind::IntArray => "intArray",
            TagKind::LongArray => "longArray",
        }
    }
}

impl TryFrom<u8> for TagKind {
    type Error = SchematicError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(TagKind::End),
            1 => Ok(TagKind::Byte),
            2 => Ok(TagKind::Short),
            3 => Ok(TagKind::Int),
            4 => Ok(TagKind::Long),
            5 => Ok(TagKind::Float),
            6 => Ok(TagKind::Double),
            7 => Ok(TagKind::ByteArray),
            8 => Ok(TagKind::String),
            9 => Ok(TagKind::List),
            10 => Ok(TagKind::Compound),
            11 => Ok(TagKind::IntArray),
            12 => Ok(TagKind::LongArray),
            _ => Err(SchematicError::MalformedTag(format!(
                "Invalid tag id: {}",
                value
            ))),
        }
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tag value.
///
/// `End` only exists on the wire as a compound terminator, so it has no
/// value variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_string())
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::String(value)
    }
}

impl From<i32> for Tag {
    fn from(value: i32) -> Self {
        Tag::Int(value)
    }
}

impl From<i64> for Tag {
    fn from(value: i64) -> Self {
        Tag::Long(value)
    }
}

impl From<Compound> for Tag {
    fn from(value: Compound) -> Self {
        Tag::Compound(value)
    }
}

impl From<List> for Tag {
    fn from(value: List) -> Self {
        Tag::List(value)
    }
}

/// A homogeneous list of tags with a declared element kind.
///
/// An empty list still carries exactly one element kind, which is written
/// back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    kind: TagKind,
    items: Vec<Tag>,
}

impl List {
    /// Create an empty list declaring the given element kind.
    pub fn new(kind: TagKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Build a list, checking that every element has the declared kind.
    pub fn from_tags(kind: TagKind, items: Vec<Tag>) -> Result<Self> {
        if let Some(bad) = items.iter().find(|t| t.kind() != kind) {
            return Err(SchematicError::InvalidInput(format!(
                "List of {} cannot hold a {} element",
                kind,
                bad.kind()
            )));
        }
        Ok(Self { kind, items })
    }

    /// Build a list from elements already known to match `kind`.
    pub(crate) fn from_parts(kind: TagKind, items: Vec<Tag>) -> Self {
        Self { kind, items }
    }

    pub fn push(&mut self, tag: Tag) -> Result<()> {
        if tag.kind() != self.kind {
            return Err(SchematicError::InvalidInput(format!(
                "List of {} cannot hold a {} element",
                self.kind,
                tag.kind()
            )));
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An insertion-ordered mapping of names to tags.
///
/// Entries live in a `Vec` for ordering; `index` maps each name to its slot
/// so lookups and inserts stay constant time on large compounds.
#[derive(Debug, Clone, Default)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
    index: HashMap<String, usize>,
}

impl PartialEq for Compound {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag. Replacing an existing key keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        let name = name.into();
        let tag = tag.into();
        match self.index.get(&name) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, tag)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, tag));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    /// Remove a tag, shifting later entries down to keep their order.
    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        let slot = self.index.remove(name)?;
        let (_, tag) = self.entries.remove(slot);
        for later in self.index.values_mut() {
            if *later > slot {
                *later -= 1;
            }
        }
        Some(tag)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_compound(&self, name: &str) -> Option<&Compound> {
        self.get(name).and_then(Tag::as_compound)
    }

    pub fn get_list(&self, name: &str) -> Option<&List> {
        self.get(name).and_then(Tag::as_list)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Tag::as_str)
    }

    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Tag::as_i32)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Tag::as_i64)
    }

    pub fn get_long_array(&self, name: &str) -> Option<&[i64]> {
        self.get(name).and_then(Tag::as_long_array)
    }
}

impl<K: Into<String>, V: Into<Tag>> FromIterator<(K, V)> for Compound {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut compound = Compound::new();
        for (k, v) in iter {
            compound.insert(k, v);
        }
        compound
    }
}

/// The single named compound at the top of every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NbtRoot {
    /// Root name, almost always empty.
    pub name: String,
    pub compound: Compound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: Compound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }

    /// Decode an uncompressed document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        NbtReader::new(bytes).read()
    }

    /// Encode as an uncompressed document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = NbtWriter::new();
        writer.write_root(self)?;
        Ok(writer.finish())
    }
}

/// Decode a document that may be gzip- or zlib-compressed.
pub fn parse_nbt(bytes: &[u8]) -> Result<NbtRoot> {
    let data = compression::decompress(bytes)?;
    NbtRoot::from_bytes(&data)
}
