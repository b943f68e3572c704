//! Buffer-owning NBT writer.

use super::{Compound, List, NbtRoot, Tag, TagKind};
use crate::error::{Result, SchematicError};
use byteorder::{BigEndian, WriteBytesExt};

const INITIAL_CAPACITY: usize = 1024;

/// Writes tags into a growable buffer using the layout [`super::NbtReader`] expects.
pub struct NbtWriter {
    buffer: Vec<u8>,
}

impl Default for NbtWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl NbtWriter {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity.max(1)),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the writer and return exactly the written bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.buffer.shrink_to_fit();
        self.buffer
    }

    /// Make room for `additional` bytes, doubling capacity until it fits.
    fn grow(&mut self, additional: usize) {
        let needed = self.buffer.len() + additional;
        let mut capacity = self.buffer.capacity().max(1);
        if needed <= capacity {
            return;
        }
        while capacity < needed {
            capacity *= 2;
        }
        self.buffer.reserve_exact(capacity - self.buffer.len());
    }

    pub fn byte(&mut self, value: i8) -> Result<()> {
        self.grow(1);
        self.buffer.write_i8(value)?;
        Ok(())
    }

    pub fn short(&mut self, value: i16) -> Result<()> {
        self.grow(2);
        self.buffer.write_i16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn int(&mut self, value: i32) -> Result<()> {
        self.grow(4);
        self.buffer.write_i32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn long(&mut self, value: i64) -> Result<()> {
        self.grow(8);
        self.buffer.write_i64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn float(&mut self, value: f32) -> Result<()> {
        self.grow(4);
        self.buffer.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn double(&mut self, value: f64) -> Result<()> {
        self.grow(8);
        self.buffer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    fn kind(&mut self, kind: TagKind) -> Result<()> {
        self.grow(1);
        self.buffer.write_u8(kind.id())?;
        Ok(())
    }

    fn length(&mut self, length: usize, what: &str) -> Result<()> {
        let length = i32::try_from(length).map_err(|_| {
            SchematicError::InvalidInput(format!("{} too long: {} elements", what, length))
        })?;
        self.int(length)
    }

    pub fn byte_array(&mut self, values: &[i8]) -> Result<()> {
        self.length(values.len(), "Byte array")?;
        self.grow(values.len());
        self.buffer.extend(values.iter().map(|&b| b as u8));
        Ok(())
    }

    pub fn int_array(&mut self, values: &[i32]) -> Result<()> {
        self.length(values.len(), "Int array")?;
        self.grow(values.len() * 4);
        for &v in values {
            self.buffer.write_i32::<BigEndian>(v)?;
        }
        Ok(())
    }

    pub fn long_array(&mut self, values: &[i64]) -> Result<()> {
        self.length(values.len(), "Long array")?;
        self.grow(values.len() * 8);
        for &v in values {
            self.buffer.write_i64::<BigEndian>(v)?;
        }
        Ok(())
    }

    /// Write a length-prefixed string.
    ///
    /// The 1/2/3/4-byte sequences the reader decodes coincide with standard
    /// UTF-8, so the encoded form is the string's own bytes.
    pub fn string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        let length = u16::try_from(bytes.len()).map_err(|_| {
            SchematicError::InvalidInput(format!(
                "String too long: {} encoded bytes",
                bytes.len()
            ))
        })?;
        self.grow(2 + bytes.len());
        self.buffer.write_u16::<BigEndian>(length)?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    pub fn list(&mut self, list: &List) -> Result<()> {
        self.kind(list.kind())?;
        self.length(list.len(), "List")?;
        for tag in list {
            self.payload(tag)?;
        }
        Ok(())
    }

    pub fn compound(&mut self, compound: &Compound) -> Result<()> {
        for (name, tag) in compound.iter() {
            self.kind(tag.kind())?;
            self.string(name)?;
            self.payload(tag)?;
        }
        self.kind(TagKind::End)
    }

    pub fn payload(&mut self, tag: &Tag) -> Result<()> {
        match tag {
            Tag::Byte(v) => self.byte(*v),
            Tag::Short(v) => self.short(*v),
            Tag::Int(v) => self.int(*v),
            Tag::Long(v) => self.long(*v),
            Tag::Float(v) => self.float(*v),
            Tag::Double(v) => self.double(*v),
            Tag::ByteArray(v) => self.byte_array(v),
            Tag::String(v) => self.string(v),
            Tag::List(v) => self.list(v),
            Tag::Compound(v) => self.compound(v),
            Tag::IntArray(v) => self.int_array(v),
            Tag::LongArray(v) => self.long_array(v),
        }
    }

    /// Write a complete document: the root marker, its name and its body.
    pub fn write_root(&mut self, root: &NbtRoot) -> Result<()> {
        self.kind(TagKind::Compound)?;
        self.string(&root.name)?;
        self.compound(&root.compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::NbtReader;

    fn sample_root() -> NbtRoot {
        let mut entities = List::new(TagKind::Compound);
        entities
            .push(Tag::Compound(Compound::new().with("id", "minecraft:pig")))
            .unwrap();

        let compound = Compound::new()
            .with("zz", Tag::Byte(-3))
            .with("short", Tag::Short(-1234))
            .with("int", 123_456)
            .with("long", i64::MIN)
            .with("float", Tag::Float(0.5))
            .with("double", Tag::Double(-1.25))
            .with("bytes", Tag::ByteArray(vec![1, -1, 127]))
            .with("text", "a£€𐍈")
            .with("entities", entities)
            .with("empty", List::new(TagKind::String))
            .with("ints", Tag::IntArray(vec![i32::MAX, 0, -7]))
            .with("longs", Tag::LongArray(vec![1, -2, 3]))
            .with("nested", Compound::new().with("inner", Compound::new()));

        NbtRoot::new("root", compound)
    }

    #[test]
    fn test_round_trip() {
        let root = sample_root();
        let bytes = root.to_bytes().unwrap();
        let decoded = NbtReader::new(&bytes).read().unwrap();
        assert_eq!(decoded, root);
        assert_eq!(
            decoded.compound.keys().collect::<Vec<_>>(),
            root.compound.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            decoded.compound.get_list("empty").unwrap().kind(),
            TagKind::String
        );
    }

    #[test]
    fn test_exact_layout() {
        let root = NbtRoot::new("", Compound::new().with("a", Tag::Short(1)));
        let bytes = root.to_bytes().unwrap();
        assert_eq!(
            bytes,
            vec![0x0A, 0x00, 0x00, 0x02, 0x00, 0x01, b'a', 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_string_length_counts_encoded_bytes() {
        let mut writer = NbtWriter::new();
        writer.string("€").unwrap();
        assert_eq!(writer.finish(), vec![0x00, 0x03, 0xE2, 0x82, 0xAC]);
    }

    #[test]
    fn test_string_too_long() {
        let mut writer = NbtWriter::new();
        let long = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            writer.string(&long),
            Err(SchematicError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_buffer_grows_past_initial_capacity() {
        let mut writer = NbtWriter::with_capacity(4);
        let values: Vec<i64> = (0..100).collect();
        writer.long_array(&values).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 4 + 100 * 8);

        let mut reader = NbtReader::new(&bytes);
        assert_eq!(reader.long_array().unwrap(), values);
    }
}
