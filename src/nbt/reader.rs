//! Slice-based NBT reader.

use super::{Compound, List, NbtRoot, Tag, TagKind};
use crate::error::{Result, SchematicError};
use byteorder::{BigEndian, ByteOrder};

/// Default nesting limit for lists and compounds.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Reader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Maximum nesting of lists and compounds below the root.
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReaderConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Reads tags from a fully buffered, uncompressed document.
///
/// The cursor only moves forward and never passes the end of the buffer;
/// any read that would is reported as [`SchematicError::UnexpectedEof`].
pub struct NbtReader<'a> {
    data: &'a [u8],
    offset: usize,
    depth: usize,
    config: ReaderConfig,
}

impl<'a> NbtReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ReaderConfig::default())
    }

    pub fn with_config(data: &'a [u8], config: ReaderConfig) -> Self {
        Self {
            data,
            offset: 0,
            depth: 0,
            config,
        }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Read the root compound. The document must start with a compound tag.
    pub fn read(&mut self) -> Result<NbtRoot> {
        let first = self.unsigned_byte()?;
        if first != TagKind::Compound.id() {
            return Err(SchematicError::MalformedTag(format!(
                "Invalid NBT start: expected 0x0A, found {:#04x}",
                first
            )));
        }

        let name = self.string()?;
        let compound = self.compound()?;

        if self.remaining() > 0 {
            log::debug!("Ignoring {} trailing bytes after root", self.remaining());
        }

        Ok(NbtRoot { name, compound })
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if needed > available {
            return Err(SchematicError::UnexpectedEof {
                offset: self.offset,
                needed,
                available,
            });
        }
        let slice = &self.data[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(slice)
    }

    fn unsigned_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn byte(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn short(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn int(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn long(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub fn float(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    pub fn double(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    /// Read a signed 32-bit length prefix and reject negative values.
    fn length(&mut self, what: &str) -> Result<usize> {
        let length = self.int()?;
        if length < 0 {
            return Err(SchematicError::MalformedTag(format!(
                "Negative {} length: {}",
                what, length
            )));
        }
        Ok(length as usize)
    }

    /// Take `count` elements of `width` bytes, checking the total up front.
    fn take_elements(&mut self, count: usize, width: usize) -> Result<&'a [u8]> {
        let needed = count.checked_mul(width).ok_or_else(|| {
            SchematicError::MalformedTag(format!("Array length {} overflows", count))
        })?;
        self.take(needed)
    }

    pub fn byte_array(&mut self) -> Result<Vec<i8>> {
        let length = self.length("byte array")?;
        Ok(self.take(length)?.iter().map(|&b| b as i8).collect())
    }

    pub fn int_array(&mut self) -> Result<Vec<i32>> {
        let length = self.length("int array")?;
        let bytes = self.take_elements(length, 4)?;
        Ok(bytes.chunks_exact(4).map(BigEndian::read_i32).collect())
    }

    pub fn long_array(&mut self) -> Result<Vec<i64>> {
        let length = self.length("long array")?;
        let bytes = self.take_elements(length, 8)?;
        Ok(bytes.chunks_exact(8).map(BigEndian::read_i64).collect())
    }

    /// Read a length-prefixed modified UTF-8 string.
    ///
    /// The prefix counts encoded bytes, so the whole body is taken first and
    /// decoded on its own; continuation bytes never reach the tag parser.
    pub fn string(&mut self) -> Result<String> {
        let length = BigEndian::read_u16(self.take(2)?) as usize;
        let start = self.offset;
        let bytes = self.take(length)?;
        decode_modified_utf8(bytes).map_err(|reason| {
            SchematicError::MalformedTag(format!("Bad string at offset {}: {}", start, reason))
        })
    }

    pub fn list(&mut self) -> Result<List> {
        self.enter()?;

        let kind = TagKind::try_from(self.unsigned_byte()?)?;
        let length = self.length("list")?;

        if kind == TagKind::End && length > 0 {
            return Err(SchematicError::MalformedTag(format!(
                "List of end tags with {} elements",
                length
            )));
        }

        // Each element takes at least one byte, so a length larger than the
        // remaining input cannot be satisfied.
        let mut items = Vec::with_capacity(length.min(self.remaining()));
        for _ in 0..length {
            items.push(self.payload(kind)?);
        }

        self.depth -= 1;
        Ok(List::from_parts(kind, items))
    }

    pub fn compound(&mut self) -> Result<Compound> {
        self.enter()?;

        let mut compound = Compound::new();
        loop {
            if self.remaining() == 0 {
                return Err(SchematicError::MalformedTag(format!(
                    "Unterminated compound at offset {}",
                    self.offset
                )));
            }

            let kind = TagKind::try_from(self.unsigned_byte()?)?;
            if kind == TagKind::End {
                break;
            }

            let name = self.string()?;
            let value = self.payload(kind)?;
            compound.insert(name, value);
        }

        self.depth -= 1;
        Ok(compound)
    }

    fn payload(&mut self, kind: TagKind) -> Result<Tag> {
        Ok(match kind {
            TagKind::End => {
                return Err(SchematicError::MalformedTag(
                    "End tag has no payload".to_string(),
                ))
            }
            TagKind::Byte => Tag::Byte(self.byte()?),
            TagKind::Short => Tag::Short(self.short()?),
            TagKind::Int => Tag::Int(self.int()?),
            TagKind::Long => Tag::Long(self.long()?),
            TagKind::Float => Tag::Float(self.float()?),
            TagKind::Double => Tag::Double(self.double()?),
            TagKind::ByteArray => Tag::ByteArray(self.byte_array()?),
            TagKind::String => Tag::String(self.string()?),
            TagKind::List => Tag::List(self.list()?),
            TagKind::Compound => Tag::Compound(self.compound()?),
            TagKind::IntArray => Tag::IntArray(self.int_array()?),
            TagKind::LongArray => Tag::LongArray(self.long_array()?),
        })
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(SchematicError::MalformedTag(format!(
                "Nesting deeper than {} levels",
                self.config.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }
}

/// Decode one encoded sequence starting at `bytes[at]`.
/// Returns the code point and the number of bytes consumed.
fn decode_sequence(bytes: &[u8], at: usize) -> std::result::Result<(u32, usize), String> {
    let lead = bytes[at];
    let (width, bits) = if lead & 0x80 == 0 {
        (1, lead & 0x7F)
    } else if lead >> 5 == 0b110 {
        (2, lead & 0x1F)
    } else if lead >> 4 == 0b1110 {
        (3, lead & 0x0F)
    } else if lead >> 3 == 0b11110 {
        (4, lead & 0x07)
    } else {
        return Err(format!("invalid lead byte {:#04x}", lead));
    };

    let tail = bytes
        .get(at + 1..at + width)
        .ok_or_else(|| format!("truncated {}-byte sequence", width))?;

    let mut code_point = bits as u32;
    for &b in tail {
        if b & 0xC0 != 0x80 {
            return Err(format!("invalid continuation byte {:#04x}", b));
        }
        code_point = (code_point << 6) | (b & 0x3F) as u32;
    }
    Ok((code_point, width))
}

/// Decode modified UTF-8.
///
/// Accepts the 4-byte form for supplementary characters as well as the
/// surrogate pairs Java writers emit, and `C0 80` for NUL.
fn decode_modified_utf8(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let (mut code_point, width) = decode_sequence(bytes, i)?;
        i += width;

        if (0xD800..0xDC00).contains(&code_point) && i < bytes.len() {
            let (low, low_width) = decode_sequence(bytes, i)?;
            if (0xDC00..0xE000).contains(&low) {
                code_point = 0x10000 + ((code_point - 0xD800) << 10) + (low - 0xDC00);
                i += low_width;
            }
        }

        let c = char::from_u32(code_point)
            .ok_or_else(|| format!("invalid code point {:#x}", code_point))?;
        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives_big_endian() {
        let data = [
            0xFF, // byte -1
            0x01, 0x02, // short 258
            0x00, 0x00, 0x01, 0x00, // int 256
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A, // long 42
            0x3F, 0x80, 0x00, 0x00, // float 1.0
            0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // double 2.0
        ];
        let mut reader = NbtReader::new(&data);
        assert_eq!(reader.byte().unwrap(), -1);
        assert_eq!(reader.short().unwrap(), 258);
        assert_eq!(reader.int().unwrap(), 256);
        assert_eq!(reader.long().unwrap(), 42);
        assert_eq!(reader.float().unwrap(), 1.0);
        assert_eq!(reader.double().unwrap(), 2.0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x00, 0x01];
        let mut reader = NbtReader::new(&data);
        match reader.int() {
            Err(SchematicError::UnexpectedEof {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 0);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("Expected UnexpectedEof, got {:?}", other),
        }
        // Cursor did not move.
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_negative_array_length() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = NbtReader::new(&data);
        assert!(matches!(
            reader.long_array(),
            Err(SchematicError::MalformedTag(_))
        ));
    }

    #[test]
    fn test_long_array_truncated() {
        // Declares 2 longs but only carries one.
        let mut data = vec![0x00, 0x00, 0x00, 0x02];
        data.extend_from_slice(&1i64.to_be_bytes());
        let mut reader = NbtReader::new(&data);
        assert!(matches!(
            reader.long_array(),
            Err(SchematicError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_string_all_width_classes() {
        // "a£€𐍈" as 1, 2, 3 and 4 byte sequences.
        let body = [
            0x61, 0xC2, 0xA3, 0xE2, 0x82, 0xAC, 0xF0, 0x90, 0x8D, 0x88,
        ];
        let mut data = vec![0x00, body.len() as u8];
        data.extend_from_slice(&body);
        let mut reader = NbtReader::new(&data);
        assert_eq!(reader.string().unwrap(), "a£€𐍈");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_string_java_forms() {
        // NUL as C0 80, U+10348 as a surrogate pair.
        let body = [0xC0, 0x80, 0xED, 0xA0, 0x80, 0xED, 0xBD, 0x88];
        let mut data = vec![0x00, body.len() as u8];
        data.extend_from_slice(&body);
        let mut reader = NbtReader::new(&data);
        assert_eq!(reader.string().unwrap(), "\u{0}\u{10348}");
    }

    #[test]
    fn test_string_invalid_lead_byte() {
        let data = [0x00, 0x01, 0xFF];
        let mut reader = NbtReader::new(&data);
        assert!(matches!(
            reader.string(),
            Err(SchematicError::MalformedTag(_))
        ));
    }

    #[test]
    fn test_root_must_be_compound() {
        let data = [0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let result = NbtReader::new(&data).read();
        assert!(matches!(result, Err(SchematicError::MalformedTag(_))));
    }

    #[test]
    fn test_read_simple_root() {
        // TAG_Compound("hello") { TAG_String("name"): "Bananrama" }
        let mut data = vec![0x0A, 0x00, 0x05];
        data.extend_from_slice(b"hello");
        data.extend_from_slice(&[0x08, 0x00, 0x04]);
        data.extend_from_slice(b"name");
        data.extend_from_slice(&[0x00, 0x09]);
        data.extend_from_slice(b"Bananrama");
        data.push(0x00);

        let root = NbtReader::new(&data).read().unwrap();
        assert_eq!(root.name, "hello");
        assert_eq!(root.compound.get_str("name"), Some("Bananrama"));
    }

    #[test]
    fn test_unterminated_compound() {
        let data = [0x0A, 0x00, 0x00, 0x03, 0x00, 0x01, b'x', 0x00, 0x00, 0x00, 0x01];
        let result = NbtReader::new(&data).read();
        assert!(matches!(result, Err(SchematicError::MalformedTag(_))));
    }

    #[test]
    fn test_large_compound() {
        let entries = 50_000;
        let mut data = vec![0x0A, 0x00, 0x00];
        for i in 0..entries {
            let name = format!("k{}", i);
            data.push(0x03);
            data.extend_from_slice(&(name.len() as u16).to_be_bytes());
            data.extend_from_slice(name.as_bytes());
            data.extend_from_slice(&(i as i32).to_be_bytes());
        }
        // A repeated name replaces the value in place.
        data.extend_from_slice(&[0x03, 0x00, 0x02, b'k', b'7']);
        data.extend_from_slice(&(-7i32).to_be_bytes());
        data.push(0x00);

        let root = NbtReader::new(&data).read().unwrap();
        assert_eq!(root.compound.len(), entries);
        assert_eq!(root.compound.get_i32("k7"), Some(-7));
        assert_eq!(root.compound.get_i32("k49999"), Some(49_999));
        assert_eq!(root.compound.keys().nth(7), Some("k7"));
    }

    #[test]
    fn test_empty_list_keeps_kind() {
        // list of compounds, zero elements
        let data = [0x0A, 0x00, 0x00, 0x09, 0x00, 0x01, b'l', 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00];
        let root = NbtReader::new(&data).read().unwrap();
        let list = root.compound.get_list("l").unwrap();
        assert!(list.is_empty());
        assert_eq!(list.kind(), TagKind::Compound);
    }

    #[test]
    fn test_depth_limit() {
        // Root compound holding three nested lists of lists.
        let mut data = vec![0x0A, 0x00, 0x00, 0x09, 0x00, 0x01, b'l'];
        for _ in 0..3 {
            data.extend_from_slice(&[0x09, 0x00, 0x00, 0x00, 0x01]);
        }
        data.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00]);
        data.push(0x00);

        let deep = ReaderConfig::default().with_max_depth(3);
        let result = NbtReader::with_config(&data, deep).read();
        assert!(matches!(result, Err(SchematicError::MalformedTag(_))));

        let roomy = ReaderConfig::default().with_max_depth(8);
        assert!(NbtReader::with_config(&data, roomy).read().is_ok());
    }
}
