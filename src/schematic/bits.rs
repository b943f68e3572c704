//! Bit-packed palette index arrays.
//!
//! Indices are packed back to back with no padding, so an entry may start in
//! one 64-bit word and end in the next. Entry 0 occupies the low bits of
//! word 0.

/// Bits used per entry for a palette of the given size.
pub fn bits_per_entry(palette_len: usize) -> u32 {
    if palette_len <= 1 {
        return 2;
    }
    // ceil(log2(len))
    let bits = usize::BITS - (palette_len - 1).leading_zeros();
    bits.max(2)
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Extract entry `index` from the packed words.
///
/// Words past the end of the array read as zero.
pub fn unpack_index(words: &[i64], bits: u32, index: usize) -> u64 {
    let bits_usize = bits as usize;
    // Saturates past any real array, so huge indices read as zero.
    let offset = index.saturating_mul(bits_usize);
    let start = offset >> 6;
    let end = offset.saturating_add(bits_usize).saturating_sub(1) >> 6;
    let shift = (offset & 0x3F) as u32;

    let low = words.get(start).copied().unwrap_or(0) as u64;
    let value = if start == end {
        low >> shift
    } else {
        let high = words.get(end).copied().unwrap_or(0) as u64;
        (low >> shift) | (high << (64 - shift))
    };

    value & mask(bits)
}

/// Pack entries into 64-bit words, the inverse of [`unpack_index`].
pub fn pack_indices(indices: &[u64], bits: u32) -> Vec<i64> {
    let bits_usize = bits as usize;
    let total_bits = indices.len() * bits_usize;
    let mut words = vec![0u64; total_bits.div_ceil(64)];
    let mask = mask(bits);

    for (i, &value) in indices.iter().enumerate() {
        let value = value & mask;
        let offset = i * bits_usize;
        let start = offset >> 6;
        let shift = (offset & 0x3F) as u32;

        words[start] |= value << shift;
        if shift + bits > 64 {
            words[start + 1] |= value >> (64 - shift);
        }
    }

    words.into_iter().map(|w| w as i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_entry() {
        assert_eq!(bits_per_entry(0), 2);
        assert_eq!(bits_per_entry(1), 2);
        assert_eq!(bits_per_entry(2), 2);
        assert_eq!(bits_per_entry(4), 2);
        assert_eq!(bits_per_entry(5), 3);
        assert_eq!(bits_per_entry(8), 3);
        assert_eq!(bits_per_entry(9), 4);
        assert_eq!(bits_per_entry(300), 9);
    }

    #[test]
    fn test_unpack_single_word() {
        // Palette of 5 -> 3 bits; entries 0, 1, 2.
        let word: i64 = 0b010_001_000;
        let bits = bits_per_entry(5);
        assert_eq!(unpack_index(&[word], bits, 0), 0);
        assert_eq!(unpack_index(&[word], bits, 1), 1);
        assert_eq!(unpack_index(&[word], bits, 2), 2);
        assert_eq!(unpack_index(&[word], bits, 3), 0);
    }

    #[test]
    fn test_unpack_straddling_words() {
        // 10 entries of 7 bits span 70 bits. Entry 9 starts at bit 63 of
        // word 0 and ends in the low 6 bits of word 1.
        let bits = 7;
        let value: u64 = 0b101_1011;
        let low_word = ((value & 1) << 63) as i64;
        let high_word = (value >> 1) as i64;

        assert_eq!(unpack_index(&[low_word, high_word], bits, 9), value);
        for i in 0..9 {
            assert_eq!(unpack_index(&[low_word, high_word], bits, i), 0);
        }
    }

    #[test]
    fn test_unpack_missing_words_read_zero() {
        assert_eq!(unpack_index(&[], 4, 10), 0);
        assert_eq!(unpack_index(&[-1], 4, 16), 0);
        assert_eq!(unpack_index(&[-1], 4, 15), 0xF);
    }

    #[test]
    fn test_unpack_huge_index_reads_zero() {
        assert_eq!(unpack_index(&[-1, -1], 9, usize::MAX), 0);
        assert_eq!(unpack_index(&[-1, -1], 9, usize::MAX / 4), 0);
    }

    #[test]
    fn test_pack_matches_unpack() {
        let bits = 5;
        let indices: Vec<u64> = (0..40).map(|i| (i * 7) % 32).collect();
        let words = pack_indices(&indices, bits);
        assert_eq!(words.len(), 4); // 200 bits
        for (i, &expected) in indices.iter().enumerate() {
            assert_eq!(unpack_index(&words, bits, i), expected, "entry {}", i);
        }
    }
}
