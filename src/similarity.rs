//! Numeric scoring primitives: tf, idf, coord, length norm, sloppy freq,
//! and the byte<->float norm codec.
//!
//! These are pure functions with no state, grounded in the classic
//! Lucene/Ferret scoring formulas. A `Similarity` is passed explicitly at
//! searcher construction rather than read from a global singleton.

/// Number of mantissa bits in the norm byte codec (5 exponent bits, no
/// sign, since norms are always non-negative).
const MANTISSA_BITS: u32 = 3;
const EXPONENT_OFFSET: i32 = 63 - 15;

/// Decodes a single norm byte into its approximate float value.
pub fn byte_to_float(b: u8) -> f32 {
    if b == 0 {
        return 0.0;
    }
    let bits = ((b as u32) << (24 - MANTISSA_BITS)) + ((EXPONENT_OFFSET as u32) << 24);
    f32::from_bits(bits)
}

/// Encodes a non-negative float into the lossy 3-bit-mantissa/5-bit-exponent
/// norm byte format. Values too small collapse to 0, values too large
/// saturate at 255.
pub fn float_to_byte(f: f32) -> u8 {
    debug_assert!(f >= 0.0, "norm values must be non-negative");
    let bits = f.to_bits() as i32;
    let small_float = bits >> (24 - MANTISSA_BITS);
    if small_float <= (EXPONENT_OFFSET << MANTISSA_BITS) {
        if bits <= 0 { 0 } else { 1 }
    } else if small_float >= (EXPONENT_OFFSET << MANTISSA_BITS) + 0x100 {
        0xff
    } else {
        (small_float - (EXPONENT_OFFSET << MANTISSA_BITS)) as u8
    }
}

/// Precomputed decode table for the hot scoring path.
pub static NORM_DECODE_TABLE: std::sync::LazyLock<[f32; 256]> = std::sync::LazyLock::new(|| {
    let mut table = [0f32; 256];
    for (b, slot) in table.iter_mut().enumerate() {
        *slot = byte_to_float(b as u8);
    }
    table
});

/// Pure scoring functions shared by all scorers. A default implementation
/// matches the classic Lucene-style vector space model; callers may supply
/// a custom `Similarity` to change tf/idf/coord behavior without touching
/// scorer code.
pub trait Similarity: Send + Sync {
    fn length_norm(&self, _field: &str, num_terms: u32) -> f32 {
        if num_terms == 0 {
            0.0
        } else {
            1.0 / (num_terms as f32).sqrt()
        }
    }

    fn query_norm(&self, sum_of_squared_weights: f32) -> f32 {
        if sum_of_squared_weights <= 0.0 {
            1.0
        } else {
            1.0 / sum_of_squared_weights.sqrt()
        }
    }

    fn tf(&self, freq: f32) -> f32 {
        freq.sqrt()
    }

    fn sloppy_freq(&self, distance: u32) -> f32 {
        1.0 / (distance as f32 + 1.0)
    }

    fn idf(&self, doc_freq: u32, max_doc: u32) -> f32 {
        ((max_doc as f32) / (doc_freq as f32 + 1.0)).ln() + 1.0
    }

    fn coord(&self, overlap: u32, max_overlap: u32) -> f32 {
        if max_overlap == 0 {
            1.0
        } else {
            overlap as f32 / max_overlap as f32
        }
    }

    fn decode_norm(&self, b: u8) -> f32 {
        NORM_DECODE_TABLE[b as usize]
    }

    fn encode_norm(&self, f: f32) -> u8 {
        float_to_byte(f)
    }
}

/// The standard tf-idf / cosine-normalized similarity.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSimilarity;

impl Similarity for DefaultSimilarity {}
