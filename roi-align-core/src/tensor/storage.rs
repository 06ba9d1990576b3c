use crate::dtypes::{f16, Packing};

use super::{Error, Location};

/// A buffer of 32-bit storage words, each holding one or two logical
/// elements. All element access goes through [PackedBuffer::load] and
/// [PackedBuffer::store] so callers only ever see `f32` scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBuffer {
    pub(crate) words: Vec<u32>,
    pub(crate) packing: Packing,
}

impl PackedBuffer {
    /// Allocates `len` zeroed words.
    pub fn try_zeros(len: usize, packing: Packing) -> Result<Self, Error> {
        let mut words = Vec::new();
        words.try_reserve(len).map_err(|_| Error::OutOfMemory)?;
        words.resize(len, 0);
        Ok(Self { words, packing })
    }

    pub fn from_words(words: Vec<u32>, packing: Packing) -> Self {
        Self { words, packing }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn packing(&self) -> Packing {
        self.packing
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Unpacks and returns the element at `loc`.
    #[inline]
    pub fn load(&self, loc: Location) -> f32 {
        self.packing.unpack(self.words[loc.word], loc.lane)
    }

    /// Packs `value` into `loc`. When the word is shared with another lane
    /// that lane is read back and kept as is.
    #[inline]
    pub fn store(&mut self, loc: Location, value: f32) {
        let word = &mut self.words[loc.word];
        *word = self.packing.pack(*word, loc.lane, value);
    }

    /// Merges a fully computed word into the buffer. Only the lanes set in
    /// `mask` are taken from `word`.
    #[inline]
    pub fn store_lanes(&mut self, index: usize, word: u32, mask: u32) {
        let dst = &mut self.words[index];
        *dst = (*dst & !mask) | (word & mask);
    }
}

/// Bit mask selecting the first `n` lanes of a word.
#[inline]
pub fn lane_mask(packing: Packing, n: usize) -> u32 {
    match (packing, n) {
        (_, 0) => 0,
        (Packing::Double, 1) => 0x0000_ffff,
        _ => u32::MAX,
    }
}

/// Packs up to `packing.lanes()` values into one word, lane 0 first.
pub fn pack_lanes(packing: Packing, values: &[f32]) -> u32 {
    debug_assert!(values.len() <= packing.lanes());
    values
        .iter()
        .enumerate()
        .fold(0, |word, (lane, &v)| packing.pack(word, lane, v))
}

/// Unpacks both lanes of a word holding two halves.
pub fn unpack_lanes(word: u32) -> [f32; 2] {
    [
        f16::from_bits(word as u16).to_f32(),
        f16::from_bits((word >> 16) as u16).to_f32(),
    ]
}
