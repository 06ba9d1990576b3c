//! Module for data type related types. Contains [DataType], which selects a
//! kernel specialization, and [Packing], which describes how many logical
//! elements live in one 32-bit storage word.
//!
//! The [f16] type is re-exported from the `half` crate.

pub use half::f16;

/// The element type of a tensor, and the numeric specialization of a kernel.
///
/// Only [DataType::F16] has a working ROI Align kernel; building one for
/// [DataType::F32] fails with [crate::tensor::Error::NotImplemented].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Two half precision values packed per storage word.
    #[default]
    F16,
    /// One single precision value per storage word.
    F32,
}

impl DataType {
    pub const fn packing(&self) -> Packing {
        match self {
            DataType::F16 => Packing::Double,
            DataType::F32 => Packing::Single,
        }
    }

    /// Size of one logical element in bytes.
    pub const fn size_of(&self) -> usize {
        match self {
            DataType::F16 => 2,
            DataType::F32 => 4,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            DataType::F16 => "f16",
            DataType::F32 => "f32",
        }
    }
}

/// How many logical elements share one 32-bit storage word.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Packing {
    Single,
    Double,
}

impl Packing {
    /// Number of lanes in a storage word.
    #[inline(always)]
    pub const fn lanes(&self) -> usize {
        match self {
            Packing::Single => 1,
            Packing::Double => 2,
        }
    }

    /// Number of words needed to hold `numel` consecutive elements.
    #[inline]
    pub const fn words_for(&self, numel: usize) -> usize {
        numel / self.lanes() + (numel % self.lanes() != 0) as usize
    }

    /// Extracts `lane` from a storage word as an `f32`.
    #[inline]
    pub fn unpack(&self, word: u32, lane: usize) -> f32 {
        match self {
            Packing::Single => {
                debug_assert_eq!(lane, 0);
                f32::from_bits(word)
            }
            Packing::Double => {
                debug_assert!(lane < 2);
                f16::from_bits((word >> (16 * lane)) as u16).to_f32()
            }
        }
    }

    /// Replaces `lane` of `word` with `value`, leaving the other lane's bits
    /// untouched.
    #[inline]
    pub fn pack(&self, word: u32, lane: usize, value: f32) -> u32 {
        match self {
            Packing::Single => {
                debug_assert_eq!(lane, 0);
                value.to_bits()
            }
            Packing::Double => {
                debug_assert!(lane < 2);
                let shift = 16 * lane;
                let bits = f16::from_f32(value).to_bits() as u32;
                (word & !(0xffff << shift)) | (bits << shift)
            }
        }
    }
}

impl From<DataType> for Packing {
    fn from(dtype: DataType) -> Self {
        dtype.packing()
    }
}
