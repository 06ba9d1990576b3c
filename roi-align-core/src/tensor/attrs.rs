//! Strided, packed addressing shared by every tensor the operator touches.
//!
//! A tensor has up to four axes `(x, y, z, w)`. `x` is the innermost axis and
//! the only one that is packed: with [Packing::Double] two consecutive `x`
//! elements share a storage word. Offsets and strides are counted in storage
//! words, never in logical elements.

use crate::dtypes::Packing;

use super::Error;

/// Number of addressable axes.
pub const NUM_AXES: usize = 4;

/// A logical index `[x, y, z, w]`.
pub type Index4 = [usize; NUM_AXES];

/// Where a logical element lives inside a word buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub word: usize,
    pub lane: usize,
}

/// Per tensor attribute descriptor: base offset, strides and packing factor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TensorAttributes {
    /// Base offset in words.
    pub offset: usize,
    /// Stride of each axis in words. The `x` stride steps over a whole word,
    /// i.e. over `packing.lanes()` logical elements.
    pub strides: Index4,
    pub packing: Packing,
}

impl TensorAttributes {
    /// Dense layout for `shape`. Rows along `x` are padded up to a whole
    /// number of words so every row starts on a word boundary.
    pub fn contiguous(shape: Index4, packing: Packing) -> Self {
        // saturates so oversized shapes fail in `required_words`
        let row = packing.words_for(shape[0]);
        let plane = row.saturating_mul(shape[1]);
        let volume = plane.saturating_mul(shape[2]);
        Self {
            offset: 0,
            strides: [1, row, plane, volume],
            packing,
        }
    }

    /// Dense 1-D layout, addressed through the `x` axis alone.
    pub fn vector(len: usize, packing: Packing) -> Self {
        Self::contiguous([len, 1, 1, 1], packing)
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_strides(mut self, strides: Index4) -> Self {
        self.strides = strides;
        self
    }

    #[inline]
    pub fn lanes(&self) -> usize {
        self.packing.lanes()
    }

    /// `offset + (x / lanes) * stride_x + y * stride_y + z * stride_z + w * stride_w`
    #[inline]
    pub fn word_of(&self, [x, y, z, w]: Index4) -> usize {
        let [sx, sy, sz, sw] = self.strides;
        self.offset + (x / self.lanes()) * sx + y * sy + z * sz + w * sw
    }

    #[inline]
    pub fn locate(&self, index: Index4) -> Location {
        Location {
            word: self.word_of(index),
            lane: index[0] % self.lanes(),
        }
    }

    /// Locates element `i` of a 1-D vector.
    #[inline]
    pub fn locate_1d(&self, i: usize) -> Location {
        self.locate([i, 0, 0, 0])
    }

    /// One past the largest word touched by a tensor of `shape`, or `0` for
    /// an empty tensor.
    ///
    /// Every word a valid index reaches is below this, so once it fits in
    /// a buffer [Self::word_of] cannot overflow.
    pub fn required_words(&self, shape: Index4) -> Result<usize, Error> {
        if shape.iter().any(|&d| d == 0) {
            return Ok(0);
        }
        let last = [
            (shape[0] - 1) / self.lanes(),
            shape[1] - 1,
            shape[2] - 1,
            shape[3] - 1,
        ];
        last.iter()
            .zip(self.strides.iter())
            .try_fold(self.offset, |acc, (&i, &stride)| {
                i.checked_mul(stride).and_then(|step| acc.checked_add(step))
            })
            .and_then(|word| word.checked_add(1))
            .ok_or(Error::AttributesOverflow)
    }

    /// Whether distinct logical elements of `shape` map to distinct
    /// locations. Axes of extent 1 never alias.
    pub fn is_non_overlapping(&self, shape: Index4) -> bool {
        let words = [
            self.packing.words_for(shape[0]),
            shape[1],
            shape[2],
            shape[3],
        ];
        let mut axes: Vec<(usize, usize)> = (0..NUM_AXES)
            .filter(|&i| words[i] > 1)
            .map(|i| (self.strides[i], words[i]))
            .collect();
        axes.sort_unstable();
        let mut span = 1;
        for (stride, extent) in axes {
            if stride < span {
                return false;
            }
            span = stride.saturating_mul(extent);
        }
        true
    }

    /// Rejects a descriptor that would read or write outside a buffer of
    /// `available` words.
    pub fn validate(&self, shape: Index4, available: usize) -> Result<(), Error> {
        let required = self.required_words(shape)?;
        if required > available {
            return Err(Error::AttributesOutOfBounds {
                required,
                available,
            });
        }
        Ok(())
    }
}
