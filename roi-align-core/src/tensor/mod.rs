//! The [Tensor] and [RoiList] types, their strided packed addressing, and the
//! devices that run operations on them.
//!
//! # Layout
//!
//! Every tensor is a [PackedBuffer] of 32-bit words plus a
//! [TensorAttributes] descriptor. Logical indices are `[x, y, z, w]`:
//!
//! | tensor | x | y | z | w |
//! | --- | --- | --- | --- | --- |
//! | feature map | width | height | channel | - |
//! | output | pooled width | pooled height | channel | region |
//! | roi list | element | - | - | - |
//!
//! ```rust
//! # use roi_align_core::prelude::*;
//! let t = Tensor::try_from_slice([2, 2, 1, 1], DataType::F16, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! assert_eq!(t.get([1, 0, 0, 0]), 2.0);
//! assert_eq!(t.attrs().strides, [1, 1, 2, 2]);
//! ```
//!
//! # Devices
//!
//! - [Cpu] dispatches with rayon when the `parallel` feature is enabled.
//! - `Webgpu` (feature `webgpu`) runs a WGSL compute shader.

mod attrs;
pub(crate) mod cpu;
mod error;
mod rois;
mod storage;

#[cfg(feature = "webgpu")]
pub(crate) mod webgpu;

pub use attrs::{Index4, Location, TensorAttributes, NUM_AXES};
pub use cpu::Cpu;
pub use error::Error;
pub use rois::{RoiFormat, RoiList};
pub use storage::{lane_mask, pack_lanes, unpack_lanes, PackedBuffer};

#[cfg(feature = "webgpu")]
pub use webgpu::Webgpu;

use crate::dtypes::{f16, DataType};

/// A strided, packed tensor of up to four axes living in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub(crate) shape: Index4,
    pub(crate) dtype: DataType,
    pub(crate) attrs: TensorAttributes,
    pub(crate) data: PackedBuffer,
}

/// A `width x height x channels` source feature map.
pub type FeatureTensor = Tensor;

/// A `pooled_width x pooled_height x channels x regions` result.
pub type OutputTensor = Tensor;

impl Tensor {
    /// Allocates a zeroed tensor with a dense layout.
    pub fn try_zeros(shape: Index4, dtype: DataType) -> Result<Self, Error> {
        let attrs = TensorAttributes::contiguous(shape, dtype.packing());
        let data = PackedBuffer::try_zeros(attrs.required_words(shape)?, dtype.packing())?;
        Ok(Self {
            shape,
            dtype,
            attrs,
            data,
        })
    }

    pub fn zeros(shape: Index4, dtype: DataType) -> Self {
        Self::try_zeros(shape, dtype).unwrap()
    }

    /// Creates a dense tensor from values in logical order, `x` fastest.
    /// Values are rounded to `dtype`.
    pub fn try_from_slice(shape: Index4, dtype: DataType, values: &[f32]) -> Result<Self, Error> {
        let mut t = Self::try_zeros(shape, dtype)?;
        if values.len() != t.numel() {
            return Err(Error::WrongNumElements);
        }
        for (i, &v) in values.iter().enumerate() {
            let index = t.unravel(i);
            t.set(index, v);
        }
        Ok(t)
    }

    /// Creates a dense [DataType::F16] tensor from half values, bit for bit.
    pub fn try_from_f16(shape: Index4, values: &[f16]) -> Result<Self, Error> {
        let values: Vec<f32> = values.iter().map(|v| v.to_f32()).collect();
        Self::try_from_slice(shape, DataType::F16, &values)
    }

    /// Wraps an externally laid out buffer. The descriptor is checked
    /// against the buffer before anything can be dispatched on it.
    pub fn try_from_parts(
        shape: Index4,
        dtype: DataType,
        attrs: TensorAttributes,
        data: PackedBuffer,
    ) -> Result<Self, Error> {
        if attrs.packing != dtype.packing() || data.packing() != dtype.packing() {
            return Err(Error::InvalidConfig("packing does not match data type"));
        }
        attrs.validate(shape, data.len())?;
        Ok(Self {
            shape,
            dtype,
            attrs,
            data,
        })
    }

    #[inline]
    pub fn shape(&self) -> Index4 {
        self.shape
    }

    #[inline]
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    #[inline]
    pub fn attrs(&self) -> &TensorAttributes {
        &self.attrs
    }

    #[inline]
    pub fn data(&self) -> &PackedBuffer {
        &self.data
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn width(&self) -> usize {
        self.shape[0]
    }

    pub fn height(&self) -> usize {
        self.shape[1]
    }

    pub fn channels(&self) -> usize {
        self.shape[2]
    }

    /// Reads one logical element.
    #[inline]
    pub fn get(&self, index: Index4) -> f32 {
        self.data.load(self.attrs.locate(index))
    }

    /// Writes one logical element, preserving the other lane of its word.
    #[inline]
    pub fn set(&mut self, index: Index4, value: f32) {
        let loc = self.attrs.locate(index);
        self.data.store(loc, value);
    }

    /// All elements in logical order, `x` fastest.
    pub fn to_vec(&self) -> Vec<f32> {
        (0..self.numel()).map(|i| self.get(self.unravel(i))).collect()
    }

    fn unravel(&self, mut i: usize) -> Index4 {
        let mut index = [0; NUM_AXES];
        for (axis, &dim) in self.shape.iter().enumerate() {
            index[axis] = i % dim;
            i /= dim;
        }
        index
    }
}
