//! Operations on [crate::tensor::Tensor]s.
//!
//! There is a single operation, [roi_align]. It is built once from a
//! [RoiAlignConfig] and then run on any device implementing
//! [RoiAlignKernel]:
//!
//! ```rust
//! # use roi_align_core::prelude::*;
//! let dev: Cpu = Default::default();
//! let feature = dev.sample_uniform([8, 8, 1, 1], DataType::F16, 0.0, 1.0);
//! let rois = RoiList::boxes(&[[1.0, 1.0, 6.0, 6.0]]);
//! let op = RoiAlignOp::build(RoiAlignConfig::new(8, 8, 2, 2)).unwrap();
//! let mut out = Tensor::zeros(op.output_shape(1, 1), DataType::F16);
//! dev.forward(&op, &feature, &rois, &mut out).unwrap();
//! ```
//!
//! Building a kernel for [crate::dtypes::DataType::F32] fails with
//! [crate::tensor::Error::NotImplemented].

pub mod roi_align;

pub use roi_align::{
    DispatchGrid, Invocation, RoiAlignConfig, RoiAlignKernel, RoiAlignOp, RoiBoxPolicy,
    TryRoiAlign,
};
