//! # roi-align
//!
//! ROI Align for packed half-precision feature maps.
//!
//! The operator itself, its tensors and its devices live in
//! [roi_align_core] and are re-exported here. This crate adds [RoiAlign], a
//! function object that derives a kernel configuration from the tensors it
//! will run on.
//!
//! See [feature_flags] for more information on features.
//!
//! ```rust
//! # use roi_align::prelude::*;
//! let dev: Cpu = Default::default();
//! let feature = dev.sample_uniform([40, 40, 3, 1], DataType::F16, 0.0, 1.0);
//! let rois = RoiList::try_from_indexed(
//!     DataType::F16,
//!     &[[0.0, 2.0, 2.0, 20.0, 30.0], [0.0, 10.0, 5.0, 39.0, 39.0]],
//! )
//! .unwrap();
//!
//! let roi_align = RoiAlign::configure(&feature, &rois, 1.0, 7, 7, 2).unwrap();
//! let out = roi_align.run(&dev, &feature, &rois).unwrap();
//! assert_eq!(out.shape(), [7, 7, 3, 2]);
//! ```

extern crate self as roi_align;

pub mod feature_flags;
pub mod function;

pub use roi_align_core::*;

pub use function::RoiAlign;

pub mod prelude {
    pub use crate::function::RoiAlign;
    pub use roi_align_core::prelude::*;
}
