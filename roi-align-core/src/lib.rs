//! # roi-align-core
//!
//! Region of interest align on packed half-precision feature maps.
//!
//! Given a `width x height x channels` feature map and a list of boxes, ROI
//! Align produces a fixed `pooled_width x pooled_height` grid per box and per
//! channel. Each output element is the average of bilinearly interpolated
//! samples taken inside one bin of the box.
//!
//! # Tensors
//!
//! *See [tensor] for more information.*
//!
//! Every [tensor::Tensor] is a buffer of 32-bit words plus a descriptor
//! (offset and four strides, counted in words). With [dtypes::DataType::F16]
//! two consecutive elements along the innermost axis share one word.
//!
//! # Running the operator
//!
//! *See [tensor_ops] for more information.*
//!
//! ```rust
//! # use roi_align_core::prelude::*;
//! let dev: Cpu = Default::default();
//! let feature = dev.sample_uniform([32, 24, 8, 1], DataType::F16, -1.0, 1.0);
//! let rois = dev.sample_rois(4, 32, 24, DataType::F16);
//! let op = RoiAlignOp::build(
//!     RoiAlignConfig::new(32, 24, 7, 7)
//!         .with_sampling_ratio(2)
//!         .with_tile([8, 8, 1]),
//! )
//! .unwrap();
//! let out = dev.roi_align(&op, &feature, &rois);
//! assert_eq!(out.shape(), [7, 7, 8, 4]);
//! ```
//!
//! Only [dtypes::DataType::F16] has a kernel. Building one for
//! [dtypes::DataType::F32] fails:
//!
//! ```rust
//! # use roi_align_core::prelude::*;
//! let cfg = RoiAlignConfig::new(32, 24, 7, 7).with_data_type(DataType::F32);
//! let err = RoiAlignOp::build(cfg).unwrap_err();
//! assert_eq!(err.to_string(), "RoIAlign for f32 Not Implemented");
//! ```

extern crate self as roi_align_core;

pub mod dtypes;
pub mod tensor;
pub mod tensor_ops;

/// Contains subset of all public exports.
pub mod prelude {
    pub use crate::dtypes::{f16, DataType, Packing};
    pub use crate::tensor::*;
    pub use crate::tensor_ops::{
        DispatchGrid, Invocation, RoiAlignConfig, RoiAlignKernel, RoiAlignOp, RoiBoxPolicy,
        TryRoiAlign,
    };
}

#[cfg(test)]
pub(crate) mod tests {
    pub type TestDevice = crate::tensor::Cpu;

    pub trait AssertClose {
        type Elem: std::fmt::Display + std::fmt::Debug + Copy;
        const DEFAULT_TOLERANCE: Self::Elem;
        fn get_default_tol(&self) -> Self::Elem {
            Self::DEFAULT_TOLERANCE
        }
        fn get_far_pair(
            &self,
            rhs: &Self,
            tolerance: Self::Elem,
        ) -> Option<(Self::Elem, Self::Elem)>;
    }

    impl AssertClose for f32 {
        type Elem = f32;
        const DEFAULT_TOLERANCE: Self::Elem = 1e-6;
        fn get_far_pair(&self, rhs: &Self, tolerance: f32) -> Option<(f32, f32)> {
            if (self - rhs).abs() > tolerance {
                Some((*self, *rhs))
            } else {
                None
            }
        }
    }

    impl AssertClose for f64 {
        type Elem = f64;
        const DEFAULT_TOLERANCE: Self::Elem = 1e-6;
        fn get_far_pair(&self, rhs: &Self, tolerance: f64) -> Option<(f64, f64)> {
            if (self - rhs).abs() > tolerance {
                Some((*self, *rhs))
            } else {
                None
            }
        }
    }

    impl<T: AssertClose, const M: usize> AssertClose for [T; M] {
        type Elem = T::Elem;
        const DEFAULT_TOLERANCE: Self::Elem = T::DEFAULT_TOLERANCE;
        fn get_far_pair(
            &self,
            rhs: &Self,
            tolerance: Self::Elem,
        ) -> Option<(Self::Elem, Self::Elem)> {
            for (l, r) in self.iter().zip(rhs.iter()) {
                if let Some(pair) = l.get_far_pair(r, tolerance) {
                    return Some(pair);
                }
            }
            None
        }
    }

    impl<T: AssertClose> AssertClose for Vec<T> {
        type Elem = T::Elem;
        const DEFAULT_TOLERANCE: Self::Elem = T::DEFAULT_TOLERANCE;
        fn get_far_pair(
            &self,
            rhs: &Self,
            tolerance: Self::Elem,
        ) -> Option<(Self::Elem, Self::Elem)> {
            assert_eq!(self.len(), rhs.len());
            for (l, r) in self.iter().zip(rhs.iter()) {
                if let Some(pair) = l.get_far_pair(r, tolerance) {
                    return Some(pair);
                }
            }
            None
        }
    }

    macro_rules! assert_close {
        ($Lhs:expr, $Rhs:expr) => {
            let lhs = $Lhs;
            let tol = AssertClose::get_default_tol(&lhs);
            let far_pair = AssertClose::get_far_pair(&lhs, &$Rhs, tol);
            if let Some((l, r)) = far_pair {
                panic!("lhs != rhs | {l} != {r}");
            }
        };
        ($Lhs:expr, $Rhs:expr, $Tolerance:expr) => {{
            let far_pair = $Lhs.get_far_pair(
                &$Rhs,
                num_traits::FromPrimitive::from_f64($Tolerance).unwrap(),
            );
            if let Some((l, r)) = far_pair {
                panic!("lhs != rhs | {l} != {r}");
            }
        }};
    }

    pub(crate) use assert_close;
}
