//! A configure-then-run front end to [RoiAlignOp].

use roi_align_core::{
    tensor::{Error, Index4, RoiList, Tensor},
    tensor_ops::{RoiAlignConfig, RoiAlignKernel, RoiAlignOp, RoiBoxPolicy},
};

/// ROI Align bound to one feature map geometry and one region count.
///
/// [RoiAlign::configure] reads the source size, channel count and data type
/// off the tensors it is given, so the caller only supplies the pooling
/// parameters. The result can be [run](RoiAlign::run) on any device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiAlign {
    op: RoiAlignOp,
    channels: usize,
    num_rois: usize,
}

impl RoiAlign {
    /// Builds a kernel for `feature` and `rois`.
    ///
    /// A non-positive `sampling_ratio` selects the number of samples per bin
    /// adaptively.
    pub fn configure(
        feature: &Tensor,
        rois: &RoiList,
        spatial_scale: f32,
        pooled_h: usize,
        pooled_w: usize,
        sampling_ratio: i32,
    ) -> Result<Self, Error> {
        let cfg = RoiAlignConfig::new(feature.width(), feature.height(), pooled_w, pooled_h)
            .with_data_type(feature.dtype())
            .with_spatial_scale(spatial_scale)
            .with_sampling_ratio(sampling_ratio);
        Self::configure_with(feature, rois, cfg)
    }

    /// Like [RoiAlign::configure], but starts from a full configuration,
    /// e.g. to pick a tile size or a [RoiBoxPolicy]. The source size and
    /// data type are still taken from `feature`.
    pub fn configure_with(
        feature: &Tensor,
        rois: &RoiList,
        mut cfg: RoiAlignConfig,
    ) -> Result<Self, Error> {
        if rois.dtype() != feature.dtype() {
            return Err(Error::DataTypeMismatch {
                expected: feature.dtype(),
                found: rois.dtype(),
            });
        }
        cfg.source_width = feature.width();
        cfg.source_height = feature.height();
        cfg.data_type = feature.dtype();
        let op = RoiAlignOp::build(cfg)?;
        Ok(Self {
            op,
            channels: feature.channels(),
            num_rois: rois.num_rois(),
        })
    }

    /// Same as [RoiAlign::configure_with] with only the ROI box policy
    /// changed from the default.
    pub fn with_roi_box(self, roi_box: RoiBoxPolicy) -> Result<Self, Error> {
        let cfg = self.op.config().with_roi_box(roi_box);
        Ok(Self {
            op: RoiAlignOp::build(cfg)?,
            ..self
        })
    }

    #[inline]
    pub fn op(&self) -> &RoiAlignOp {
        &self.op
    }

    /// `[pooled_width, pooled_height, channels, num_rois]`
    pub fn output_shape(&self, num_rois: usize) -> Index4 {
        self.op.output_shape(self.channels, num_rois)
    }

    /// Allocates the output and fills it.
    pub fn run<D: RoiAlignKernel>(
        &self,
        dev: &D,
        feature: &Tensor,
        rois: &RoiList,
    ) -> Result<Tensor, Error> {
        let mut out = Tensor::try_zeros(self.output_shape(rois.num_rois()), feature.dtype())?;
        self.run_into(dev, feature, rois, &mut out)?;
        Ok(out)
    }

    /// Fills a caller allocated output, which may carry its own strides.
    pub fn run_into<D: RoiAlignKernel>(
        &self,
        dev: &D,
        feature: &Tensor,
        rois: &RoiList,
        out: &mut Tensor,
    ) -> Result<(), Error> {
        if feature.channels() != self.channels || rois.num_rois() != self.num_rois {
            return Err(Error::ShapeMismatch {
                expected: self.output_shape(self.num_rois),
                found: self.op.output_shape(feature.channels(), rois.num_rois()),
            });
        }
        log::trace!(
            "running roi_align on {} regions of {:?}",
            rois.num_rois(),
            feature.shape()
        );
        dev.forward(&self.op, feature, rois, out)
    }
}
