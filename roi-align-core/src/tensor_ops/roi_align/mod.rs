//! Region of interest align.
//!
//! Each output element `(pw, ph, channel, region)` is the mean of an
//! `iy_upper x ix_upper` grid of bilinear samples taken inside bin
//! `(pw, ph)` of `region`. Every element is computed independently by
//! [RoiAlignOp::compute]; devices implementing [RoiAlignKernel] only decide
//! how that index space is spread over workers.
//!
//! ```rust
//! # use roi_align_core::prelude::*;
//! let dev: Cpu = Default::default();
//! let feature = dev.sample_uniform([16, 16, 3, 1], DataType::F16, 0.0, 1.0);
//! let rois = RoiList::boxes(&[[0.0, 0.0, 8.0, 8.0], [4.0, 2.0, 15.0, 9.0]]);
//! let op = RoiAlignOp::build(RoiAlignConfig::new(16, 16, 2, 2).with_sampling_ratio(2)).unwrap();
//! let out = dev.roi_align(&op, &feature, &rois);
//! assert_eq!(out.shape(), [2, 2, 3, 2]);
//! ```

mod bilinear;
mod cpu_kernel;
mod sampling;

#[cfg(feature = "webgpu")]
mod webgpu_kernel;

pub use bilinear::{bilinear, Neighbors};
pub use sampling::{Bins, RoiBox, SamplingGrid, MAX_SAMPLES_PER_BIN};

use crate::{
    dtypes::DataType,
    tensor::{Error, Index4, RoiList, Tensor},
};

/// Which box the sampling math runs on.
///
/// The deployed GLES kernel computed the scaled region and then overwrote it
/// with the unit box, so every region pooled the same `[0, 1] x [0, 1]`
/// patch. [RoiBoxPolicy::Scaled] uses the scaled region;
/// [RoiBoxPolicy::UnitBox] reproduces the deployed kernel exactly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RoiBoxPolicy {
    #[default]
    Scaled,
    UnitBox,
}

/// Specialization constants of one ROI Align kernel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoiAlignConfig {
    pub data_type: DataType,
    pub pooled_width: usize,
    pub pooled_height: usize,
    /// `> 0` fixes the samples per axis, `<= 0` selects them adaptively.
    pub sampling_ratio: i32,
    pub spatial_scale: f32,
    pub source_width: usize,
    pub source_height: usize,
    /// Work group size along `(x, y, z)`.
    pub tile: [usize; 3],
    pub roi_box: RoiBoxPolicy,
}

impl Default for RoiAlignConfig {
    fn default() -> Self {
        Self {
            data_type: DataType::F16,
            pooled_width: 7,
            pooled_height: 7,
            sampling_ratio: 0,
            spatial_scale: 1.0,
            source_width: 0,
            source_height: 0,
            tile: [1, 1, 1],
            roi_box: RoiBoxPolicy::Scaled,
        }
    }
}

impl RoiAlignConfig {
    pub fn new(
        source_width: usize,
        source_height: usize,
        pooled_width: usize,
        pooled_height: usize,
    ) -> Self {
        Self {
            source_width,
            source_height,
            pooled_width,
            pooled_height,
            ..Default::default()
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_sampling_ratio(mut self, sampling_ratio: i32) -> Self {
        self.sampling_ratio = sampling_ratio;
        self
    }

    pub fn with_spatial_scale(mut self, spatial_scale: f32) -> Self {
        self.spatial_scale = spatial_scale;
        self
    }

    pub fn with_tile(mut self, tile: [usize; 3]) -> Self {
        self.tile = tile;
        self
    }

    pub fn with_roi_box(mut self, roi_box: RoiBoxPolicy) -> Self {
        self.roi_box = roi_box;
        self
    }
}

/// A built kernel: a configuration that passed every build time check.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoiAlignOp {
    pub(crate) config: RoiAlignConfig,
}

impl RoiAlignOp {
    /// Checks `config` and builds a kernel from it.
    ///
    /// [DataType::F32] has no kernel and is rejected with
    /// [Error::NotImplemented].
    pub fn build(config: RoiAlignConfig) -> Result<Self, Error> {
        if config.data_type != DataType::F16 {
            return Err(Error::NotImplemented(config.data_type));
        }
        if config.pooled_width == 0 || config.pooled_height == 0 {
            return Err(Error::InvalidConfig("pooled size must be non-zero"));
        }
        if config.source_width == 0 || config.source_height == 0 {
            return Err(Error::InvalidConfig("source size must be non-zero"));
        }
        if config.tile.contains(&0) {
            return Err(Error::InvalidConfig("tile size must be non-zero"));
        }
        if !config.spatial_scale.is_finite() || config.spatial_scale <= 0.0 {
            return Err(Error::InvalidConfig("spatial scale must be finite and positive"));
        }
        if config.sampling_ratio > 0 {
            let n = config.sampling_ratio as usize;
            if n.checked_mul(n).map_or(true, |n| n > MAX_SAMPLES_PER_BIN) {
                return Err(Error::InvalidConfig("sampling ratio is too large"));
            }
        }
        log::debug!(
            "building roi_align kernel: dtype={} pooled={}x{} sampling_ratio={} \
             spatial_scale={} source={}x{} tile={:?} roi_box={:?}",
            config.data_type.name(),
            config.pooled_width,
            config.pooled_height,
            config.sampling_ratio,
            config.spatial_scale,
            config.source_width,
            config.source_height,
            config.tile,
            config.roi_box,
        );
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &RoiAlignConfig {
        &self.config
    }

    /// `[pooled_width, pooled_height, channels, num_rois]`
    pub fn output_shape(&self, channels: usize, num_rois: usize) -> Index4 {
        [
            self.config.pooled_width,
            self.config.pooled_height,
            channels,
            num_rois,
        ]
    }

    /// Number of invocations in one work group.
    pub fn tile_len(&self) -> usize {
        self.config.tile.iter().product()
    }

    /// The box the sampling math runs on for `region`.
    #[inline]
    pub fn roi_box(&self, rois: &RoiList, region: usize) -> RoiBox {
        let scaled = RoiBox::scaled(rois.corners(region), self.config.spatial_scale);
        match self.config.roi_box {
            RoiBoxPolicy::Scaled => scaled,
            RoiBoxPolicy::UnitBox => RoiBox::UNIT,
        }
    }

    /// Bins and sampling grid of `region`.
    #[inline]
    pub fn sampling(&self, rois: &RoiList, region: usize) -> (Bins, SamplingGrid) {
        let cfg = &self.config;
        let bins = self
            .roi_box(rois, region)
            .bins(cfg.pooled_width, cfg.pooled_height);
        let grid =
            SamplingGrid::new(cfg.sampling_ratio, &bins, cfg.pooled_width, cfg.pooled_height);
        (bins, grid)
    }

    /// Value of output element `(pw, ph, channel)` of `region`. Pure: the
    /// result depends only on the inputs and the configuration.
    pub fn compute(
        &self,
        region: usize,
        pw: usize,
        ph: usize,
        channel: usize,
        feature: &Tensor,
        rois: &RoiList,
    ) -> f32 {
        let cfg = &self.config;
        let (bins, grid) = self.sampling(rois, region);

        let mut res = 0.0f32;
        for (x, y) in grid.samples(&bins, pw, ph) {
            let fetch = |xi, yi| feature.get([xi, yi, channel, 0]);
            if let Some(v) = bilinear(x, y, cfg.source_width, cfg.source_height, fetch) {
                res += v;
            }
        }
        res / grid.count() as f32
    }

    /// Pre-dispatch checks on the tensors a kernel is about to touch.
    pub fn validate(&self, feature: &Tensor, rois: &RoiList, out: &Tensor) -> Result<(), Error> {
        let expected = self.config.data_type;
        for found in [feature.dtype(), rois.dtype(), out.dtype()] {
            if found != expected {
                return Err(Error::DataTypeMismatch { expected, found });
            }
        }

        let channels = feature.channels();
        let expected = [self.config.source_width, self.config.source_height, channels, 1];
        if feature.shape() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                found: feature.shape(),
            });
        }
        let expected = self.output_shape(channels, rois.num_rois());
        if out.shape() != expected {
            return Err(Error::ShapeMismatch {
                expected,
                found: out.shape(),
            });
        }

        for t in [feature, rois.tensor(), out] {
            t.attrs().validate(t.shape(), t.data().len())?;
        }
        if !out.attrs().is_non_overlapping(out.shape()) {
            return Err(Error::OverlappingAttributes);
        }
        rois.validate()?;
        for region in 0..rois.num_rois() {
            let (_, grid) = self.sampling(rois, region);
            if grid.checked_count().is_none() {
                return Err(Error::TooManySamples { region });
            }
        }
        Ok(())
    }
}

/// One unit of work: every lane of a single output storage word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Pooled column of lane 0.
    pub pw: usize,
    /// Lanes of the word that belong to the output.
    pub lanes: usize,
    pub ph: usize,
    pub channel: usize,
    pub region: usize,
}

/// The index space of one launch, enumerated per output storage word so no
/// two invocations write the same word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DispatchGrid {
    pub pooled_width: usize,
    pub pooled_height: usize,
    pub channels: usize,
    pub regions: usize,
    pub lanes: usize,
}

impl DispatchGrid {
    pub fn new(op: &RoiAlignOp, channels: usize, regions: usize) -> Self {
        Self {
            pooled_width: op.config.pooled_width,
            pooled_height: op.config.pooled_height,
            channels,
            regions,
            lanes: op.config.data_type.packing().lanes(),
        }
    }

    #[inline]
    pub fn words_per_row(&self) -> usize {
        (self.pooled_width + self.lanes - 1) / self.lanes
    }

    /// Total number of invocations.
    pub fn len(&self) -> usize {
        self.words_per_row() * self.pooled_height * self.channels * self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invocation `i`, counting word columns fastest, then pooled rows,
    /// channels and regions.
    #[inline]
    pub fn invocation(&self, i: usize) -> Invocation {
        let row = self.words_per_row();
        let pw = (i % row) * self.lanes;
        let i = i / row;
        let ph = i % self.pooled_height;
        let i = i / self.pooled_height;
        let channel = i % self.channels;
        let region = i / self.channels;
        Invocation {
            pw,
            lanes: self.lanes.min(self.pooled_width - pw),
            ph,
            channel,
            region,
        }
    }

    /// Extent of the 3-D launch: word columns, pooled rows and
    /// `channels * regions`.
    pub fn extent(&self) -> [usize; 3] {
        [
            self.words_per_row(),
            self.pooled_height,
            self.channels * self.regions,
        ]
    }
}

/// A device that can run a built [RoiAlignOp].
pub trait RoiAlignKernel {
    /// Writes every element of `out`. `out` must already have the shape
    /// given by [RoiAlignOp::output_shape].
    fn forward(
        &self,
        op: &RoiAlignOp,
        feature: &Tensor,
        rois: &RoiList,
        out: &mut Tensor,
    ) -> Result<(), Error>;
}

/// Runs ROI Align into a freshly allocated, densely laid out output.
pub trait TryRoiAlign: RoiAlignKernel {
    fn roi_align(&self, op: &RoiAlignOp, feature: &Tensor, rois: &RoiList) -> Tensor {
        self.try_roi_align(op, feature, rois).unwrap()
    }

    fn try_roi_align(
        &self,
        op: &RoiAlignOp,
        feature: &Tensor,
        rois: &RoiList,
    ) -> Result<Tensor, Error> {
        let shape = op.output_shape(feature.channels(), rois.num_rois());
        let mut out = Tensor::try_zeros(shape, op.config.data_type)?;
        self.forward(op, feature, rois, &mut out)?;
        Ok(out)
    }
}

impl<D: RoiAlignKernel> TryRoiAlign for D {}
