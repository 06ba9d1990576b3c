/// A region in feature map coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoiBox {
    pub start_w: f32,
    pub start_h: f32,
    pub end_w: f32,
    pub end_h: f32,
}

impl RoiBox {
    /// The `[0, 1] x [0, 1]` box every region collapses to under
    /// [super::RoiBoxPolicy::UnitBox].
    pub const UNIT: Self = Self {
        start_w: 0.0,
        start_h: 0.0,
        end_w: 1.0,
        end_h: 1.0,
    };

    /// Maps a stored `(start_x, start_y, end_x, end_y)` into feature map
    /// coordinates.
    pub fn scaled([x1, y1, x2, y2]: [f32; 4], spatial_scale: f32) -> Self {
        Self {
            start_w: x1 * spatial_scale,
            start_h: y1 * spatial_scale,
            end_w: x2 * spatial_scale,
            end_h: y2 * spatial_scale,
        }
    }

    /// Width floored to `1.0`.
    #[inline]
    pub fn width(&self) -> f32 {
        (self.end_w - self.start_w).max(1.0)
    }

    /// Height floored to `1.0`.
    #[inline]
    pub fn height(&self) -> f32 {
        (self.end_h - self.start_h).max(1.0)
    }

    pub fn bins(&self, pooled_w: usize, pooled_h: usize) -> Bins {
        let roi_width = self.width();
        let roi_height = self.height();
        Bins {
            start_w: self.start_w,
            start_h: self.start_h,
            roi_width,
            roi_height,
            bin_size_w: roi_width / pooled_w as f32,
            bin_size_h: roi_height / pooled_h as f32,
        }
    }
}

/// The derived quantities every invocation recomputes for its region.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bins {
    pub start_w: f32,
    pub start_h: f32,
    pub roi_width: f32,
    pub roi_height: f32,
    pub bin_size_w: f32,
    pub bin_size_h: f32,
}

/// Largest number of samples a single bin may average. The denominator is
/// exact in `f32` up to this count.
pub const MAX_SAMPLES_PER_BIN: usize = 1 << 24;

/// `iy_upper x ix_upper` sample points, each centered in an equal sub-cell of
/// a bin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SamplingGrid {
    pub ix_upper: usize,
    pub iy_upper: usize,
}

impl SamplingGrid {
    /// A positive `sampling_ratio` fixes the grid, anything else makes it
    /// adaptive: one sample per unit of source resolution inside a bin.
    pub fn new(sampling_ratio: i32, bins: &Bins, pooled_w: usize, pooled_h: usize) -> Self {
        if sampling_ratio > 0 {
            let n = sampling_ratio as usize;
            return Self {
                ix_upper: n,
                iy_upper: n,
            };
        }
        // roi sizes are >= 1.0 so both ceilings are >= 1
        Self {
            ix_upper: (bins.roi_width / pooled_w as f32).ceil() as usize,
            iy_upper: (bins.roi_height / pooled_h as f32).ceil() as usize,
        }
    }

    /// Averaging denominator. Out of range samples still count.
    #[inline]
    pub fn count(&self) -> usize {
        self.ix_upper * self.iy_upper
    }

    /// [Self::count], or `None` past [MAX_SAMPLES_PER_BIN].
    pub fn checked_count(&self) -> Option<usize> {
        self.ix_upper
            .checked_mul(self.iy_upper)
            .filter(|&n| n <= MAX_SAMPLES_PER_BIN)
    }

    /// Continuous source coordinates `(x, y)` of sample `(ix, iy)` in bin
    /// `(pw, ph)`.
    #[inline]
    pub fn sample(&self, bins: &Bins, pw: usize, ph: usize, ix: usize, iy: usize) -> (f32, f32) {
        let y = bins.start_h
            + ph as f32 * bins.bin_size_h
            + (iy as f32 + 0.5) * bins.bin_size_h / self.iy_upper as f32;
        let x = bins.start_w
            + pw as f32 * bins.bin_size_w
            + (ix as f32 + 0.5) * bins.bin_size_w / self.ix_upper as f32;
        (x, y)
    }

    /// Every sample of bin `(pw, ph)`, row by row.
    pub fn samples<'a>(
        &'a self,
        bins: &'a Bins,
        pw: usize,
        ph: usize,
    ) -> impl Iterator<Item = (f32, f32)> + 'a {
        (0..self.iy_upper)
            .flat_map(move |iy| (0..self.ix_upper).map(move |ix| self.sample(bins, pw, ph, ix, iy)))
    }
}
