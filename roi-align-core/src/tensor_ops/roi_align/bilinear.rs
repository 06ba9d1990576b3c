use num_traits::Float;

/// The four source positions and weights that make up one bilinear sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Neighbors<F> {
    pub x_low: usize,
    pub x_high: usize,
    pub y_low: usize,
    pub y_high: usize,
    /// `[top-left, top-right, bottom-left, bottom-right]`
    pub weights: [F; 4],
}

#[inline(always)]
fn to_float<F: Float>(n: usize) -> F {
    // every usize is representable (possibly rounded) as a float
    F::from(n).unwrap()
}

/// Clamps one axis: returns `(low, high, snapped coordinate)`.
#[inline]
fn clamp_axis<F: Float>(v: F, extent: usize) -> (usize, usize, F) {
    let last = extent - 1;
    let low = v.floor();
    if low >= to_float(last) {
        (last, last, to_float(last))
    } else {
        let low = low.to_usize().unwrap_or(0);
        (low, low + 1, v)
    }
}

impl<F: Float> Neighbors<F> {
    /// Resolves sample `(x, y)` on a `width x height` map.
    ///
    /// Returns `None` when the sample lies more than one unit outside the
    /// map. Samples in `[-1, 0]` snap to `0`, samples at or past the last
    /// row or column collapse onto it, so the high neighbor never leaves the
    /// map.
    pub fn resolve(x: F, y: F, width: usize, height: usize) -> Option<Self> {
        let neg_one = -F::one();
        if y < neg_one || y > to_float(height) || x < neg_one || x > to_float(width) {
            return None;
        }
        let y = if y <= F::zero() { F::zero() } else { y };
        let x = if x <= F::zero() { F::zero() } else { x };

        let (y_low, y_high, y) = clamp_axis(y, height);
        let (x_low, x_high, x) = clamp_axis(x, width);

        let ly = y - to_float(y_low);
        let lx = x - to_float(x_low);
        let hy = F::one() - ly;
        let hx = F::one() - lx;
        Some(Self {
            x_low,
            x_high,
            y_low,
            y_high,
            weights: [hy * hx, hy * lx, ly * hx, ly * lx],
        })
    }

    /// Weighted sum of the four neighbors, fetched as `fetch(x, y)`.
    #[inline]
    pub fn interpolate<L: FnMut(usize, usize) -> F>(&self, mut fetch: L) -> F {
        let [w1, w2, w3, w4] = self.weights;
        let data1 = fetch(self.x_low, self.y_low);
        let data2 = fetch(self.x_high, self.y_low);
        let data3 = fetch(self.x_low, self.y_high);
        let data4 = fetch(self.x_high, self.y_high);
        data1 * w1 + data2 * w2 + data3 * w3 + data4 * w4
    }
}

/// Bilinearly samples a `width x height` map at `(x, y)`, or returns `None`
/// when the sample contributes nothing.
#[inline]
pub fn bilinear<F: Float, L: FnMut(usize, usize) -> F>(
    x: F,
    y: F,
    width: usize,
    height: usize,
    fetch: L,
) -> Option<F> {
    Neighbors::resolve(x, y, width, height).map(|n| n.interpolate(fetch))
}
