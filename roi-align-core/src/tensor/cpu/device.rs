use crate::{
    dtypes::DataType,
    tensor::{Error, Index4, RoiList, Tensor},
};

use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// A device that runs operations on the host, optionally across a rayon
/// thread pool.
#[derive(Clone, Debug)]
pub struct Cpu {
    pub(crate) rng: Arc<Mutex<StdRng>>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::seed_from_u64(0)
    }
}

impl Cpu {
    /// Constructs rng with the given seed.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Fills a dense tensor with values drawn uniformly from `[low, high)`.
    pub fn try_sample_uniform(
        &self,
        shape: Index4,
        dtype: DataType,
        low: f32,
        high: f32,
    ) -> Result<Tensor, Error> {
        if !(low < high) {
            return Err(Error::InvalidConfig("uniform range is empty"));
        }
        let numel = shape.iter().product();
        let distr = Uniform::new(low, high);
        let values: Vec<f32> = {
            let mut rng = self.rng.lock().unwrap();
            (&mut *rng).sample_iter(distr).take(numel).collect()
        };
        Tensor::try_from_slice(shape, dtype, &values)
    }

    pub fn sample_uniform(&self, shape: Index4, dtype: DataType, low: f32, high: f32) -> Tensor {
        self.try_sample_uniform(shape, dtype, low, high).unwrap()
    }

    /// Draws `n` boxes lying inside a `width x height` image.
    pub fn try_sample_rois(
        &self,
        n: usize,
        width: usize,
        height: usize,
        dtype: DataType,
    ) -> Result<RoiList, Error> {
        let boxes: Vec<[f32; 4]> = {
            let mut rng = self.rng.lock().unwrap();
            (0..n)
                .map(|_| {
                    let (x1, x2) = ordered(&mut *rng, width as f32);
                    let (y1, y2) = ordered(&mut *rng, height as f32);
                    [x1, y1, x2, y2]
                })
                .collect()
        };
        RoiList::try_from_boxes(dtype, &boxes)
    }

    pub fn sample_rois(&self, n: usize, width: usize, height: usize, dtype: DataType) -> RoiList {
        self.try_sample_rois(n, width, height, dtype).unwrap()
    }
}

fn ordered<R: Rng>(rng: &mut R, high: f32) -> (f32, f32) {
    let a: f32 = rng.gen_range(0.0..=high);
    let b: f32 = rng.gen_range(0.0..=high);
    (a.min(b), a.max(b))
}
