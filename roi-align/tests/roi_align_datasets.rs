//! Sweeps over the small and large shape sets, checked against a direct
//! evaluation of ROI Align on the logical tensor values.

use rand::{rngs::StdRng, Rng, SeedableRng};
use roi_align::prelude::*;

struct Case {
    width: usize,
    height: usize,
    channels: usize,
    num_rois: usize,
    spatial_scale: f32,
    pool: usize,
    sampling_ratio: i32,
}

/// Batch indexed rows whose scaled boxes lie inside the feature map and are
/// at least one pixel wide.
fn random_rois(rng: &mut StdRng, case: &Case) -> RoiList {
    let (w, h) = (case.width as f32, case.height as f32);
    let rows: Vec<[f32; 5]> = (0..case.num_rois)
        .map(|_| {
            let x1 = rng.gen_range(0.0..0.75 * w);
            let y1 = rng.gen_range(0.0..0.75 * h);
            let x2 = rng.gen_range(x1 + 1.0..=w);
            let y2 = rng.gen_range(y1 + 1.0..=h);
            let s = case.spatial_scale;
            [0.0, x1 / s, y1 / s, x2 / s, y2 / s]
        })
        .collect();
    RoiList::try_from_indexed(DataType::F16, &rows).unwrap()
}

fn reference(case: &Case, feature: &Tensor, rois: &RoiList) -> Vec<f32> {
    let (w, h) = (case.width, case.height);
    let at = |x: usize, y: usize, c: usize| feature.get([x, y, c, 0]) as f64;
    let sample = |x: f32, y: f32, c: usize| -> f64 {
        if x < -1.0 || y < -1.0 || x > w as f32 || y > h as f32 {
            return 0.0;
        }
        let x = x.max(0.0).min((w - 1) as f32);
        let y = y.max(0.0).min((h - 1) as f32);
        let (x0, y0) = (x.floor() as usize, y.floor() as usize);
        let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
        let (fx, fy) = ((x - x0 as f32) as f64, (y - y0 as f32) as f64);
        (1.0 - fy) * ((1.0 - fx) * at(x0, y0, c) + fx * at(x1, y0, c))
            + fy * ((1.0 - fx) * at(x0, y1, c) + fx * at(x1, y1, c))
    };

    let mut out = Vec::new();
    for r in 0..case.num_rois {
        let [x1, y1, x2, y2] = rois.corners(r).map(|v| v * case.spatial_scale);
        let roi_w = (x2 - x1).max(1.0);
        let roi_h = (y2 - y1).max(1.0);
        let bin_w = roi_w / case.pool as f32;
        let bin_h = roi_h / case.pool as f32;
        let (nx, ny) = if case.sampling_ratio > 0 {
            (case.sampling_ratio as usize, case.sampling_ratio as usize)
        } else {
            (bin_w.ceil() as usize, bin_h.ceil() as usize)
        };
        for c in 0..case.channels {
            for ph in 0..case.pool {
                for pw in 0..case.pool {
                    let mut acc = 0.0;
                    for iy in 0..ny {
                        let y = y1 + ph as f32 * bin_h + (iy as f32 + 0.5) * bin_h / ny as f32;
                        for ix in 0..nx {
                            let x = x1 + pw as f32 * bin_w + (ix as f32 + 0.5) * bin_w / nx as f32;
                            acc += sample(x, y, c);
                        }
                    }
                    out.push((acc / (nx * ny) as f64) as f32);
                }
            }
        }
    }
    out
}

fn run_case(dev: &Cpu, rng: &mut StdRng, case: Case) {
    let feature = dev.sample_uniform(
        [case.width, case.height, case.channels, 1],
        DataType::F16,
        0.0,
        1.0,
    );
    let rois = random_rois(rng, &case);
    let roi_align = RoiAlign::configure(
        &feature,
        &rois,
        case.spatial_scale,
        case.pool,
        case.pool,
        case.sampling_ratio,
    )
    .unwrap();
    let out = roi_align.run(dev, &feature, &rois).unwrap();
    assert_eq!(
        out.shape(),
        [case.pool, case.pool, case.channels, case.num_rois]
    );

    let found = out.to_vec();
    let expected = reference(&case, &feature, &rois);
    assert_eq!(found.len(), expected.len());
    for (i, (l, r)) in found.iter().zip(expected.iter()).enumerate() {
        assert!(
            (l - r).abs() <= 1e-2,
            "element {i}: {l} != {r} (scale={} pool={} sampling_ratio={})",
            case.spatial_scale,
            case.pool,
            case.sampling_ratio
        );
    }
}

#[test]
fn test_small_shapes() {
    let dev = Cpu::seed_from_u64(0);
    let mut rng = StdRng::seed_from_u64(0);
    for spatial_scale in [1.0, 2.0, 0.0625] {
        for channels in [1, 3, 5, 8] {
            for pool in [1, 3, 7] {
                for sampling_ratio in [0, 1, 2, 3] {
                    let case = Case {
                        width: 40,
                        height: 40,
                        channels,
                        num_rois: 6,
                        spatial_scale,
                        pool,
                        sampling_ratio,
                    };
                    run_case(&dev, &mut rng, case);
                }
            }
        }
    }
}

#[test]
fn test_large_shapes() {
    let dev = Cpu::seed_from_u64(1);
    let mut rng = StdRng::seed_from_u64(1);
    for num_rois in [1, 2, 3, 6] {
        for spatial_scale in [1.0, 2.0, 0.0625] {
            for pool in [3, 7] {
                for sampling_ratio in [0, 1, 2, 3] {
                    let case = Case {
                        width: 160,
                        height: 160,
                        channels: 3,
                        num_rois,
                        spatial_scale,
                        pool,
                        sampling_ratio,
                    };
                    run_case(&dev, &mut rng, case);
                }
            }
        }
    }
}

#[test]
fn test_strided_output_matches_dense() {
    let dev: Cpu = Default::default();
    let feature = dev.sample_uniform([40, 40, 5, 1], DataType::F16, 0.0, 1.0);
    let rois = dev.sample_rois(3, 40, 40, DataType::F16);
    let roi_align = RoiAlign::configure(&feature, &rois, 1.0, 7, 7, 2).unwrap();
    let dense = roi_align.run(&dev, &feature, &rois).unwrap();

    // 7 halves per row padded to 6 words, channels and regions swapped
    let shape = roi_align.output_shape(3);
    let attrs = TensorAttributes::contiguous(shape, Packing::Double)
        .with_offset(2)
        .with_strides([1, 6, 6 * 7 * 3, 6 * 7]);
    let len = 2 + 6 * 7 * 3 * 5;
    let data = PackedBuffer::try_zeros(len, Packing::Double).unwrap();
    let mut out = Tensor::try_from_parts(shape, DataType::F16, attrs, data).unwrap();
    roi_align.run_into(&dev, &feature, &rois, &mut out).unwrap();

    assert_eq!(out.to_vec(), dense.to_vec());
}

#[test]
fn test_strided_feature_matches_dense() {
    let dev: Cpu = Default::default();
    let dense = dev.sample_uniform([9, 6, 2, 1], DataType::F16, -1.0, 1.0);

    // same values with each row padded by three words
    let shape = dense.shape();
    let attrs = TensorAttributes::contiguous(shape, Packing::Double).with_strides([1, 8, 48, 96]);
    let data = PackedBuffer::try_zeros(96, Packing::Double).unwrap();
    let mut strided = Tensor::try_from_parts(shape, DataType::F16, attrs, data).unwrap();
    for c in 0..2 {
        for y in 0..6 {
            for x in 0..9 {
                strided.set([x, y, c, 0], dense.get([x, y, c, 0]));
            }
        }
    }

    let rois = RoiList::boxes(&[[0.5, 0.5, 8.0, 5.0], [3.0, 1.0, 6.0, 4.0]]);
    let roi_align = RoiAlign::configure(&dense, &rois, 1.0, 3, 3, 0).unwrap();
    assert_eq!(
        roi_align.run(&dev, &strided, &rois).unwrap(),
        roi_align.run(&dev, &dense, &rois).unwrap()
    );
}
