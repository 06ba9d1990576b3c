use std::time::Instant;

use roi_align::prelude::*;

#[cfg(feature = "webgpu")]
type Dev = Webgpu;

#[cfg(not(feature = "webgpu"))]
type Dev = Cpu;

const SOURCE: Index4 = [160, 160, 64, 1];
const NUM_ROIS: usize = 32;
const POOL: usize = 7;

fn main() {
    println!("Benchmarking `roi_align`");
    println!("Device {}", std::any::type_name::<Dev>());
    println!("Dispatch {}", roi_align::feature_flags::CPU_DISPATCH);
    println!("Source shape {SOURCE:?}, {NUM_ROIS} rois, pooled {POOL}x{POOL}");
    println!();

    let dev: Dev = Default::default();

    loop {
        let feature = dev.sample_uniform(SOURCE, DataType::F16, -1.0, 1.0);
        let rois = dev.sample_rois(NUM_ROIS, SOURCE[0], SOURCE[1], DataType::F16);

        for sampling_ratio in [0, 2] {
            let cfg = RoiAlignConfig::new(SOURCE[0], SOURCE[1], POOL, POOL)
                .with_sampling_ratio(sampling_ratio)
                .with_tile([8, 8, 1]);
            let roi_align = RoiAlign::configure_with(&feature, &rois, cfg).unwrap();
            let mut out = Tensor::zeros(roi_align.output_shape(NUM_ROIS), DataType::F16);

            let start = Instant::now();
            roi_align
                .run_into(&dev, &feature, &rois, &mut out)
                .unwrap();
            let dur = start.elapsed();

            print!("sampling_ratio={sampling_ratio}: {dur:?}  ");
        }
        println!();
    }
}
