use super::{DispatchGrid, RoiAlignKernel, RoiAlignOp};
use crate::tensor::{lane_mask, Cpu, Error, RoiList, Tensor};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

impl RoiAlignKernel for Cpu {
    fn forward(
        &self,
        op: &RoiAlignOp,
        feature: &Tensor,
        rois: &RoiList,
        out: &mut Tensor,
    ) -> Result<(), Error> {
        op.validate(feature, rois, out)?;

        let grid = DispatchGrid::new(op, feature.channels(), rois.num_rois());
        let packing = out.attrs.packing;
        log::trace!(
            "roi_align on cpu: {} invocations, {} regions, tile of {}",
            grid.len(),
            grid.regions,
            op.tile_len()
        );

        // every lane of one output word, packed
        let word_at = |i: usize| {
            let inv = grid.invocation(i);
            (0..inv.lanes).fold(0u32, |word, lane| {
                let v = op.compute(inv.region, inv.pw + lane, inv.ph, inv.channel, feature, rois);
                packing.pack(word, lane, v)
            })
        };

        #[cfg(not(feature = "parallel"))]
        let words: Vec<u32> = (0..grid.len()).map(word_at).collect();

        #[cfg(feature = "parallel")]
        let words: Vec<u32> = (0..grid.len())
            .into_par_iter()
            .with_min_len(op.tile_len())
            .map(word_at)
            .collect();

        for (i, word) in words.into_iter().enumerate() {
            let inv = grid.invocation(i);
            let index = out.attrs.word_of([inv.pw, inv.ph, inv.channel, inv.region]);
            out.data.store_lanes(index, word, lane_mask(packing, inv.lanes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dtypes::DataType,
        tensor_ops::roi_align::{RoiAlignConfig, TryRoiAlign},
        tests::*,
    };

    #[test]
    fn test_tile_size_does_not_change_results() {
        let dev: TestDevice = Default::default();
        let feature = dev.sample_uniform([33, 17, 5, 1], DataType::F16, -1.0, 1.0);
        let rois = dev.sample_rois(9, 33, 17, DataType::F16);
        let cfg = RoiAlignConfig::new(33, 17, 7, 5).with_spatial_scale(1.0);

        let mut expected = Tensor::zeros([7, 5, 5, 9], DataType::F16);
        let op = RoiAlignOp::build(cfg).unwrap();
        dev.forward(&op, &feature, &rois, &mut expected).unwrap();

        for tile in [[8, 8, 1], [64, 1, 1], [4, 4, 4]] {
            let op = RoiAlignOp::build(cfg.with_tile(tile)).unwrap();
            let mut out = Tensor::zeros([7, 5, 5, 9], DataType::F16);
            dev.forward(&op, &feature, &rois, &mut out).unwrap();
            assert_eq!(out.data().words(), expected.data().words());
        }
    }

    #[test]
    fn test_every_element_matches_compute() {
        let dev: TestDevice = Default::default();
        let feature = dev.sample_uniform([9, 9, 2, 1], DataType::F16, 0.0, 1.0);
        let rois = dev.sample_rois(3, 9, 9, DataType::F16);
        let op = RoiAlignOp::build(RoiAlignConfig::new(9, 9, 3, 3).with_sampling_ratio(2)).unwrap();
        let out = dev.roi_align(&op, &feature, &rois);
        for r in 0..3 {
            for c in 0..2 {
                for ph in 0..3 {
                    for pw in 0..3 {
                        let v = op.compute(r, pw, ph, c, &feature, &rois);
                        let v = crate::dtypes::f16::from_f32(v).to_f32();
                        assert_eq!(out.get([pw, ph, c, r]), v);
                    }
                }
            }
        }
    }

    #[test]
    fn test_failed_validation_leaves_output_untouched() {
        let dev: TestDevice = Default::default();
        let feature = dev.sample_uniform([4, 4, 1, 1], DataType::F16, 0.0, 1.0);
        let rois = RoiList::boxes(&[[0.0, 0.0, f32::INFINITY, 2.0]]);
        let op = RoiAlignOp::build(RoiAlignConfig::new(4, 4, 2, 2)).unwrap();
        let mut out = Tensor::try_from_slice([2, 2, 1, 1], DataType::F16, &[3.0; 4]).unwrap();
        assert!(matches!(
            dev.forward(&op, &feature, &rois, &mut out),
            Err(Error::NonFiniteRoi { region: 0 })
        ));
        assert_eq!(out.to_vec(), [3.0; 4]);
    }
}
