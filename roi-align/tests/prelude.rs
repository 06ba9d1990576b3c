//! Downstream code glob-imports the prelude and still names the crate root.

use roi_align::prelude::*;

#[test]
fn test_crate_paths_resolve_after_prelude_glob() {
    assert!(["serial", "rayon"].contains(&roi_align::feature_flags::CPU_DISPATCH));

    let bins = roi_align::tensor_ops::roi_align::RoiBox::UNIT.bins(2, 2);
    assert_eq!(bins.bin_size_w, 0.5);
}

#[test]
fn test_prelude_runs_the_operator() {
    let dev: Cpu = Default::default();
    let feature = Tensor::try_from_slice([2, 2, 1, 1], DataType::F16, &[1.0, 2.0, 3.0, 4.0])
        .unwrap();
    let rois = RoiList::boxes(&[[-0.5, -0.5, 1.5, 1.5]]);
    let roi_align = RoiAlign::configure(&feature, &rois, 1.0, 2, 2, 1).unwrap();

    let grid = DispatchGrid::new(roi_align.op(), 1, 1);
    assert_eq!(grid.len(), 2);

    let out = roi_align.run(&dev, &feature, &rois).unwrap();
    assert_eq!(out.to_vec(), [1.0, 2.0, 3.0, 4.0]);
}
