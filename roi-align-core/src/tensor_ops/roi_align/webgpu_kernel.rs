use super::{DispatchGrid, RoiAlignKernel, RoiAlignOp, RoiBoxPolicy};
use crate::tensor::{Error, RoiList, Tensor, Webgpu};

use wgpu::BufferUsages;

const SHADER: &str = include_str!("roi_align.wgsl");

impl RoiAlignOp {
    /// WGSL source with this kernel's constants baked in.
    pub(crate) fn wgsl(&self, rois: &RoiList) -> String {
        let cfg = &self.config;
        let format = rois.format();
        let first_corner = format.row_len() - 4;
        let [tx, ty, tz] = cfg.tile;
        SHADER
            .replace("$POOLED_W", &cfg.pooled_width.to_string())
            .replace("$POOLED_H", &cfg.pooled_height.to_string())
            .replace("$SAMPLING_RATIO", &cfg.sampling_ratio.to_string())
            .replace("$SPATIAL_SCALE", &format!("{:?}", cfg.spatial_scale))
            .replace("$SOURCE_W", &cfg.source_width.to_string())
            .replace("$SOURCE_H", &cfg.source_height.to_string())
            .replace("$ROI_ROW", &format.row_len().to_string())
            .replace("$FIRST_CORNER", &first_corner.to_string())
            .replace("$UNIT_BOX", &(cfg.roi_box == RoiBoxPolicy::UnitBox).to_string())
            .replace("$TILE_X", &tx.to_string())
            .replace("$TILE_Y", &ty.to_string())
            .replace("$TILE_Z", &tz.to_string())
    }
}

/// Shader addressing is 32-bit.
fn to_word(v: usize) -> Result<u32, Error> {
    u32::try_from(v).map_err(|_| Error::InvalidConfig("tensor exceeds 32-bit addressing"))
}

fn push_attrs(params: &mut Vec<u32>, tensor: &Tensor, axes: usize) -> Result<(), Error> {
    let attrs = tensor.attrs();
    // every word the shader can form stays below this
    to_word(attrs.required_words(tensor.shape())?)?;
    params.push(to_word(attrs.offset)?);
    for &s in &attrs.strides[..axes] {
        params.push(to_word(s)?);
    }
    Ok(())
}

impl RoiAlignKernel for Webgpu {
    fn forward(
        &self,
        op: &RoiAlignOp,
        feature: &Tensor,
        rois: &RoiList,
        out: &mut Tensor,
    ) -> Result<(), Error> {
        op.validate(feature, rois, out)?;

        let grid = DispatchGrid::new(op, feature.channels(), rois.num_rois());
        if grid.is_empty() {
            return Ok(());
        }

        let limits = self.dev.limits();
        if op.tile_len() > limits.max_compute_invocations_per_workgroup as usize {
            return Err(Error::InvalidConfig("tile exceeds the device work group size"));
        }
        let tile = op.config.tile;
        let mut groups = [0u32; 3];
        for (axis, extent) in grid.extent().into_iter().enumerate() {
            let n = (extent + tile[axis] - 1) / tile[axis];
            if n > limits.max_compute_workgroups_per_dimension as usize {
                return Err(Error::InvalidConfig("launch exceeds the device work group count"));
            }
            groups[axis] = n as u32;
        }

        let mut params = Vec::with_capacity(15);
        push_attrs(&mut params, feature, 4)?;
        push_attrs(&mut params, rois.tensor(), 1)?;
        push_attrs(&mut params, out, 4)?;
        for v in [grid.channels, grid.regions, grid.words_per_row()] {
            params.push(to_word(v)?);
        }

        let src = self.upload(feature.data().words(), BufferUsages::STORAGE);
        let roi_buf = self.upload(rois.tensor().data().words(), BufferUsages::STORAGE);
        let dst = self.upload(
            out.data().words(),
            BufferUsages::STORAGE | BufferUsages::COPY_SRC,
        );
        let params = self.upload(&params, BufferUsages::STORAGE);

        let pipeline = self.pipeline(op.wgsl(rois));
        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.dev.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: src.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: roi_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dst.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params.as_entire_binding(),
                },
            ],
        });

        log::trace!(
            "roi_align on webgpu: {} invocations in {:?} work groups of {:?}",
            grid.len(),
            groups,
            tile
        );
        let mut encoder = self
            .dev
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: None,
                timestamp_writes: None,
            });
            cpass.set_pipeline(&pipeline);
            cpass.set_bind_group(0, &bind_group, &[]);
            cpass.dispatch_workgroups(groups[0], groups[1], groups[2]);
        }
        self.queue.submit(Some(encoder.finish()));

        let words = self.download(&dst, out.data().len())?;
        out.data.words_mut().copy_from_slice(&words);
        Ok(())
    }
}
