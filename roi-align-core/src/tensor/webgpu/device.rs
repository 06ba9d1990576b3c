use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Adapter, Buffer, BufferDescriptor, BufferUsages, ComputePipeline, Device, Instance,
    InstanceDescriptor, Maintain, MapMode, Queue, RequestDeviceError,
};

use crate::{
    dtypes::DataType,
    tensor::{cpu::Cpu, Error, Index4, RoiList, Tensor},
};

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// A device that runs ROI Align as a WGSL compute shader. Host side tensors
/// are uploaded for each launch and the output is read back into them.
#[derive(Clone, Debug)]
pub struct Webgpu {
    pub(crate) cpu: Cpu,
    #[allow(unused)]
    pub(crate) instance: Arc<Instance>,
    #[allow(unused)]
    pub(crate) adapter: Arc<Adapter>,
    pub(crate) dev: Arc<Device>,
    pub(crate) queue: Arc<Queue>,

    /// Compiled pipelines keyed by their generated shader source.
    pub(crate) pipelines: Arc<RwLock<HashMap<String, Arc<ComputePipeline>>>>,
}

impl From<RequestDeviceError> for Error {
    fn from(e: RequestDeviceError) -> Self {
        Error::WebgpuRequestDeviceError(e)
    }
}

impl From<wgpu::BufferAsyncError> for Error {
    fn from(e: wgpu::BufferAsyncError) -> Self {
        Error::WebgpuBufferMapError(e)
    }
}

impl Default for Webgpu {
    fn default() -> Self {
        Self::seed_from_u64(0)
    }
}

impl Webgpu {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::try_build(seed).unwrap()
    }

    pub fn try_build(seed: u64) -> Result<Self, Error> {
        let cpu = Cpu::seed_from_u64(seed);
        let instance = Arc::new(Instance::new(InstanceDescriptor::default()));
        let adapter = futures_lite::future::block_on(instance.request_adapter(&Default::default()))
            .ok_or(Error::WebgpuAdapterNotFound)?;
        let info = adapter.get_info();
        log::debug!("webgpu adapter: {} ({:?})", info.name, info.backend);
        let adapter = Arc::new(adapter);
        let (dev, queue) =
            futures_lite::future::block_on(adapter.request_device(&Default::default(), None))?;

        Ok(Self {
            cpu,
            instance,
            adapter,
            dev: Arc::new(dev),
            queue: Arc::new(queue),
            pipelines: Default::default(),
        })
    }

    /// See [Cpu::try_sample_uniform].
    pub fn try_sample_uniform(
        &self,
        shape: Index4,
        dtype: DataType,
        low: f32,
        high: f32,
    ) -> Result<Tensor, Error> {
        self.cpu.try_sample_uniform(shape, dtype, low, high)
    }

    pub fn sample_uniform(&self, shape: Index4, dtype: DataType, low: f32, high: f32) -> Tensor {
        self.cpu.sample_uniform(shape, dtype, low, high)
    }

    /// See [Cpu::try_sample_rois].
    pub fn try_sample_rois(
        &self,
        n: usize,
        width: usize,
        height: usize,
        dtype: DataType,
    ) -> Result<RoiList, Error> {
        self.cpu.try_sample_rois(n, width, height, dtype)
    }

    pub fn sample_rois(&self, n: usize, width: usize, height: usize, dtype: DataType) -> RoiList {
        self.cpu.sample_rois(n, width, height, dtype)
    }
}

impl Webgpu {
    pub(crate) fn upload(&self, words: &[u32], usage: BufferUsages) -> Buffer {
        self.dev.create_buffer_init(&BufferInitDescriptor {
            label: None,
            contents: bytemuck::cast_slice(words),
            usage,
        })
    }

    /// Reads the first `len` words of `buffer` back to the host.
    pub(crate) fn download(&self, buffer: &Buffer, len: usize) -> Result<Vec<u32>, Error> {
        let size = (len * std::mem::size_of::<u32>()) as u64;
        let staging = self.dev.create_buffer(&BufferDescriptor {
            label: None,
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self.dev.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        let slice = staging.slice(..);
        slice.map_async(MapMode::Read, move |res| {
            let _ = sender.send(res);
        });
        self.dev.poll(Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| Error::WebgpuBufferMapError(wgpu::BufferAsyncError))??;

        let words = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, u32>(&data[..]).to_vec()
        };
        staging.unmap();
        Ok(words)
    }

    /// Compiles `source` once per device and returns the cached pipeline
    /// afterwards.
    pub(crate) fn pipeline(&self, source: String) -> Arc<ComputePipeline> {
        if let Some(pipeline) = self.pipelines.read().unwrap().get(&source) {
            return pipeline.clone();
        }
        log::debug!("compiling roi_align shader ({} bytes)", source.len());
        let module = self.dev.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("roi_align"),
            source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
        });
        let pipeline = Arc::new(self.dev.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some("roi_align"),
                layout: None,
                module: &module,
                entry_point: "main",
            },
        ));
        self.pipelines
            .write()
            .unwrap()
            .insert(source, pipeline.clone());
        pipeline
    }
}
