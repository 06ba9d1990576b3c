mod device;

pub use device::Webgpu;
