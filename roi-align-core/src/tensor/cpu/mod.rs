mod device;

pub use device::Cpu;
