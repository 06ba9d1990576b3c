//! Information about the available feature flags
//!
//! # "parallel"
//!
//! **Enabled by default**
//!
//! Spreads the invocations of [crate::tensor::Cpu] over the rayon thread
//! pool. Work is split into chunks of at least one tile, see
//! [crate::tensor_ops::RoiAlignConfig::tile]. Results are bit-identical
//! with and without this feature.
//!
//! # "webgpu"
//!
//! Enables the `Webgpu` device, which runs the operator as a WGSL compute
//! shader with the kernel constants baked into the source.
//!
//! Example:
//! ```toml
//! roi-align = { version = "...", features = ["webgpu"] }
//! ```

#[cfg(not(feature = "parallel"))]
/// How [crate::tensor::Cpu] dispatches invocations. Configure with crate features.
pub const CPU_DISPATCH: &str = "serial";

#[cfg(feature = "parallel")]
/// How [crate::tensor::Cpu] dispatches invocations. Configure with crate features.
pub const CPU_DISPATCH: &str = "rayon";
