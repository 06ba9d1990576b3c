use crate::dtypes::DataType;

/// Represents a number of different errors that can occur from building a
/// kernel, creating tensors, or launching the ROI Align operation. This
/// encompasses both Cpu and WebGPU errors.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Device is out of memory
    OutOfMemory,
    /// Not enough elements were provided when creating a tensor
    WrongNumElements,
    /// The kernel has no implementation for this data type.
    NotImplemented(DataType),
    /// A configuration constant is outside of its valid range.
    InvalidConfig(&'static str),
    /// Two tensors that must share a data type do not.
    DataTypeMismatch { expected: DataType, found: DataType },
    /// A tensor's shape disagrees with the configuration or with another tensor.
    ShapeMismatch {
        expected: [usize; 4],
        found: [usize; 4],
    },
    /// An attribute descriptor addresses words past the end of its buffer.
    AttributesOutOfBounds { required: usize, available: usize },
    /// An attribute descriptor addresses a word past `usize::MAX`.
    AttributesOverflow,
    /// Two distinct output elements alias the same storage location.
    OverlappingAttributes,
    /// A batch indexed ROI names an image other than the single source image.
    RoiBatchIndexOutOfRange { region: usize, index: f32 },
    /// A ROI coordinate is NaN or infinite.
    NonFiniteRoi { region: usize },
    /// A region's bins would average more samples than the kernel allows.
    TooManySamples { region: usize },

    #[cfg(feature = "webgpu")]
    WebgpuAdapterNotFound,

    #[cfg(feature = "webgpu")]
    WebgpuRequestDeviceError(wgpu::RequestDeviceError),

    #[cfg(feature = "webgpu")]
    WebgpuBufferMapError(wgpu::BufferAsyncError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotImplemented(dtype) => {
                write!(f, "RoIAlign for {} Not Implemented", dtype.name())
            }
            _ => write!(f, "{self:?}"),
        }
    }
}

impl std::error::Error for Error {}
