use crate::dtypes::DataType;

use super::{Error, Tensor};

/// How each region is laid out inside a [RoiList].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RoiFormat {
    /// `(start_x, start_y, end_x, end_y)`
    #[default]
    Corners,
    /// `(batch_index, start_x, start_y, end_x, end_y)`
    BatchIndexed,
}

impl RoiFormat {
    /// Number of elements per region.
    pub const fn row_len(&self) -> usize {
        match self {
            RoiFormat::Corners => 4,
            RoiFormat::BatchIndexed => 5,
        }
    }

    /// Position of `start_x` within a row.
    const fn first_corner(&self) -> usize {
        match self {
            RoiFormat::Corners => 0,
            RoiFormat::BatchIndexed => 1,
        }
    }
}

/// A read-only list of regions in pre-scale coordinates, stored as a packed
/// 1-D vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiList {
    pub(crate) data: Tensor,
    pub(crate) format: RoiFormat,
}

impl RoiList {
    /// Packs `boxes` as `(start_x, start_y, end_x, end_y)` rows.
    pub fn try_from_boxes(dtype: DataType, boxes: &[[f32; 4]]) -> Result<Self, Error> {
        let flat: Vec<f32> = boxes.iter().flatten().copied().collect();
        let data = Tensor::try_from_slice([flat.len(), 1, 1, 1], dtype, &flat)?;
        Ok(Self {
            data,
            format: RoiFormat::Corners,
        })
    }

    /// Packs `rows` as `(batch_index, start_x, start_y, end_x, end_y)`.
    pub fn try_from_indexed(dtype: DataType, rows: &[[f32; 5]]) -> Result<Self, Error> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let data = Tensor::try_from_slice([flat.len(), 1, 1, 1], dtype, &flat)?;
        Ok(Self {
            data,
            format: RoiFormat::BatchIndexed,
        })
    }

    /// Interprets a 1-D tensor as a list of regions.
    pub fn try_from_tensor(data: Tensor, format: RoiFormat) -> Result<Self, Error> {
        let [len, y, z, w] = data.shape();
        if y * z * w != 1 || len % format.row_len() != 0 {
            return Err(Error::WrongNumElements);
        }
        Ok(Self { data, format })
    }

    pub fn boxes(boxes: &[[f32; 4]]) -> Self {
        Self::try_from_boxes(DataType::F16, boxes).unwrap()
    }

    #[inline]
    pub fn num_rois(&self) -> usize {
        self.data.width() / self.format.row_len()
    }

    #[inline]
    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    #[inline]
    pub fn format(&self) -> RoiFormat {
        self.format
    }

    /// The backing vector.
    pub fn tensor(&self) -> &Tensor {
        &self.data
    }

    /// Loads the four corners of `region` through the vector's descriptor.
    #[inline]
    pub fn corners(&self, region: usize) -> [f32; 4] {
        let base = region * self.format.row_len() + self.format.first_corner();
        [0, 1, 2, 3].map(|k| self.data.get([base + k, 0, 0, 0]))
    }

    /// The batch index of `region`, if the format carries one.
    pub fn batch_index(&self, region: usize) -> Option<f32> {
        match self.format {
            RoiFormat::Corners => None,
            RoiFormat::BatchIndexed => {
                Some(self.data.get([region * self.format.row_len(), 0, 0, 0]))
            }
        }
    }

    /// Pre-dispatch checks: every batch index names image `0` and every
    /// coordinate is finite.
    pub fn validate(&self) -> Result<(), Error> {
        for region in 0..self.num_rois() {
            if let Some(index) = self.batch_index(region) {
                if index != 0.0 {
                    return Err(Error::RoiBatchIndexOutOfRange { region, index });
                }
            }
            if self.corners(region).iter().any(|c| !c.is_finite()) {
                return Err(Error::NonFiniteRoi { region });
            }
        }
        Ok(())
    }
}
