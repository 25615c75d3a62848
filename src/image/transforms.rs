use crate::utils::error::BiomedError;
use crate::Result;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array3;

/// 固定的缩放插值方法（双三次），改变它会改变模型输出
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 缩放到精确尺寸，不保持宽高比
    pub fn resize_exact(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
        if width == 0 || height == 0 {
            return Err(BiomedError::InvalidInput(format!(
                "Invalid target size: {}x{}",
                width, height
            )));
        }

        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }

        Ok(imageops::resize(image, width, height, RESIZE_FILTER))
    }

    /// RGB8 图像转为 HWC 格式的 f32 数组，数值保持 0-255
    pub fn to_array3(image: &RgbImage) -> Result<Array3<f32>> {
        let (width, height) = image.dimensions();
        let array = Array3::from_shape_vec(
            (height as usize, width as usize, 3),
            image.as_raw().iter().map(|&v| v as f32).collect(),
        )
        .map_err(|e| BiomedError::Internal(format!("Failed to build pixel array: {}", e)))?;

        Ok(array)
    }
}
