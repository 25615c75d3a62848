use crate::image::ImageTransforms;
use crate::models::{ModelDescriptor, NormalizationMode};
use crate::Result;
use image::RgbImage;
use ndarray::{Array3, Array4, Axis};

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 分类预处理流水线：缩放 -> 归一化 -> 添加batch维度
    pub fn preprocess_for_model(image: &RgbImage, descriptor: &ModelDescriptor) -> Result<Array4<f32>> {
        let (width, height) = descriptor.input_size;

        let resized = ImageTransforms::resize_exact(image, width, height)?;
        let pixels = ImageTransforms::to_array3(&resized)?;
        let normalized = Self::normalize(pixels, descriptor.normalization_mode);

        Ok(Self::batch(normalized))
    }

    /// 按模型的归一化方式处理 0-255 像素值
    pub fn normalize(mut pixels: Array3<f32>, mode: NormalizationMode) -> Array3<f32> {
        match mode {
            NormalizationMode::ScaleUnit => pixels.mapv_inplace(|v| v / 255.0),
            // keras.applications.mobilenet_v2.preprocess_input
            NormalizationMode::DomainSpecificPreprocess => pixels.mapv_inplace(|v| v / 127.5 - 1.0),
        }
        pixels
    }

    /// HWC -> NHWC，batch 大小为 1
    pub fn batch(pixels: Array3<f32>) -> Array4<f32> {
        pixels.insert_axis(Axis(0))
    }
}
