use crate::utils::error::BiomedError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};

/// 默认单张图片上限
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 20 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像，允许 data URL 前缀 (data:image/xxx;base64,)
    pub fn from_base64(base64_data: &str, max_size: usize) -> Result<RgbImage> {
        let base64_clean = match base64_data.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => base64_data,
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        Self::from_bytes(&image_bytes, max_size)
    }

    /// 从字节解码为RGB图像，丢弃alpha通道
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<RgbImage> {
        if bytes.len() > max_size {
            return Err(BiomedError::FileTooLarge(bytes.len(), max_size));
        }

        let format = Self::detect_format(bytes).ok_or_else(|| {
            BiomedError::ImageDecode(format!("unrecognized image data ({} bytes)", bytes.len()))
        })?;

        if !Self::is_supported_format(format) {
            return Err(BiomedError::UnsupportedFormat(format!("{:?}", format)));
        }

        let image = image::load_from_memory_with_format(bytes, format)?;
        tracing::debug!(
            "Decoded {:?} image: {}x{}",
            format,
            image.width(),
            image.height()
        );

        Ok(Self::to_rgb(image))
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 仅接受 JPEG 与 PNG
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    pub fn to_rgb(image: DynamicImage) -> RgbImage {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        }
    }
}
