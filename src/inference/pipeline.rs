use crate::{
    image::{loader::DEFAULT_MAX_IMAGE_SIZE, ImageLoader, ImagePreprocessor},
    inference::{InferenceRequest, InferenceResult, ResultFormatter},
    models::{LoadedModel, ModelRegistry},
    utils::error::BiomedError,
    Result,
};
use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;

/// 分类推理流水线
///
/// 不持有可变状态，可以在多个线程间克隆共享。
#[derive(Clone)]
pub struct InferencePipeline {
    registry: Arc<ModelRegistry>,
    max_image_size: usize,
}

impl InferencePipeline {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }

    pub fn with_max_image_size(mut self, max_image_size: usize) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// 处理原始图像字节
    pub fn infer(&self, model_name: &str, bytes: &[u8]) -> Result<InferenceResult> {
        let start_time = Instant::now();
        let model = self.registry.get(model_name)?;
        let image = ImageLoader::from_bytes(bytes, self.max_image_size)?;

        Self::run(&model, &image, start_time)
    }

    pub fn infer_request(&self, request: &InferenceRequest) -> Result<InferenceResult> {
        self.infer(&request.model_name, &request.image)
    }

    /// 处理base64图像
    pub fn infer_base64(&self, model_name: &str, base64_data: &str) -> Result<InferenceResult> {
        let start_time = Instant::now();
        let model = self.registry.get(model_name)?;
        let image = ImageLoader::from_base64(base64_data, self.max_image_size)?;

        Self::run(&model, &image, start_time)
    }

    /// 没有上传文件时不做推理，返回 None
    pub fn infer_upload(&self, model_name: &str, upload: Option<&[u8]>) -> Result<Option<InferenceResult>> {
        match upload {
            Some(bytes) => self.infer(model_name, bytes).map(Some),
            None => {
                tracing::debug!("No image uploaded for '{}', skipping inference", model_name);
                Ok(None)
            }
        }
    }

    /// 核心流水线
    fn run(model: &LoadedModel, image: &RgbImage, start_time: Instant) -> Result<InferenceResult> {
        let descriptor = model.descriptor();

        let input = ImagePreprocessor::preprocess_for_model(image, descriptor)?;
        Self::check_input_shape(model.input_shape(), input.shape())?;

        tracing::debug!(
            "Running '{}' on input {:?} ({:?})",
            descriptor.name,
            input.shape(),
            descriptor.normalization_mode
        );

        let inference_start = Instant::now();
        let scores = model.forward(input)?;
        let inference_time = inference_start.elapsed();

        let result = ResultFormatter::format_result(
            descriptor,
            &scores,
            start_time.elapsed().as_secs_f32(),
        )?;

        tracing::info!(
            "Inference completed: model={}, label={}, confidence={:.3}, forward={:.3}s, total={:.3}s",
            descriptor.name,
            result.predicted_label,
            result.confidence,
            inference_time.as_secs_f32(),
            result.processing_time
        );

        Ok(result)
    }

    /// 对比模型声明的输入形状，动态维度 (<0) 匹配任意大小
    pub fn check_input_shape(expected: Option<&[i64]>, actual: &[usize]) -> Result<()> {
        let Some(expected) = expected else {
            return Ok(());
        };

        let matches = expected.len() == actual.len()
            && expected
                .iter()
                .zip(actual)
                .all(|(&e, &a)| e < 0 || e as usize == a);

        if matches {
            Ok(())
        } else {
            Err(BiomedError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            })
        }
    }
}
