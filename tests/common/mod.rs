#![allow(dead_code)]

pub mod onnx;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use onnx_biomed::models::{Classify, LoadedModel, ModelDescriptor, ModelRegistry};
use onnx_biomed::{InferencePipeline, Result};
use parking_lot::Mutex;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// 返回固定分数并记录输入形状的模型
pub struct StubClassifier {
    input_shape: Option<Vec<i64>>,
    scores: Vec<f32>,
    seen_shapes: Arc<Mutex<Vec<Vec<usize>>>>,
}

impl StubClassifier {
    pub fn new(input_shape: Option<Vec<i64>>, scores: Vec<f32>) -> Self {
        Self {
            input_shape,
            scores,
            seen_shapes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 声明与描述一致的 NHWC 输入，batch 维为动态
    pub fn for_descriptor(descriptor: &ModelDescriptor, scores: Vec<f32>) -> Self {
        let (width, height) = descriptor.input_size;
        Self::new(Some(vec![-1, height as i64, width as i64, 3]), scores)
    }

    pub fn seen_shapes(&self) -> Arc<Mutex<Vec<Vec<usize>>>> {
        Arc::clone(&self.seen_shapes)
    }
}

impl Classify for StubClassifier {
    fn input_shape(&self) -> Option<&[i64]> {
        self.input_shape.as_deref()
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        self.seen_shapes.lock().push(input.shape().to_vec());
        Ok(self.scores.clone())
    }
}

pub fn catalog() -> Vec<ModelDescriptor> {
    ModelDescriptor::catalog(Path::new("models"))
}

pub fn descriptor(name: &str) -> ModelDescriptor {
    catalog().into_iter().find(|d| d.name == name).unwrap()
}

/// 每个模型都加载，输出为均匀分布
pub fn full_registry() -> Arc<ModelRegistry> {
    let catalog = catalog();
    let models = catalog
        .iter()
        .map(|d| {
            let n = d.num_classes();
            LoadedModel::new(d.clone(), StubClassifier::for_descriptor(d, vec![1.0 / n as f32; n]))
        })
        .collect();
    Arc::new(ModelRegistry::from_models(catalog, models))
}

pub fn pipeline_with(models: Vec<LoadedModel>) -> InferencePipeline {
    InferencePipeline::new(Arc::new(ModelRegistry::from_models(catalog(), models)))
}

pub fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    encode(&image, ImageFormat::Png)
}
