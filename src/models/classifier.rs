use crate::config::OnnxConfig;
use crate::models::ModelDescriptor;
use crate::utils::error::BiomedError;
use crate::Result;
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::fmt::Display;
use std::path::Path;

/// 前向推理接口
///
/// 输入为 NHWC `[1, H, W, 3]` 张量，输出为长度等于类别数的分数向量。
/// 实现必须可以跨线程共享。
pub trait Classify: Send + Sync {
    /// 模型声明的输入形状，动态维度为 -1；未知时返回 None
    fn input_shape(&self) -> Option<&[i64]>;

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>>;
}

/// ONNX Runtime 分类模型
///
/// `Session::run` 需要可变引用，同一模型上的推理通过互斥锁串行执行。
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    input_shape: Option<Vec<i64>>,
}

fn load_error(path: &Path, err: impl Display) -> BiomedError {
    BiomedError::ModelLoad(format!("{}: {}", path.display(), err))
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(BiomedError::ModelArtifactMissing(model_path.to_path_buf()));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let level = if onnx_config.enable_optimization {
            GraphOptimizationLevel::Level3
        } else {
            GraphOptimizationLevel::Disable
        };

        let session = Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_optimization_level(level)
            .map_err(|e| load_error(model_path, e))?
            .with_intra_threads(onnx_config.intra_threads)
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| load_error(model_path, "model has no inputs"))?;
        let input_name = input.name.clone();
        let input_shape = input
            .input_type
            .tensor_shape()
            .map(|shape| shape.iter().copied().collect::<Vec<i64>>());

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => return Err(load_error(model_path, "model has no outputs")),
        };

        tracing::info!(
            "Model input: '{}' {:?}, output: '{}'",
            input_name,
            input_shape,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Model output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_shape,
        })
    }
}

impl Classify for OnnxClassifier {
    fn input_shape(&self) -> Option<&[i64]> {
        self.input_shape.as_deref()
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input)?;

        let scores: Vec<f32> = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.iter().copied().collect(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(BiomedError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        Ok(scores)
    }
}

/// 已加载的模型，与其描述绑定
pub struct LoadedModel {
    descriptor: ModelDescriptor,
    classifier: Box<dyn Classify>,
}

impl LoadedModel {
    pub fn new(descriptor: ModelDescriptor, classifier: impl Classify + 'static) -> Self {
        Self {
            descriptor,
            classifier: Box::new(classifier),
        }
    }

    pub fn load(descriptor: ModelDescriptor, onnx_config: &OnnxConfig) -> Result<Self> {
        let classifier = OnnxClassifier::load(&descriptor.artifact_path, onnx_config)?;
        Ok(Self::new(descriptor, classifier))
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn input_shape(&self) -> Option<&[i64]> {
        self.classifier.input_shape()
    }

    pub fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        self.classifier.forward(input)
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.descriptor.name)
            .field("input_shape", &self.input_shape())
            .finish()
    }
}
