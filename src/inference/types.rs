use serde::{Deserialize, Serialize};

/// 单次推理请求
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model_name: String,
    /// 上传的原始图像字节（JPEG/PNG）
    pub image: Vec<u8>,
}

impl InferenceRequest {
    pub fn new(model_name: impl Into<String>, image: impl Into<Vec<u8>>) -> Self {
        Self {
            model_name: model_name.into(),
            image: image.into(),
        }
    }
}

/// 单个类别的概率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f32,
}

/// 推理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    /// 模型名称
    pub model: String,
    /// 预测标签
    pub predicted_label: String,
    /// 预测类别下标
    pub predicted_index: usize,
    /// 预测类别的分数
    pub confidence: f32,
    /// 与模型的 class_labels 顺序一致
    pub class_probabilities: Vec<ClassProbability>,
    /// 处理耗时（秒）
    pub processing_time: f32,
}

impl InferenceResult {
    pub fn probability(&self, label: &str) -> Option<f32> {
        self.class_probabilities
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.probability)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.class_probabilities.iter().map(|p| p.label.as_str())
    }
}
