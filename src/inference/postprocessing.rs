use crate::inference::{ClassProbability, InferenceResult};
use crate::models::ModelDescriptor;
use crate::utils::error::BiomedError;
use crate::Result;

/// 结果格式化器
pub struct ResultFormatter;

impl ResultFormatter {
    /// 最大分数的下标；并列时取最小下标，NaN 视为最大值（取第一个 NaN）
    pub fn argmax(scores: &[f32]) -> Option<usize> {
        if scores.is_empty() {
            return None;
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score.is_nan() {
                return Some(i);
            }
            if score > scores[best] {
                best = i;
            }
        }
        Some(best)
    }

    /// 将输出向量与类别标签对齐
    pub fn format_result(
        descriptor: &ModelDescriptor,
        scores: &[f32],
        processing_time: f32,
    ) -> Result<InferenceResult> {
        let num_classes = descriptor.num_classes();
        if scores.len() != num_classes {
            return Err(BiomedError::ShapeMismatch {
                expected: vec![1, num_classes as i64],
                actual: vec![1, scores.len()],
            });
        }

        let predicted_index = Self::argmax(scores).ok_or_else(|| {
            BiomedError::Inference(format!("Model '{}' returned no scores", descriptor.name))
        })?;

        let class_probabilities = descriptor
            .class_labels
            .iter()
            .zip(scores)
            .map(|(label, &probability)| ClassProbability {
                label: label.clone(),
                probability,
            })
            .collect();

        Ok(InferenceResult {
            model: descriptor.name.clone(),
            predicted_label: descriptor.class_labels[predicted_index].clone(),
            predicted_index,
            confidence: scores[predicted_index],
            class_probabilities,
            processing_time,
        })
    }
}
