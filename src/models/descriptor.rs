use serde::Serialize;
use std::path::{Path, PathBuf};

/// 像素归一化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizationMode {
    /// v / 255，输出 [0, 1]
    ScaleUnit,
    /// MobileNetV2 标准预处理，v / 127.5 - 1，输出 [-1, 1]
    DomainSpecificPreprocess,
}

/// 单个分类模型的不可变配置
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub artifact_path: PathBuf,
    /// (width, height)
    pub input_size: (u32, u32),
    pub normalization_mode: NormalizationMode,
    /// 与模型输出向量下标一一对应
    pub class_labels: Vec<String>,
}

pub const BLOOD_CELL: &str = "Blood Cell";
pub const BRAIN_TUMOR: &str = "Brain Tumor";
pub const LUNG_COLON_CANCER: &str = "Lung & Colon Cancer";
pub const PNEUMONIA: &str = "Pneumonia";

struct CatalogEntry {
    name: &'static str,
    file_name: &'static str,
    input_size: (u32, u32),
    normalization_mode: NormalizationMode,
    class_labels: &'static [&'static str],
}

const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        name: BLOOD_CELL,
        file_name: "blood_cell.onnx",
        input_size: (244, 244),
        normalization_mode: NormalizationMode::DomainSpecificPreprocess,
        class_labels: &["Eosinophil", "Lymphocyte", "Monocyte", "Neutrophil"],
    },
    CatalogEntry {
        name: BRAIN_TUMOR,
        file_name: "brain_tumor.onnx",
        input_size: (150, 150),
        normalization_mode: NormalizationMode::ScaleUnit,
        class_labels: &["Glioma", "No Tumor", "Meningioma", "Pituitary"],
    },
    CatalogEntry {
        name: LUNG_COLON_CANCER,
        file_name: "lung_colon_cancer.onnx",
        input_size: (224, 224),
        normalization_mode: NormalizationMode::ScaleUnit,
        class_labels: &[
            "Lung Benign",
            "Lung Adenocarcinoma",
            "Lung Squamous-Cell Carcinoma",
            "Colon Adenocarcinoma",
            "Colon Benign",
        ],
    },
    CatalogEntry {
        name: PNEUMONIA,
        file_name: "pneumonia.onnx",
        input_size: (244, 244),
        normalization_mode: NormalizationMode::DomainSpecificPreprocess,
        class_labels: &["Normal", "Pneumonia"],
    },
];

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
        input_size: (u32, u32),
        normalization_mode: NormalizationMode,
        class_labels: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact_path: artifact_path.into(),
            input_size,
            normalization_mode,
            class_labels,
        }
    }

    /// 固定的四个模型，模型文件位于 `models_dir` 下
    pub fn catalog(models_dir: &Path) -> Vec<ModelDescriptor> {
        CATALOG
            .iter()
            .map(|entry| ModelDescriptor {
                name: entry.name.to_string(),
                artifact_path: models_dir.join(entry.file_name),
                input_size: entry.input_size,
                normalization_mode: entry.normalization_mode,
                class_labels: entry.class_labels.iter().map(|s| s.to_string()).collect(),
            })
            .collect()
    }

    pub fn num_classes(&self) -> usize {
        self.class_labels.len()
    }

    /// NHWC 输入张量形状 [1, H, W, 3]
    pub fn input_shape(&self) -> [usize; 4] {
        let (width, height) = self.input_size;
        [1, height as usize, width as usize, 3]
    }
}
