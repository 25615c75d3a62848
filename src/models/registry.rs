use crate::config::OnnxConfig;
use crate::models::{LoadedModel, ModelDescriptor};
use crate::utils::error::BiomedError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// 进程级模型注册表，每个模型只加载一次
pub struct ModelRegistry {
    descriptors: Vec<ModelDescriptor>,
    models: HashMap<String, Arc<LoadedModel>>,
    warnings: Vec<LoadWarning>,
}

static MODEL_REGISTRY: OnceCell<Arc<ModelRegistry>> = OnceCell::new();

/// 初始化阶段的非致命警告
#[derive(Debug, Clone, Serialize)]
pub struct LoadWarning {
    pub model: String,
    pub code: &'static str,
    pub message: String,
}

/// 单个模型状态
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    #[serde(flatten)]
    pub descriptor: ModelDescriptor,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<Vec<i64>>,
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub total: usize,
    pub loaded: usize,
    pub models: Vec<ModelStatus>,
    pub warnings: Vec<LoadWarning>,
}

impl ModelRegistry {
    /// 逐个加载模型；缺失或损坏的模型记录警告后跳过
    pub fn initialize(descriptors: Vec<ModelDescriptor>, onnx_config: &OnnxConfig) -> Self {
        tracing::info!("Initializing model registry with {} models...", descriptors.len());

        let mut models = HashMap::with_capacity(descriptors.len());
        let mut warnings = Vec::new();

        for descriptor in &descriptors {
            match LoadedModel::load(descriptor.clone(), onnx_config) {
                Ok(model) => {
                    tracing::info!("Model '{}' loaded successfully", descriptor.name);
                    models.insert(descriptor.name.clone(), Arc::new(model));
                }
                Err(e) => {
                    tracing::warn!("Model '{}' unavailable: {}", descriptor.name, e);
                    warnings.push(LoadWarning {
                        model: descriptor.name.clone(),
                        code: e.error_code(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Model registry initialized: {}/{} models available",
            models.len(),
            descriptors.len()
        );

        Self {
            descriptors,
            models,
            warnings,
        }
    }

    /// 由已构造的模型创建注册表；未出现在 `models` 中的描述视为不可用
    pub fn from_models(descriptors: Vec<ModelDescriptor>, models: Vec<LoadedModel>) -> Self {
        let models = models
            .into_iter()
            .map(|model| (model.name().to_string(), Arc::new(model)))
            .collect::<HashMap<_, _>>();

        let warnings = descriptors
            .iter()
            .filter(|d| !models.contains_key(&d.name))
            .map(|d| LoadWarning {
                model: d.name.clone(),
                code: "MODEL_ARTIFACT_MISSING",
                message: BiomedError::ModelArtifactMissing(d.artifact_path.clone()).to_string(),
            })
            .collect();

        Self {
            descriptors,
            models,
            warnings,
        }
    }

    /// 获取全局注册表；并发首次访问也只初始化一次
    pub fn shared(config: &Config) -> Arc<ModelRegistry> {
        MODEL_REGISTRY
            .get_or_init(|| {
                Arc::new(ModelRegistry::initialize(
                    config.model_descriptors(),
                    &config.onnx_config,
                ))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Result<Arc<LoadedModel>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| BiomedError::ModelUnavailable(name.to_string()))
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.descriptors
    }

    /// 可用模型名称，按目录顺序
    pub fn available(&self) -> Vec<&str> {
        self.descriptors
            .iter()
            .filter(|d| self.models.contains_key(&d.name))
            .map(|d| d.name.as_str())
            .collect()
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> ModelStats {
        let models = self
            .descriptors
            .iter()
            .map(|d| {
                let loaded = self.models.get(&d.name);
                ModelStatus {
                    descriptor: d.clone(),
                    available: loaded.is_some(),
                    input_shape: loaded.and_then(|m| m.input_shape().map(|s| s.to_vec())),
                }
            })
            .collect();

        ModelStats {
            total: self.descriptors.len(),
            loaded: self.models.len(),
            models,
            warnings: self.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classify;
    use ndarray::Array4;
    use std::path::Path;

    struct Fixed(Vec<f32>);

    impl Classify for Fixed {
        fn input_shape(&self) -> Option<&[i64]> {
            None
        }

        fn forward(&self, _input: Array4<f32>) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    fn onnx_config() -> OnnxConfig {
        OnnxConfig {
            intra_threads: 1,
            enable_optimization: false,
        }
    }

    #[test]
    fn test_missing_artifacts_are_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::initialize(ModelDescriptor::catalog(dir.path()), &onnx_config());

        assert!(registry.available().is_empty());
        assert_eq!(registry.warnings().len(), 4);
        assert!(registry
            .warnings()
            .iter()
            .all(|w| w.code == "MODEL_ARTIFACT_MISSING"));
        assert_eq!(registry.descriptors().len(), 4);
    }

    #[test]
    fn test_get_unknown_model() {
        let registry = ModelRegistry::from_models(Vec::new(), Vec::new());
        match registry.get("Blood Cell") {
            Err(BiomedError::ModelUnavailable(name)) => assert_eq!(name, "Blood Cell"),
            other => panic!("expected ModelUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_registry() {
        let catalog = ModelDescriptor::catalog(Path::new("models"));
        let pneumonia = catalog.iter().find(|d| d.name == "Pneumonia").unwrap().clone();
        let registry = ModelRegistry::from_models(
            catalog,
            vec![LoadedModel::new(pneumonia, Fixed(vec![0.2, 0.8]))],
        );

        assert_eq!(registry.available(), vec!["Pneumonia"]);
        assert!(registry.get("Pneumonia").is_ok());
        assert!(registry.get("Brain Tumor").is_err());
        assert_eq!(registry.warnings().len(), 3);

        let stats = registry.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.loaded, 1);
        assert!(stats.models.iter().any(|m| m.descriptor.name == "Pneumonia" && m.available));
    }

    #[test]
    fn test_shared_initializes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.models_dir = dir.path().to_path_buf();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let config = config.clone();
                std::thread::spawn(move || ModelRegistry::shared(&config))
            })
            .collect();
        let registries: Vec<Arc<ModelRegistry>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(registries.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registries[0].descriptors().len(), 4);
    }
}
