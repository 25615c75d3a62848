pub mod descriptor;
pub mod classifier;
pub mod registry;

pub use descriptor::{ModelDescriptor, NormalizationMode};
pub use classifier::{Classify, LoadedModel, OnnxClassifier};
pub use registry::{LoadWarning, ModelRegistry, ModelStats, ModelStatus};
