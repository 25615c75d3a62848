pub mod pipeline;
pub mod postprocessing;
pub mod types;

pub use pipeline::InferencePipeline;
pub use postprocessing::ResultFormatter;
pub use types::{ClassProbability, InferenceRequest, InferenceResult};
