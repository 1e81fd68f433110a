//! Churn classifier loading and inference

pub mod inference;
pub mod loader;

pub use inference::{ChurnAssessment, Classifier, OnnxClassifier, Predictor};
pub use loader::ModelLoader;
