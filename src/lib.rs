//! Customer Churn Predictor Library
//!
//! Collects a bank customer's profile through a web form, encodes it into the
//! classifier's 11-feature layout, runs a pre-trained ONNX model and presents
//! the verdict with charts, a retention advisory and CSV/PDF downloads.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod presentation;
pub mod report;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{PredictError, ValidationError};
pub use feature_extractor::{FeatureEncoder, FeatureSchema, FeatureVector};
pub use models::{ChurnAssessment, Classifier, ModelLoader, OnnxClassifier, Predictor};
pub use report::ResultRecord;
pub use server::AppState;
pub use types::{CustomerProfile, PredictionResult, ProfileForm, RiskTier};
