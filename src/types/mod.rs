//! Type definitions for the churn predictor

pub mod prediction;
pub mod profile;

pub use prediction::{ChurnClass, PredictionResult, RiskTier, RiskTierThresholds};
pub use profile::{CustomerProfile, Gender, Geography, NumProducts, ProfileForm, YesNo};
