//! Prediction result data structures

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChurnClass {
    Stay,
    Churn,
}

impl ChurnClass {
    /// Map the classifier's `{0, 1}` label
    pub fn from_label(label: i64) -> Result<Self> {
        match label {
            0 => Ok(ChurnClass::Stay),
            1 => Ok(ChurnClass::Churn),
            other => bail!("Classifier returned unexpected label {}", other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChurnClass::Stay => "Stay",
            ChurnClass::Churn => "Churn",
        }
    }
}

impl fmt::Display for ChurnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one inference call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub class: ChurnClass,
    /// Probability of the churn class, in `[0, 1]`
    pub churn_probability: f64,
}

impl PredictionResult {
    /// Build from the classifier label and its `[stay, churn]` probability pair
    pub fn from_model(label: i64, probabilities: [f64; 2]) -> Result<Self> {
        let class = ChurnClass::from_label(label)?;
        let churn_probability = probabilities[1];
        if !churn_probability.is_finite() {
            bail!("Classifier returned non-finite churn probability");
        }

        Ok(Self {
            class,
            churn_probability: churn_probability.clamp(0.0, 1.0),
        })
    }

    /// Always `1 - churn_probability`
    pub fn stay_probability(&self) -> f64 {
        1.0 - self.churn_probability
    }
}

/// Discrete risk bucket derived from the churn probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    VeryHigh,
}

impl RiskTier {
    /// Pick the tier for a churn probability. Comparisons are strict.
    pub fn from_probability(churn_probability: f64, thresholds: &RiskTierThresholds) -> Self {
        if churn_probability > thresholds.very_high {
            RiskTier::VeryHigh
        } else if churn_probability > thresholds.moderate {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// Retention advice shown under the charts
    pub fn advisory(&self) -> &'static str {
        match self {
            RiskTier::VeryHigh => {
                "Very High Churn Risk! Consider offering special discounts, loyalty rewards, \
                 or personalized engagement."
            }
            RiskTier::Moderate => {
                "Moderate Churn Risk. Stay connected with regular feedback surveys or exclusive offers."
            }
            RiskTier::Low => {
                "Low Churn Risk. Maintain excellent service and keep communication open."
            }
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskTier::Low => "low risk",
            RiskTier::Moderate => "moderate risk",
            RiskTier::VeryHigh => "very high risk",
        })
    }
}

/// Configurable risk tier thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTierThresholds {
    pub very_high: f64,
    pub moderate: f64,
}

impl RiskTierThresholds {
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.very_high) || !in_range(self.moderate) {
            bail!("Risk tier thresholds must lie in [0, 1]");
        }
        if self.moderate > self.very_high {
            bail!(
                "Moderate threshold ({}) must not exceed very high threshold ({})",
                self.moderate,
                self.very_high
            );
        }
        Ok(())
    }
}

impl Default for RiskTierThresholds {
    fn default() -> Self {
        Self {
            very_high: 0.7,
            moderate: 0.4,
        }
    }
}
