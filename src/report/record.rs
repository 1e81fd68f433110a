//! Flat key/value view of a prediction, shared by both exports

use crate::models::ChurnAssessment;
use crate::types::profile::labels;

pub const CHURN_PROBABILITY: &str = "Churn Probability";
pub const STAY_PROBABILITY: &str = "Stay Probability";
pub const PREDICTION: &str = "Prediction";

/// Export keys in column order
pub const RECORD_KEYS: [&str; 13] = [
    labels::CREDIT_SCORE,
    labels::AGE,
    labels::TENURE,
    labels::BALANCE,
    labels::NUM_OF_PRODUCTS,
    labels::HAS_CREDIT_CARD,
    labels::IS_ACTIVE_MEMBER,
    labels::ESTIMATED_SALARY,
    labels::GEOGRAPHY,
    labels::GENDER,
    CHURN_PROBABILITY,
    STAY_PROBABILITY,
    PREDICTION,
];

/// Raw inputs, both probabilities and the verdict as ordered text pairs
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    entries: Vec<(&'static str, String)>,
}

impl ResultRecord {
    pub fn from_assessment(assessment: &ChurnAssessment) -> Self {
        let profile = &assessment.profile;
        let result = &assessment.result;

        let values = [
            profile.credit_score.to_string(),
            profile.age.to_string(),
            profile.tenure.to_string(),
            profile.balance.to_string(),
            profile.num_of_products.to_string(),
            profile.has_credit_card.to_string(),
            profile.is_active_member.to_string(),
            profile.estimated_salary.to_string(),
            profile.geography.to_string(),
            profile.gender.to_string(),
            result.churn_probability.to_string(),
            result.stay_probability().to_string(),
            result.class.to_string(),
        ];

        Self {
            entries: RECORD_KEYS.into_iter().zip(values).collect(),
        }
    }

    pub fn entries(&self) -> &[(&'static str, String)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, value)| value.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feature_extractor::FeatureEncoder;
    use crate::types::prediction::{ChurnClass, PredictionResult, RiskTier};
    use crate::types::profile::{CustomerProfile, Gender, Geography, NumProducts, YesNo};

    pub(crate) fn sample_assessment() -> ChurnAssessment {
        let profile = CustomerProfile {
            credit_score: 650,
            age: 40,
            tenure: 5,
            balance: 75000.5,
            num_of_products: NumProducts::Two,
            has_credit_card: YesNo::Yes,
            is_active_member: YesNo::No,
            estimated_salary: 50000.0,
            geography: Geography::Germany,
            gender: Gender::Female,
        };
        let features = FeatureEncoder::default().encode(&profile).unwrap();
        ChurnAssessment {
            profile,
            features,
            result: PredictionResult {
                class: ChurnClass::Churn,
                churn_probability: 0.75,
            },
            risk_tier: RiskTier::VeryHigh,
        }
    }

    #[test]
    fn test_record_order_and_values() {
        let record = ResultRecord::from_assessment(&sample_assessment());

        assert_eq!(record.len(), 13);
        assert_eq!(record.keys().collect::<Vec<_>>(), RECORD_KEYS.to_vec());
        assert_eq!(record.get("Balance"), Some("75000.5"));
        assert_eq!(record.get("Estimated Salary"), Some("50000"));
        assert_eq!(record.get("Has Credit Card"), Some("Yes"));
        assert_eq!(record.get("Is Active Member"), Some("No"));
        assert_eq!(record.get("Num of Products"), Some("2"));
        assert_eq!(record.get(CHURN_PROBABILITY), Some("0.75"));
        assert_eq!(record.get(STAY_PROBABILITY), Some("0.25"));
        assert_eq!(record.get(PREDICTION), Some("Churn"));
    }
}
