//! Feature encoding for churn model inference.
//!
//! Converts a customer profile into the numeric vector the classifier was
//! trained on. Values are placed by name through `FeatureSchema`, whose
//! column order is the training order.

use crate::error::ValidationError;
use crate::types::profile::{CustomerProfile, Gender, Geography, ProfileForm};
use anyhow::{bail, Result};

pub use crate::types::profile::labels::{
    AGE, BALANCE, CREDIT_SCORE, ESTIMATED_SALARY, HAS_CREDIT_CARD, IS_ACTIVE_MEMBER,
    NUM_OF_PRODUCTS, TENURE,
};
pub const GEO_FRANCE: &str = "Geo: France";
pub const GEO_GERMANY: &str = "Geo: Germany";
pub const GENDER_FEMALE: &str = "Gender: Female";

/// Column order the churn classifier was trained with
pub const CHURN_FEATURES: [&str; 11] = [
    CREDIT_SCORE,
    AGE,
    TENURE,
    BALANCE,
    NUM_OF_PRODUCTS,
    HAS_CREDIT_CARD,
    IS_ACTIVE_MEMBER,
    ESTIMATED_SALARY,
    GEO_FRANCE,
    GEO_GERMANY,
    GENDER_FEMALE,
];

/// Fixed "average customer" used only for the comparison chart, in schema order
pub const REFERENCE_AVERAGES: [f64; 11] = [
    600.0, 35.0, 3.0, 50000.0, 2.0, 1.0, 1.0, 60000.0, 0.0, 0.0, 0.0,
];

/// Named-field-to-index schema shared by encoding and model validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<&'static str>,
}

impl FeatureSchema {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            names: names.to_vec(),
        }
    }

    /// The 11-column churn schema
    pub fn churn() -> Self {
        Self::new(&CHURN_FEATURES)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|&n| n == name)
    }

    /// Place named values at their schema index.
    ///
    /// Every column must be assigned exactly once.
    pub fn assemble(&self, named: &[(&str, f32)]) -> Result<FeatureVector> {
        let mut slots: Vec<Option<f32>> = vec![None; self.len()];

        for &(name, value) in named {
            let Some(index) = self.index_of(name) else {
                bail!("Feature '{}' is not part of the schema", name);
            };
            if slots[index].replace(value).is_some() {
                bail!("Feature '{}' assigned twice", name);
            }
        }

        let values = slots
            .into_iter()
            .zip(&self.names)
            .map(|(slot, name)| {
                slot.ok_or_else(|| anyhow::anyhow!("Feature '{}' was not assigned", name))
            })
            .collect::<Result<Vec<f32>>>()?;

        Ok(FeatureVector(values))
    }

    /// Check a model's declared input width against the schema
    pub fn check_width(&self, width: usize) -> Result<()> {
        if width != self.len() {
            bail!(
                "Model expects {} features but the schema defines {}",
                width,
                self.len()
            );
        }
        Ok(())
    }

    /// Check column names carried by a model artifact against the schema
    pub fn check_names<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.check_width(names.len())?;
        for (index, (expected, actual)) in self.names.iter().zip(names).enumerate() {
            if *expected != actual.as_ref().trim() {
                bail!(
                    "Feature {} is '{}' in the model but '{}' in the schema",
                    index,
                    actual.as_ref(),
                    expected
                );
            }
        }
        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::churn()
    }
}

/// Encoded model input, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values widened to `f64` for display and charting
    pub fn to_f64(&self) -> Vec<f64> {
        self.0.iter().map(|&v| v as f64).collect()
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Validates submitted forms and encodes complete profiles
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Require every field of the form to be set
    pub fn validate(&self, form: &ProfileForm) -> Result<CustomerProfile, ValidationError> {
        let missing = form.missing_fields();

        match (
            form.credit_score,
            form.age,
            form.tenure,
            form.balance,
            form.num_of_products,
            form.has_credit_card,
            form.is_active_member,
            form.estimated_salary,
            form.geography,
            form.gender,
        ) {
            (
                Some(credit_score),
                Some(age),
                Some(tenure),
                Some(balance),
                Some(num_of_products),
                Some(has_credit_card),
                Some(is_active_member),
                Some(estimated_salary),
                Some(geography),
                Some(gender),
            ) => Ok(CustomerProfile {
                credit_score,
                age,
                tenure,
                balance,
                num_of_products,
                has_credit_card,
                is_active_member,
                estimated_salary,
                geography,
                gender,
            }),
            _ => Err(ValidationError::IncompleteInput { missing }),
        }
    }

    /// Encode a complete profile.
    ///
    /// Geography expands to France/Germany indicators (Spain is both zero),
    /// gender to a single Female indicator, Yes/No answers to 1/0.
    pub fn encode(&self, profile: &CustomerProfile) -> Result<FeatureVector> {
        self.schema.assemble(&[
            (CREDIT_SCORE, profile.credit_score as f32),
            (AGE, profile.age as f32),
            (TENURE, profile.tenure as f32),
            (BALANCE, profile.balance as f32),
            (NUM_OF_PRODUCTS, profile.num_of_products.count() as f32),
            (HAS_CREDIT_CARD, flag(profile.has_credit_card.as_flag())),
            (IS_ACTIVE_MEMBER, flag(profile.is_active_member.as_flag())),
            (ESTIMATED_SALARY, profile.estimated_salary as f32),
            (GEO_FRANCE, flag(profile.geography == Geography::France)),
            (GEO_GERMANY, flag(profile.geography == Geography::Germany)),
            (GENDER_FEMALE, flag(profile.gender == Gender::Female)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{NumProducts, YesNo};

    fn sample_profile() -> CustomerProfile {
        CustomerProfile {
            credit_score: 650,
            age: 40,
            tenure: 5,
            balance: 75000.0,
            num_of_products: NumProducts::Two,
            has_credit_card: YesNo::Yes,
            is_active_member: YesNo::Yes,
            estimated_salary: 50000.0,
            geography: Geography::Germany,
            gender: Gender::Female,
        }
    }

    #[test]
    fn test_numeric_feature_names_match_export_keys() {
        use crate::report::record::RECORD_KEYS;

        assert_eq!(CHURN_FEATURES[..8], RECORD_KEYS[..8]);
        assert_eq!(CHURN_FEATURES[0], crate::types::profile::labels::CREDIT_SCORE);
    }

    #[test]
    fn test_feature_encoding() {
        let encoder = FeatureEncoder::default();
        let features = encoder.encode(&sample_profile()).unwrap();

        assert_eq!(features.len(), 11);
        assert_eq!(
            features.as_slice(),
            &[650.0, 40.0, 5.0, 75000.0, 2.0, 1.0, 1.0, 50000.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_one_hot_geography() {
        let encoder = FeatureEncoder::default();
        let mut profile = sample_profile();

        for (geography, expected) in [
            (Geography::France, [1.0f32, 0.0]),
            (Geography::Germany, [0.0, 1.0]),
            (Geography::Spain, [0.0, 0.0]),
        ] {
            profile.geography = geography;
            let features = encoder.encode(&profile).unwrap();
            assert_eq!(&features.as_slice()[8..10], &expected);
        }

        profile.gender = Gender::Male;
        profile.has_credit_card = YesNo::No;
        let features = encoder.encode(&profile).unwrap();
        assert_eq!(features.as_slice()[10], 0.0);
        assert_eq!(features.as_slice()[5], 0.0);
    }

    #[test]
    fn test_validate_reports_missing() {
        let encoder = FeatureEncoder::default();
        let mut form = ProfileForm::from(&sample_profile());
        assert!(encoder.validate(&form).is_ok());

        form.balance = None;
        form.gender = None;
        let err = encoder.validate(&form).unwrap_err();
        assert_eq!(err.missing_fields(), &["Balance", "Gender"]);
    }

    #[test]
    fn test_schema_order_and_lookup() {
        let schema = FeatureSchema::churn();
        assert_eq!(schema.len(), 11);
        assert_eq!(schema.index_of(GEO_GERMANY), Some(9));
        assert_eq!(schema.index_of("Geo: Spain"), None);
        assert_eq!(REFERENCE_AVERAGES.len(), schema.len());
    }

    #[test]
    fn test_assemble_rejects_gaps_and_duplicates() {
        let schema = FeatureSchema::new(&["a", "b"]);
        assert!(schema.assemble(&[("a", 1.0)]).is_err());
        assert!(schema.assemble(&[("a", 1.0), ("a", 2.0)]).is_err());
        assert!(schema.assemble(&[("a", 1.0), ("c", 2.0)]).is_err());

        let vector = schema.assemble(&[("b", 2.0), ("a", 1.0)]).unwrap();
        assert_eq!(vector.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_check_width_and_names() {
        let schema = FeatureSchema::churn();
        assert!(schema.check_width(11).is_ok());
        assert!(schema.check_width(12).is_err());

        let names: Vec<String> = CHURN_FEATURES.iter().map(|s| s.to_string()).collect();
        assert!(schema.check_names(&names).is_ok());

        let mut swapped = names.clone();
        swapped.swap(8, 9);
        assert!(schema.check_names(&swapped).is_err());
    }
}
