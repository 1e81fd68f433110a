//! Customer profile data structures

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Form field labels, shared by the page, the validation message and the reports
pub mod labels {
    pub const CREDIT_SCORE: &str = "Credit Score";
    pub const AGE: &str = "Age";
    pub const TENURE: &str = "Tenure";
    pub const BALANCE: &str = "Balance";
    pub const NUM_OF_PRODUCTS: &str = "Num of Products";
    pub const HAS_CREDIT_CARD: &str = "Has Credit Card";
    pub const IS_ACTIVE_MEMBER: &str = "Is Active Member";
    pub const ESTIMATED_SALARY: &str = "Estimated Salary";
    pub const GEOGRAPHY: &str = "Geography";
    pub const GENDER: &str = "Gender";
}

/// Error returned when a selector value is not one of its options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown option: {0}")]
pub struct UnknownOption(pub String);

/// Declares a single-choice selector enum with its display text
macro_rules! selector {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All options in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Text shown in the selector and written to reports
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownOption(other.to_string())),
                }
            }
        }
    };
}

selector!(
    /// Customer country
    Geography {
        France => "France",
        Germany => "Germany",
        Spain => "Spain",
    }
);

selector!(
    /// Customer gender
    Gender {
        Female => "Female",
        Male => "Male",
    }
);

selector!(
    /// Yes/No selector answer
    YesNo {
        Yes => "Yes",
        No => "No",
    }
);

selector!(
    /// Number of bank products held
    NumProducts {
        One => "1",
        Two => "2",
        Three => "3",
        Four => "4",
    }
);

impl YesNo {
    pub fn as_flag(&self) -> bool {
        matches!(self, YesNo::Yes)
    }
}

impl NumProducts {
    pub fn count(&self) -> u8 {
        match self {
            NumProducts::One => 1,
            NumProducts::Two => 2,
            NumProducts::Three => 3,
            NumProducts::Four => 4,
        }
    }
}

/// Current values of the input form. Every field starts unset.
///
/// Deserializes from a urlencoded form or query string; blank or
/// unparsable values are treated as unset, as are non-integral values
/// in the whole-number fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    #[serde(deserialize_with = "whole_or_none")]
    pub credit_score: Option<u32>,
    #[serde(deserialize_with = "whole_or_none")]
    pub age: Option<u32>,
    #[serde(deserialize_with = "whole_or_none")]
    pub tenure: Option<u32>,
    #[serde(deserialize_with = "finite_or_none")]
    pub balance: Option<f64>,
    #[serde(deserialize_with = "parsed_or_none")]
    pub num_of_products: Option<NumProducts>,
    #[serde(deserialize_with = "parsed_or_none")]
    pub has_credit_card: Option<YesNo>,
    #[serde(deserialize_with = "parsed_or_none")]
    pub is_active_member: Option<YesNo>,
    #[serde(deserialize_with = "finite_or_none")]
    pub estimated_salary: Option<f64>,
    #[serde(deserialize_with = "parsed_or_none")]
    pub geography: Option<Geography>,
    #[serde(deserialize_with = "parsed_or_none")]
    pub gender: Option<Gender>,
}

fn parsed_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok()))
}

fn finite_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parsed_or_none::<D, f64>(deserializer)?.filter(|v| v.is_finite()))
}

/// Number inputs may submit `40.0` or `6.5e2`; any integral value is accepted
fn whole_or_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(finite_or_none(deserializer)?
        .filter(|v| v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(v))
        .map(|v| v as u32))
}

impl ProfileForm {
    /// Labels of every field that is still unset, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        use labels::*;

        let checks = [
            (self.credit_score.is_none(), CREDIT_SCORE),
            (self.age.is_none(), AGE),
            (self.tenure.is_none(), TENURE),
            (self.balance.is_none(), BALANCE),
            (self.num_of_products.is_none(), NUM_OF_PRODUCTS),
            (self.has_credit_card.is_none(), HAS_CREDIT_CARD),
            (self.is_active_member.is_none(), IS_ACTIVE_MEMBER),
            (self.estimated_salary.is_none(), ESTIMATED_SALARY),
            (self.geography.is_none(), GEOGRAPHY),
            (self.gender.is_none(), GENDER),
        ];

        checks
            .into_iter()
            .filter(|(missing, _)| *missing)
            .map(|(_, label)| label)
            .collect()
    }
}

impl From<&CustomerProfile> for ProfileForm {
    fn from(profile: &CustomerProfile) -> Self {
        Self {
            credit_score: Some(profile.credit_score),
            age: Some(profile.age),
            tenure: Some(profile.tenure),
            balance: Some(profile.balance),
            num_of_products: Some(profile.num_of_products),
            has_credit_card: Some(profile.has_credit_card),
            is_active_member: Some(profile.is_active_member),
            estimated_salary: Some(profile.estimated_salary),
            geography: Some(profile.geography),
            gender: Some(profile.gender),
        }
    }
}

/// A complete customer profile, every field set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    /// Credit score (300 - 850)
    pub credit_score: u32,
    /// Age in years (18 - 100)
    pub age: u32,
    /// Years with the company (0 - 10)
    pub tenure: u32,
    /// Account balance
    pub balance: f64,
    pub num_of_products: NumProducts,
    pub has_credit_card: YesNo,
    pub is_active_member: YesNo,
    /// Estimated yearly salary
    pub estimated_salary: f64,
    pub geography: Geography,
    pub gender: Gender,
}

impl CustomerProfile {
    /// Urlencoded query string that round-trips through `ProfileForm`.
    ///
    /// Every value is a number or a fixed option name, so no escaping is needed.
    pub fn to_query(&self) -> String {
        format!(
            "credit_score={}&age={}&tenure={}&balance={}&num_of_products={}\
             &has_credit_card={}&is_active_member={}&estimated_salary={}\
             &geography={}&gender={}",
            self.credit_score,
            self.age,
            self.tenure,
            self.balance,
            self.num_of_products,
            self.has_credit_card,
            self.is_active_member,
            self.estimated_salary,
            self.geography,
            self.gender,
        )
    }
}
