//! HTML rendering of the prediction page

use crate::feature_extractor::{CHURN_FEATURES, REFERENCE_AVERAGES};
use crate::models::ChurnAssessment;
use crate::presentation::charts::{feature_comparison_svg, probability_pie_svg};
use crate::types::prediction::{ChurnClass, RiskTier};
use crate::types::profile::{labels, Gender, Geography, NumProducts, ProfileForm, YesNo};
use anyhow::Result;
use std::fmt::Write;

pub const PAGE_TITLE: &str = "Customer Churn Prediction App";
pub const INCOMPLETE_INPUT_MESSAGE: &str = "Please fill out all the fields before prediction.";

/// What the page shows below the form
#[derive(Debug, Clone)]
pub enum PageState {
    /// Fresh page, nothing submitted yet
    Empty,
    /// Submit rejected; the user must complete the form and resubmit
    ValidationFailed { missing: Vec<&'static str> },
    /// Submit accepted and classified
    PredictionRendered(Box<ChurnAssessment>),
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render the whole page: form (with the submitted values) and result section
pub fn render_page(form: &ProfileForm, state: &PageState) -> Result<String> {
    let mut html = String::with_capacity(16 * 1024);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>Customer Churn Prediction</title>")?;
    writeln!(html, "<style>{}</style>", STYLE)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;
    writeln!(html, "<h1>{}</h1>", PAGE_TITLE)?;
    writeln!(
        html,
        "<p>Use this tool to predict whether a customer is likely to churn based on their profile.</p>"
    )?;

    render_form(&mut html, form)?;

    match state {
        PageState::Empty => {}
        PageState::ValidationFailed { missing } => {
            writeln!(
                html,
                "<div class=\"banner error\" role=\"alert\">{}</div>",
                INCOMPLETE_INPUT_MESSAGE
            )?;
            if !missing.is_empty() {
                writeln!(
                    html,
                    "<p class=\"missing\">Missing: {}</p>",
                    escape_html(&missing.join(", "))
                )?;
            }
        }
        PageState::PredictionRendered(assessment) => render_prediction(&mut html, assessment)?,
    }

    writeln!(html, "<hr>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;
    Ok(html)
}

fn render_form(html: &mut String, form: &ProfileForm) -> Result<()> {
    writeln!(html, "<form method=\"post\" action=\"/predict\">")?;

    writeln!(html, "<fieldset><legend>Customer Profile Input</legend>")?;
    number_input(
        html,
        "credit_score",
        labels::CREDIT_SCORE,
        form.credit_score.map(|v| v.to_string()),
        "min=\"300\" max=\"850\" step=\"1\"",
    )?;
    number_input(
        html,
        "age",
        labels::AGE,
        form.age.map(|v| v.to_string()),
        "min=\"18\" max=\"100\" step=\"1\"",
    )?;
    number_input(
        html,
        "tenure",
        "Tenure (Years with Company)",
        form.tenure.map(|v| v.to_string()),
        "min=\"0\" max=\"10\" step=\"1\"",
    )?;
    number_input(
        html,
        "balance",
        "Account Balance",
        form.balance.map(|v| v.to_string()),
        "step=\"any\"",
    )?;
    select_input(
        html,
        "num_of_products",
        "Number of Products",
        NumProducts::ALL,
        form.num_of_products.as_ref(),
    )?;
    number_input(
        html,
        "estimated_salary",
        labels::ESTIMATED_SALARY,
        form.estimated_salary.map(|v| v.to_string()),
        "step=\"any\"",
    )?;
    writeln!(html, "</fieldset>")?;

    writeln!(html, "<fieldset><legend>Customer Membership Details</legend>")?;
    select_input(
        html,
        "has_credit_card",
        "Has Credit Card?",
        YesNo::ALL,
        form.has_credit_card.as_ref(),
    )?;
    select_input(
        html,
        "is_active_member",
        "Is Active Member?",
        YesNo::ALL,
        form.is_active_member.as_ref(),
    )?;
    writeln!(html, "</fieldset>")?;

    writeln!(html, "<fieldset><legend>Geographical &amp; Gender Info</legend>")?;
    select_input(html, "geography", labels::GEOGRAPHY, Geography::ALL, form.geography.as_ref())?;
    select_input(html, "gender", labels::GENDER, Gender::ALL, form.gender.as_ref())?;
    writeln!(html, "</fieldset>")?;

    writeln!(html, "<button type=\"submit\">Predict Churn</button>")?;
    writeln!(html, "</form>")?;
    Ok(())
}

fn number_input(
    html: &mut String,
    name: &str,
    label: &str,
    value: Option<String>,
    limits: &str,
) -> Result<()> {
    writeln!(
        html,
        "<label>{label} <input type=\"number\" name=\"{name}\" value=\"{value}\" {limits}></label>",
        label = escape_html(label),
        name = name,
        value = escape_html(value.as_deref().unwrap_or("")),
        limits = limits,
    )?;
    Ok(())
}

fn select_input<T>(
    html: &mut String,
    name: &str,
    label: &str,
    options: &[T],
    selected: Option<&T>,
) -> Result<()>
where
    T: PartialEq + std::fmt::Display,
{
    writeln!(html, "<label>{} <select name=\"{}\">", escape_html(label), name)?;
    writeln!(
        html,
        "<option value=\"\"{}>Choose an option</option>",
        if selected.is_none() { " selected" } else { "" }
    )?;
    for option in options {
        let text = escape_html(&option.to_string());
        let is_selected = selected == Some(option);
        writeln!(
            html,
            "<option value=\"{text}\"{}>{text}</option>",
            if is_selected { " selected" } else { "" },
        )?;
    }
    writeln!(html, "</select></label>")?;
    Ok(())
}

fn render_prediction(html: &mut String, assessment: &ChurnAssessment) -> Result<()> {
    let (class, message) = match assessment.result.class {
        ChurnClass::Churn => ("error", "Customer is likely to churn!"),
        ChurnClass::Stay => ("success", "Customer is likely to stay."),
    };
    writeln!(html, "<div class=\"banner {}\" role=\"status\">{}</div>", class, message)?;

    writeln!(html, "<h2>Churn Probability Distribution</h2>")?;
    writeln!(html, "<div class=\"chart\">{}</div>", probability_pie_svg(&assessment.result)?)?;

    writeln!(html, "<h2>Feature Comparison (Customer vs Average)</h2>")?;
    let chart = feature_comparison_svg(
        &CHURN_FEATURES,
        &assessment.features.to_f64(),
        &REFERENCE_AVERAGES,
    )?;
    writeln!(html, "<div class=\"chart\">{}</div>", chart)?;

    writeln!(html, "<h2>Retention Strategy Suggestion</h2>")?;
    let tier_class = match assessment.risk_tier {
        RiskTier::VeryHigh => "warning",
        RiskTier::Moderate => "info",
        RiskTier::Low => "success",
    };
    writeln!(
        html,
        "<div class=\"banner {}\">{}</div>",
        tier_class,
        escape_html(assessment.risk_tier.advisory())
    )?;

    let query = assessment.profile.to_query();
    writeln!(html, "<p class=\"downloads\">")?;
    let query = escape_html(&query);
    writeln!(
        html,
        "<a href=\"/export/csv?{query}\" download>Download Prediction as CSV</a>"
    )?;
    writeln!(
        html,
        "<a href=\"/export/pdf?{query}\" download>Download Prediction as PDF</a>"
    )?;
    writeln!(html, "</p>")?;
    Ok(())
}

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto;padding:0 1em}\
fieldset{margin-bottom:1em}label{display:block;margin:.4em 0}\
.banner{padding:.8em;border-radius:4px;margin:1em 0}\
.error{background:#fdecea;color:#8a1c1c}.success{background:#e8f5e9;color:#1b5e20}\
.warning{background:#fff8e1;color:#8a6d00}.info{background:#e3f2fd;color:#0d47a1}\
.downloads a{margin-right:1.5em}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FeatureEncoder;
    use crate::types::prediction::PredictionResult;
    use crate::types::profile::CustomerProfile;

    fn assessment(churn_probability: f64) -> ChurnAssessment {
        let profile = CustomerProfile {
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
        };
        let features = FeatureEncoder::default().encode(&profile).unwrap();
        let result = PredictionResult {
            class: if churn_probability > 0.5 { ChurnClass::Churn } else { ChurnClass::Stay },
            churn_probability,
        };
        ChurnAssessment {
            risk_tier: RiskTier::from_probability(churn_probability, &Default::default()),
            profile,
            features,
            result,
        }
    }

    #[test]
    fn test_empty_page_has_unset_form() {
        let html = render_page(&ProfileForm::default(), &PageState::Empty).unwrap();

        assert!(html.contains(PAGE_TITLE));
        assert!(html.contains("name=\"credit_score\" value=\"\""));
        assert!(html.contains("<option value=\"\" selected>Choose an option</option>"));
        assert!(!html.contains("banner"));
    }

    #[test]
    fn test_amount_inputs_accept_any_real_value() {
        let html = render_page(&ProfileForm::default(), &PageState::Empty).unwrap();

        assert!(html.contains("name=\"balance\" value=\"\" step=\"any\""));
        assert!(html.contains("name=\"estimated_salary\" value=\"\" step=\"any\""));
        assert!(!html.contains("step=\"100\""));
    }

    #[test]
    fn test_validation_failed_page() {
        let state = PageState::ValidationFailed {
            missing: vec![labels::AGE],
        };
        let html = render_page(&ProfileForm::default(), &state).unwrap();

        assert!(html.contains(INCOMPLETE_INPUT_MESSAGE));
        assert!(html.contains("Missing: Age"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_prediction_page() {
        let assessment = assessment(0.82);
        let form = ProfileForm::from(&assessment.profile);
        let html = render_page(&form, &PageState::PredictionRendered(Box::new(assessment))).unwrap();

        assert!(html.contains("Customer is likely to churn!"));
        assert!(html.contains("Very High Churn Risk!"));
        assert!(html.contains("<option value=\"Germany\" selected>Germany</option>"));
        assert!(html.contains("/export/csv?credit_score=650&amp;age=40"));
        assert_eq!(html.matches("<svg").count(), 2);
    }

    #[test]
    fn test_stay_banner() {
        let assessment = assessment(0.1);
        let html = render_page(
            &ProfileForm::default(),
            &PageState::PredictionRendered(Box::new(assessment)),
        )
        .unwrap();

        assert!(html.contains("Customer is likely to stay."));
        assert!(html.contains("Low Churn Risk."));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href='x'>&\"</a>"),
            "&lt;a href=&#39;x&#39;&gt;&amp;&quot;&lt;/a&gt;"
        );
    }
}
