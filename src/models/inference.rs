//! Churn classifier inference

use crate::error::PredictError;
use crate::feature_extractor::{FeatureEncoder, FeatureVector};
use crate::models::loader::LoadedModel;
use crate::types::prediction::{PredictionResult, RiskTier, RiskTierThresholds};
use crate::types::profile::{CustomerProfile, ProfileForm};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// A binary classifier over encoded feature vectors.
///
/// Both operations are pure functions of the input and the frozen parameters.
pub trait Classifier: Send + Sync {
    /// Model name for logs and the health probe
    fn name(&self) -> &str;

    /// Declared input width, if known
    fn n_features(&self) -> Option<usize>;

    /// Predicted label, `0` (stay) or `1` (churn)
    fn predict(&self, features: &[f32]) -> Result<i64>;

    /// Probability pair `[stay, churn]`
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]>;

    /// Label and probability pair together. Backends that produce both from
    /// one evaluation should override this.
    fn predict_with_proba(&self, features: &[f32]) -> Result<(i64, [f64; 2])> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }
}

/// Raw outputs of one session run
#[derive(Debug, Clone, Copy)]
struct ModelOutput {
    label: Option<i64>,
    churn_probability: f64,
}

impl ModelOutput {
    /// Graph label, or the 0.5 cut when the graph exposes none
    fn label(&self) -> i64 {
        self.label
            .unwrap_or(if self.churn_probability > 0.5 { 1 } else { 0 })
    }

    fn probabilities(&self) -> [f64; 2] {
        [1.0 - self.churn_probability, self.churn_probability]
    }
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    n_features: Option<usize>,
    /// Session runs need exclusive access
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name.clone(),
            n_features: model.n_features,
            model: Mutex::new(model),
        }
    }

    /// Run the session on one feature vector
    fn run(&self, features: &[f32]) -> Result<ModelOutput> {
        use ort::value::Tensor;

        let mut guard = self
            .model
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let model: &mut LoadedModel = &mut guard;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let churn_probability = extract_probability(&outputs, &model.output_name, &model.name)?;

        let label = model
            .label_name
            .as_deref()
            .and_then(|name| outputs.get(name))
            .and_then(|output| output.try_extract_tensor::<i64>().ok())
            .and_then(|(_, data)| data.first().copied());

        Ok(ModelOutput {
            label,
            churn_probability,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> Result<i64> {
        Ok(self.run(features)?.label())
    }

    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2]> {
        Ok(self.run(features)?.probabilities())
    }

    fn predict_with_proba(&self, features: &[f32]) -> Result<(i64, [f64; 2])> {
        let output = self.run(features)?;
        Ok((output.label(), output.probabilities()))
    }
}

/// Extract the churn probability from the session outputs.
///
/// Handles both tensor outputs (`[1, 2]` probabilities) and the
/// `seq(map(int64, float))` form produced by zipmap exports.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Ok(prob) = extract_from_value(output, model_name) {
            return Ok(prob);
        }
    }

    // Fallback: iterate all outputs and try extraction
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Ok(prob) = extract_from_value(&output, model_name) {
            debug!(model = %model_name, output = %name, prob = prob, "Extracted from fallback output");
            return Ok(prob);
        }
    }

    anyhow::bail!("Model {} produced no readable probability output", model_name)
}

fn extract_from_value(output: &ort::value::DynValue, model_name: &str) -> Result<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let prob = churn_prob_from_tensor(&dims, data)?;
        debug!(model = %model_name, prob = prob, "Extracted from tensor");
        return Ok(prob);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return extract_from_sequence_map(output, model_name);
    }

    anyhow::bail!("Unsupported output type for model {}", model_name)
}

/// Extract probability from seq(map(int64, float)) format
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let Some(map_value) = maps.first() else {
        anyhow::bail!("Empty sequence");
    };

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    anyhow::bail!("No probability found in map")
}

/// Churn probability from a probability tensor's dimensions and data
fn churn_prob_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    let prob = match classes {
        // [batch, 2] or [2]: churn is class index 1
        c if c >= 2 => data.get(1),
        // [batch, 1] or [1]: single positive-class probability
        1 => data.first(),
        _ => data.last(),
    };

    prob.map(|&p| p as f64)
        .ok_or_else(|| anyhow::anyhow!("Empty probability tensor"))
}

/// A validated, encoded and classified submission
#[derive(Debug, Clone)]
pub struct ChurnAssessment {
    pub profile: CustomerProfile,
    pub features: FeatureVector,
    pub result: PredictionResult,
    pub risk_tier: RiskTier,
}

/// Validates forms, encodes them and runs the shared classifier
pub struct Predictor {
    classifier: Arc<dyn Classifier>,
    encoder: FeatureEncoder,
    thresholds: RiskTierThresholds,
}

impl Predictor {
    /// Wire a classifier to the encoder, checking its input width first
    pub fn new(
        classifier: Arc<dyn Classifier>,
        encoder: FeatureEncoder,
        thresholds: RiskTierThresholds,
    ) -> Result<Self> {
        if let Some(width) = classifier.n_features() {
            encoder.schema().check_width(width)?;
        }
        thresholds.validate()?;

        info!(
            model = %classifier.name(),
            features = encoder.schema().len(),
            "Predictor initialized"
        );

        Ok(Self {
            classifier,
            encoder,
            thresholds,
        })
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn thresholds(&self) -> &RiskTierThresholds {
        &self.thresholds
    }

    /// Label and probabilities for an encoded vector, from a single evaluation
    pub fn classify(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let (label, probabilities) = self.classifier.predict_with_proba(features.as_slice())?;
        PredictionResult::from_model(label, probabilities)
    }

    /// Full submit: validate, encode, classify, tier.
    ///
    /// An incomplete form fails before the classifier is touched.
    pub fn predict(&self, form: &ProfileForm) -> Result<ChurnAssessment, PredictError> {
        let profile = self.encoder.validate(form).inspect_err(|e| {
            warn!(missing = ?e.missing_fields(), "Rejected incomplete profile");
        })?;

        let features = self.encoder.encode(&profile)?;
        let result = self.classify(&features)?;
        let risk_tier = RiskTier::from_probability(result.churn_probability, &self.thresholds);

        info!(
            class = %result.class,
            churn_probability = result.churn_probability,
            risk_tier = %risk_tier,
            "Prediction complete"
        );

        Ok(ChurnAssessment {
            profile,
            features,
            result,
            risk_tier,
        })
    }
}
