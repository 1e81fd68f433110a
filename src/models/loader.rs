//! ONNX classifier loader

use crate::feature_extractor::FeatureSchema;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{info, warn};

/// Metadata key a training export may use to record its column order
pub const FEATURE_NAMES_METADATA_KEY: &str = "feature_names";

/// An opened session plus the graph names inference needs
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Name of the feature input
    pub input_name: String,
    /// Output name for the predicted label, when the graph exposes one
    pub label_name: Option<String>,
    /// Output name for class probabilities
    pub output_name: String,
    /// Declared input width, when the graph fixes it
    pub n_features: Option<usize>,
}

/// Loader for the churn classifier
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Single-threaded loader
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Loader whose sessions use `onnx_threads` intra-op threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        // Environment creation is idempotent; a second commit is a no-op.
        let _ = ort::init().with_name("churn-predictor").commit();
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the classifier and check it against the feature schema.
    ///
    /// Fails when the file is missing or unreadable, when the declared input
    /// width differs from the schema, or when the artifact records feature
    /// names in a different order.
    pub fn load_model<P: AsRef<Path>>(&self, path: P, schema: &FeatureSchema) -> Result<LoadedModel> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();

        if !path.is_file() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        info!(
            model = %name,
            path = %path.display(),
            threads = self.onnx_threads,
            "Loading churn classifier"
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load churn classifier from {}", path.display()))?;

        let (input_name, n_features) = feature_input(&session)
            .with_context(|| format!("Model {} declares no inputs", name))?;
        let label_name = output_named(&session, |n| n.contains("label"));
        let output_name = output_named(&session, |n| n.contains("prob"))
            .or_else(|| session.outputs.last().map(|o| o.name.clone()))
            .with_context(|| format!("Model {} declares no outputs", name))?;

        match n_features {
            Some(width) => schema
                .check_width(width)
                .with_context(|| format!("Model {} does not match the feature schema", name))?,
            None => warn!(model = %name, "Model input width is dynamic, skipping width check"),
        }

        let feature_names = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom(FEATURE_NAMES_METADATA_KEY).ok().flatten());
        if let Some(raw) = feature_names {
            let names = parse_feature_names(&raw);
            schema
                .check_names(&names)
                .with_context(|| format!("Model {} feature names do not match", name))?;
            info!(model = %name, "Feature names verified against schema");
        }

        info!(
            model = %name,
            features = %input_name,
            probabilities = %output_name,
            label = ?label_name,
            width = ?n_features,
            "Churn classifier ready"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            label_name,
            output_name,
            n_features,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Name and fixed width of the graph's feature input
fn feature_input(session: &Session) -> Option<(String, Option<usize>)> {
    let input = session.inputs.first()?;
    let width = input
        .input_type
        .tensor_shape()
        .and_then(|shape| shape.last().copied())
        .filter(|&dim| dim > 0)
        .map(|dim| dim as usize);
    Some((input.name.clone(), width))
}

fn output_named(session: &Session, matches: impl Fn(&str) -> bool) -> Option<String> {
    session
        .outputs
        .iter()
        .map(|o| o.name.as_str())
        .find(|n| matches(n))
        .map(str::to_string)
}

/// Split a `feature_names` metadata value.
///
/// Accepts a JSON string array or a comma-separated list.
pub fn parse_feature_names(raw: &str) -> Vec<String> {
    if let Ok(names) = serde_json::from_str::<Vec<String>>(raw) {
        return names;
    }

    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
