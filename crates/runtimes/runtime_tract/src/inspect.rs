//! Model file inspection: tensor facts, model kind and a probe inference

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tract_onnx::tract_core::internal::DimLike;

use crate::probe::ProbeInput;

const MB: f64 = 1024.0 * 1024.0;

/// Name, shape and element type of a model input or output.
/// Unknown (symbolic) dimensions are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TensorInfo {
    pub name: String,
    pub shape: Vec<Option<usize>>,
    pub datum_type: String,
}

impl TensorInfo {
    pub fn shape_text(&self) -> String {
        let dims: Vec<String> = self
            .shape
            .iter()
            .map(|d| d.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string()))
            .collect();
        format!("[{}]", dims.join(", "))
    }
}

/// What a model's outputs suggest it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// A single output vector of class scores
    Classification { classes: Option<usize> },
    /// Four or more outputs (boxes, classes, scores, count)
    Detection,
    Unknown { outputs: usize },
}

impl ModelKind {
    pub fn from_outputs(outputs: &[TensorInfo]) -> Self {
        match outputs {
            [single] => ModelKind::Classification {
                classes: single.shape.last().copied().flatten(),
            },
            many if many.len() >= 4 => ModelKind::Detection,
            other => ModelKind::Unknown {
                outputs: other.len(),
            },
        }
    }
}

/// How comfortable a model is to bundle with a client app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn from_bytes(bytes: u64) -> Self {
        let mb = bytes as f64 / MB;
        if mb > 50.0 {
            SizeClass::Large
        } else if mb > 25.0 {
            SizeClass::Medium
        } else {
            SizeClass::Small
        }
    }
}

/// Outcome of one inference on seeded random input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSummary {
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    pub min: f32,
    pub max: f32,
    /// First few output values
    pub head: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
    pub kind: ModelKind,
    pub probe: std::result::Result<ProbeSummary, String>,
}

impl InspectReport {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / MB
    }

    pub fn size_class(&self) -> SizeClass {
        SizeClass::from_bytes(self.size_bytes)
    }

    /// Human-readable preprocessing and packaging hints.
    pub fn recommendations(&self) -> Vec<String> {
        let mut notes = Vec::new();

        if let Some(input) = self.inputs.first() {
            if input.datum_type == "U8" {
                notes.push("Model takes uint8 input: resize only, no normalization".to_string());
            } else {
                notes.push(format!(
                    "Model takes {} input: check for an internal rescaling layer before normalizing",
                    input.datum_type
                ));
            }

            if let Some((h, w)) = spatial_dims(&input.shape) {
                if h == w {
                    notes.push(format!("Square input: {}x{}", h, w));
                } else {
                    notes.push(format!(
                        "Non-square input: {}x{}, keep the aspect ratio in mind when resizing",
                        h, w
                    ));
                }
            }
        }

        notes.push(match self.size_class() {
            SizeClass::Large => format!(
                "Large model ({:.1} MB): consider downloading on demand instead of bundling",
                self.size_mb()
            ),
            SizeClass::Medium => format!(
                "Medium model ({:.1} MB): acceptable for bundling",
                self.size_mb()
            ),
            SizeClass::Small => format!("Small model ({:.1} MB): fine to bundle", self.size_mb()),
        });

        notes
    }

    /// Machine-readable summary of the primary input and output.
    pub fn summary_json(&self) -> serde_json::Value {
        let input = self.inputs.first();
        let output = self.outputs.first();
        let num_classes = match self.kind {
            ModelKind::Classification { classes } => classes,
            _ => output.and_then(|o| o.shape.last().copied().flatten()),
        };

        serde_json::json!({
            "input_shape": input.map(|i| &i.shape),
            "input_dtype": input.map(|i| &i.datum_type),
            "output_shape": output.map(|o| &o.shape),
            "num_classes": num_classes,
            "model_size_mb": self.size_mb(),
        })
    }
}

/// Height and width of a 4-d image input, NHWC or NCHW.
fn spatial_dims(shape: &[Option<usize>]) -> Option<(usize, usize)> {
    match shape {
        [_, Some(3), Some(h), Some(w)] => Some((*h, *w)),
        [_, Some(h), Some(w), _] => Some((*h, *w)),
        _ => None,
    }
}

/// Load the model at `path`, describe its tensors and run one probe inference
/// seeded with `seed`. A failed probe is recorded in the report, not returned.
pub fn inspect(path: &Path, seed: u64) -> Result<InspectReport> {
    let size_bytes = std::fs::metadata(path)
        .with_context(|| format!("Model file not found: {:?}", path))?
        .len();

    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("Failed to parse ONNX model {:?}", path))?
        .into_typed()?;

    let inputs = model
        .input_outlets()?
        .iter()
        .map(|outlet| tensor_info(&model, *outlet))
        .collect::<Result<Vec<_>>>()?;
    let outputs = model
        .output_outlets()?
        .iter()
        .map(|outlet| tensor_info(&model, *outlet))
        .collect::<Result<Vec<_>>>()?;

    let kind = ModelKind::from_outputs(&outputs);
    let probe = run_probe(path, &model, seed).map_err(|e| format!("{:#}", e));
    if let Err(e) = &probe {
        tracing::warn!("Probe inference failed: {}", e);
    }

    Ok(InspectReport {
        path: path.to_path_buf(),
        size_bytes,
        inputs,
        outputs,
        kind,
        probe,
    })
}

fn tensor_info(model: &TypedModel, outlet: OutletId) -> Result<TensorInfo> {
    let fact = model.outlet_fact(outlet)?;
    Ok(TensorInfo {
        name: model.node(outlet.node).name.clone(),
        shape: fact.shape.iter().map(|d| d.to_usize().ok()).collect(),
        datum_type: format!("{:?}", fact.datum_type),
    })
}

fn run_probe(path: &Path, model: &TypedModel, seed: u64) -> Result<ProbeSummary> {
    let outlet = *model
        .input_outlets()?
        .first()
        .context("Model declares no inputs")?;
    let fact = model.outlet_fact(outlet)?;
    let datum_type = fact.datum_type;

    // Symbolic dimensions (usually the batch) are pinned to 1
    let dims: TVec<usize> = fact
        .shape
        .iter()
        .map(|d| d.to_usize().unwrap_or(1))
        .collect();
    let len: usize = dims.iter().product();

    let mut rng = ProbeInput::new(seed);
    let values = if datum_type == DatumType::U8 {
        rng.byte_values(len)
    } else {
        rng.unit_values(len)
    };
    let input = Tensor::from_shape(&dims, &values)?
        .cast_to_dt(datum_type)?
        .into_owned();

    let plan = tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, InferenceFact::dt_shape(datum_type, dims.clone()))?
        .into_optimized()?
        .into_runnable()?;

    let outputs = plan.run(tvec!(input.into()))?;
    let output = outputs.first().context("Model produced no outputs")?;
    let output_shape = output.shape().to_vec();

    let values = output.cast_to::<f32>()?;
    let values = values.as_slice::<f32>()?;
    let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

    Ok(ProbeSummary {
        input_shape: dims.to_vec(),
        output_shape,
        min,
        max,
        head: values.iter().take(10).copied().collect(),
    })
}
