//! progeny_runtime_tract - ONNX classifier runtime
//!
//! Loads the exported per-crop Keras classifiers (ONNX) with tract, a pure
//! Rust inference engine, and serves them through [`Classifier`]. Also
//! provides [`inspect`] for looking inside a model file.

mod inspect;
mod probe;

use anyhow::{Context, Result};
use progeny_core::{ImageTensor, InputSpec, OutputKind};
use progeny_runtime_api::{softmax, Classifier, ClassifierConfig};
use tract_onnx::prelude::*;

pub use inspect::{inspect, InspectReport, ModelKind, ProbeSummary, SizeClass, TensorInfo};
pub use probe::ProbeInput;

pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input: InputSpec,
    output: OutputKind,
    num_classes: Option<usize>,
}

impl OnnxClassifier {
    pub fn load(config: &ClassifierConfig) -> Result<Self> {
        let path = &config.model_path;
        if !path.exists() {
            anyhow::bail!("Model file not found: {:?}", path);
        }

        let shape: TVec<usize> = config.input.shape().iter().copied().collect();
        tracing::info!("Loading classifier from {:?} with input {:?}", path, shape);

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("Failed to parse ONNX model {:?}", path))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))?
            .into_optimized()
            .with_context(|| format!("Failed to optimize model {:?}", path))?;

        let num_classes = model
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().and_then(|dims| dims.last().copied()));
        tracing::debug!("Declared output classes: {:?}", num_classes);

        let plan = model.into_runnable()?;

        Ok(Self {
            plan,
            input: config.input,
            output: config.output,
            num_classes,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn input_spec(&self) -> InputSpec {
        self.input
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn classify(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        let expected = self.input.shape();
        if input.shape != expected {
            anyhow::bail!(
                "Input tensor shape {:?} does not match model input {:?}",
                input.shape,
                expected
            );
        }

        let tensor = Tensor::from_shape(&input.shape, &input.data)?;
        let outputs = self.plan.run(tvec!(tensor.into()))?;
        let output = outputs.first().context("Model produced no outputs")?;

        let scores = output.cast_to::<f32>()?;
        let scores = scores.as_slice::<f32>()?.to_vec();

        Ok(match self.output {
            OutputKind::Probabilities => scores,
            OutputKind::Logits => softmax(&scores),
        })
    }
}
