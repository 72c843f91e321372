//! Print what a model file expects and produces

use anyhow::{Context, Result};
use progeny_runtime_tract::{inspect, ModelKind};
use std::path::Path;

pub async fn execute(path: &Path, json: Option<&Path>, seed: u64) -> Result<()> {
    let model_path = path.to_path_buf();
    let report = tokio::task::spawn_blocking(move || inspect(&model_path, seed)).await??;

    println!("Model: {}", report.path.display());
    println!("Size:  {:.2} MB", report.size_mb());

    println!("\nInputs:");
    for input in &report.inputs {
        println!("  {:<24} {:<20} {}", input.name, input.shape_text(), input.datum_type);
    }

    println!("\nOutputs:");
    for output in &report.outputs {
        println!("  {:<24} {:<20} {}", output.name, output.shape_text(), output.datum_type);
    }

    println!();
    match report.kind {
        ModelKind::Classification { classes } => {
            let classes = classes
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Verdict: classification model ({} classes)", classes);
        }
        ModelKind::Detection => {
            println!("Verdict: object detection model (boxes, classes, scores, count)");
        }
        ModelKind::Unknown { outputs } => {
            println!("Verdict: unrecognized layout ({} outputs)", outputs);
        }
    }

    println!("\nProbe inference (seed {}):", seed);
    match &report.probe {
        Ok(probe) => {
            println!("  input shape:  {:?}", probe.input_shape);
            println!("  output shape: {:?}", probe.output_shape);
            println!("  output range: [{:.4}, {:.4}]", probe.min, probe.max);
            println!("  first values: {:?}", probe.head);
        }
        Err(e) => println!("  failed: {}", e),
    }

    println!("\nRecommendations:");
    for note in report.recommendations() {
        println!("  - {}", note);
    }

    if let Some(out) = json {
        write_summary(out, &report.summary_json())?;
        println!("\nSummary written to {}", out.display());
    }

    Ok(())
}

fn write_summary(out: &Path, summary: &serde_json::Value) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(summary)?;
    std::fs::write(out, text).with_context(|| format!("Failed to write {:?}", out))
}
