use anyhow::{Context, Result};
use progeny_core::{remedies_for, Config, Crop};
use progeny_daemon::{ClassifierLoader, ModelEntry, TractLoader};
use progeny_runtime_api::ClassifierConfig;
use std::path::Path;

pub async fn execute(crop: &str, image: &Path, top: usize) -> Result<()> {
    let crop: Crop = crop.parse()?;
    let config = Config::load()?;

    let bytes = std::fs::read(image).with_context(|| format!("Failed to read {:?}", image))?;
    let model_config = ClassifierConfig {
        model_path: config.models.model_path(crop),
        input: config.models.input_spec(),
        output: config.models.output,
    };

    let ranked = tokio::task::spawn_blocking(move || {
        let classifier = TractLoader.load(crop, &model_config)?;
        ModelEntry::new(crop, classifier, model_config.model_path.clone()).predict(&bytes)
    })
    .await??;

    let best = &ranked[0];
    println!("Crop:       {}", crop);
    println!("Prediction: {}", best.class);
    println!("Confidence: {:.2}%", best.confidence * 100.0);

    println!("\nTop classes:");
    for score in ranked.iter().take(top.max(1)) {
        println!("  {:<16} {:>6.2}%", score.class, score.confidence * 100.0);
    }

    let (remedies, source) = remedies_for(&best.class);
    println!("\nRemedies ({:?}):", source);
    for (i, remedy) in remedies.iter().enumerate() {
        println!("  {}. {}", i + 1, remedy);
    }

    Ok(())
}
