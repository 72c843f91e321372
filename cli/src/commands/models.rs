use anyhow::Result;
use progeny_core::{Config, Crop};
use progeny_daemon::{ModelRegistry, TractLoader};

pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let models = config.models.clone();
    let registry =
        tokio::task::spawn_blocking(move || ModelRegistry::load(&models, &TractLoader)).await?;

    println!("Models directory: {}\n", config.models.directory.display());
    println!("{:<8} {:<8} {:<10} {}", "CROP", "STATUS", "SIZE", "PATH");
    println!("{}", "-".repeat(80));

    for crop in Crop::ALL {
        let path = config.models.model_path(crop);
        let size = std::fs::metadata(&path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "-".to_string());
        let status = if registry.get(crop).is_some() {
            "loaded"
        } else {
            "missing"
        };
        println!("{:<8} {:<8} {:<10} {}", crop, status, size, path.display());
    }

    if registry.is_empty() {
        println!("\nNo models loaded. Put <crop>_model.onnx files in the models directory");
        println!("or point APPLE_MODEL_PATH (etc.) at them.");
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
