use anyhow::Result;
use progeny_core::{Config, Crop};

pub async fn execute(key: Option<&str>, value: Option<&str>) -> Result<()> {
    match (key, value) {
        // Show all config, with environment overrides applied
        (None, None) => {
            let config = Config::load()?;
            println!("Configuration file: {:?}\n", Config::config_path()?);
            println!("[daemon]");
            println!("  host = \"{}\"", config.daemon.host);
            println!("  port = {}", config.daemon.port);
            println!("  max_upload_mb = {}", config.daemon.max_upload_mb);
            println!("  static_dir = {:?}", config.daemon.static_dir.display().to_string());
            println!();
            println!("[models]");
            println!("  directory = {:?}", config.models.directory.display().to_string());
            println!("  image_size = {}", config.models.image_size);
            println!("  layout = {:?}", config.models.layout);
            println!("  output = {:?}", config.models.output);
            for crop in Crop::ALL {
                println!(
                    "  {} -> {}",
                    crop,
                    config.models.model_path(crop).display()
                );
            }
            println!();
            println!("[assistant]");
            println!("  base_url = \"{}\"", config.assistant.base_url);
            println!(
                "  api_key = {}",
                config.assistant.api_key.as_ref().map(|_| "***").unwrap_or("(not set)")
            );
            println!("  transcription_model = \"{}\"", config.assistant.transcription_model);
            println!("  chat_model = \"{}\"", config.assistant.chat_model);
            println!("  temperature = {}", config.assistant.temperature);
            println!("  max_tokens = {}", config.assistant.max_tokens);
            println!("  timeout_secs = {}", config.assistant.timeout_secs);
        }

        // Get a specific key
        (Some(key), None) => {
            let config = Config::load()?;
            let value = get_config_value(&config, key)?;
            println!("{}", value);
        }

        // Set a specific key; the file is rewritten without environment overrides
        (Some(key), Some(value)) => {
            let mut config = Config::load_file()?;
            set_config_value(&mut config, key, value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }

        (None, Some(_)) => anyhow::bail!("A key is required when setting a value"),
    }

    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    if let Some(crop) = key.strip_prefix("models.paths.") {
        let crop: Crop = crop.parse()?;
        return Ok(config.models.model_path(crop).display().to_string());
    }

    match key {
        "daemon.host" => Ok(config.daemon.host.clone()),
        "daemon.port" => Ok(config.daemon.port.to_string()),
        "daemon.max_upload_mb" => Ok(config.daemon.max_upload_mb.to_string()),
        "daemon.static_dir" => Ok(config.daemon.static_dir.display().to_string()),
        "models.directory" => Ok(config.models.directory.display().to_string()),
        "models.image_size" => Ok(config.models.image_size.to_string()),
        "assistant.base_url" => Ok(config.assistant.base_url.clone()),
        "assistant.api_key" => Ok(config
            .assistant
            .api_key
            .as_ref()
            .map(|_| "***".to_string())
            .unwrap_or_default()),
        "assistant.transcription_model" => Ok(config.assistant.transcription_model.clone()),
        "assistant.chat_model" => Ok(config.assistant.chat_model.clone()),
        "assistant.temperature" => Ok(config.assistant.temperature.to_string()),
        "assistant.max_tokens" => Ok(config.assistant.max_tokens.to_string()),
        "assistant.timeout_secs" => Ok(config.assistant.timeout_secs.to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    if let Some(crop) = key.strip_prefix("models.paths.") {
        let crop: Crop = crop.parse()?;
        if value.is_empty() {
            config.models.paths.remove(crop.as_str());
        } else {
            config
                .models
                .paths
                .insert(crop.as_str().to_string(), value.into());
        }
        return Ok(());
    }

    match key {
        "daemon.host" => config.daemon.host = value.to_string(),
        "daemon.port" => config.daemon.port = value.parse()?,
        "daemon.max_upload_mb" => config.daemon.max_upload_mb = value.parse()?,
        "daemon.static_dir" => config.daemon.static_dir = value.into(),
        "models.directory" => config.models.directory = value.into(),
        "models.image_size" => config.models.image_size = value.parse()?,
        "assistant.base_url" => config.assistant.base_url = value.to_string(),
        "assistant.api_key" => {
            config.assistant.api_key = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        "assistant.transcription_model" => {
            config.assistant.transcription_model = value.to_string()
        }
        "assistant.chat_model" => config.assistant.chat_model = value.to_string(),
        "assistant.temperature" => config.assistant.temperature = value.parse()?,
        "assistant.max_tokens" => config.assistant.max_tokens = value.parse()?,
        "assistant.timeout_secs" => config.assistant.timeout_secs = value.parse()?,
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}
