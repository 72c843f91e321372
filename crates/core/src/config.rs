use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::crops::Crop;
use crate::preprocess::{InputSpec, TensorLayout};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Classifier model settings
    #[serde(default)]
    pub models: ModelsConfig,

    /// Speech-to-text and chat completion settings
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, in MiB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Directory holding the static pages
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding `<crop>_model.onnx` files
    #[serde(default = "default_models_dir")]
    pub directory: PathBuf,

    /// Square input size the classifiers were trained on
    #[serde(default = "default_image_size")]
    pub image_size: u32,

    /// Input tensor layout
    #[serde(default)]
    pub layout: TensorLayout,

    /// What the classifiers emit
    #[serde(default)]
    pub output: OutputKind,

    /// Per-crop model path overrides, keyed by crop id
    #[serde(default)]
    pub paths: BTreeMap<String, PathBuf>,
}

/// Whether a classifier's output vector is already a probability distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Probabilities,
    /// Raw scores; a softmax is applied after inference
    Logits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// OpenAI-compatible API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (usually supplied through GROQ_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout for the external API
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_mb() -> usize {
    16
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_image_size() -> u32 {
    256
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_chat_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            models: ModelsConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            directory: default_models_dir(),
            image_size: default_image_size(),
            layout: TensorLayout::default(),
            output: OutputKind::default(),
            paths: BTreeMap::new(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            transcription_model: default_transcription_model(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelsConfig {
    /// Model path for a crop: explicit override, else `<directory>/<crop>_model.onnx`.
    pub fn model_path(&self, crop: Crop) -> PathBuf {
        self.paths
            .get(crop.as_str())
            .cloned()
            .unwrap_or_else(|| self.directory.join(crop.model_file_name()))
    }

    pub fn input_spec(&self) -> InputSpec {
        InputSpec::square(self.image_size, self.layout)
    }
}

impl Config {
    /// Get the base directory: ~/.config/progeny/
    pub fn base_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("USERPROFILE").map(PathBuf::from))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("progeny"))
    }

    /// Load config from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env();
        Ok(config)
    }

    /// Load config from the default location only (no environment overrides)
    pub fn load_file() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path: ~/.config/progeny/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GROQ_API_KEY") {
            self.assistant.api_key = Some(key.trim().to_string());
        }
        if let Some(dir) = get("PROGENY_MODELS_DIR") {
            self.models.directory = PathBuf::from(dir);
        }
        if let Some(port) = get("PROGENY_PORT") {
            match port.trim().parse() {
                Ok(port) => self.daemon.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PROGENY_PORT value: {}", port),
            }
        }
        for crop in Crop::ALL {
            if let Some(path) = get(crop.model_path_env()) {
                self.models
                    .paths
                    .insert(crop.as_str().to_string(), PathBuf::from(path));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_service_conventions() {
        let config = Config::default();
        assert_eq!(config.daemon.port, 5000);
        assert_eq!(config.daemon.host, "0.0.0.0");
        assert_eq!(config.models.image_size, 256);
        assert_eq!(config.models.layout, TensorLayout::Nhwc);
        assert_eq!(config.models.output, OutputKind::Probabilities);
        assert_eq!(config.assistant.chat_model, "llama-3.3-70b-versatile");
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [daemon]
            port = 8080

            [models]
            directory = "/srv/models"
            layout = "nchw"
            output = "logits"

            [models.paths]
            tomato = "/srv/custom/tomato.onnx"
            "#,
        )
        .unwrap();

        assert_eq!(config.daemon.port, 8080);
        assert_eq!(config.daemon.max_upload_mb, 16);
        assert_eq!(config.models.layout, TensorLayout::Nchw);
        assert_eq!(config.models.output, OutputKind::Logits);
        assert_eq!(
            config.models.model_path(Crop::Tomato),
            PathBuf::from("/srv/custom/tomato.onnx")
        );
        assert_eq!(
            config.models.model_path(Crop::Corn),
            PathBuf::from("/srv/models/corn_model.onnx")
        );
    }

    #[test]
    fn toml_round_trip_preserves_settings() {
        let mut config = Config::default();
        config.daemon.port = 6000;
        config.assistant.api_key = Some("secret".to_string());

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.daemon.port, 6000);
        assert_eq!(parsed.assistant.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn environment_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GROQ_API_KEY", " gsk_test "),
            ("PROGENY_MODELS_DIR", "/opt/models"),
            ("PROGENY_PORT", "7000"),
            ("APPLE_MODEL_PATH", "/tmp/apple.onnx"),
            ("CORN_MODEL_PATH", "  "),
        ]);
        let mut config = Config::default();
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.assistant.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.daemon.port, 7000);
        assert_eq!(
            config.models.model_path(Crop::Apple),
            PathBuf::from("/tmp/apple.onnx")
        );
        assert_eq!(
            config.models.model_path(Crop::Corn),
            PathBuf::from("/opt/models/corn_model.onnx")
        );
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_env_from(|key| (key == "PROGENY_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.daemon.port, 5000);
    }
}
