//! progeny_core - Core library for the plant disease service
//!
//! This crate provides:
//! - Service configuration (TOML file + environment overrides)
//! - The supported crops and their classifier label order
//! - The static disease remedy table
//! - Image preprocessing into model input tensors

pub mod config;
pub mod crops;
pub mod preprocess;
pub mod remedies;

pub use config::{AssistantConfig, Config, DaemonConfig, ModelsConfig, OutputKind};
pub use crops::{Crop, UnknownCrop};
pub use preprocess::{preprocess, ImageTensor, InputSpec, PreprocessError, TensorLayout, CHANNELS};
pub use remedies::{remedies_for, Disease, RemedySource, FALLBACK_REMEDIES};
