use anyhow::{Context, Result};
use progeny_core::{preprocess, Crop, ModelsConfig};
use progeny_runtime_api::{rank_scores, ClassScore, Classifier, ClassifierConfig};
use progeny_runtime_tract::OnnxClassifier;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Turns a model file into a ready classifier.
pub trait ClassifierLoader: Send + Sync {
    fn load(&self, crop: Crop, config: &ClassifierConfig) -> Result<Arc<dyn Classifier>>;
}

/// Loads ONNX models with tract.
pub struct TractLoader;

impl ClassifierLoader for TractLoader {
    fn load(&self, _crop: Crop, config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
        Ok(Arc::new(OnnxClassifier::load(config)?))
    }
}

/// A loaded classifier and the labels for its outputs.
#[derive(Clone)]
pub struct ModelEntry {
    pub crop: Crop,
    pub classifier: Arc<dyn Classifier>,
    pub class_names: &'static [&'static str],
    pub path: PathBuf,
}

impl ModelEntry {
    pub fn new(crop: Crop, classifier: Arc<dyn Classifier>, path: PathBuf) -> Self {
        let class_names = crop.class_names();
        if let Some(outputs) = classifier.num_classes() {
            if outputs != class_names.len() {
                tracing::warn!(
                    "{} model has {} outputs but {} class names",
                    crop,
                    outputs,
                    class_names.len()
                );
            }
        }

        Self {
            crop,
            classifier,
            class_names,
            path,
        }
    }

    /// Preprocess `image` and classify it. Scores come back ranked, best first.
    pub fn predict(&self, image: &[u8]) -> Result<Vec<ClassScore>> {
        let tensor = preprocess(image, &self.classifier.input_spec())?;
        let scores = self
            .classifier
            .classify(&tensor)
            .with_context(|| format!("{} model inference failed", self.crop))?;

        if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
            anyhow::bail!(
                "{} model inference failed: non-finite score {} at output {}",
                self.crop,
                scores[index],
                index
            );
        }

        for (index, score) in scores.iter().enumerate() {
            let label = self.class_names.get(index).copied().unwrap_or("?");
            tracing::debug!("  {:>2} {:<16} {:.4}", index, label, score);
        }

        let ranked = rank_scores(&scores, self.class_names);
        if ranked.is_empty() {
            anyhow::bail!("{} model produced no scores", self.crop);
        }
        Ok(ranked)
    }
}

/// Classifiers that loaded at start-up, one per crop. Read-only afterwards.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<Crop, ModelEntry>,
}

impl ModelRegistry {
    /// Try every crop. A model that fails to load is logged and left out.
    pub fn load(config: &ModelsConfig, loader: &dyn ClassifierLoader) -> Self {
        let mut entries = BTreeMap::new();

        for crop in Crop::ALL {
            let model_config = ClassifierConfig {
                model_path: config.model_path(crop),
                input: config.input_spec(),
                output: config.output,
            };

            match loader.load(crop, &model_config) {
                Ok(classifier) => {
                    tracing::info!("Loaded {} model from {:?}", crop, model_config.model_path);
                    entries.insert(
                        crop,
                        ModelEntry::new(crop, classifier, model_config.model_path),
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to load {} model: {:#}", crop, e);
                }
            }
        }

        if entries.is_empty() {
            tracing::warn!("No crop models loaded from {:?}", config.directory);
        }

        Self { entries }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ModelEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.crop, e)).collect(),
        }
    }

    pub fn get(&self, crop: Crop) -> Option<&ModelEntry> {
        self.entries.get(&crop)
    }

    /// Crops with a model, in `Crop::ALL` order
    pub fn loaded_crops(&self) -> Vec<Crop> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progeny_core::{ImageTensor, InputSpec, TensorLayout};
    use std::path::Path;
    use std::sync::Mutex;

    struct Fixed(Vec<f32>);

    impl Classifier for Fixed {
        fn input_spec(&self) -> InputSpec {
            InputSpec::square(8, TensorLayout::Nhwc)
        }

        fn num_classes(&self) -> Option<usize> {
            Some(self.0.len())
        }

        fn classify(&self, _input: &ImageTensor) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    /// Loads a fixed classifier for files that exist, fails otherwise.
    struct FileLoader {
        seen: Mutex<Vec<PathBuf>>,
    }

    impl ClassifierLoader for FileLoader {
        fn load(&self, _crop: Crop, config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
            self.seen.lock().unwrap().push(config.model_path.clone());
            if !Path::new(&config.model_path).exists() {
                anyhow::bail!("missing");
            }
            Ok(Arc::new(Fixed(vec![0.2, 0.3, 0.5])))
        }
    }

    #[test]
    fn failed_crops_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("potato_model.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("corn_model.onnx"), b"").unwrap();

        let config = ModelsConfig {
            directory: dir.path().to_path_buf(),
            ..ModelsConfig::default()
        };
        let loader = FileLoader {
            seen: Mutex::new(Vec::new()),
        };
        let registry = ModelRegistry::load(&config, &loader);

        assert_eq!(registry.loaded_crops(), vec![Crop::Corn, Crop::Potato]);
        assert!(registry.get(Crop::Apple).is_none());
        assert_eq!(loader.seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn predict_ranks_scores_with_crop_labels() {
        let entry = ModelEntry::new(
            Crop::Potato,
            Arc::new(Fixed(vec![0.2, 0.3, 0.5])),
            PathBuf::from("potato_model.onnx"),
        );

        let ranked = entry.predict(&png()).unwrap();
        assert_eq!(ranked[0].class, "Healthy");
        assert_eq!(ranked[2].class, "Early Blight");
    }

    fn png() -> Vec<u8> {
        let mut png = Vec::new();
        image::DynamicImage::new_rgb8(4, 4)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    #[test]
    fn predict_rejects_non_finite_scores() {
        for bad in [f32::NAN, f32::INFINITY] {
            let entry = ModelEntry::new(
                Crop::Apple,
                Arc::new(Fixed(vec![0.1, bad, 0.2, 0.3])),
                PathBuf::from("apple_model.onnx"),
            );

            let err = entry.predict(&png()).unwrap_err().to_string();
            assert!(err.contains("apple model inference failed"), "{}", err);
            assert!(err.contains("non-finite score"), "{}", err);
        }
    }

    #[test]
    fn predict_rejects_undecodable_bytes() {
        let entry = ModelEntry::new(
            Crop::Corn,
            Arc::new(Fixed(vec![1.0, 0.0, 0.0])),
            PathBuf::from("corn_model.onnx"),
        );
        assert!(entry.predict(b"not an image").is_err());
    }
}
