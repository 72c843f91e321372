use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A plant type with its own disease classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Apple,
    Corn,
    Potato,
    Tomato,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown crop '{0}'")]
pub struct UnknownCrop(pub String);

impl Crop {
    pub const ALL: [Crop; 4] = [Crop::Apple, Crop::Corn, Crop::Potato, Crop::Tomato];

    /// Resolve a wire identifier such as `"tomato"`. Surrounding whitespace and
    /// case are ignored.
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|crop| crop.as_str().eq_ignore_ascii_case(id))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::Apple => "apple",
            Crop::Corn => "corn",
            Crop::Potato => "potato",
            Crop::Tomato => "tomato",
        }
    }

    /// Labels in the order of the classifier's output vector.
    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            Crop::Apple => &[
                "Alternaria",
                "Insect",
                "MLB",
                "Mosaic",
                "Multiple",
                "Powdery Mildew",
                "Scab",
            ],
            Crop::Corn => &["Blight", "Common Rust", "Healthy"],
            Crop::Potato => &["Early Blight", "Late Blight", "Healthy"],
            Crop::Tomato => &[
                "Bacterial Spot",
                "Early Blight",
                "Late Blight",
                "Leaf Mold",
                "Target Spot",
                "Healthy",
            ],
        }
    }

    /// File name of the model inside the models directory.
    pub fn model_file_name(&self) -> String {
        format!("{}_model.onnx", self.as_str())
    }

    /// Environment variable that overrides this crop's model path.
    pub fn model_path_env(&self) -> &'static str {
        match self {
            Crop::Apple => "APPLE_MODEL_PATH",
            Crop::Corn => "CORN_MODEL_PATH",
            Crop::Potato => "POTATO_MODEL_PATH",
            Crop::Tomato => "TOMATO_MODEL_PATH",
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Crop {
    type Err = UnknownCrop;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownCrop(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_ids_leniently() {
        assert_eq!(Crop::from_id("apple"), Some(Crop::Apple));
        assert_eq!(Crop::from_id(" Tomato "), Some(Crop::Tomato));
        assert_eq!("CORN".parse::<Crop>(), Ok(Crop::Corn));
    }

    #[test]
    fn rejects_unknown_ids() {
        assert_eq!(Crop::from_id("grape"), None);
        assert_eq!(Crop::from_id(""), None);
        assert_eq!("wheat".parse::<Crop>(), Err(UnknownCrop("wheat".to_string())));
    }

    #[test]
    fn class_counts_match_trained_models() {
        assert_eq!(Crop::Apple.class_names().len(), 7);
        assert_eq!(Crop::Corn.class_names().len(), 3);
        assert_eq!(Crop::Potato.class_names().len(), 3);
        assert_eq!(Crop::Tomato.class_names().len(), 6);
    }

    #[test]
    fn model_file_names_follow_crop_id() {
        assert_eq!(Crop::Potato.model_file_name(), "potato_model.onnx");
        assert_eq!(Crop::Corn.to_string(), "corn");
    }
}
