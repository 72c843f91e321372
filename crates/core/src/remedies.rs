//! Static remedy table keyed by disease label.

use serde::Serialize;

/// Returned for any label the table does not know.
pub const FALLBACK_REMEDIES: &[&str] = &[
    "Consult with agricultural specialist",
    "Remove infected plant parts",
    "Monitor plants regularly",
];

/// Every label a crop classifier can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disease {
    Healthy,
    Alternaria,
    Insect,
    Mlb,
    Mosaic,
    Multiple,
    PowderyMildew,
    Scab,
    Blight,
    CommonRust,
    EarlyBlight,
    LateBlight,
    BacterialSpot,
    LeafMold,
    TargetSpot,
}

/// Whether remedies came from the table or the generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemedySource {
    OnDevice,
    Fallback,
}

impl Disease {
    pub const ALL: [Disease; 15] = [
        Disease::Healthy,
        Disease::Alternaria,
        Disease::Insect,
        Disease::Mlb,
        Disease::Mosaic,
        Disease::Multiple,
        Disease::PowderyMildew,
        Disease::Scab,
        Disease::Blight,
        Disease::CommonRust,
        Disease::EarlyBlight,
        Disease::LateBlight,
        Disease::BacterialSpot,
        Disease::LeafMold,
        Disease::TargetSpot,
    ];

    /// Label as emitted by the classifiers.
    pub fn label(&self) -> &'static str {
        match self {
            Disease::Healthy => "Healthy",
            Disease::Alternaria => "Alternaria",
            Disease::Insect => "Insect",
            Disease::Mlb => "MLB",
            Disease::Mosaic => "Mosaic",
            Disease::Multiple => "Multiple",
            Disease::PowderyMildew => "Powdery Mildew",
            Disease::Scab => "Scab",
            Disease::Blight => "Blight",
            Disease::CommonRust => "Common Rust",
            Disease::EarlyBlight => "Early Blight",
            Disease::LateBlight => "Late Blight",
            Disease::BacterialSpot => "Bacterial Spot",
            Disease::LeafMold => "Leaf Mold",
            Disease::TargetSpot => "Target Spot",
        }
    }

    /// Exact label match after trimming; ASCII case is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|disease| disease.label().eq_ignore_ascii_case(label))
    }

    pub fn remedies(&self) -> &'static [&'static str] {
        match self {
            Disease::Healthy => &[
                "Continue regular monitoring",
                "Maintain proper watering",
                "Keep area clean",
            ],
            Disease::Alternaria => &[
                "Remove and destroy infected leaves and fruit",
                "Apply fungicides containing copper or mancozeb",
                "Improve air circulation by pruning",
                "Avoid overhead irrigation",
            ],
            Disease::Insect => &[
                "Identify specific pest for targeted treatment",
                "Use appropriate insecticides or biological controls",
                "Remove heavily infested plant parts",
                "Encourage beneficial insects",
            ],
            Disease::Mlb => &[
                "Remove fallen leaves to reduce spore buildup",
                "Apply fungicides in early spring",
                "Prune trees for better air circulation",
                "Choose resistant apple varieties",
            ],
            Disease::Mosaic => &[
                "Remove and destroy infected plants immediately",
                "Control aphid populations",
                "Use virus-free planting material",
                "Keep area weed-free",
            ],
            Disease::Multiple => &[
                "Consult with agricultural specialist",
                "Implement integrated disease management",
                "Improve overall plant health",
                "Monitor plants closely",
            ],
            Disease::PowderyMildew => &[
                "Apply sulfur or potassium bicarbonate sprays",
                "Improve air circulation",
                "Avoid overhead watering",
                "Remove infected plant parts",
            ],
            Disease::Scab => &[
                "Apply fungicides during primary infection period",
                "Remove fallen leaves and infected fruit",
                "Prune for better air circulation",
                "Choose scab-resistant varieties",
            ],
            Disease::Blight => &[
                "Apply appropriate fungicides",
                "Remove and destroy infected plant material",
                "Practice crop rotation",
                "Ensure proper spacing for air circulation",
            ],
            Disease::CommonRust => &[
                "Apply fungicides if infection is severe",
                "Plant resistant varieties",
                "Remove volunteer corn plants",
                "Monitor fields regularly",
            ],
            Disease::EarlyBlight => &[
                "Apply chlorothalonil or copper-based fungicides",
                "Remove lower leaves that touch the ground",
                "Mulch around plants to prevent soil splash",
                "Practice crop rotation",
            ],
            Disease::LateBlight => &[
                "Apply fungicides immediately upon detection",
                "Remove and destroy infected plants",
                "Avoid overhead irrigation",
                "Monitor weather conditions",
            ],
            Disease::BacterialSpot => &[
                "Apply copper-based bactericides",
                "Use disease-free seeds and transplants",
                "Avoid overhead watering",
                "Remove and destroy infected plants",
            ],
            Disease::LeafMold => &[
                "Improve ventilation in greenhouse or garden",
                "Reduce humidity levels",
                "Remove and destroy infected leaves",
                "Apply appropriate fungicides",
            ],
            Disease::TargetSpot => &[
                "Apply fungicides containing chlorothalonil",
                "Remove infected plant debris",
                "Improve air circulation",
                "Practice crop rotation",
            ],
        }
    }
}

/// Remedies for a label, falling back to the generic list when unknown.
pub fn remedies_for(label: &str) -> (&'static [&'static str], RemedySource) {
    match Disease::from_label(label) {
        Some(disease) => (disease.remedies(), RemedySource::OnDevice),
        None => (FALLBACK_REMEDIES, RemedySource::Fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crops::Crop;

    #[test]
    fn every_class_label_has_table_remedies() {
        for crop in Crop::ALL {
            for label in crop.class_names() {
                let (remedies, source) = remedies_for(label);
                assert_eq!(source, RemedySource::OnDevice, "{crop}: {label}");
                assert!(!remedies.is_empty());
            }
        }
    }

    #[test]
    fn healthy_returns_fixed_list() {
        let (remedies, source) = remedies_for("Healthy");
        assert_eq!(source, RemedySource::OnDevice);
        assert_eq!(
            remedies,
            &["Continue regular monitoring", "Maintain proper watering", "Keep area clean"]
        );
    }

    #[test]
    fn unknown_label_falls_back() {
        let (remedies, source) = remedies_for("Cedar Rust");
        assert_eq!(source, RemedySource::Fallback);
        assert_eq!(remedies, FALLBACK_REMEDIES);
    }

    #[test]
    fn lookup_trims_and_ignores_case() {
        assert_eq!(Disease::from_label("  powdery mildew "), Some(Disease::PowderyMildew));
        assert_eq!(Disease::from_label("mlb"), Some(Disease::Mlb));
    }

    #[test]
    fn source_serializes_as_wire_names() {
        assert_eq!(
            serde_json::to_string(&RemedySource::OnDevice).unwrap(),
            "\"on-device\""
        );
        assert_eq!(
            serde_json::to_string(&RemedySource::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
