use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Location of a detection, in percent of the image width/height.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
    pub disease_name: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Predictions for one image, in the order the classifier returned them.
///
/// Index 0 is treated as the primary result whatever its confidence.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Deref, From)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    pub fn primary(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn into_inner(self) -> Vec<Prediction> {
        self.0
    }
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KnowledgeRecord {
    pub disease_name: String,
    pub symptoms: Vec<String>,
    pub causes: Vec<String>,
    pub treatments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevention: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn prediction_set_keeps_server_order_and_raw_values() {
        let body = r#"[
            {"disease_name": "Leaf Spot", "confidence": 0.4},
            {"disease_name": "Rust", "confidence": 1.7, "bounding_box": {"x": 90, "y": 5, "width": 40, "height": 10}}
        ]"#;

        let set: PredictionSet = serde_json::from_str(body).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.primary().unwrap().disease_name, "Leaf Spot");
        assert_eq!(set[1].confidence, 1.7);
        let bbox = set[1].bounding_box.unwrap();
        assert_eq!(bbox.x + bbox.width, 130.0);
        assert!(set[0].bounding_box.is_none());
    }

    #[test]
    fn empty_prediction_array_is_valid() {
        let set: PredictionSet = serde_json::from_str("[]").unwrap();
        assert!(set.is_empty());
        assert!(set.primary().is_none());
    }

    #[test]
    fn knowledge_record_optional_fields_default_to_none() {
        let body = r#"{
            "disease_name": "Powdery Mildew",
            "symptoms": ["white spots"],
            "causes": ["fungus"],
            "treatments": []
        }"#;

        let record: KnowledgeRecord = serde_json::from_str(body).unwrap();

        assert_eq!(record.disease_name, "Powdery Mildew");
        assert!(record.treatments.is_empty());
        assert!(record.prevention.is_none());
        assert!(record.severity.is_none());
        assert!(record.description.is_none());
    }

    #[test]
    fn knowledge_record_requires_list_fields() {
        let body = r#"{"disease_name": "Rust", "symptoms": [], "causes": []}"#;
        assert!(serde_json::from_str::<KnowledgeRecord>(body).is_err());
    }

    #[test]
    fn severity_uses_lowercase_on_the_wire() {
        let record: KnowledgeRecord = serde_json::from_str(
            r#"{"disease_name": "Blight", "symptoms": [], "causes": [], "treatments": [], "severity": "high"}"#,
        )
        .unwrap();

        assert_eq!(record.severity, Some(Severity::High));
        assert_eq!(Severity::Medium.to_string(), "medium");
        assert_eq!(Severity::from_str("low").unwrap(), Severity::Low);
        assert!(serde_json::from_str::<Severity>(r#""critical""#).is_err());
    }
}
