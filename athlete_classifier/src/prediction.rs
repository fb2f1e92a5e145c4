use serde::{Deserialize, Serialize};

/// One labeled confidence score returned by the classification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub athlete: String,
    pub confidence: f64,
}

/// Predictions in the order the service produced them. Never re-sorted here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self(predictions)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn top(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Prediction> {
        self.0
    }
}

impl From<Vec<Prediction>> for PredictionSet {
    fn from(predictions: Vec<Prediction>) -> Self {
        Self(predictions)
    }
}

impl<'a> IntoIterator for &'a PredictionSet {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_service_order() {
        let body = r#"[
            {"athlete": "Roger Federer", "confidence": 0.05},
            {"athlete": "Serena Williams", "confidence": 0.94}
        ]"#;

        let set: PredictionSet = serde_json::from_str(body).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.top().unwrap().athlete, "Roger Federer");
        assert_eq!(set.iter().nth(1).unwrap().confidence, 0.94);
    }

    #[test]
    fn test_rejects_missing_fields() {
        let body = r#"[{"athlete": "Lionel Messi"}]"#;
        assert!(serde_json::from_str::<PredictionSet>(body).is_err());
    }
}
