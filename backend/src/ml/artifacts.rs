//! Serialized model artifacts.
//!
//! Each artifact is plain JSON, deserialized into a fixed type and checked
//! once by `validate` when it is loaded. Inference on a validated artifact
//! can still fail (non-finite scores, unmatched input); those failures are
//! reported as [`ModelError::Inference`].

use serde::Deserialize;

use super::{ModelError, FEATURE_COUNT};

/// One linear classification head: `scores = weights · x + bias`
#[derive(Debug, Clone, Deserialize)]
pub struct LinearHead {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LinearHead {
    fn validate(&self, name: &str) -> Result<(), String> {
        if self.weights.is_empty() {
            return Err(format!("{} head has no classes", name));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != FEATURE_COUNT) {
            return Err(format!(
                "{} head rows must have {} weights, found {}",
                name,
                FEATURE_COUNT,
                row.len()
            ));
        }
        if self.bias.len() != self.weights.len() {
            return Err(format!(
                "{} head has {} classes but {} bias terms",
                name,
                self.weights.len(),
                self.bias.len()
            ));
        }
        Ok(())
    }

    /// Index of the highest scoring class
    fn classify(&self, x: &[f64; FEATURE_COUNT]) -> Result<i64, ModelError> {
        let mut best: Option<(usize, f64)> = None;

        for (class, (row, bias)) in self.weights.iter().zip(&self.bias).enumerate() {
            let score = row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + bias;
            if !score.is_finite() {
                return Err(ModelError::Inference(format!("non-finite score for class {}", class)));
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((class, score));
            }
        }

        best.map(|(class, _)| class as i64)
            .ok_or_else(|| ModelError::Inference("classifier produced no output".to_string()))
    }
}

/// `prediction_model.json`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionArtifact {
    pub malnutrition: LinearHead,
    #[serde(default)]
    pub risk: Option<LinearHead>,
}

impl PredictionArtifact {
    pub fn validate(&self) -> Result<(), String> {
        self.malnutrition.validate("malnutrition")?;
        if let Some(risk) = &self.risk {
            risk.validate("risk")?;
        }
        Ok(())
    }

    /// Raw status code and, when the artifact has a risk head, raw risk code
    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> Result<(i64, Option<i64>), ModelError> {
        let status = self.malnutrition.classify(x)?;
        let risk = self.risk.as_ref().map(|head| head.classify(x)).transpose()?;
        Ok((status, risk))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationEntry {
    pub input: [u8; 2],
    pub text: String,
}

/// `recommendation_model.json`, keyed by `[status_code, risk_code]`
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationArtifact {
    pub entries: Vec<RecommendationEntry>,
    #[serde(default)]
    pub default: Option<String>,
}

impl RecommendationArtifact {
    pub fn validate(&self) -> Result<(), String> {
        match self.entries.iter().find(|e| e.text.trim().is_empty()) {
            Some(entry) => Err(format!("empty text for input {:?}", entry.input)),
            None => Ok(()),
        }
    }

    pub fn recommend(&self, input: [u8; 2]) -> Result<&str, ModelError> {
        self.entries
            .iter()
            .find(|e| e.input == input)
            .map(|e| e.text.as_str())
            .or(self.default.as_deref())
            .ok_or_else(|| ModelError::Inference(format!("no recommendation for input {:?}", input)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotIntent {
    pub keywords: Vec<String>,
    pub answer: String,
}

/// `chatbot_model.json`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatbotArtifact {
    pub intents: Vec<ChatbotIntent>,
    #[serde(default)]
    pub default: Option<String>,
}

impl ChatbotArtifact {
    /// Validate, and lower-case keywords so matching is case-insensitive
    pub fn normalize(&mut self) -> Result<(), String> {
        for (index, intent) in self.intents.iter_mut().enumerate() {
            if intent.keywords.is_empty() || intent.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(format!("intent {} has an empty keyword list or keyword", index));
            }
            for keyword in intent.keywords.iter_mut() {
                *keyword = keyword.trim().to_lowercase();
            }
        }
        Ok(())
    }

    pub fn answer(&self, question: &str) -> Result<&str, ModelError> {
        let question = question.to_lowercase();

        self.intents
            .iter()
            .find(|intent| intent.keywords.iter().any(|k| question.contains(k.as_str())))
            .map(|intent| intent.answer.as_str())
            .or(self.default.as_deref())
            .ok_or_else(|| ModelError::Inference("no chatbot intent matched".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(classes: usize, favoured: usize) -> LinearHead {
        LinearHead {
            weights: vec![vec![0.0; FEATURE_COUNT]; classes],
            bias: (0..classes).map(|c| if c == favoured { 1.0 } else { 0.0 }).collect(),
        }
    }

    #[test]
    fn test_linear_head_argmax() {
        let mut weights = vec![vec![0.0; FEATURE_COUNT]; 5];
        // class 1 scores higher the lower the height z-score (index 10)
        weights[1][10] = -1.0;
        let artifact = PredictionArtifact {
            malnutrition: LinearHead { weights, bias: vec![0.5, 0.0, 0.0, 0.0, 0.0] },
            risk: None,
        };
        artifact.validate().unwrap();

        let mut x = [0.0; FEATURE_COUNT];
        assert_eq!(artifact.predict(&x).unwrap(), (0, None));

        x[10] = -2.5;
        assert_eq!(artifact.predict(&x).unwrap(), (1, None));
    }

    #[test]
    fn test_risk_head_used_when_present() {
        let artifact = PredictionArtifact {
            malnutrition: head(5, 3),
            risk: Some(head(3, 2)),
        };
        assert_eq!(artifact.predict(&[0.0; FEATURE_COUNT]).unwrap(), (3, Some(2)));
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        let short_row = PredictionArtifact {
            malnutrition: LinearHead { weights: vec![vec![0.0; 3]], bias: vec![0.0] },
            risk: None,
        };
        assert!(short_row.validate().is_err());

        let bias_mismatch = PredictionArtifact {
            malnutrition: LinearHead { weights: vec![vec![0.0; FEATURE_COUNT]; 2], bias: vec![0.0] },
            risk: None,
        };
        assert!(bias_mismatch.validate().is_err());

        let empty_risk = PredictionArtifact {
            malnutrition: head(5, 0),
            risk: Some(LinearHead { weights: vec![], bias: vec![] }),
        };
        assert!(empty_risk.validate().is_err());
    }

    #[test]
    fn test_non_finite_score_is_inference_error() {
        let artifact = PredictionArtifact {
            malnutrition: LinearHead {
                weights: vec![vec![f64::MAX; FEATURE_COUNT]; 2],
                bias: vec![0.0, 0.0],
            },
            risk: None,
        };
        // f64::MAX * 2.0 overflows to infinity
        assert!(matches!(artifact.predict(&[2.0; FEATURE_COUNT]), Err(ModelError::Inference(_))));
    }

    #[test]
    fn test_recommendation_lookup() {
        let artifact: RecommendationArtifact = serde_json::from_str(
            r#"{"entries": [{"input": [1, 1], "text": "Give more protein-rich food."}]}"#,
        )
        .unwrap();
        artifact.validate().unwrap();

        assert_eq!(artifact.recommend([1, 1]).unwrap(), "Give more protein-rich food.");
        assert!(artifact.recommend([0, 0]).is_err());

        let with_default = RecommendationArtifact {
            default: Some("See a clinician.".to_string()),
            ..artifact
        };
        assert_eq!(with_default.recommend([0, 0]).unwrap(), "See a clinician.");
    }

    #[test]
    fn test_chatbot_keywords_are_case_insensitive() {
        let mut artifact: ChatbotArtifact = serde_json::from_str(
            r#"{"intents": [{"keywords": ["Sleep"], "answer": "Toddlers need 11 to 14 hours of sleep."}]}"#,
        )
        .unwrap();
        artifact.normalize().unwrap();

        assert!(artifact.answer("How much SLEEP is enough?").unwrap().starts_with("Toddlers"));
        assert!(artifact.answer("What about vaccines?").is_err());
    }

    #[test]
    fn test_chatbot_empty_keyword_rejected() {
        let mut artifact: ChatbotArtifact =
            serde_json::from_str(r#"{"intents": [{"keywords": [" "], "answer": "Anything"}]}"#).unwrap();
        assert!(artifact.normalize().is_err());
    }
}
