//! Forward pass and decision rule

use std::fmt;

use ndarray::Array4;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::model::Classifier;

/// Probability above which an image is labelled negative
pub const DECISION_BOUNDARY: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Positive,
    Negative,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Positive => write!(f, "PCOS Positive"),
            Label::Negative => write!(f, "PCOS Negative"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Label,
    pub probability: f32,
}

impl PredictionResult {
    /// Distance of the probability from the decision boundary, in [0, 1]
    pub fn confidence(&self) -> f32 {
        (self.probability - DECISION_BOUNDARY).abs() * 2.0
    }

    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence() * 100.0)
    }
}

/// Apply the decision rule to a raw probability.
///
/// The model was trained with the positive class at low probabilities,
/// so `p > 0.5` is negative.
pub fn classify(probability: f32) -> PredictionResult {
    let label = if probability > DECISION_BOUNDARY {
        Label::Negative
    } else {
        Label::Positive
    };
    PredictionResult { label, probability }
}

/// Run one forward pass and classify its first output
pub fn predict(model: &dyn Classifier, input: &Array4<f32>) -> Result<PredictionResult> {
    let outputs = model.forward(input)?;

    let probability = *outputs
        .first()
        .ok_or_else(|| AnalysisError::inference("model returned an empty output"))?;

    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(AnalysisError::inference(format!(
            "model output {} is not a probability",
            probability
        )));
    }

    let result = classify(probability);
    tracing::debug!(
        probability,
        label = %result.label,
        confidence = result.confidence(),
        "Prediction complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::FixedClassifier;

    fn input() -> Array4<f32> {
        Array4::zeros((1, 224, 224, 3))
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn test_high_probability_is_negative() {
        let result = classify(0.9);
        assert_eq!(result.label, Label::Negative);
        assert_close(result.confidence(), 0.8);
    }

    #[test]
    fn test_low_probability_is_positive() {
        let result = classify(0.1);
        assert_eq!(result.label, Label::Positive);
        assert_close(result.confidence(), 0.8);
    }

    #[test]
    fn test_boundary_is_positive_with_zero_confidence() {
        let result = classify(0.5);
        assert_eq!(result.label, Label::Positive);
        assert_eq!(result.confidence(), 0.0);
        assert_eq!(result.confidence_percent(), "0.00%");
    }

    #[test]
    fn test_extremes_have_full_confidence() {
        assert_eq!(classify(0.0).confidence(), 1.0);
        assert_eq!(classify(1.0).confidence(), 1.0);
        assert_eq!(classify(1.0).confidence_percent(), "100.00%");
    }

    #[test]
    fn test_confidence_monotonic_away_from_boundary() {
        let mut previous = 0.0;
        for step in 0..=50 {
            let delta = step as f32 / 100.0;
            let up = classify(0.5 + delta).confidence();
            let down = classify(0.5 - delta).confidence();

            assert!((0.0..=1.0).contains(&up));
            assert_close(up, down);
            assert!(up >= previous);
            previous = up;
        }
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Positive.to_string(), "PCOS Positive");
        assert_eq!(Label::Negative.to_string(), "PCOS Negative");
    }

    #[test]
    fn test_predict_reads_first_output() {
        let model = FixedClassifier(vec![0.9, 0.0]);
        let result = predict(&model, &input()).unwrap();

        assert_eq!(result.label, Label::Negative);
        assert_close(result.probability, 0.9);
        assert_eq!(result.confidence_percent(), "80.00%");
    }

    #[test]
    fn test_predict_rejects_empty_output() {
        let model = FixedClassifier(vec![]);
        assert!(matches!(
            predict(&model, &input()).unwrap_err(),
            AnalysisError::Inference(_)
        ));
    }

    #[test]
    fn test_predict_rejects_non_probability() {
        for bad in [f32::NAN, 1.5, -0.1] {
            let model = FixedClassifier(vec![bad]);
            assert!(predict(&model, &input()).is_err());
        }
    }
}
