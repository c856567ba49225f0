use serde::{Deserialize, Serialize};

use crate::inference::PredictionResult;

pub const DISCLAIMER: &str = "Please note: This is an AI-based prediction and should not be used \
as a definitive medical diagnosis. Always consult with a healthcare professional for proper \
diagnosis and treatment.";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredictionResponse {
    pub request_id: String,
    pub label: String,
    pub probability: f32,
    pub confidence: f32,
    pub confidence_display: String,
    pub disclaimer: String,
}

impl PredictionResponse {
    pub fn new(request_id: impl Into<String>, result: &PredictionResult) -> Self {
        Self {
            request_id: request_id.into(),
            label: result.label.to_string(),
            probability: result.probability,
            confidence: result.confidence(),
            confidence_display: result.confidence_percent(),
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
