//! Error types for the analysis pipeline and their HTTP rendering

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::models::ErrorResponse;

/// Result type alias using [`AnalysisError`]
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Every way an upload or an analysis can fail.
///
/// The `Display` text carries the technical detail and is what gets logged.
/// [`AnalysisError::user_message`] is what a user sees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Classifier artifact missing, corrupt, or incompatible with the runtime
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Upload larger than the accepted limit
    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    OversizeInput { size: usize, limit: usize },

    /// Extension or content outside the accepted formats
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Analysis requested without an image
    #[error("no image was uploaded")]
    MissingImage,

    /// Multipart transport failure while receiving the upload
    #[error("upload error: {0}")]
    Upload(String),

    /// Image content could not be decoded or normalized
    #[error("normalization error: {0}")]
    Normalization(String),

    /// Forward pass failed or produced an unusable output
    #[error("inference error: {0}")]
    Inference(String),
}

impl AnalysisError {
    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new normalization error
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelLoad(_) => "model_load_error",
            Self::OversizeInput { .. } => "oversize_input_error",
            Self::UnsupportedFormat(_) => "unsupported_format_error",
            Self::MissingImage => "missing_image",
            Self::Upload(_) => "upload_error",
            Self::Normalization(_) => "normalization_error",
            Self::Inference(_) => "inference_error",
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::ModelLoad(_) => {
                "Failed to load model. Please check if the model file exists.".to_string()
            }
            Self::OversizeInput { .. } => {
                "File size exceeds 10MB limit. Please upload a smaller file.".to_string()
            }
            Self::UnsupportedFormat(_) => {
                "Unsupported file type. Please upload a JPG, JPEG or PNG image.".to_string()
            }
            Self::MissingImage => {
                "Please upload an ultrasound image to begin analysis.".to_string()
            }
            Self::Upload(_) => "The upload could not be read. Please try again.".to_string(),
            Self::Normalization(_) => {
                "Error processing image. Please ensure you've uploaded a valid image file."
                    .to_string()
            }
            Self::Inference(_) => "Error during prediction.".to_string(),
        }
    }
}

impl From<actix_multipart::MultipartError> for AnalysisError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        Self::Upload(err.to_string())
    }
}

impl ResponseError for AnalysisError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::OversizeInput { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::MissingImage | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Normalization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.user_message(),
        })
    }
}
