//! PCOS detection backend
//!
//! Accepts an ultrasound image, normalizes it into the classifier's input
//! tensor and reports a positive/negative label with a confidence score.

pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod logging;
pub mod model;
pub mod models;
pub mod preprocess;
pub mod session;
pub mod upload;

pub use error::{AnalysisError, Result};
pub use inference::{Label, PredictionResult};
pub use model::{Classifier, ModelProvider, OnnxClassifier};
pub use session::Session;
pub use upload::UploadedImage;
