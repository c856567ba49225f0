//! Per-interaction analysis state

use crate::error::{AnalysisError, Result};
use crate::inference::{self, PredictionResult};
use crate::model::ModelProvider;
use crate::preprocess::{self, INPUT_SIZE};
use crate::upload::UploadedImage;

/// State of one user's interaction with the tool.
///
/// A result only ever exists alongside the gated upload it was computed from.
#[derive(Debug, Default)]
pub enum Session {
    #[default]
    NoImage,
    ImageUploaded {
        image: UploadedImage,
    },
    ResultReady {
        image: UploadedImage,
        result: PredictionResult,
    },
}

impl Session {
    /// Replace the current image, discarding any previous result
    pub fn upload(&mut self, image: UploadedImage) {
        tracing::debug!(
            filename = image.filename(),
            size = image.size(),
            previous = self.state_name(),
            "Image uploaded"
        );
        *self = Session::ImageUploaded { image };
    }

    /// Normalize the current image and run the classifier on it.
    ///
    /// On failure the session stays in `ImageUploaded` and no result is kept.
    pub fn analyze(&mut self, provider: &ModelProvider) -> Result<PredictionResult> {
        let image = match std::mem::take(self) {
            Session::NoImage => return Err(AnalysisError::MissingImage),
            Session::ImageUploaded { image } | Session::ResultReady { image, .. } => image,
        };

        match run_pipeline(&image, provider) {
            Ok(result) => {
                *self = Session::ResultReady { image, result };
                Ok(result)
            }
            Err(e) => {
                *self = Session::ImageUploaded { image };
                Err(e)
            }
        }
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            Session::ResultReady { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        match self {
            Session::NoImage => None,
            Session::ImageUploaded { image } | Session::ResultReady { image, .. } => Some(image),
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Session::NoImage => "no_image",
            Session::ImageUploaded { .. } => "image_uploaded",
            Session::ResultReady { .. } => "result_ready",
        }
    }
}

fn run_pipeline(image: &UploadedImage, provider: &ModelProvider) -> Result<PredictionResult> {
    let model = provider.get_model()?;
    let decoded = image.decode()?;
    let tensor = preprocess::normalize(&decoded, INPUT_SIZE)?;
    inference::predict(model.as_ref(), &tensor)
}
