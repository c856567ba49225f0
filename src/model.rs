//! Classifier loading and the process-wide model handle

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use ndarray::Array4;
use tract_onnx::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::preprocess::INPUT_SIZE;

/// A loaded model mapping a `(1, H, W, 3)` tensor to its raw outputs
pub trait Classifier: Send + Sync {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>>;
}

type Loader = Box<dyn Fn() -> Result<Arc<dyn Classifier>> + Send + Sync>;

/// ONNX classifier executed with tract
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) = INPUT_SIZE;

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    f32::fact([1, height as usize, width as usize, 3]).into(),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| AnalysisError::model_load(format!("{}: {:#}", path.display(), e)))?;

        Ok(Self { plan })
    }
}

impl Classifier for OnnxClassifier {
    fn forward(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let data = input
            .as_slice()
            .ok_or_else(|| AnalysisError::inference("input tensor is not contiguous"))?;
        let tensor = Tensor::from_shape(input.shape(), data)
            .map_err(|e| AnalysisError::inference(format!("{:#}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| AnalysisError::inference(format!("{:#}", e)))?;

        let first = outputs
            .first()
            .ok_or_else(|| AnalysisError::inference("model produced no outputs"))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| AnalysisError::inference(format!("{:#}", e)))?;

        Ok(view.iter().copied().collect())
    }
}

/// Loads the classifier on first use and hands out the same instance
/// for the rest of the process.
///
/// The outcome of the first load is kept whether it succeeded or not, so a
/// broken artifact is reported on every call without being read again.
pub struct ModelProvider {
    source: String,
    loader: Loader,
    cell: OnceLock<std::result::Result<Arc<dyn Classifier>, AnalysisError>>,
}

impl ModelProvider {
    /// Provider backed by an ONNX artifact on disk
    pub fn onnx(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source = path.display().to_string();
        Self::with_loader(source, move || {
            OnnxClassifier::load(&path).map(|model| Arc::new(model) as Arc<dyn Classifier>)
        })
    }

    /// Provider backed by an arbitrary loader
    pub fn with_loader<F>(source: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Classifier>> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get_model(&self) -> Result<Arc<dyn Classifier>> {
        self.cell
            .get_or_init(|| {
                tracing::info!(source = %self.source, "Loading classifier");
                let loaded = (self.loader)();
                match &loaded {
                    Ok(_) => tracing::info!(source = %self.source, "Classifier loaded"),
                    Err(e) => tracing::error!(source = %self.source, error = %e, "Classifier failed to load"),
                }
                loaded
            })
            .clone()
    }

    /// Whether a load has already succeeded. Never triggers a load.
    pub fn is_ready(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }
}
