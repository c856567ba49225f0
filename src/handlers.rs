use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AnalysisError, Result};
use crate::model::ModelProvider;
use crate::models::{HealthResponse, PredictionResponse};
use crate::session::Session;
use crate::upload::{self, UploadedImage};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

pub async fn predict(
    provider: web::Data<ModelProvider>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("predict", request_id = %request_id);

    async move {
        let upload = read_upload(payload).await.map_err(|e| {
            tracing::warn!(error = %e, "Upload rejected");
            e
        })?;

        tracing::info!(
            filename = upload.filename(),
            size = upload.size(),
            format = upload.format().mime_type(),
            "Analyzing image"
        );

        // Decoding, resizing and the forward pass are CPU bound
        let current = tracing::Span::current();
        let result = web::block(move || {
            let _entered = current.enter();
            let mut session = Session::default();
            session.upload(upload);
            session.analyze(&provider)
        })
        .await
        .map_err(|e| AnalysisError::inference(format!("worker failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!(error = %e, "Analysis failed");
            e
        })?;

        tracing::info!(
            label = %result.label,
            probability = result.probability,
            confidence = %result.confidence_percent(),
            "Analysis complete"
        );

        Ok::<_, AnalysisError>(
            HttpResponse::Ok().json(PredictionResponse::new(request_id, &result)),
        )
    }
    .instrument(span)
    .await
}

pub async fn health(provider: web::Data<ModelProvider>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: provider.is_ready(),
    })
}

/// Read the first file part of the form, stopping as soon as it grows past
/// the upload limit.
async fn read_upload(mut payload: Multipart) -> Result<UploadedImage> {
    while let Some(item) = payload.next().await {
        let mut field = item?;
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_owned);

        let Some(filename) = filename else {
            // Non-file form fields are drained and ignored
            while let Some(chunk) = field.next().await {
                chunk?;
            }
            continue;
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            upload::check_size(bytes.len() + data.len())?;
            bytes.extend_from_slice(&data);
        }

        return UploadedImage::accept(filename, bytes);
    }

    Err(AnalysisError::MissingImage)
}
