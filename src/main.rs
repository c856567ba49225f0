use std::path::Path;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;

use pcos_backend::config::{Cli, Command, Environment};
use pcos_backend::logging::setup_logging;
use pcos_backend::upload::{self, UploadedImage};
use pcos_backend::{handlers, AnalysisError, ModelProvider, Session};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let environment = Environment::from_env();
    setup_logging(environment);

    let provider = ModelProvider::onnx(&cli.model_path);

    match cli.command {
        Command::Serve { host, port } => serve(provider, environment, &host, port).await,
        Command::Check { file } => check(&provider, &file),
    }
}

async fn serve(
    provider: ModelProvider,
    environment: Environment,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    tracing::info!(
        environment = environment.as_str(),
        model = provider.source(),
        "Starting PCOS detection service"
    );

    if let Err(e) = provider.get_model() {
        tracing::error!(error = %e, "Analysis will be unavailable until the service is restarted");
    }

    let provider = web::Data::new(provider);

    tracing::info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(provider.clone())
            .configure(handlers::configure)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}

fn check(provider: &ModelProvider, file: &Path) -> anyhow::Result<()> {
    let mut session = Session::default();
    let result = read_upload(file)
        .and_then(|image| {
            session.upload(image);
            session.analyze(provider)
        })
        .map_err(|e| {
            tracing::error!(error = %e, "Check failed");
            anyhow::anyhow!(e.user_message())
        })?;

    println!("{}", result.label);
    println!("Confidence: {}", result.confidence_percent());
    Ok(())
}

fn read_upload(file: &Path) -> pcos_backend::Result<UploadedImage> {
    let read_err = |e: std::io::Error| AnalysisError::Upload(format!("{}: {}", file.display(), e));

    let size = std::fs::metadata(file).map_err(read_err)?.len();
    upload::check_size(usize::try_from(size).unwrap_or(usize::MAX))?;

    let bytes = std::fs::read(file).map_err(read_err)?;
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    UploadedImage::accept(filename, bytes)
}
