use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Environment;

/// Initialize tracing with pretty output for development and JSON for production.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. Events go to stderr so
/// `check` output on stdout stays clean.
pub fn setup_logging(environment: Environment) {
    subscriber(environment, std::io::stderr).init();
}

fn subscriber<W>(environment: Environment, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    match environment {
        Environment::Production => Box::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_level(true)
                    .with_writer(writer),
            ),
        ),
        Environment::Development => Box::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_writer(writer),
            ),
        ),
    }
}
