//! Command line and environment configuration

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_MODEL_PATH: &str = "pcos_detection_model.onnx";

#[derive(Parser, Debug)]
#[command(name = "pcos-backend")]
#[command(about = "PCOS detection from ultrasound images", long_about = None)]
pub struct Cli {
    /// Path to the ONNX classifier
    #[arg(short, long, env = "PCOS_MODEL_PATH", default_value = DEFAULT_MODEL_PATH, global = true)]
    pub model_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen address
        #[arg(long, env = "PCOS_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Listen port
        #[arg(short, long, env = "PCOS_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Classify a single image file and print the result
    Check {
        /// JPG, JPEG or PNG image
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Development);
        assert_eq!(Environment::Production.as_str(), "production");
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["pcos-backend", "serve"]).unwrap();
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_with_model_path() {
        let cli = Cli::try_parse_from([
            "pcos-backend",
            "check",
            "scan.png",
            "--model-path",
            "/models/pcos.onnx",
        ])
        .unwrap();

        assert_eq!(cli.model_path, PathBuf::from("/models/pcos.onnx"));
        assert!(matches!(cli.command, Command::Check { file } if file == PathBuf::from("scan.png")));
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["pcos-backend"]).is_err());
    }
}
