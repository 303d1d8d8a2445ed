use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Failed to load TLS certificate from {path}: {source}")]
    TlsCertificate {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to load macaroon from {path}: {source}")]
    Macaroon {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid macaroon credential: {0}")]
    InvalidCredential(String),

    #[error("Failed to dial {addr}: {reason}")]
    Dial { addr: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
