use thiserror::Error;

use super::credentials::CredentialsError;

#[derive(Error, Debug)]
pub enum PostSignerError {
    #[error("Credentials unavailable: {0}")]
    CredentialsUnavailable(#[from] CredentialsError),
    #[error("Unknown region '{region}' for service '{service}'")]
    UnknownRegion { region: String, service: String },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Unable to encode policy document: {0}")]
    Encoding(String),
    #[error("Unable to calculate a request signature: {0}")]
    Signing(String),
}

impl From<serde_json::Error> for PostSignerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<hmac::digest::InvalidLength> for PostSignerError {
    fn from(err: hmac::digest::InvalidLength) -> Self {
        Self::Signing(err.to_string())
    }
}
