use std::env;
use std::fmt;
use std::sync::RwLock;

use thiserror::Error;
use tracing::{debug, instrument};

const AWS_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
const AWS_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
const AWS_SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Missing credential value: {0}")]
    Missing(String),
    #[error("Credentials unavailable: {0}")]
    Unavailable(String),
}

/// Access key pair as handed out by a [`CredentialSource`].
///
/// A session token marks temporary credentials. Anonymous credentials carry no
/// keys at all and tell the signer to skip signing.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    anonymous: bool,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            anonymous: false,
        }
    }

    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: Some(session_token.into()),
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            anonymous: true,
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Copy of these credentials with surrounding whitespace removed from every field.
    pub fn sanitized(&self) -> Self {
        Self {
            access_key_id: self.access_key_id.trim().to_string(),
            secret_access_key: self.secret_access_key.trim().to_string(),
            session_token: self.session_token.as_deref().map(|t| t.trim().to_string()),
            anonymous: self.anonymous,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("anonymous", &self.anonymous)
            .finish()
    }
}

pub trait CredentialSource: Send + Sync {
    fn credentials(&self) -> Result<Credentials, CredentialsError>;
}

/// Always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentialSource {
    credentials: Credentials,
}

impl StaticCredentialSource {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialSource for StaticCredentialSource {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.credentials.clone())
    }
}

/// Credentials that can be rotated while signers keep reading them.
///
/// Readers only hold the lock long enough to copy the key fields out.
#[derive(Debug)]
pub struct SharedCredentialSource {
    inner: RwLock<Credentials>,
}

impl SharedCredentialSource {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }

    pub fn replace(&self, credentials: Credentials) -> Result<(), CredentialsError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| CredentialsError::Unavailable("credential lock poisoned".to_string()))?;
        *guard = credentials;
        debug!("Replaced shared credentials");
        Ok(())
    }
}

impl CredentialSource for SharedCredentialSource {
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| CredentialsError::Unavailable("credential lock poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

/// Reads the standard AWS environment variables on every call.
#[derive(Debug, Default, Clone)]
pub struct EnvironmentCredentialSource;

impl EnvironmentCredentialSource {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialSource for EnvironmentCredentialSource {
    #[instrument(name = "environment_credentials", skip(self))]
    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let access_key_id = env::var(AWS_ACCESS_KEY_ID_ENV)
            .map_err(|_| CredentialsError::Missing(AWS_ACCESS_KEY_ID_ENV.to_string()))?;
        let secret_access_key = env::var(AWS_SECRET_ACCESS_KEY_ENV)
            .map_err(|_| CredentialsError::Missing(AWS_SECRET_ACCESS_KEY_ENV.to_string()))?;

        match env::var(AWS_SESSION_TOKEN_ENV) {
            Ok(token) => {
                debug!("Loaded session credentials from environment");
                Ok(Credentials::with_session_token(
                    access_key_id,
                    secret_access_key,
                    token,
                ))
            }
            Err(_) => {
                debug!("Loaded long-term credentials from environment");
                Ok(Credentials::new(access_key_id, secret_access_key))
            }
        }
    }
}
