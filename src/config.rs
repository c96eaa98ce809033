use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::postsign::{
    default_acl, default_log_level, Config, CredentialConfig, ENDPOINT_CHECK_BUCKET,
};
use crate::postsign::region::{AwsRegionTable, RegionTable};
use crate::postsign::signer::compose_endpoint;
use crate::postsign::signing_key::AWS_SERVICE;

/// Loads the service configuration from a TOML file or from environment variables.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from environment variables with fallback defaults
    pub fn load() -> Result<Config> {
        let address = env::var("POSTSIGN_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("POSTSIGN_PORT").unwrap_or_else(|_| "8334".to_string());
        let log_level = env::var("POSTSIGN_LOG_LEVEL").unwrap_or_else(|_| default_log_level());
        let region = env::var("POSTSIGN_REGION")
            .or_else(|_| env::var("AWS_REGION"))
            .unwrap_or_else(|_| "us-east-1".to_string());
        let acl = env::var("POSTSIGN_DEFAULT_ACL").unwrap_or_else(|_| default_acl());

        let credentials = Self::load_credentials();
        let endpoints = Self::load_endpoints()?;

        Ok(Config {
            address,
            port,
            log_level,
            region,
            default_acl: acl,
            credentials,
            endpoints,
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Unable to read {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Config> {
        toml::from_str(contents).map_err(|e| anyhow!("Invalid configuration file: {}", e))
    }

    /// Static credentials are only taken when POSTSIGN_STATIC_CREDENTIALS is set;
    /// otherwise the signer reads the AWS_* variables on every request.
    fn load_credentials() -> Option<CredentialConfig> {
        let enabled = env::var("POSTSIGN_STATIC_CREDENTIALS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        if !enabled {
            return None;
        }

        match (
            env::var("AWS_ACCESS_KEY_ID"),
            env::var("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Ok(access_key_id), Ok(secret_access_key)) => Some(CredentialConfig {
                access_key_id,
                secret_access_key,
                session_token: env::var("AWS_SESSION_TOKEN").ok(),
            }),
            _ => None,
        }
    }

    /// Endpoint overrides as a JSON object, e.g. `{"local": "storage.internal:9000"}`
    fn load_endpoints() -> Result<HashMap<String, String>> {
        match env::var("POSTSIGN_ENDPOINTS") {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| anyhow!("Invalid POSTSIGN_ENDPOINTS JSON format: {}", e)),
            Err(_) => Ok(HashMap::new()),
        }
    }

    /// Validate loaded configuration
    pub fn validate(config: &Config) -> Result<()> {
        config
            .port
            .parse::<u16>()
            .map_err(|_| anyhow!("Invalid port number: {}", config.port))?;

        match config.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(anyhow!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    config.log_level
                ))
            }
        }

        if config.region.trim().is_empty() {
            return Err(anyhow!("Region must not be empty"));
        }

        let host = AwsRegionTable::with_overrides(config.endpoints.clone())
            .service_endpoint(&config.region, AWS_SERVICE)
            .map_err(|e| anyhow!("{}", e))?;
        compose_endpoint(ENDPOINT_CHECK_BUCKET, &host).map_err(|e| anyhow!("{}", e))?;

        if config.default_acl.trim().is_empty() {
            return Err(anyhow!("Default ACL must not be empty"));
        }

        if let Some(creds) = &config.credentials {
            if creds.access_key_id.trim().is_empty() {
                return Err(anyhow!("Static credentials have an empty access key ID"));
            }
            if creds.secret_access_key.trim().is_empty() {
                return Err(anyhow!("Static credentials have an empty secret access key"));
            }
        }

        Ok(())
    }

    /// Print configuration help
    pub fn print_help() {
        println!("Postsign Configuration - Environment Variables");
        println!("==============================================");
        println!();
        println!("  POSTSIGN_ADDRESS            Bind address (default: 0.0.0.0)");
        println!("  POSTSIGN_PORT               Server port (default: 8334)");
        println!("  POSTSIGN_LOG_LEVEL          Log level (default: info)");
        println!("  POSTSIGN_REGION             Signing region (default: AWS_REGION or us-east-1)");
        println!("  POSTSIGN_DEFAULT_ACL        ACL when the request sets none (default: private)");
        println!("  POSTSIGN_ENDPOINTS          JSON map of region to endpoint host");
        println!("  POSTSIGN_STATIC_CREDENTIALS Read AWS_* once at startup (true/false)");
        println!();
        println!("Credentials:");
        println!("  AWS_ACCESS_KEY_ID           Access key");
        println!("  AWS_SECRET_ACCESS_KEY       Secret key");
        println!("  AWS_SESSION_TOKEN           Session token for temporary credentials");
        println!();
        println!("A ./config.toml file takes precedence over the environment.");
    }
}
