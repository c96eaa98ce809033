use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Path;
use axum::response::Json;
use axum::Extension;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::form_fields::{SignedFormFields, UploadRequest};
use super::policy::format_expiration;
use super::s3_app_error::S3AppError;
use super::AppState;

const DEFAULT_EXPIRES_IN: u64 = 3600;
const MAX_EXPIRES_IN: u64 = 604800;

#[derive(Debug, Default, Deserialize)]
pub struct PresignFormRequest {
    pub expires_in: Option<u64>,
    pub acl: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct PresignFormResponse {
    pub url: String,
    pub fields: SignedFormFields,
    pub expiration: String,
}

/// An empty body means defaults; anything else must be a valid request document.
fn parse_params(body: &[u8]) -> Result<PresignFormRequest, S3AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PresignFormRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected presign form request body: {}", e);
        S3AppError::invalid_argument(&format!("Invalid request body: {}", e))
    })
}

#[instrument(
    name = "presign_form_handler",
    skip(state, body),
    fields(bucket = %bucket, key = %key)
)]
pub async fn handle(
    Extension(state): Extension<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<PresignFormResponse>, S3AppError> {
    let resource = format!("/{}/{}", bucket, key);
    let params = parse_params(&body).map_err(|e| e.with_resource(resource.clone()))?;

    let expires_in = params
        .expires_in
        .unwrap_or(DEFAULT_EXPIRES_IN)
        .clamp(1, MAX_EXPIRES_IN);
    if let Some(requested) = params.expires_in {
        if requested != expires_in {
            warn!(
                "Expiration time {} was clamped to valid range (1-{} seconds)",
                requested, MAX_EXPIRES_IN
            );
        }
    }

    let acl = params.acl.unwrap_or_else(|| state.default_acl.clone());
    if acl.trim().is_empty() {
        return Err(S3AppError::invalid_argument("acl must not be empty").with_resource(resource));
    }

    // Clamped above, so the cast cannot overflow
    let expiration = state.clock.now() + Duration::seconds(expires_in as i64);
    debug!("Form expires at {}", expiration);

    let mut request = UploadRequest::new(expiration, bucket.as_str(), key.as_str(), acl);
    request.metadata = params.metadata;

    let url = state
        .signer
        .build_endpoint(&bucket)
        .map_err(|e| S3AppError::from(e).with_resource(resource.clone()))?;
    let fields = state
        .signer
        .presign_form(&request)
        .map_err(|e| S3AppError::from(e).with_resource(resource.clone()))?;

    if fields.is_empty() {
        info!("Returning unsigned form for {}", resource);
    } else {
        info!(
            "Issued signed form for {}, expires in {} seconds",
            resource, expires_in
        );
    }

    Ok(Json(PresignFormResponse {
        url,
        fields,
        expiration: format_expiration(&expiration),
    }))
}
