use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use quick_xml::se::to_string;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use super::signer_error::PostSignerError;

#[derive(Serialize, Debug)]
#[serde(rename = "Error")]
pub struct S3Error {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3ErrorCode {
    InvalidArgument,
    InternalError,
    ServiceUnavailable,
}

impl S3ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            S3ErrorCode::InvalidArgument => "InvalidArgument",
            S3ErrorCode::InternalError => "InternalError",
            S3ErrorCode::ServiceUnavailable => "ServiceUnavailable",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            S3ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            S3ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            S3ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            S3ErrorCode::InvalidArgument => "Invalid Argument",
            S3ErrorCode::InternalError => "We encountered an internal error. Please try again.",
            S3ErrorCode::ServiceUnavailable => "Signing credentials are currently unavailable.",
        }
    }
}

pub struct S3AppError {
    pub code: S3ErrorCode,
    pub message: Option<String>,
    pub resource: Option<String>,
}

impl S3AppError {
    pub fn new(code: S3ErrorCode) -> Self {
        Self {
            code,
            message: None,
            resource: None,
        }
    }

    pub fn with_message(code: S3ErrorCode, message: String) -> Self {
        Self {
            code,
            message: Some(message),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: String) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::with_message(S3ErrorCode::InvalidArgument, message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        Self::with_message(S3ErrorCode::InternalError, message.to_string())
    }
}

impl IntoResponse for S3AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let err = S3Error {
            code: self.code.as_str().to_string(),
            message: self
                .message
                .unwrap_or_else(|| self.code.default_message().to_string()),
            resource: self.resource.unwrap_or_else(|| "/".to_string()),
            request_id,
        };

        let status_code = self.code.http_status();
        let xml_body = match to_string(&err) {
            Ok(xml) => xml,
            Err(e) => {
                error!("Failed to serialize error body: {}", e);
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
    <Code>{}</Code>
    <Message>{}</Message>
    <Resource>{}</Resource>
    <RequestId>{}</RequestId>
</Error>"#,
                    err.code, err.message, err.resource, err.request_id
                )
            }
        };

        let mut response = (status_code, xml_body).into_response();
        response
            .headers_mut()
            .insert("content-type", HeaderValue::from_static("application/xml"));
        if let Ok(value) = HeaderValue::from_str(&err.request_id) {
            response.headers_mut().insert("x-amz-request-id", value);
        }

        response
    }
}

impl From<PostSignerError> for S3AppError {
    fn from(err: PostSignerError) -> Self {
        match err {
            // Never echo credential details back to the caller
            PostSignerError::CredentialsUnavailable(_) => {
                Self::new(S3ErrorCode::ServiceUnavailable)
            }
            other => Self::internal_error(&other.to_string()),
        }
    }
}
