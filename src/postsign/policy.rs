use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::form_fields::{meta_field_name, UploadRequest};
use super::signer_error::PostSignerError;
use super::signing_key::AWS_ALGORITHM;

// Policy condition names
const CONDITION_BUCKET: &str = "bucket";
const CONDITION_ACL: &str = "acl";
const CONDITION_SECURITY_TOKEN: &str = "x-amz-security-token";
const CONDITION_CREDENTIAL: &str = "x-amz-credential";
const CONDITION_ALGORITHM: &str = "x-amz-algorithm";
const CONDITION_KEY: &str = "key";
const CONDITION_DATE: &str = "x-amz-date";

/// Exact-match condition, serialized as `{"<field>": "<value>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyCondition {
    pub field: String,
    pub value: String,
}

impl PolicyCondition {
    fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl Serialize for PolicyCondition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    expiration: String,
    conditions: Vec<PolicyCondition>,
}

impl PolicyDocument {
    pub fn expiration(&self) -> &str {
        &self.expiration
    }

    pub fn conditions(&self) -> &[PolicyCondition] {
        &self.conditions
    }

    pub fn to_json(&self) -> Result<String, PostSignerError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Base64 of the JSON document, the exact string that gets signed.
    ///
    /// The standard engine never wraps lines, so the result is a single line.
    pub fn encode(&self) -> Result<String, PostSignerError> {
        Ok(general_purpose::STANDARD.encode(self.to_json()?.as_bytes()))
    }
}

pub fn format_expiration(expiration: &DateTime<Utc>) -> String {
    expiration.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Builds the policy binding bucket, key, acl, credential scope, date and metadata.
///
/// Every condition here has a form field with the same value, except the signature.
pub fn build_policy(
    request: &UploadRequest,
    credential: &str,
    timestamp: &str,
    session_token: Option<&str>,
) -> PolicyDocument {
    let mut conditions = Vec::with_capacity(7 + request.metadata.len());
    conditions.push(PolicyCondition::exact(CONDITION_BUCKET, &request.bucket));
    conditions.push(PolicyCondition::exact(CONDITION_ACL, &request.acl));
    if let Some(token) = session_token {
        conditions.push(PolicyCondition::exact(CONDITION_SECURITY_TOKEN, token));
    }
    conditions.push(PolicyCondition::exact(CONDITION_CREDENTIAL, credential));
    conditions.push(PolicyCondition::exact(CONDITION_ALGORITHM, AWS_ALGORITHM));
    conditions.push(PolicyCondition::exact(CONDITION_KEY, &request.key));
    for (key, value) in &request.metadata {
        conditions.push(PolicyCondition::exact(meta_field_name(key), value));
    }
    conditions.push(PolicyCondition::exact(CONDITION_DATE, timestamp));

    PolicyDocument {
        expiration: format_expiration(&request.expiration),
        conditions,
    }
}
