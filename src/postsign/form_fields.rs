use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// Form field names sent by the browser
pub const FIELD_ALGORITHM: &str = "X-Amz-Algorithm";
pub const FIELD_CREDENTIAL: &str = "X-Amz-Credential";
pub const FIELD_DATE: &str = "X-Amz-Date";
pub const FIELD_SECURITY_TOKEN: &str = "X-Amz-Security-Token";
pub const FIELD_SIGNATURE: &str = "X-Amz-Signature";
pub const FIELD_POLICY: &str = "policy";
pub const FIELD_ACL: &str = "acl";
pub const FIELD_KEY: &str = "key";
pub const META_PREFIX: &str = "X-Amz-Meta-";

/// What the browser is allowed to upload, and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub expiration: DateTime<Utc>,
    pub bucket: String,
    pub key: String,
    pub acl: String,
    pub metadata: BTreeMap<String, String>,
}

impl UploadRequest {
    pub fn new(
        expiration: DateTime<Utc>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        acl: impl Into<String>,
    ) -> Self {
        Self {
            expiration,
            bucket: bucket.into(),
            key: key.into(),
            acl: acl.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub fn meta_field_name(metadata_key: &str) -> String {
    format!("{}{}", META_PREFIX, metadata_key)
}

/// Fields to embed in a `multipart/form-data` POST to the bucket endpoint.
///
/// An empty set means the credentials were anonymous and nothing was signed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignedFormFields(BTreeMap<String, String>);

impl SignedFormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}
