use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use url::Url;

use super::clock::{Clock, SystemClock};
use super::credentials::CredentialSource;
use super::form_fields::{
    meta_field_name, SignedFormFields, UploadRequest, FIELD_ACL, FIELD_ALGORITHM,
    FIELD_CREDENTIAL, FIELD_DATE, FIELD_KEY, FIELD_POLICY, FIELD_SECURITY_TOKEN,
    FIELD_SIGNATURE,
};
use super::policy::build_policy;
use super::region::{AwsRegionTable, RegionTable};
use super::signer_error::PostSignerError;
use super::signing_key::{derive_signing_key, sign_policy, SigningContext, AWS_SERVICE};

/// Signs browser POST uploads to a bucket.
pub trait PostSigner: Send + Sync {
    /// `https://{bucket}.{service host}` for the configured region.
    fn build_endpoint(&self, bucket: &str) -> Result<String, PostSignerError>;

    /// Form fields authorizing `request`, or an empty set for anonymous credentials.
    fn presign_form(&self, request: &UploadRequest) -> Result<SignedFormFields, PostSignerError>;
}

pub struct AwsPostSigner {
    region: String,
    credentials: Arc<dyn CredentialSource>,
    regions: Arc<dyn RegionTable>,
    clock: Arc<dyn Clock>,
}

impl AwsPostSigner {
    pub fn new(region: impl Into<String>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            region: region.into(),
            credentials,
            regions: Arc::new(AwsRegionTable::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_region_table(mut self, regions: Arc<dyn RegionTable>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Virtual-hosted endpoint for `bucket` on `host`.
///
/// The bucket becomes a DNS label, so IP hosts are rejected here.
pub fn compose_endpoint(bucket: &str, host: &str) -> Result<String, PostSignerError> {
    let endpoint = format!("https://{}.{}", bucket, host);

    Url::parse(&endpoint).map_err(|e| {
        PostSignerError::Configuration(format!("invalid endpoint '{}': {}", endpoint, e))
    })?;

    Ok(endpoint)
}

impl fmt::Debug for AwsPostSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsPostSigner")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl PostSigner for AwsPostSigner {
    fn build_endpoint(&self, bucket: &str) -> Result<String, PostSignerError> {
        let host = self.regions.service_endpoint(&self.region, AWS_SERVICE)?;
        compose_endpoint(bucket, &host)
    }

    #[instrument(
        name = "presign_form",
        skip(self, request),
        fields(
            bucket = %request.bucket,
            key = %request.key,
            region = %self.region,
            metadata_count = request.metadata.len()
        )
    )]
    fn presign_form(&self, request: &UploadRequest) -> Result<SignedFormFields, PostSignerError> {
        let credentials = self.credentials.credentials()?;
        if credentials.is_anonymous() {
            info!("Anonymous credentials, returning unsigned form");
            return Ok(SignedFormFields::new());
        }

        let credentials = credentials.sanitized();
        let session_token = credentials.session_token();

        let context = SigningContext::new(self.clock.now(), &self.region, AWS_SERVICE);
        debug!("Signing at {} with scope {}", context.timestamp, context.scope());

        let signing_key = derive_signing_key(
            credentials.secret_access_key(),
            &context.date_stamp,
            &context.region,
            &context.service,
        )?;

        let credential = context.credential(credentials.access_key_id());

        let mut fields = SignedFormFields::new();
        if let Some(token) = session_token {
            fields.insert(FIELD_SECURITY_TOKEN, token);
        }
        fields.insert(FIELD_ALGORITHM, context.algorithm);
        fields.insert(FIELD_CREDENTIAL, credential.as_str());
        fields.insert(FIELD_DATE, context.timestamp.as_str());
        for (key, value) in &request.metadata {
            fields.insert(meta_field_name(key), value.as_str());
        }

        let policy = build_policy(request, &credential, &context.timestamp, session_token);
        let encoded_policy = policy.encode()?;
        debug!("Policy document encoded ({} bytes)", encoded_policy.len());

        let signature = sign_policy(&signing_key, &encoded_policy)?;

        fields.insert(FIELD_POLICY, encoded_policy);
        fields.insert(FIELD_SIGNATURE, signature);
        fields.insert(FIELD_ACL, request.acl.as_str());
        fields.insert(FIELD_KEY, request.key.as_str());

        info!(
            "Signed POST form for {}/{} with access key {}",
            request.bucket,
            request.key,
            credentials.access_key_id()
        );
        Ok(fields)
    }
}
