use chrono::{DateTime, SubsecRound, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::signer_error::PostSignerError;

type HmacSha256 = Hmac<Sha256>;

// AWS SigV4 constants
pub const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const AWS_REQUEST: &str = "aws4_request";
pub const AWS_SERVICE: &str = "s3";
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
pub const DATE_STAMP_FORMAT: &str = "%Y%m%d";

/// Time and scope shared by the signing key, the credential field and the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    pub region: String,
    pub service: String,
    pub algorithm: &'static str,
    pub date_stamp: String,
    pub timestamp: String,
}

impl SigningContext {
    pub fn new(now: DateTime<Utc>, region: &str, service: &str) -> Self {
        // Both strings come from the same truncated instant so they can never disagree
        let now = now.trunc_subsecs(0);
        Self {
            region: region.to_string(),
            service: service.to_string(),
            algorithm: AWS_ALGORITHM,
            date_stamp: now.format(DATE_STAMP_FORMAT).to_string(),
            timestamp: now.format(AMZ_DATE_FORMAT).to_string(),
        }
    }

    pub fn scope(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.date_stamp, self.region, self.service, AWS_REQUEST
        )
    }

    /// Value of the `X-Amz-Credential` field for `access_key_id`.
    pub fn credential(&self, access_key_id: &str) -> String {
        format!("{}/{}", access_key_id, self.scope())
    }
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PostSignerError> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derives the SigV4 signing key for one day, region and service.
pub fn derive_signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, PostSignerError> {
    let k_date = hmac_sha256(
        format!("AWS4{}", secret_access_key).as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    let k_signing = hmac_sha256(&k_service, AWS_REQUEST.as_bytes())?;
    debug!("Signing key derived for {}/{}/{}", date_stamp, region, service);
    Ok(k_signing)
}

/// Hex HMAC of the base64 policy, as sent in `X-Amz-Signature`.
pub fn sign_policy(signing_key: &[u8], encoded_policy: &str) -> Result<String, PostSignerError> {
    Ok(hex::encode(hmac_sha256(
        signing_key,
        encoded_policy.as_bytes(),
    )?))
}

pub fn verify_policy_signature(
    signing_key: &[u8],
    encoded_policy: &str,
    signature: &str,
) -> Result<bool, PostSignerError> {
    let expected = sign_policy(signing_key, encoded_policy)?;
    Ok(expected
        .as_bytes()
        .ct_eq(signature.to_ascii_lowercase().as_bytes())
        .into())
}
