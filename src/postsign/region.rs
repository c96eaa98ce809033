use std::collections::HashMap;

use tracing::debug;

use super::signer_error::PostSignerError;

const AWS_DOMAIN: &str = "amazonaws.com";
const AWS_CN_DOMAIN: &str = "amazonaws.com.cn";

// Public AWS regions known to the built-in table
const AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "eu-central-1",
    "eu-north-1",
    "eu-south-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "me-south-1",
    "sa-east-1",
    "us-gov-east-1",
    "us-gov-west-1",
];

const AWS_CN_REGIONS: &[&str] = &["cn-north-1", "cn-northwest-1"];

pub trait RegionTable: Send + Sync {
    /// Hostname serving `service` in `region`, without scheme or bucket.
    fn service_endpoint(&self, region: &str, service: &str) -> Result<String, PostSignerError>;
}

/// Region table for the public AWS partitions, plus explicit host overrides.
#[derive(Debug, Default, Clone)]
pub struct AwsRegionTable {
    overrides: HashMap<String, String>,
}

impl AwsRegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Registers `host` as the endpoint for `region`, for any service.
    pub fn add_endpoint(&mut self, region: impl Into<String>, host: impl Into<String>) {
        self.overrides.insert(region.into(), host.into());
    }
}

impl RegionTable for AwsRegionTable {
    fn service_endpoint(&self, region: &str, service: &str) -> Result<String, PostSignerError> {
        if let Some(host) = self.overrides.get(region) {
            debug!("Using configured endpoint {} for region {}", host, region);
            return Ok(host.clone());
        }

        let unknown = || PostSignerError::UnknownRegion {
            region: region.to_string(),
            service: service.to_string(),
        };

        if service.is_empty() {
            return Err(unknown());
        }

        if AWS_CN_REGIONS.contains(&region) {
            return Ok(format!("{}.{}.{}", service, region, AWS_CN_DOMAIN));
        }

        if !AWS_REGIONS.contains(&region) {
            return Err(unknown());
        }

        // S3 in us-east-1 keeps its global hostname
        if region == "us-east-1" && service == "s3" {
            return Ok(format!("{}.{}", service, AWS_DOMAIN));
        }

        Ok(format!("{}.{}.{}", service, region, AWS_DOMAIN))
    }
}
