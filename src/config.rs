use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::error::GalleryError;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_PUBLIC_HOST: &str = "s3.amazonaws.com";
const CREDENTIALS_FILE_NAME: &str = "AwsCredentials.properties";

/// Configuration for the S3 transport and the shareable links
#[derive(Debug, Clone)]
pub struct Config {
    pub region: String,
    /// Host used when printing `http://<host>/<bucket>/<key>` links
    pub public_host: String,
    /// Custom endpoint for S3-compatible stores (path-style addressing)
    pub endpoint_url: Option<String>,
    pub credentials_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables and .env file
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid, or if no
    /// home directory can be found for the default credentials file
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if it exists

        let region = env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        Self::validate_region(&region)?;

        let public_host =
            env::var("S3_PUBLIC_HOST").unwrap_or_else(|_| DEFAULT_PUBLIC_HOST.to_string());
        Self::validate_public_host(&public_host)?;

        let endpoint_url = env::var("S3_ENDPOINT_URL").ok().filter(|s| !s.is_empty());

        let credentials_path = match env::var("AWS_CREDENTIALS_FILE") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_credentials_path()
                .context("Cannot locate home directory. Set HOME or AWS_CREDENTIALS_FILE")?,
        };

        Ok(Self {
            region,
            public_host,
            endpoint_url,
            credentials_path,
        })
    }

    /// Validate AWS region format
    fn validate_region(region: &str) -> Result<()> {
        if region.is_empty() {
            anyhow::bail!("AWS_REGION cannot be empty");
        }

        // Basic validation - ensure it looks like a region (contains a dash)
        if !region.contains('-') {
            anyhow::bail!(
                "AWS_REGION '{}' doesn't look like a valid region (e.g., us-west-2, eu-west-1)",
                region
            );
        }

        Ok(())
    }

    fn validate_public_host(host: &str) -> Result<()> {
        if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
            anyhow::bail!(
                "S3_PUBLIC_HOST '{}' must be a bare host name (e.g., s3.amazonaws.com)",
                host
            );
        }
        Ok(())
    }
}

fn default_credentials_path() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(CREDENTIALS_FILE_NAME))
}

/// Validate S3 bucket name according to AWS rules
pub fn validate_bucket_name(bucket: &str) -> std::result::Result<(), GalleryError> {
    let invalid = |reason: String| GalleryError::InvalidBucketName {
        bucket: bucket.to_string(),
        reason,
    };

    if bucket.len() < 3 || bucket.len() > 63 {
        return Err(invalid(format!(
            "must be between 3 and 63 characters (got {})",
            bucket.len()
        )));
    }

    let is_edge = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let (first, last) = match (bucket.chars().next(), bucket.chars().last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(invalid("cannot be empty".to_string())),
    };
    if !is_edge(first) {
        return Err(invalid(
            "must start with a lowercase letter or number".to_string(),
        ));
    }
    if !is_edge(last) {
        return Err(invalid("must end with a lowercase letter or number".to_string()));
    }

    if let Some(c) = bucket
        .chars()
        .find(|&c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.')
    {
        return Err(invalid(format!(
            "contains invalid character '{}'. Only lowercase letters, numbers, hyphens, and periods are allowed",
            c
        )));
    }

    if bucket.contains("..") {
        return Err(invalid("cannot contain consecutive periods".to_string()));
    }

    if bucket
        .split('.')
        .all(|part| part.parse::<u8>().is_ok() && !part.is_empty())
    {
        return Err(invalid("cannot be formatted as an IP address".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_validation() {
        // Valid bucket names
        assert!(validate_bucket_name("my-bucket").is_ok());
        assert!(validate_bucket_name("my.bucket.123").is_ok());
        assert!(validate_bucket_name("abc").is_ok());

        // Invalid bucket names
        assert!(validate_bucket_name("ab").is_err()); // Too short
        assert!(validate_bucket_name(&"a".repeat(64)).is_err()); // Too long
        assert!(validate_bucket_name("MY-BUCKET").is_err()); // Uppercase
        assert!(validate_bucket_name("my_bucket").is_err()); // Underscore
        assert!(validate_bucket_name("-mybucket").is_err()); // Starts with dash
        assert!(validate_bucket_name("mybucket-").is_err()); // Ends with dash
        assert!(validate_bucket_name("my..bucket").is_err()); // Consecutive periods
        assert!(validate_bucket_name("192.168.1.1").is_err()); // IP address format
        assert!(validate_bucket_name("").is_err()); // Empty
    }

    #[test]
    fn test_region_validation() {
        assert!(Config::validate_region("us-west-2").is_ok());
        assert!(Config::validate_region("eu-west-1").is_ok());

        assert!(Config::validate_region("").is_err());
        assert!(Config::validate_region("uswest2").is_err());
    }

    #[test]
    fn test_public_host_validation() {
        assert!(Config::validate_public_host("s3.amazonaws.com").is_ok());
        assert!(Config::validate_public_host("localhost:9000").is_ok());

        assert!(Config::validate_public_host("").is_err());
        assert!(Config::validate_public_host("http://s3.amazonaws.com").is_err());
        assert!(Config::validate_public_host("bad host").is_err());
    }
}
