use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl, StorageClass,
};
use aws_sdk_s3::Client;
use tracing::{debug, info};

use super::store::{AccessPolicy, ObjectStore, Payload, StorageTier, UploadArtifact};
use crate::config::Config;
use crate::credentials::AccessKeys;
use crate::error::{self, GalleryError};

const CREDENTIALS_SOURCE: &str = "AwsCredentials.properties";

/// The real S3 transport
///
/// Dropping the last handle releases the underlying connection pool.
pub struct S3Client {
    client: Client,
    pub config: Config,
}

impl S3Client {
    pub async fn new(config: Config, keys: AccessKeys) -> Result<Self> {
        let credentials = Credentials::new(
            keys.access_key_id,
            keys.secret_access_key,
            None,
            None,
            CREDENTIALS_SOURCE,
        );

        let mut aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            aws_config = aws_config.endpoint_url(endpoint);
        }

        let sdk_config = aws_config.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();
        let client = Client::from_conf(s3_config);

        Ok(Self { client, config })
    }
}

impl From<StorageTier> for StorageClass {
    fn from(tier: StorageTier) -> Self {
        match tier {
            StorageTier::Standard => StorageClass::Standard,
            StorageTier::ReducedRedundancy => StorageClass::ReducedRedundancy,
        }
    }
}

impl From<AccessPolicy> for ObjectCannedAcl {
    fn from(policy: AccessPolicy) -> Self {
        match policy {
            AccessPolicy::Private => ObjectCannedAcl::Private,
            AccessPolicy::PublicRead => ObjectCannedAcl::PublicRead,
        }
    }
}

impl ObjectStore for S3Client {
    async fn ensure_bucket(&self, bucket: &str) -> error::Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the default location and rejects an explicit constraint
        if self.config.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.config.region.as_str(),
                    ))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("Created bucket {}", bucket);
                Ok(())
            }
            Err(e)
                if e.as_service_error().is_some_and(|se| {
                    se.is_bucket_already_owned_by_you() || se.is_bucket_already_exists()
                }) =>
            {
                debug!("Bucket {} already exists", bucket);
                Ok(())
            }
            Err(e) => Err(GalleryError::write_failed(bucket, "", e)),
        }
    }

    async fn list_keys(&self, bucket: &str) -> error::Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| GalleryError::list_failed(bucket, e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }

        debug!("Listed {} objects in {}", keys.len(), bucket);
        Ok(keys)
    }

    async fn put_object(&self, bucket: &str, artifact: &UploadArtifact) -> error::Result<()> {
        let body = match &artifact.payload {
            Payload::Temp(path) => ByteStream::from_path(path)
                .await
                .map_err(|e| GalleryError::write_failed(bucket, &artifact.key, e))?,
            Payload::Bytes(bytes) => ByteStream::from(bytes.clone()),
        };

        self.client
            .put_object()
            .bucket(bucket)
            .key(&artifact.key)
            .body(body)
            .set_content_type(artifact.content_type.clone())
            .storage_class(artifact.storage_class.into())
            .acl(artifact.access.into())
            .send()
            .await
            .map_err(|e| GalleryError::write_failed(bucket, &artifact.key, e))?;

        debug!("Uploaded s3://{}/{}", bucket, artifact.key);
        Ok(())
    }
}
