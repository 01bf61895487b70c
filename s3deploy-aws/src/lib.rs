//! AWS implementations of the sync engine's remote capabilities.
//!
//! [`AwsRemote`] owns a current-thread tokio runtime and blocks on every SDK
//! call, so the engine itself stays synchronous.

mod cloudfront;
mod s3;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials as SdkCredentials;
use tokio::runtime::Runtime;

use s3deploy_core::Credentials;
use s3deploy_sync::{CacheInvalidator, PutObject, RemoteObject, RemoteStore, RemoteStoreError};

/// Provider name attached to the static credentials.
const CREDENTIALS_PROVIDER: &str = "s3-deploy-config";

/// S3 + CloudFront behind the [`RemoteStore`] and [`CacheInvalidator`] traits.
pub struct AwsRemote {
    runtime: Runtime,
    s3: aws_sdk_s3::Client,
    cloudfront: aws_sdk_cloudfront::Client,
}

impl AwsRemote {
    /// Build both clients from static credentials. No request is sent yet.
    pub fn connect(region: &str, credentials: &Credentials) -> Result<Self, RemoteStoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RemoteStoreError::new(format!("tokio runtime: {e}")))?;

        let provider = SdkCredentials::new(
            credentials.access_id.clone(),
            credentials.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );
        let shared = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .credentials_provider(provider)
                .load(),
        );

        let s3 = aws_sdk_s3::Client::new(&shared);
        let cloudfront = aws_sdk_cloudfront::Client::new(&shared);
        tracing::debug!(%region, "AWS clients initialised");

        Ok(Self {
            runtime,
            s3,
            cloudfront,
        })
    }
}

impl RemoteStore for AwsRemote {
    fn check_access(&self, bucket: &str) -> Result<(), RemoteStoreError> {
        self.runtime.block_on(s3::check_access(&self.s3, bucket))
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<RemoteObject>, RemoteStoreError> {
        self.runtime
            .block_on(s3::list_objects(&self.s3, bucket, prefix))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
        self.runtime.block_on(s3::get_object(&self.s3, bucket, key))
    }

    fn put_object(&self, bucket: &str, object: PutObject) -> Result<(), RemoteStoreError> {
        self.runtime.block_on(s3::put_object(&self.s3, bucket, object))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), RemoteStoreError> {
        self.runtime
            .block_on(s3::delete_object(&self.s3, bucket, key))
    }
}

impl CacheInvalidator for AwsRemote {
    fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        caller_reference: &str,
    ) -> Result<String, RemoteStoreError> {
        self.runtime.block_on(cloudfront::create_invalidation(
            &self.cloudfront,
            distribution_id,
            paths,
            caller_reference,
        ))
    }
}
