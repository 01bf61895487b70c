use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client;
use tracing::{info, instrument};

use s3deploy_sync::RemoteStoreError;

fn remote_err(operation: &str, err: impl std::error::Error) -> RemoteStoreError {
    RemoteStoreError::new(format!("CloudFront {operation}: {}", DisplayErrorContext(err)))
}

/// Start an invalidation and return its id.
#[instrument(skip(client, paths), fields(%distribution_id))]
pub(crate) async fn create_invalidation(
    client: &Client,
    distribution_id: &str,
    paths: &[String],
    caller_reference: &str,
) -> Result<String, RemoteStoreError> {
    let quantity = i32::try_from(paths.len())
        .map_err(|_| RemoteStoreError::new("too many invalidation paths"))?;
    let paths = Paths::builder()
        .quantity(quantity)
        .set_items(Some(paths.to_vec()))
        .build()
        .map_err(|e| remote_err("build Paths", e))?;
    let batch = InvalidationBatch::builder()
        .paths(paths)
        .caller_reference(caller_reference)
        .build()
        .map_err(|e| remote_err("build InvalidationBatch", e))?;

    let resp = client
        .create_invalidation()
        .distribution_id(distribution_id)
        .invalidation_batch(batch)
        .send()
        .await
        .map_err(|e| remote_err("CreateInvalidation", e))?;

    let id = resp
        .invalidation()
        .map(|inv| inv.id().to_string())
        .unwrap_or_default();
    info!(%id, "invalidation created");
    Ok(id)
}
