//! S3 object operations on explicit bucket / key parameters.

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use s3deploy_sync::{PutObject, RemoteObject, RemoteStoreError};

fn remote_err(operation: &str, err: impl std::error::Error) -> RemoteStoreError {
    RemoteStoreError::new(format!("S3 {operation}: {}", DisplayErrorContext(err)))
}

/// One-key listing: proves the bucket exists and the credentials can read it.
#[instrument(skip(client), fields(%bucket))]
pub(crate) async fn check_access(client: &Client, bucket: &str) -> Result<(), RemoteStoreError> {
    client
        .list_objects_v2()
        .bucket(bucket)
        .max_keys(1)
        .send()
        .await
        .map_err(|e| remote_err("ListObjectsV2", e))?;
    debug!("bucket reachable");
    Ok(())
}

/// List every object under a prefix.
///
/// Automatically paginates through all results.
#[instrument(skip(client), fields(%bucket, %prefix))]
pub(crate) async fn list_objects(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<RemoteObject>, RemoteStoreError> {
    let mut objects = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(ref token) = continuation_token {
            req = req.continuation_token(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| remote_err("ListObjectsV2", e))?;

        for obj in resp.contents() {
            let Some(key) = obj.key() else { continue };
            objects.push(RemoteObject {
                key: key.to_string(),
                etag: obj.e_tag().map(String::from),
                size: obj.size().and_then(|s| u64::try_from(s).ok()),
                last_modified: obj
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
            });
        }

        match resp.next_continuation_token() {
            Some(token) => {
                continuation_token = Some(token.to_string());
            }
            None => break,
        }
    }

    debug!(count = objects.len(), "listed objects");
    Ok(objects)
}

#[instrument(skip(client), fields(%bucket, %key))]
pub(crate) async fn get_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<Vec<u8>, RemoteStoreError> {
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| remote_err("GetObject", e))?;

    let bytes = resp
        .body
        .collect()
        .await
        .map_err(|e| remote_err("read GetObject body", e))?
        .into_bytes();

    debug!(bytes = bytes.len(), "object downloaded");
    Ok(bytes.to_vec())
}

#[instrument(skip(client, object), fields(%bucket, key = %object.key))]
pub(crate) async fn put_object(
    client: &Client,
    bucket: &str,
    object: PutObject,
) -> Result<(), RemoteStoreError> {
    let len = object.body.len();
    client
        .put_object()
        .bucket(bucket)
        .key(object.key)
        .body(ByteStream::from(object.body))
        .set_content_type(object.content_type)
        .cache_control(object.cache_control)
        .send()
        .await
        .map_err(|e| remote_err("PutObject", e))?;

    debug!(len, "object uploaded");
    Ok(())
}

#[instrument(skip(client), fields(%bucket, %key))]
pub(crate) async fn delete_object(
    client: &Client,
    bucket: &str,
    key: &str,
) -> Result<(), RemoteStoreError> {
    client
        .delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| remote_err("DeleteObject", e))?;

    debug!("object deleted");
    Ok(())
}
