//! S3 object retrieval for the renovate config template.

use aws_sdk_s3::error::DisplayErrorContext;

/// Errors from template retrieval.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to get s3://{bucket}/{key}: {message}")]
    Get {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("failed to read object body: {0}")]
    Read(String),

    #[error("object body is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// Fetch an object's body as a string, using the ambient AWS credential
/// chain.
pub async fn get_s3_object(bucket: &str, key: &str) -> Result<String, StoreError> {
    let sdk = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_s3::Client::new(&sdk);

    let output = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| StoreError::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: format!("{}", DisplayErrorContext(&e)),
        })?;

    let bytes = output
        .body
        .collect()
        .await
        .map_err(|e| StoreError::Read(e.to_string()))?
        .into_bytes();
    Ok(String::from_utf8(bytes.to_vec())?)
}
