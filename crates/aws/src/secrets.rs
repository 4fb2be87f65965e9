//! Secrets Manager retrieval for the GitHub App private key.

use aws_sdk_secretsmanager::error::DisplayErrorContext;

/// Errors from secret retrieval.
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("failed to retrieve secret {secret_id}: {message}")]
    Get { secret_id: String, message: String },

    /// The secret exists but holds binary data, not a string.
    #[error("secret {secret_id} has no string value")]
    NotAString { secret_id: String },
}

/// Fetch a secret's string value by name or ARN, using the ambient AWS
/// credential chain.
pub async fn get_secret(secret_id: &str) -> Result<String, SecretsError> {
    let sdk = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_secretsmanager::Client::new(&sdk);

    let output = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| SecretsError::Get {
            secret_id: secret_id.to_string(),
            message: format!("{}", DisplayErrorContext(&e)),
        })?;

    output
        .secret_string()
        .map(str::to_string)
        .ok_or_else(|| SecretsError::NotAString {
            secret_id: secret_id.to_string(),
        })
}
