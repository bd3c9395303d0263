//! S3-compatible object store backed by the AWS SDK

use super::ObjectStore;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::types::ObjectEntry;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// [`ObjectStore`] over one bucket of an S3-compatible service
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from static credentials
    ///
    /// The SDK's own retry layer is disabled so a failed request fails once; callers
    /// opt into retries explicitly.
    pub async fn new(config: &StoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.key_id,
            &config.application_key,
            None,
            None,
            "asset-courier",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .timeout_config(
                aws_config::timeout::TimeoutConfig::builder()
                    .operation_timeout(config.timeout)
                    .build(),
            );
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            endpoint = ?config.endpoint,
            bucket = %config.bucket,
            region = %config.region,
            "created S3 client"
        );

        Self::from_client(S3Client::from_conf(s3_config), config.bucket.clone())
    }

    /// Wrap an existing client (for tests and custom SDK setups)
    pub fn from_client(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Bucket this store reads from
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|err| sdk_failure(&err))?;

            for object in response.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(ObjectEntry {
                    key: key.to_string(),
                    size: object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                });
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StoreError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let missing = err.as_service_error().is_some_and(|e| e.is_no_such_key())
                    || err
                        .raw_response()
                        .is_some_and(|r| r.status().as_u16() == 404);
                if missing {
                    StoreError::NotFound {
                        bucket: self.bucket.clone(),
                        key: key.to_string(),
                    }
                } else {
                    sdk_failure(&err)
                }
            })?;

        let io_error = |path: &Path, e: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = local_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }

        let mut file = File::create(local_path)
            .await
            .map_err(|e| io_error(local_path, e))?;

        let mut body = response.body;
        while let Some(chunk) = body.try_next().await.map_err(|e| StoreError::Network {
            message: e.to_string(),
            retryable: true,
        })? {
            file.write_all(&chunk)
                .await
                .map_err(|e| io_error(local_path, e))?;
        }

        file.flush().await.map_err(|e| io_error(local_path, e))?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

/// Classify an SDK failure; timeouts, dispatch failures, throttling and 5xx are retryable
fn sdk_failure<E>(err: &SdkError<E, HttpResponse>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let retryable = match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => true,
        _ => err.raw_response().is_some_and(|r| {
            let status = r.status().as_u16();
            status == 429 || status >= 500
        }),
    };
    StoreError::Network {
        message: DisplayErrorContext(err).to_string(),
        retryable,
    }
}
