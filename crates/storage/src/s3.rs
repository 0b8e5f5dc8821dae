//! AWS SDK implementation of the [`ObjectStore`] capability
//!
//! Serves both AWS S3 and any S3-compatible backend via an endpoint
//! override with path-style addressing. Credentials come from the standard
//! SDK chain (environment, profiles, instance metadata); nothing here reads
//! or stores credentials itself.

use crate::retry::{with_retry, RetryPolicy};
use crate::{ObjectBody, ObjectMeta, ObjectPage, ObjectStore, RawObjectEntry};
use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use chrono::DateTime;
use std::time::Duration;
use tagsweep_errors::{Error, Result, StorageError};

/// Build an S3 client for the given endpoint settings.
///
/// `endpoint` selects a non-AWS S3-compatible store; `force_path_style`
/// is required by most self-hosted backends. The SDK's own retry layer is
/// disabled: retry/backoff policy is owned by [`S3ObjectStore`] so the
/// sweep's request budget stays predictable.
pub async fn build_client(
    endpoint: Option<&str>,
    region: Option<&str>,
    force_path_style: bool,
    timeout: Duration,
) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .retry_config(aws_config::retry::RetryConfig::disabled())
        .timeout_config(
            aws_config::timeout::TimeoutConfig::builder()
                .operation_attempt_timeout(timeout)
                .build(),
        );

    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint.to_string());
    }

    let sdk_config = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(force_path_style)
        .build();

    Client::from_conf(s3_config)
}

/// Production object store backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    retry: RetryPolicy,
}

impl S3ObjectStore {
    #[must_use]
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
    ) -> Result<ObjectPage> {
        let response = with_retry(&self.retry, "list_objects", || {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(prefix) = prefix {
                request = request.prefix(prefix);
            }
            if let Some(token) = token {
                request = request.continuation_token(token);
            }
            async move {
                request
                    .send()
                    .await
                    .map_err(|e| map_sdk_err(&e, "list_objects", bucket))
            }
        })
        .await?;

        let mut entries = Vec::with_capacity(response.contents().len());
        for object in response.contents() {
            let (Some(key), Some(tag)) = (object.key(), object.e_tag()) else {
                tracing::warn!(bucket, "listing entry without key or etag, skipping");
                continue;
            };
            entries.push(RawObjectEntry {
                key: key.to_string(),
                size_bytes: object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                stored_tag: tag.to_string(),
                last_modified: object
                    .last_modified()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
            });
        }

        Ok(ObjectPage {
            entries,
            next_token: response.next_continuation_token().map(String::from),
        })
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        let response = with_retry(&self.retry, "head_object", || {
            let request = self.client.head_object().bucket(bucket).key(key);
            async move {
                request
                    .send()
                    .await
                    .map_err(|e| map_sdk_err(&e, "head_object", key))
            }
        })
        .await?;

        let Some(tag) = response.e_tag() else {
            return Err(StorageError::InvalidResponse {
                message: format!("HEAD response for {key} carries no etag"),
            }
            .into());
        };

        Ok(ObjectMeta {
            stored_tag: tag.to_string(),
            size_bytes: response
                .content_length()
                .and_then(|s| u64::try_from(s).ok())
                .unwrap_or(0),
            part_count: response.parts_count().and_then(|p| u32::try_from(p).ok()),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let response = with_retry(&self.retry, "get_object", || {
            let request = self.client.get_object().bucket(bucket).key(key);
            async move {
                request
                    .send()
                    .await
                    .map_err(|e| map_sdk_err(&e, "get_object", key))
            }
        })
        .await?;

        Ok(Box::new(response.body.into_async_read()))
    }
}

/// Classify an SDK failure into the transport error taxonomy.
fn map_sdk_err<E, R>(err: &SdkError<E, R>, operation: &str, target: &str) -> Error
where
    E: ProvideErrorMetadata,
{
    let storage_err = match err {
        SdkError::TimeoutError(_) => StorageError::Timeout {
            operation: operation.to_string(),
            target: target.to_string(),
        },
        SdkError::DispatchFailure(failure) if failure.is_timeout() => StorageError::Timeout {
            operation: operation.to_string(),
            target: target.to_string(),
        },
        SdkError::DispatchFailure(_) => {
            StorageError::ConnectionFailed(format!("dispatch failure during {operation}"))
        }
        SdkError::ResponseError(_) => StorageError::InvalidResponse {
            message: format!("malformed response during {operation} for {target}"),
        },
        SdkError::ServiceError(_) => {
            let code = err.code().unwrap_or("Unknown");
            let message = err.message().unwrap_or("no message").to_string();
            match code {
                "NoSuchKey" | "NotFound" => StorageError::NoSuchKey {
                    key: target.to_string(),
                },
                "NoSuchBucket" => StorageError::NoSuchBucket {
                    bucket: target.to_string(),
                },
                "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
                    StorageError::AccessDenied { message }
                }
                "SlowDown" | "Throttling" | "TooManyRequests" | "RequestLimitExceeded" => {
                    StorageError::RateLimited { seconds: 1 }
                }
                "InternalError" | "ServiceUnavailable" | "RequestTimeout" => {
                    StorageError::Backend {
                        message: format!("{code}: {message}"),
                        retriable: true,
                    }
                }
                _ => StorageError::Backend {
                    message: format!("{code}: {message}"),
                    retriable: false,
                },
            }
        }
        _ => StorageError::Backend {
            message: format!("unexpected SDK failure during {operation}"),
            retriable: false,
        },
    };

    storage_err.into()
}
