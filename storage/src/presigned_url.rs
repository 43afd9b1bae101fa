use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;

use crate::{error::Error, provider::Provider};

pub struct PresignedUrl {
    pub method: http::Method,
    pub uri: http::Uri,
    pub headers: http::HeaderMap,
}

impl Provider {
    /// Signs a GET for one object so the browser can fetch it straight from
    /// the bucket. Other providers stream the bytes through the API instead.
    pub async fn create_presigned_download_url(
        &self,
        location: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl, Error> {
        match self {
            Self::S3 {
                client,
                bucket,
                prefix,
                ..
            } => {
                let key = match prefix {
                    Some(prefix) => format!("{prefix}/{location}"),
                    None => location.to_string(),
                };

                let presign_config = PresigningConfig::expires_in(expires_in)
                    .map_err(|e| Error::PresignedUriCreation(e.to_string()))?;

                let presigned = client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .presigned(presign_config)
                    .await
                    .map_err(|e| Error::PresignedUriCreation(e.to_string()))?;

                let method = http::Method::from_bytes(presigned.method().as_bytes())
                    .map_err(|_| Error::PresignedUriCreation("invalid method".to_string()))?;
                let uri = presigned.uri().parse::<http::Uri>()?;

                let mut headers = http::HeaderMap::new();
                for (name, value) in presigned.headers() {
                    if let (Ok(name), Ok(value)) = (
                        http::header::HeaderName::try_from(name),
                        http::header::HeaderValue::from_str(value),
                    ) {
                        headers.insert(name, value);
                    }
                }

                Ok(PresignedUrl {
                    method,
                    uri,
                    headers,
                })
            }
            _ => Err(Error::PresignedUriNotSupported),
        }
    }
}
