use http::{
    uri::{Authority, Scheme},
    Uri,
};
use object_store::aws::AmazonS3;
use tracing::{event, Level};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct S3ProviderConfig {
    pub endpoint: Option<Uri>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_key: Option<String>,
    pub virtual_host_style: Option<bool>,
}

/// The object_store client that does the actual reads and writes.
pub(crate) fn create_store(config: &S3ProviderConfig, bucket: &str) -> Result<AmazonS3, Error> {
    let virtual_host_style = config.virtual_host_style.unwrap_or(false);

    let mut builder = object_store::aws::AmazonS3Builder::new()
        .with_virtual_hosted_style_request(virtual_host_style)
        .with_bucket_name(bucket);

    match (config.access_key_id.as_ref(), config.secret_key.as_ref()) {
        (Some(access_key_id), Some(secret_key)) => {
            builder = builder
                .with_access_key_id(access_key_id.as_str())
                .with_secret_access_key(secret_key.as_str());
        }
        (Some(_), None) => return Err(Error::MissingField("secret_key")),
        (None, Some(_)) => return Err(Error::MissingField("access_key_id")),
        (None, None) => {}
    };

    if let Some(endpoint) = config.endpoint.as_ref() {
        event!(Level::DEBUG, ?endpoint);
        let needs_scheme = endpoint.scheme().is_none();

        let e = if virtual_host_style {
            // When using virtual host style, object_store requires us to prepend the bucket name
            // to the endpoint.
            let parts = endpoint.to_owned().into_parts();
            let authority = parts
                .authority
                .unwrap_or_else(|| Authority::from_static("missing-host"));
            let new_domain = format!("{}.{}", bucket, authority.as_str());
            let scheme = parts.scheme.unwrap_or(Scheme::HTTPS);

            format!("{}://{}", scheme.as_str(), new_domain)
        } else if needs_scheme {
            // We tolerate a missing https:// in the endpoint, but object_store will panic without it.
            let parts = endpoint.to_owned().into_parts();
            format!("https://{}", parts.authority.unwrap().as_str())
        } else {
            endpoint.to_string()
        };
        event!(Level::DEBUG, endpoint=%e, "Creating S3 provider with custom endpoint");
        builder = builder.with_endpoint(e);
    }

    if let Some(region) = config.region.as_ref() {
        builder = builder.with_region(region.as_str());
    }

    Ok(builder.build()?)
}

/// The AWS SDK client, used only for signing download URLs. It never makes
/// a network call itself.
pub(crate) fn create_client(config: &S3ProviderConfig) -> aws_sdk_s3::Client {
    let region = config
        .region
        .clone()
        .unwrap_or_else(|| "us-east-1".to_string());

    let mut builder = aws_sdk_s3::config::Builder::new()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new(region))
        .force_path_style(!config.virtual_host_style.unwrap_or(false));

    if let (Some(access_key_id), Some(secret_key)) =
        (config.access_key_id.as_ref(), config.secret_key.as_ref())
    {
        builder = builder.credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key_id.clone(),
            secret_key.clone(),
            None,
            None,
            "storage-config",
        ));
    }

    if let Some(endpoint) = config.endpoint.as_ref() {
        builder = builder.endpoint_url(endpoint.to_string());
    }

    aws_sdk_s3::Client::from_conf(builder.build())
}
