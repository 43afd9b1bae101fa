use object_store::{local::LocalFileSystem, memory::InMemory, path::Path};

use crate::{
    error::{Error, Result},
    operator::Operator,
    s3::{create_client, create_store},
};

pub use crate::s3::S3ProviderConfig;

#[derive(Debug, Clone)]
pub enum ProviderConfig {
    S3(S3ProviderConfig),
    Local,
    /// Keeps objects in process memory. Only useful for tests.
    Memory,
}

#[derive(Debug)]
pub enum Provider {
    S3 {
        config: S3ProviderConfig,
        client: aws_sdk_s3::Client,
        bucket: String,
        prefix: Option<Path>,
    },
    Local {
        root: String,
    },
    Memory,
}

impl Provider {
    /// `base_location` is the bucket name plus an optional key prefix for
    /// S3, or the root directory for local storage.
    pub fn new(config: ProviderConfig, base_location: &str) -> Result<Self> {
        match config {
            ProviderConfig::S3(config) => {
                if base_location.is_empty() {
                    return Err(Error::MissingField("base_location"));
                }

                let (bucket, prefix) = match base_location.split_once('/') {
                    Some((bucket, prefix)) => (bucket.to_string(), Some(Path::from(prefix))),
                    None => (base_location.to_string(), None),
                };

                let client = create_client(&config);
                Ok(Provider::S3 {
                    config,
                    client,
                    bucket,
                    prefix,
                })
            }
            ProviderConfig::Local => {
                if base_location.is_empty() {
                    return Err(Error::MissingField("base_location"));
                }

                std::fs::create_dir_all(base_location)?;
                Ok(Provider::Local {
                    root: base_location.to_string(),
                })
            }
            ProviderConfig::Memory => Ok(Provider::Memory),
        }
    }

    pub fn create_operator(&self) -> Result<Operator> {
        let operator = match self {
            Self::S3 {
                config,
                bucket,
                prefix,
                ..
            } => Operator {
                store: Box::new(create_store(config, bucket)?),
                path_prefix: prefix.clone(),
            },
            Self::Local { root } => Operator {
                store: Box::new(LocalFileSystem::new_with_prefix(root)?),
                path_prefix: None,
            },
            Self::Memory => Operator {
                store: Box::new(InMemory::new()),
                path_prefix: None,
            },
        };

        Ok(operator)
    }

    /// Only S3 can hand the browser a direct link to the object.
    pub fn supports_presigned_urls(&self) -> bool {
        matches!(self, Self::S3 { .. })
    }
}
