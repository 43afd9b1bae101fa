mod error;
mod operator;
mod presigned_url;
mod provider;
mod s3;

pub use error::*;
pub use operator::*;
pub use presigned_url::*;
pub use provider::*;
pub use s3::S3ProviderConfig;
