use anyhow::anyhow;
use clap::Parser;
use freelance_desk_storage::{ProviderConfig, S3ProviderConfig};

#[derive(Debug, Parser)]
pub struct Config {
    #[clap(long, env, default_value_t = String::from("127.0.0.1"))]
    pub host: String,
    #[clap(long, env, default_value_t = 7420)]
    pub port: u16,

    #[clap(env, default_value_t = String::from("production"))]
    pub env: String,

    #[clap(long = "db", env)]
    pub database_url: String,

    /// Public URL of the frontend, used when building the links that go
    /// into invite emails.
    #[clap(long, env, default_value_t = String::from("http://localhost:5173"))]
    pub base_url: String,

    #[clap(long, env, help = "Secret used to sign session cookies")]
    pub cookie_secret: String,

    /// Where uploaded files live: local, s3, or memory.
    #[clap(long, env, default_value_t = String::from("local"))]
    pub file_storage: String,
    /// Root directory for local storage, or `bucket[/prefix]` for S3.
    #[clap(long, env, default_value_t = String::from("./file_uploads"))]
    pub file_storage_location: String,

    #[clap(long, env)]
    pub s3_endpoint: Option<String>,
    #[clap(long, env)]
    pub s3_region: Option<String>,
    #[clap(long, env)]
    pub s3_access_key_id: Option<String>,
    #[clap(long, env)]
    pub s3_secret_key: Option<String>,
    #[clap(long, env, default_value_t = false)]
    pub s3_virtual_host_style: bool,

    /// SMTP relay host. When unset, outgoing mail is logged and dropped.
    #[clap(long, env)]
    pub smtp_host: Option<String>,
    #[clap(long, env)]
    pub smtp_username: Option<String>,
    #[clap(long, env)]
    pub smtp_password: Option<String>,
    #[clap(long, env, default_value_t = String::from("FreelanceDesk <no-reply@localhost>"))]
    pub email_from: String,

    /// How often the outbox worker looks for unsent email.
    #[clap(long, env, default_value_t = 15)]
    pub outbox_poll_seconds: u64,
}

impl Config {
    pub fn storage_config(&self) -> Result<ProviderConfig, anyhow::Error> {
        let config = match self.file_storage.as_str() {
            "local" => ProviderConfig::Local,
            "memory" => ProviderConfig::Memory,
            "s3" => ProviderConfig::S3(S3ProviderConfig {
                endpoint: self
                    .s3_endpoint
                    .as_deref()
                    .map(|e| e.parse())
                    .transpose()?,
                region: self.s3_region.clone(),
                access_key_id: self.s3_access_key_id.clone(),
                secret_key: self.s3_secret_key.clone(),
                virtual_host_style: Some(self.s3_virtual_host_style),
            }),
            other => return Err(anyhow!("unknown file storage provider {other}")),
        };

        Ok(config)
    }
}
