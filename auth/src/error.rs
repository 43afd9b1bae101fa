use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to hash password: {0}")]
    PasswordHasherError(String),

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Missing credentials")]
    MissingCredentials,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
