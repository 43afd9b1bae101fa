mod error;
mod password;
mod session;

pub use error::*;
pub use password::{new_hash, verify_password};
pub use session::*;
