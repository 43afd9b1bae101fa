use std::sync::Arc;

use freelance_desk_auth::SessionCookieManager;
use freelance_desk_db as db;
use freelance_desk_storage::{Operator, Provider};

/// State shared by every request handler. Mail never appears here; handlers
/// queue it in the database outbox and the worker owns the transport.
pub struct InnerState {
    pub production: bool,
    pub db: db::Pool,

    /// Frontend origin, used when building links that leave the API.
    pub base_url: String,

    pub sessions: SessionCookieManager,

    pub storage: Provider,
    pub files: Operator,
}

pub type AppState = Arc<InnerState>;
