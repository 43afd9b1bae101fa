use axum::{http::StatusCode, response::IntoResponse, routing::get, Extension, Json, Router};
use diesel::RunQueryDsl;
use serde::Serialize;

use db::PoolExt;
use freelance_desk_db as db;

use crate::{shared_state::AppState, Error};

#[derive(Serialize)]
struct HealthResponse {
    /// If the database connection is ok
    database: bool,
    /// If all the other fields indicate healthy status.
    healthy: bool,
}

async fn health(Extension(ref state): Extension<AppState>) -> impl IntoResponse {
    let db_result = state
        .db
        .interact(|conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map_err(Error::from)
        })
        .await;

    (
        StatusCode::OK,
        Json(HealthResponse {
            database: db_result.is_ok(),
            healthy: db_result.is_ok(),
        }),
    )
}

pub fn configure() -> Router {
    Router::new().route("/health", get(health))
}
