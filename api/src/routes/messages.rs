use axum::{
    extract::Path, http::StatusCode, response::IntoResponse, routing::get, Extension, Json, Router,
};
use diesel::prelude::*;
use serde::Deserialize;

use db::{
    access::AccessLevel,
    messages::{self, MessageWithAuthor, NewMessage},
    object_id::{MessageId, ProjectId},
    PoolExt,
};
use freelance_desk_db as db;

use crate::{
    auth::{require_project_access, Authenticated},
    shared_state::AppState,
    Error, Result,
};

async fn list_messages(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let messages = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            messages::list_for_project(conn, project_id).map_err(Error::from)
        })
        .await?;

    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    body: String,
}

/// Both sides of the project may post; this is the collaboration channel.
async fn post_message(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<MessagePayload>,
) -> Result<impl IntoResponse> {
    if payload.body.trim().is_empty() {
        return Err(Error::invalid("body", "Message body must not be empty"));
    }

    let message = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;

            let message_id = MessageId::new();
            diesel::insert_into(messages::table)
                .values(&NewMessage {
                    message_id,
                    project_id,
                    user_id,
                    body: payload.body,
                })
                .execute(conn)?;

            messages::table
                .inner_join(db::users::table)
                .filter(messages::message_id.eq(message_id))
                .select((
                    messages::message_id,
                    messages::project_id,
                    messages::user_id,
                    messages::body,
                    messages::created,
                    db::users::name,
                ))
                .first::<MessageWithAuthor>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub fn configure() -> Router {
    Router::new().route(
        "/projects/:project_id/messages",
        get(list_messages).post(post_message),
    )
}
