use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;

use db::{
    users::{self, UserProfile},
    PoolExt,
};
use freelance_desk_db as db;

use crate::{auth::Authenticated, shared_state::AppState, Error, Result};

fn avatar_location(user: db::object_id::UserId) -> String {
    format!("avatars/{user}")
}

async fn get_me(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<impl IntoResponse> {
    let profile = state
        .db
        .interact(move |conn| {
            users::table
                .filter(users::user_id.eq(user_id))
                .select(UserProfile::as_select())
                .first::<UserProfile>(conn)
                .optional()
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::NotFound)?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
struct UpdateProfilePayload {
    name: String,
}

async fn update_me(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(Error::invalid("name", "Name must not be empty"));
    }

    let profile = state
        .db
        .interact(move |conn| {
            diesel::update(users::table.filter(users::user_id.eq(user_id)))
                .set((users::name.eq(payload.name), users::updated.eq(Utc::now())))
                .get_result::<users::User>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok(Json(UserProfile {
        user_id: profile.user_id,
        email: profile.email,
        name: profile.name,
        avatar_location: profile.avatar_location,
        created: profile.created,
    }))
}

async fn upload_avatar(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if body.is_empty() {
        return Err(Error::invalid("body", "Avatar upload was empty"));
    }

    let location = avatar_location(user_id);
    state.files.put(&location, body).await?;

    state
        .db
        .interact(move |conn| {
            diesel::update(users::table.filter(users::user_id.eq(user_id)))
                .set((
                    users::avatar_location.eq(Some(location)),
                    users::updated.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_avatar(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<impl IntoResponse> {
    let location = state
        .db
        .interact(move |conn| {
            users::table
                .filter(users::user_id.eq(user_id))
                .select(users::avatar_location)
                .first::<Option<String>>(conn)
                .map_err(Error::from)
        })
        .await?
        .ok_or(Error::NotFound)?;

    let bytes = state.files.get_bytes(&location).await.map_err(|e| {
        if e.is_not_found() {
            Error::NotFound
        } else {
            Error::from(e)
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/octet-stream"),
    );

    Ok((headers, bytes))
}

pub fn configure() -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/me/avatar", post(upload_avatar).get(get_avatar))
}
