use axum::{
    http::StatusCode, response::IntoResponse, routing::post, Extension, Json, Router,
};
use diesel::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tower_cookies::Cookies;

use db::{
    object_id::UserId,
    users::{self, NewUser, User, UserProfile},
    PoolExt,
};
use freelance_desk_auth as auth;
use freelance_desk_db as db;

use crate::{shared_state::AppState, Error, Result};

/// Light check that an address has a local part, an @, and a dotted domain.
/// Anything stricter rejects real addresses.
static EMAIL_FORMAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

pub fn valid_email(email: &str) -> bool {
    EMAIL_FORMAT.is_match(email)
}

fn profile_of(user: User) -> UserProfile {
    UserProfile {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        avatar_location: user.avatar_location,
        created: user.created,
    }
}

#[derive(Debug, Deserialize)]
struct SignupPayload {
    email: String,
    password: String,
    name: String,
}

async fn signup(
    Extension(ref state): Extension<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse> {
    if !valid_email(&payload.email) {
        return Err(Error::invalid("email", "Invalid email address"));
    }

    if payload.password.len() < 8 {
        return Err(Error::invalid(
            "password",
            "Password must be at least 8 characters",
        ));
    }

    if payload.name.trim().is_empty() {
        return Err(Error::invalid("name", "Name must not be empty"));
    }

    let user = state
        .db
        .interact(move |conn| {
            // Hashing is slow on purpose, so it runs here on the pool's
            // blocking thread rather than on the runtime.
            let password_hash = auth::new_hash(&payload.password)?;

            diesel::insert_into(users::table)
                .values(&NewUser {
                    user_id: UserId::new(),
                    email: payload.email,
                    password_hash: Some(password_hash),
                    name: payload.name,
                })
                .get_result::<User>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => Error::invalid("email", "An account with this email already exists"),
                    e => Error::from(e),
                })
        })
        .await?;

    auth::start_session(&**state, &state.sessions, &cookies, user.user_id).await?;

    Ok((StatusCode::CREATED, Json(profile_of(user))))
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

async fn login(
    Extension(ref state): Extension<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    let user = state
        .db
        .interact(move |conn| {
            // An unknown email fails the same way as a bad password so the
            // response does not reveal which addresses have accounts.
            let user = users::lookup_by_email(conn, &payload.email)?
                .ok_or(Error::AuthError(auth::Error::InvalidPassword))?;

            let hash = user
                .password_hash
                .as_deref()
                .ok_or(Error::AuthError(auth::Error::InvalidPassword))?;
            auth::verify_password(&payload.password, hash)?;

            Ok::<_, Error>(user)
        })
        .await?;

    auth::start_session(&**state, &state.sessions, &cookies, user.user_id).await?;

    Ok(Json(profile_of(user)))
}

async fn logout(
    Extension(ref state): Extension<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse> {
    auth::end_session(&**state, &state.sessions, &cookies).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure() -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::valid_email;

    #[test]
    fn plausible_addresses_pass() {
        assert!(valid_email("client@example.com"));
        assert!(valid_email("a.b+c@mail.co.uk"));
    }

    #[test]
    fn malformed_addresses_fail() {
        assert!(!valid_email(""));
        assert!(!valid_email("no-at-sign"));
        assert!(!valid_email("two@@example.com"));
        assert!(!valid_email("spaces in@example.com"));
        assert!(!valid_email("missing@dot"));
    }
}
