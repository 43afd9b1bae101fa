use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use tower_cookies::Cookies;
use uuid::Uuid;

use db::{
    access::{self, AccessLevel, ProjectRole},
    object_id::{ProjectId, UserId},
};
use freelance_desk_auth as auth;
use freelance_desk_db as db;

use crate::{shared_state::AppState, shared_state::InnerState, Error};

#[async_trait]
impl auth::SessionStore for InnerState {
    type UserId = UserId;
    type Error = Error;

    async fn create_session(
        &self,
        user: UserId,
        expires: DateTime<Utc>,
    ) -> Result<Uuid, Self::Error> {
        use db::PoolExt;

        let session = db::sessions::Session {
            session_id: db::new_uuid(),
            user_id: user,
            expires,
        };
        let session_id = session.session_id;

        self.db
            .interact(move |conn| {
                diesel::insert_into(db::sessions::table)
                    .values(&session)
                    .execute(conn)
                    .map_err(Error::from)
            })
            .await?;

        Ok(session_id)
    }

    async fn lookup_session(&self, session_id: Uuid) -> Result<Option<UserId>, Self::Error> {
        use db::PoolExt;

        self.db
            .interact(move |conn| {
                db::sessions::table
                    .filter(db::sessions::session_id.eq(session_id))
                    .filter(db::sessions::expires.gt(diesel::dsl::now))
                    .select(db::sessions::user_id)
                    .first::<UserId>(conn)
                    .optional()
                    .map_err(Error::from)
            })
            .await
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<(), Self::Error> {
        use db::PoolExt;

        self.db
            .interact(move |conn| {
                diesel::delete(db::sessions::table)
                    .filter(db::sessions::session_id.eq(session_id))
                    .execute(conn)
                    .map_err(Error::from)
            })
            .await?;

        Ok(())
    }
}

/// The signed-in caller. Rejects the request with Unauthenticated when no
/// valid session cookie is present.
pub struct Authenticated(pub UserId);

/// Like [`Authenticated`] but yields None instead of rejecting, for routes
/// that redirect anonymous callers rather than failing them.
pub struct MaybeAuthenticated(pub Option<UserId>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthenticated
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts
            .extensions
            .get::<AppState>()
            .expect("InnerState extension must be installed")
            .clone();

        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .expect("CookieManagerLayer must be installed");

        let user = auth::current_user(&*app_state, &app_state.sessions, &cookies).await?;
        Ok(MaybeAuthenticated(user))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeAuthenticated(user) = MaybeAuthenticated::from_request_parts(parts, state).await?;
        user.map(Authenticated).ok_or(Error::Unauthenticated)
    }
}

/// Resolves the caller's role and verifies it covers `level`. Runs inside
/// the same connection closure as the guarded query so a denied write never
/// reaches the table. A user with no tie to the project gets NotFound on
/// reads, so project ids cannot be probed for existence.
pub fn require_project_access(
    conn: &mut PgConnection,
    user: UserId,
    project: ProjectId,
    level: AccessLevel,
) -> Result<ProjectRole, Error> {
    match access::role_for(conn, user, project)? {
        Some(role) if access::allowed(Some(role), level) => Ok(role),
        Some(_) => Err(Error::MissingPermission(level)),
        None if matches!(level, AccessLevel::Read) => Err(Error::NotFound),
        None => Err(Error::MissingPermission(level)),
    }
}
