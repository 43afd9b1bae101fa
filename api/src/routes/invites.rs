use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use db::{
    access::AccessLevel,
    email_outbox::{self, NewOutboxEmail},
    object_id::{EmailId, InviteId, ProjectId, UserId},
    project_invites::{self, NewProjectInvite, ProjectInvite, RedeemOutcome},
    PoolExt,
};
use freelance_desk_db as db;
use freelance_desk_mail::templates;

use crate::{
    auth::{require_project_access, Authenticated, MaybeAuthenticated},
    shared_state::AppState,
    Error, Result,
};

use super::auth::valid_email;

/// Queues the invitation email for the outbox worker. Runs inside the same
/// transaction as whatever made the invite current, so a mail outage never
/// fails the request.
fn enqueue_invite_email(
    conn: &mut diesel::PgConnection,
    base_url: &str,
    invite: &ProjectInvite,
) -> Result<()> {
    let (project_name, owner_name) = db::projects::table
        .inner_join(db::users::table)
        .filter(db::projects::project_id.eq(invite.project_id))
        .select((db::projects::name, db::users::name))
        .first::<(String, String)>(conn)?;

    let redeem_url = format!("{base_url}/invite/{}", invite.token);
    let rendered = templates::invite_email(&project_name, &owner_name, &redeem_url);

    email_outbox::enqueue(
        conn,
        &NewOutboxEmail {
            email_id: EmailId::new(),
            recipient: invite.email.clone(),
            subject: rendered.subject,
            html: rendered.html,
        },
    )?;

    Ok(())
}

async fn list_invites(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let invites = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            project_invites::table
                .filter(project_invites::project_id.eq(project_id))
                .order(project_invites::created.asc())
                .select(ProjectInvite::as_select())
                .load::<ProjectInvite>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok(Json(invites))
}

#[derive(Debug, Deserialize)]
struct CreateInvitePayload {
    email: String,
}

#[derive(Debug, Serialize)]
struct InviteResponse {
    #[serde(flatten)]
    invite: ProjectInvite,
    /// Returned once, at creation. The list route never includes it.
    token: String,
}

async fn create_invite(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<CreateInvitePayload>,
) -> Result<impl IntoResponse> {
    if !valid_email(&payload.email) {
        return Err(Error::invalid("email", "Invalid email address"));
    }

    let base_url = state.base_url.clone();
    let invite = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let invite = diesel::insert_into(project_invites::table)
                .values(&NewProjectInvite {
                    invite_id: InviteId::new(),
                    project_id,
                    email: payload.email,
                    token: project_invites::generate_token(),
                    accepted: false,
                    expires: project_invites::default_expiry(Utc::now()),
                })
                .get_result::<ProjectInvite>(conn)?;

            enqueue_invite_email(conn, &base_url, &invite)?;

            Ok::<_, Error>(invite)
        })
        .await?;

    let token = invite.token.clone();
    Ok((
        StatusCode::CREATED,
        Json(InviteResponse { invite, token }),
    ))
}

/// Queues another email for an existing invite. The token and expiry stay
/// exactly as they were.
async fn resend_invite(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invite_id)): Path<(ProjectId, InviteId)>,
) -> Result<impl IntoResponse> {
    let base_url = state.base_url.clone();
    state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let invite = project_invites::table
                .filter(
                    project_invites::invite_id
                        .eq(invite_id)
                        .and(project_invites::project_id.eq(project_id)),
                )
                .select(ProjectInvite::as_select())
                .first::<ProjectInvite>(conn)
                .optional()?
                .ok_or(Error::NotFound)?;

            enqueue_invite_email(conn, &base_url, &invite)
        })
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// Hard-deletes the invite so its token stops working. Memberships granted
/// from an earlier redemption stay in place.
async fn revoke_invite(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, invite_id)): Path<(ProjectId, InviteId)>,
) -> Result<impl IntoResponse> {
    state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let deleted = diesel::delete(
                project_invites::table.filter(
                    project_invites::invite_id
                        .eq(invite_id)
                        .and(project_invites::project_id.eq(project_id)),
                ),
            )
            .execute(conn)?;

            if deleted == 0 {
                Err(Error::NotFound)
            } else {
                Ok(())
            }
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Applies a redemption for a signed-in user and returns the project the
/// invite belongs to. Redeeming an already-accepted invite succeeds without
/// touching the membership table.
async fn redeem_invite(state: &AppState, user_id: UserId, token: String) -> Result<ProjectId> {
    state
        .db
        .transaction(move |conn| {
            let invite = project_invites::lookup_by_token(conn, &token)?.ok_or(Error::NotFound)?;

            match project_invites::redeem_outcome(&invite, Utc::now()) {
                RedeemOutcome::AlreadyAccepted => Ok(invite.project_id),
                RedeemOutcome::Expired => Err(Error::ExpiredInvite),
                RedeemOutcome::Grant => {
                    project_invites::grant(conn, &invite, user_id)?;
                    Ok(invite.project_id)
                }
            }
        })
        .await
}

/// The link from the invitation email. Anonymous visitors go sign in first,
/// with the invite path preserved so they come straight back.
async fn redeem_page(
    Extension(ref state): Extension<AppState>,
    MaybeAuthenticated(user): MaybeAuthenticated,
    Path(token): Path<String>,
) -> Result<Response> {
    let user_id = match user {
        Some(user_id) => user_id,
        None => {
            let target = format!("/login?next=/invite/{token}");
            return Ok(Redirect::to(&target).into_response());
        }
    };

    let project_id = redeem_invite(state, user_id, token).await?;
    let target = format!("/projects/{project_id}");
    Ok(Redirect::to(&target).into_response())
}

#[derive(Debug, Serialize)]
struct RedeemResponse {
    project_id: ProjectId,
}

async fn redeem_api(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    let project_id = redeem_invite(state, user_id, token).await?;
    Ok(Json(RedeemResponse { project_id }))
}

pub fn configure() -> Router {
    Router::new()
        .route(
            "/projects/:project_id/invites",
            get(list_invites).post(create_invite),
        )
        .route(
            "/projects/:project_id/invites/:invite_id",
            delete(revoke_invite),
        )
        .route(
            "/projects/:project_id/invites/:invite_id/resend",
            post(resend_invite),
        )
        .route("/invites/:token/redeem", post(redeem_api))
}

/// The browser-facing redemption route lives at the root, not under /api,
/// because it is the target of the emailed link.
pub fn configure_public() -> Router {
    Router::new().route("/invite/:token", get(redeem_page))
}
