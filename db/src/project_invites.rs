use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use diesel::{prelude::*, PgConnection};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    object_id::{InviteId, ProjectId, UserId},
    project_clients::NewProjectClient,
    schema::*,
};

pub use crate::schema::project_invites::*;

/// How long a fresh invite stays redeemable.
pub const INVITE_VALID_DAYS: i64 = 14;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(invite_id))]
pub struct ProjectInvite {
    pub invite_id: InviteId,
    pub project_id: ProjectId,
    pub email: String,
    /// Tokens only travel inside the invite email and the redemption URL.
    #[serde(skip_serializing)]
    pub token: String,
    pub accepted: bool,
    pub expires: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = project_invites)]
pub struct NewProjectInvite {
    pub invite_id: InviteId,
    pub project_id: ProjectId,
    pub email: String,
    pub token: String,
    pub accepted: bool,
    pub expires: DateTime<Utc>,
}

impl ProjectInvite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires
    }
}

/// Generates an invite token from two UUIDs worth of random data, which
/// keeps it comfortably past 128 bits of entropy.
pub fn generate_token() -> String {
    let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}",
        engine.encode(Uuid::new_v4().as_bytes()),
        engine.encode(Uuid::new_v4().as_bytes())
    )
}

pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(INVITE_VALID_DAYS)
}

/// What redeeming a token should do, decided from the invite row alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Already redeemed. Report success without touching the membership
    /// table, even if the invite has since lapsed.
    AlreadyAccepted,
    /// The invite lapsed before anyone redeemed it.
    Expired,
    /// Grant membership and mark the invite accepted.
    Grant,
}

pub fn redeem_outcome(invite: &ProjectInvite, now: DateTime<Utc>) -> RedeemOutcome {
    if invite.accepted {
        RedeemOutcome::AlreadyAccepted
    } else if invite.is_expired(now) {
        RedeemOutcome::Expired
    } else {
        RedeemOutcome::Grant
    }
}

pub fn lookup_by_token(
    conn: &mut PgConnection,
    lookup: &str,
) -> Result<Option<ProjectInvite>, diesel::result::Error> {
    table
        .filter(token.eq(lookup))
        .select(ProjectInvite::as_select())
        .first::<ProjectInvite>(conn)
        .optional()
}

/// Applies a [`RedeemOutcome::Grant`]. The membership insert runs before the
/// accepted flag is set so that a failure in between leaves the token
/// redeemable. Callers must run this inside a transaction.
pub fn grant(
    conn: &mut PgConnection,
    invite: &ProjectInvite,
    client_id: UserId,
) -> Result<(), diesel::result::Error> {
    crate::project_clients::add_client(
        conn,
        &NewProjectClient {
            project_id: invite.project_id,
            client_id,
        },
    )?;

    diesel::update(table.filter(invite_id.eq(invite.invite_id)))
        .set(accepted.eq(true))
        .execute(conn)?;

    Ok(())
}
