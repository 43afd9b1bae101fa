use chrono::{DateTime, Duration, Utc};
use diesel::{prelude::*, PgConnection};

use crate::{object_id::EmailId, schema::*};

pub use crate::schema::email_outbox::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name = email_outbox)]
#[diesel(primary_key(email_id))]
pub struct OutboxEmail {
    pub email_id: EmailId,
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = email_outbox)]
pub struct NewOutboxEmail {
    pub email_id: EmailId,
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

/// Queues an email. This is a plain insert so callers can run it inside
/// the same transaction that persists the fact the email is about, which
/// keeps a mail outage from failing the caller's operation.
pub fn enqueue(
    conn: &mut PgConnection,
    email: &NewOutboxEmail,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(table).values(email).execute(conn)?;
    Ok(())
}

/// Retry schedule, 30 seconds doubling per attempt and capped at an hour.
pub fn backoff(attempt: i32) -> Duration {
    let exp = (attempt - 1).clamp(0, 7) as u32;
    Duration::seconds((30i64 << exp).min(3600))
}

/// Claims a batch of due emails for one delivery attempt. Each claimed row
/// has its attempt counter bumped and its next attempt pushed out, so a
/// worker that dies mid-send just delays the email instead of losing it.
/// SKIP LOCKED keeps concurrent workers off each other's batches. Must run
/// inside a transaction.
pub fn claim_due(
    conn: &mut PgConnection,
    now: DateTime<Utc>,
    batch: i64,
) -> Result<Vec<OutboxEmail>, diesel::result::Error> {
    let due = table
        .filter(sent_at.is_null().and(next_attempt_at.le(now)))
        .order(next_attempt_at.asc())
        .limit(batch)
        .for_update()
        .skip_locked()
        .select(OutboxEmail::as_select())
        .load::<OutboxEmail>(conn)?;

    for email in &due {
        diesel::update(table.filter(email_id.eq(email.email_id)))
            .set((
                attempts.eq(email.attempts + 1),
                next_attempt_at.eq(now + backoff(email.attempts + 1)),
            ))
            .execute(conn)?;
    }

    Ok(due)
}

pub fn mark_sent(
    conn: &mut PgConnection,
    email: EmailId,
    now: DateTime<Utc>,
) -> Result<(), diesel::result::Error> {
    diesel::update(table.filter(email_id.eq(email)))
        .set(sent_at.eq(now))
        .execute(conn)?;
    Ok(())
}
