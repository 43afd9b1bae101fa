use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::{object_id::UserId, schema::*};

pub use crate::schema::users::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(user_id))]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub avatar_location: Option<String>,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
}

/// The subset of a user row that can be sent back to the user.
#[derive(Clone, Debug, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub avatar_location: Option<String>,
    pub created: DateTime<Utc>,
}

pub fn lookup_by_email(
    conn: &mut PgConnection,
    lookup: &str,
) -> Result<Option<User>, diesel::result::Error> {
    table
        .filter(email.eq(lookup))
        .select(User::as_select())
        .first::<User>(conn)
        .optional()
}
