use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::{
    object_id::{MessageId, ProjectId, UserId},
    schema::*,
};

pub use crate::schema::messages::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(message_id))]
pub struct Message {
    pub message_id: MessageId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub body: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub message_id: MessageId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub body: String,
}

/// A message joined with its author's display name for rendering.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct MessageWithAuthor {
    pub message_id: MessageId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub body: String,
    pub created: DateTime<Utc>,
    pub author_name: String,
}

pub fn list_for_project(
    conn: &mut PgConnection,
    project: ProjectId,
) -> Result<Vec<MessageWithAuthor>, diesel::result::Error> {
    table
        .inner_join(crate::users::table)
        .filter(project_id.eq(project))
        .order(created.asc())
        .select((
            message_id,
            project_id,
            user_id,
            body,
            created,
            crate::users::name,
        ))
        .load::<MessageWithAuthor>(conn)
}
