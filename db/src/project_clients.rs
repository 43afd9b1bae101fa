use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{
    object_id::{ProjectId, UserId},
    schema::*,
};

pub use crate::schema::project_clients::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(project_id, client_id))]
pub struct ProjectClient {
    pub project_id: ProjectId,
    pub client_id: UserId,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = project_clients)]
pub struct NewProjectClient {
    pub project_id: ProjectId,
    pub client_id: UserId,
}

/// Adds a user to a project's client list. Inserting an existing membership
/// is a no-op so that racing invite redemptions both succeed.
pub fn add_client(
    conn: &mut diesel::PgConnection,
    membership: &NewProjectClient,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(table)
        .values(membership)
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}
