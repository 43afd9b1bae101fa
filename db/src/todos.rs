use chrono::{DateTime, NaiveDate, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::{
    object_id::{ProjectId, TodoId, UserId},
    schema::*,
};

pub use crate::schema::todos::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(todo_id))]
pub struct Todo {
    pub todo_id: TodoId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_by: UserId,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub todo_id: TodoId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_by: UserId,
}

/// Postgres sorts ascending with NULLs last, so undated todos land at the
/// end of the list.
pub fn list_for_project(
    conn: &mut PgConnection,
    project: ProjectId,
) -> Result<Vec<Todo>, diesel::result::Error> {
    table
        .filter(project_id.eq(project))
        .order((due_date.asc(), created.asc()))
        .select(Todo::as_select())
        .load::<Todo>(conn)
}

/// Flips the completion flag, returning the updated row. Clients as well as
/// the owner may call this one mutation.
pub fn set_completed(
    conn: &mut PgConnection,
    todo: TodoId,
    value: bool,
) -> Result<Option<Todo>, diesel::result::Error> {
    diesel::update(table.filter(todo_id.eq(todo)))
        .set((completed.eq(value), updated.eq(Utc::now())))
        .get_result::<Todo>(conn)
        .optional()
}
