use chrono::{DateTime, NaiveDate, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::{
    enums::MilestoneStatus,
    object_id::{MilestoneId, ProjectId, UserId},
    schema::*,
};

pub use crate::schema::milestones::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(milestone_id))]
pub struct Milestone {
    pub milestone_id: MilestoneId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: MilestoneStatus,
    pub due_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub actual_completion_date: Option<NaiveDate>,
    pub order_number: i32,
    pub created_by: UserId,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = milestones)]
pub struct NewMilestone {
    pub milestone_id: MilestoneId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: MilestoneStatus,
    pub due_date: NaiveDate,
    pub target_date: Option<NaiveDate>,
    pub order_number: i32,
    pub created_by: UserId,
}

pub fn list_for_project(
    conn: &mut PgConnection,
    project: ProjectId,
) -> Result<Vec<Milestone>, diesel::result::Error> {
    table
        .filter(project_id.eq(project))
        .order((order_number.asc(), due_date.asc()))
        .select(Milestone::as_select())
        .load::<Milestone>(conn)
}

/// Moves a milestone to a new stored status, stamping the completion date
/// when it lands on Completed and clearing it otherwise.
pub fn set_status(
    conn: &mut PgConnection,
    milestone: MilestoneId,
    new_status: MilestoneStatus,
    today: NaiveDate,
) -> Result<Option<Milestone>, diesel::result::Error> {
    let completion = match new_status {
        MilestoneStatus::Completed => Some(today),
        _ => None,
    };

    diesel::update(table.filter(milestone_id.eq(milestone)))
        .set((
            status.eq(new_status),
            actual_completion_date.eq(completion),
            updated.eq(Utc::now()),
        ))
        .get_result::<Milestone>(conn)
        .optional()
}
