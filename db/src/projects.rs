use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    enums::ProjectStatus,
    object_id::{ProjectId, UserId},
    schema::*,
};

pub use crate::schema::projects::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(project_id))]
pub struct Project {
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub deadline: Option<chrono::NaiveDate>,
    pub status: ProjectStatus,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub deadline: Option<chrono::NaiveDate>,
    pub status: ProjectStatus,
}
