use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::Serialize;

use crate::{
    object_id::{FileId, FileVersionId, ProjectId, UserId},
    schema::*,
};

pub use crate::schema::file_versions::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(file_version_id))]
pub struct FileVersion {
    pub file_version_id: FileVersionId,
    pub file_id: FileId,
    pub version_number: i32,
    pub location: String,
    pub size: i64,
    pub mime_type: String,
    pub created_by: UserId,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = file_versions)]
pub struct NewFileVersion {
    pub file_version_id: FileVersionId,
    pub file_id: FileId,
    pub version_number: i32,
    pub location: String,
    pub size: i64,
    pub mime_type: String,
    pub created_by: UserId,
}

/// Canonical object key for one version of a project file. Every reader
/// and writer of file bytes goes through this scheme.
pub fn version_location(project: ProjectId, version: i32, file_name: &str) -> String {
    format!("{project}/v{version}/{file_name}")
}

pub fn list_for_file(
    conn: &mut PgConnection,
    file: FileId,
) -> Result<Vec<FileVersion>, diesel::result::Error> {
    table
        .filter(file_id.eq(file))
        .order(version_number.desc())
        .select(FileVersion::as_select())
        .load::<FileVersion>(conn)
}

pub fn lookup(
    conn: &mut PgConnection,
    file: FileId,
    version: i32,
) -> Result<Option<FileVersion>, diesel::result::Error> {
    table
        .filter(file_id.eq(file).and(version_number.eq(version)))
        .select(FileVersion::as_select())
        .first::<FileVersion>(conn)
        .optional()
}
