use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::Serialize;

use crate::{
    file_versions::{version_location, FileVersion, NewFileVersion},
    object_id::{FileId, FileVersionId, ProjectId, UserId},
    schema::*,
};

pub use crate::schema::project_files::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(primary_key(file_id))]
pub struct ProjectFile {
    pub file_id: FileId,
    pub project_id: ProjectId,
    pub file_name: String,
    pub current_version: i32,
    pub mime_type: String,
    pub size: i64,
    pub updated_by: UserId,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = project_files)]
pub struct NewProjectFile {
    pub file_id: FileId,
    pub project_id: ProjectId,
    pub file_name: String,
    pub current_version: i32,
    pub mime_type: String,
    pub size: i64,
    pub updated_by: UserId,
}

pub fn lookup(
    conn: &mut PgConnection,
    project: ProjectId,
    name: &str,
) -> Result<Option<ProjectFile>, diesel::result::Error> {
    table
        .filter(project_id.eq(project).and(file_name.eq(name)))
        .select(ProjectFile::as_select())
        .first::<ProjectFile>(conn)
        .optional()
}

pub fn list_for_project(
    conn: &mut PgConnection,
    project: ProjectId,
) -> Result<Vec<ProjectFile>, diesel::result::Error> {
    table
        .filter(project_id.eq(project))
        .order(file_name.asc())
        .select(ProjectFile::as_select())
        .load::<ProjectFile>(conn)
}

/// Registers an upload, either as version 1 of a new file or as the next
/// version of an existing one. The returned version row carries the object
/// key the bytes should be written to. Callers must run this inside a
/// transaction so the version counter and the version row move together.
pub fn record_upload(
    conn: &mut PgConnection,
    project: ProjectId,
    name: &str,
    mime: &str,
    file_size: i64,
    uploaded_by: UserId,
) -> Result<(ProjectFile, FileVersion), diesel::result::Error> {
    let existing = lookup(conn, project, name)?;

    let file = match existing {
        // The increment happens in SQL so two racing uploads take the row
        // lock in turn and get distinct version numbers.
        Some(file) => diesel::update(table.filter(file_id.eq(file.file_id)))
            .set((
                current_version.eq(current_version + 1),
                mime_type.eq(mime),
                size.eq(file_size),
                updated_by.eq(uploaded_by),
                updated.eq(Utc::now()),
            ))
            .get_result::<ProjectFile>(conn)?,
        None => diesel::insert_into(table)
            .values(&NewProjectFile {
                file_id: FileId::new(),
                project_id: project,
                file_name: name.to_string(),
                current_version: 1,
                mime_type: mime.to_string(),
                size: file_size,
                updated_by: uploaded_by,
            })
            .get_result::<ProjectFile>(conn)?,
    };

    let version = diesel::insert_into(crate::file_versions::table)
        .values(&NewFileVersion {
            file_version_id: FileVersionId::new(),
            file_id: file.file_id,
            version_number: file.current_version,
            location: version_location(project, file.current_version, name),
            size: file_size,
            mime_type: mime.to_string(),
            created_by: uploaded_by,
        })
        .get_result::<FileVersion>(conn)?;

    Ok((file, version))
}
