use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};

use crate::{
    object_id::{FileDownloadId, FileId, UserId},
    schema::*,
};

pub use crate::schema::file_downloads::*;

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(primary_key(file_download_id))]
pub struct FileDownload {
    pub file_download_id: FileDownloadId,
    pub file_id: FileId,
    pub user_id: UserId,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = file_downloads)]
pub struct NewFileDownload {
    pub file_download_id: FileDownloadId,
    pub file_id: FileId,
    pub user_id: UserId,
}

/// Records that a user fetched a file. Runs before the redirect to the
/// signed URL is returned.
pub fn record(
    conn: &mut PgConnection,
    file: FileId,
    user: UserId,
) -> Result<(), diesel::result::Error> {
    diesel::insert_into(table)
        .values(&NewFileDownload {
            file_download_id: FileDownloadId::new(),
            file_id: file,
            user_id: user,
        })
        .execute(conn)?;
    Ok(())
}
