use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use db::{
    access::AccessLevel,
    file_downloads, file_versions,
    file_versions::FileVersion,
    object_id::ProjectId,
    project_files::{self, ProjectFile},
    PoolExt,
};
use freelance_desk_db as db;
use freelance_desk_storage as storage;

use crate::{
    auth::{require_project_access, Authenticated},
    shared_state::AppState,
    Error, Result,
};

const FILE_SIZE_LIMIT: usize = 50 * 1048576;

/// How long a presigned download link stays valid.
const PRESIGN_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Serialize)]
struct UploadResponse {
    #[serde(flatten)]
    file: ProjectFile,
    version: FileVersion,
}

async fn list_files(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let files = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            project_files::list_for_project(conn, project_id).map_err(Error::from)
        })
        .await?;

    Ok(Json(files))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    file_name: String,
}

/// Raw-body upload. A repeated name becomes the next version of that file;
/// the bytes land in storage only after the version row is committed, so
/// the version counter never moves backwards.
async fn upload_file(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let file_name = params.file_name;
    if file_name.is_empty() {
        return Err(Error::invalid("file_name", "File name must not be empty"));
    }
    if file_name.contains('/') || file_name.contains("..") {
        return Err(Error::invalid(
            "file_name",
            "File name must be a plain name without path separators",
        ));
    }
    if body.is_empty() {
        return Err(Error::invalid("body", "Upload was empty"));
    }

    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let size = body.len() as i64;

    let (file, version) = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            project_files::record_upload(conn, project_id, &file_name, &mime, size, user_id)
                .map_err(Error::from)
        })
        .await?;

    state.files.put(&version.location, body).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { file, version })))
}

/// Hands the bytes of one version back to the caller, either via a
/// presigned URL when the provider signs them or by streaming directly.
async fn serve_version(state: &AppState, file_name: &str, version: FileVersion) -> Result<Response> {
    if state.storage.supports_presigned_urls() {
        let presigned = state
            .storage
            .create_presigned_download_url(&version.location, PRESIGN_TTL)
            .await?;
        return Ok(Redirect::to(&presigned.uri.to_string()).into_response());
    }

    let bytes = state
        .files
        .get_bytes(&version.location)
        .await
        .map_err(|e: storage::Error| {
            if e.is_not_found() {
                Error::NotFound
            } else {
                Error::from(e)
            }
        })?;

    let headers = [
        (header::CONTENT_TYPE, version.mime_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];

    Ok((headers, bytes).into_response())
}

async fn download_file(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, file_name)): Path<(ProjectId, String)>,
) -> Result<Response> {
    let lookup_name = file_name.clone();
    let version = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;

            let file =
                project_files::lookup(conn, project_id, &lookup_name)?.ok_or(Error::NotFound)?;
            let version = file_versions::lookup(conn, file.file_id, file.current_version)?
                .ok_or(Error::NotFound)?;
            file_downloads::record(conn, file.file_id, user_id)?;

            Ok::<_, Error>(version)
        })
        .await?;

    serve_version(state, &file_name, version).await
}

async fn list_versions(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, file_name)): Path<(ProjectId, String)>,
) -> Result<impl IntoResponse> {
    let versions = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;

            let file =
                project_files::lookup(conn, project_id, &file_name)?.ok_or(Error::NotFound)?;
            file_versions::list_for_file(conn, file.file_id).map_err(Error::from)
        })
        .await?;

    Ok(Json(versions))
}

async fn download_version(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, file_name, version_number)): Path<(ProjectId, String, i32)>,
) -> Result<Response> {
    let lookup_name = file_name.clone();
    let version = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;

            let file =
                project_files::lookup(conn, project_id, &lookup_name)?.ok_or(Error::NotFound)?;
            let version =
                file_versions::lookup(conn, file.file_id, version_number)?.ok_or(Error::NotFound)?;
            file_downloads::record(conn, file.file_id, user_id)?;

            Ok::<_, Error>(version)
        })
        .await?;

    serve_version(state, &file_name, version).await
}

pub fn configure() -> Router {
    Router::new()
        .route(
            "/projects/:project_id/files",
            get(list_files).post(upload_file),
        )
        .route("/files/:project_id/:file_name", get(download_file))
        .route(
            "/files/:project_id/:file_name/versions",
            get(list_versions),
        )
        .route(
            "/files/:project_id/:file_name/versions/:version",
            get(download_version),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(FILE_SIZE_LIMIT))
}
