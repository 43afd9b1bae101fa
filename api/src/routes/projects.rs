use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use db::{
    access::{AccessLevel, ProjectRole},
    object_id::ProjectId,
    projects::{self, NewProject, Project},
    PoolExt, ProjectStatus,
};
use freelance_desk_db as db;

use crate::{
    auth::{require_project_access, Authenticated},
    shared_state::AppState,
    Error, Result,
};

#[derive(Debug, Serialize)]
struct ProjectResponse {
    #[serde(flatten)]
    project: Project,
    /// The caller's relationship to this project.
    role: ProjectRole,
}

async fn list_projects(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<impl IntoResponse> {
    let (owned, member) = state
        .db
        .interact(move |conn| {
            let owned = projects::table
                .filter(projects::owner_id.eq(user_id))
                .select(Project::as_select())
                .load::<Project>(conn)?;

            let memberships = db::project_clients::table
                .filter(db::project_clients::client_id.eq(user_id))
                .select(db::project_clients::project_id);
            let member = projects::table
                .filter(projects::project_id.eq_any(memberships))
                .select(Project::as_select())
                .load::<Project>(conn)?;

            Ok::<_, Error>((owned, member))
        })
        .await?;

    let mut entries = owned
        .into_iter()
        .map(|project| (project, ProjectRole::Owner))
        .chain(
            member
                .into_iter()
                .map(|project| (project, ProjectRole::Client)),
        )
        .collect::<Vec<_>>();
    entries.sort_by_key(|(project, _)| project.created);

    let response = entries
        .into_iter()
        .map(|(project, role)| ProjectResponse { project, role })
        .collect::<Vec<_>>();

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct CreateProjectPayload {
    name: String,
    #[serde(default)]
    description: String,
    deadline: Option<NaiveDate>,
}

async fn create_project(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(Error::invalid("name", "Project name must not be empty"));
    }

    let project = state
        .db
        .interact(move |conn| {
            diesel::insert_into(projects::table)
                .values(&NewProject {
                    project_id: ProjectId::new(),
                    owner_id: user_id,
                    name: payload.name,
                    description: payload.description,
                    deadline: payload.deadline,
                    status: ProjectStatus::Active,
                })
                .get_result::<Project>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse {
            project,
            role: ProjectRole::Owner,
        }),
    ))
}

async fn get_project(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let (project, role) = state
        .db
        .interact(move |conn| {
            let role = require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            let project = projects::table
                .filter(projects::project_id.eq(project_id))
                .select(Project::as_select())
                .first::<Project>(conn)
                .optional()?
                .ok_or(Error::NotFound)?;

            Ok::<_, Error>((project, role))
        })
        .await?;

    Ok(Json(ProjectResponse { project, role }))
}

#[derive(Debug, Deserialize)]
struct UpdateProjectPayload {
    name: String,
    #[serde(default)]
    description: String,
    deadline: Option<NaiveDate>,
    status: ProjectStatus,
}

async fn update_project(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse> {
    if payload.name.trim().is_empty() {
        return Err(Error::invalid("name", "Project name must not be empty"));
    }

    let project = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            diesel::update(projects::table.filter(projects::project_id.eq(project_id)))
                .set((
                    projects::name.eq(payload.name),
                    projects::description.eq(payload.description),
                    projects::deadline.eq(payload.deadline),
                    projects::status.eq(payload.status),
                    projects::updated.eq(Utc::now()),
                ))
                .get_result::<Project>(conn)
                .map_err(Error::from)
        })
        .await?;

    Ok(Json(ProjectResponse {
        project,
        role: ProjectRole::Owner,
    }))
}

pub fn configure() -> Router {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:project_id",
            get(get_project).put(update_project),
        )
}
