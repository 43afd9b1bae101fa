use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use db::{
    access::AccessLevel,
    milestones::{self, Milestone, NewMilestone},
    object_id::{MilestoneId, ProjectId},
    status::{self, DerivedStatus},
    MilestoneStatus, PoolExt,
};
use freelance_desk_db as db;

use crate::{
    auth::{require_project_access, Authenticated},
    shared_state::AppState,
    Error, Result,
};

#[derive(Debug, Serialize)]
struct MilestoneResponse {
    #[serde(flatten)]
    milestone: Milestone,
    /// Derived for display; the stored status only changes through the
    /// status route.
    display_status: DerivedStatus,
}

fn milestone_response(milestone: Milestone, today: NaiveDate) -> MilestoneResponse {
    let display_status = status::milestone_status(&milestone, today);
    MilestoneResponse {
        milestone,
        display_status,
    }
}

async fn list_milestones(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let milestones = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            milestones::list_for_project(conn, project_id).map_err(Error::from)
        })
        .await?;

    let today = Utc::now().date_naive();
    let response = milestones
        .into_iter()
        .map(|milestone| milestone_response(milestone, today))
        .collect::<Vec<_>>();

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct MilestonePayload {
    title: String,
    #[serde(default)]
    description: String,
    due_date: NaiveDate,
    target_date: Option<NaiveDate>,
    order_number: Option<i32>,
}

async fn create_milestone(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<MilestonePayload>,
) -> Result<impl IntoResponse> {
    if payload.title.trim().is_empty() {
        return Err(Error::invalid("title", "Title must not be empty"));
    }

    let milestone = state
        .db
        .transaction(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let order_number = match payload.order_number {
                Some(n) => n,
                None => {
                    // Append to the end of the project's timeline.
                    milestones::table
                        .filter(milestones::project_id.eq(project_id))
                        .select(diesel::dsl::max(milestones::order_number))
                        .first::<Option<i32>>(conn)?
                        .unwrap_or(0)
                        + 1
                }
            };

            diesel::insert_into(milestones::table)
                .values(&NewMilestone {
                    milestone_id: MilestoneId::new(),
                    project_id,
                    title: payload.title,
                    description: payload.description,
                    status: MilestoneStatus::Pending,
                    due_date: payload.due_date,
                    target_date: payload.target_date,
                    order_number,
                    created_by: user_id,
                })
                .get_result::<Milestone>(conn)
                .map_err(Error::from)
        })
        .await?;

    let today = Utc::now().date_naive();
    Ok((StatusCode::CREATED, Json(milestone_response(milestone, today))))
}

async fn update_milestone(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, milestone_id)): Path<(ProjectId, MilestoneId)>,
    Json(payload): Json<MilestonePayload>,
) -> Result<impl IntoResponse> {
    if payload.title.trim().is_empty() {
        return Err(Error::invalid("title", "Title must not be empty"));
    }

    let milestone = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let current = milestones::table
                .filter(
                    milestones::milestone_id
                        .eq(milestone_id)
                        .and(milestones::project_id.eq(project_id)),
                )
                .select(Milestone::as_select())
                .first::<Milestone>(conn)
                .optional()?
                .ok_or(Error::NotFound)?;

            diesel::update(milestones::table.filter(milestones::milestone_id.eq(milestone_id)))
                .set((
                    milestones::title.eq(payload.title),
                    milestones::description.eq(payload.description),
                    milestones::due_date.eq(payload.due_date),
                    milestones::target_date.eq(payload.target_date),
                    milestones::order_number
                        .eq(payload.order_number.unwrap_or(current.order_number)),
                    milestones::updated.eq(Utc::now()),
                ))
                .get_result::<Milestone>(conn)
                .map_err(Error::from)
        })
        .await?;

    let today = Utc::now().date_naive();
    Ok(Json(milestone_response(milestone, today)))
}

async fn delete_milestone(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, milestone_id)): Path<(ProjectId, MilestoneId)>,
) -> Result<impl IntoResponse> {
    state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let deleted = diesel::delete(
                milestones::table.filter(
                    milestones::milestone_id
                        .eq(milestone_id)
                        .and(milestones::project_id.eq(project_id)),
                ),
            )
            .execute(conn)?;

            if deleted == 0 {
                Err(Error::NotFound)
            } else {
                Ok(())
            }
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: MilestoneStatus,
}

/// Clients may move a milestone through its stages, like todo completion.
async fn set_milestone_status(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, milestone_id)): Path<(ProjectId, MilestoneId)>,
    Json(payload): Json<StatusPayload>,
) -> Result<impl IntoResponse> {
    let today = Utc::now().date_naive();

    let milestone = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::ToggleCompletion)?;

            let exists = milestones::table
                .filter(
                    milestones::milestone_id
                        .eq(milestone_id)
                        .and(milestones::project_id.eq(project_id)),
                )
                .select(milestones::milestone_id)
                .first::<MilestoneId>(conn)
                .optional()?;
            if exists.is_none() {
                return Err(Error::NotFound);
            }

            milestones::set_status(conn, milestone_id, payload.status, today)?
                .ok_or(Error::NotFound)
        })
        .await?;

    Ok(Json(milestone_response(milestone, today)))
}

pub fn configure() -> Router {
    Router::new()
        .route(
            "/projects/:project_id/milestones",
            get(list_milestones).post(create_milestone),
        )
        .route(
            "/projects/:project_id/milestones/:milestone_id",
            put(update_milestone).delete(delete_milestone),
        )
        .route(
            "/projects/:project_id/milestones/:milestone_id/status",
            post(set_milestone_status),
        )
}
