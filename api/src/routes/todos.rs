use axum::{
    extract::{Path, Query},
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
    object_id::{ProjectId, TodoId},
    status::{self, DerivedStatus},
    todos::{self, NewTodo, Todo},
    PoolExt,
};
use freelance_desk_db as db;

use crate::{
    auth::{require_project_access, Authenticated},
    shared_state::AppState,
    Error, Result,
};

#[derive(Debug, Serialize)]
struct TodoResponse {
    #[serde(flatten)]
    todo: Todo,
    /// Derived from the row and today's date, never stored.
    display_status: DerivedStatus,
}

fn todo_response(todo: Todo, today: NaiveDate) -> TodoResponse {
    let display_status = status::todo_status(&todo, today);
    TodoResponse {
        todo,
        display_status,
    }
}

async fn list_todos(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse> {
    let todos = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            todos::list_for_project(conn, project_id).map_err(Error::from)
        })
        .await?;

    let today = Utc::now().date_naive();
    let response = todos
        .into_iter()
        .map(|todo| todo_response(todo, today))
        .collect::<Vec<_>>();

    Ok(Json(response))
}

fn default_upcoming_days() -> i64 {
    14
}

#[derive(Debug, Deserialize)]
struct UpcomingParams {
    #[serde(default = "default_upcoming_days")]
    days: i64,
}

async fn upcoming_todos(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Query(params): Query<UpcomingParams>,
) -> Result<impl IntoResponse> {
    let todos = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Read)?;
            todos::list_for_project(conn, project_id).map_err(Error::from)
        })
        .await?;

    let today = Utc::now().date_naive();
    let response = status::upcoming_within_days(&todos, today, params.days)
        .into_iter()
        .cloned()
        .map(|todo| todo_response(todo, today))
        .collect::<Vec<_>>();

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct TodoPayload {
    title: String,
    #[serde(default)]
    description: String,
    due_date: Option<NaiveDate>,
}

async fn create_todo(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<TodoPayload>,
) -> Result<impl IntoResponse> {
    if payload.title.trim().is_empty() {
        return Err(Error::invalid("title", "Title must not be empty"));
    }

    let todo = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            diesel::insert_into(todos::table)
                .values(&NewTodo {
                    todo_id: TodoId::new(),
                    project_id,
                    title: payload.title,
                    description: payload.description,
                    completed: false,
                    due_date: payload.due_date,
                    created_by: user_id,
                })
                .get_result::<Todo>(conn)
                .map_err(Error::from)
        })
        .await?;

    let today = Utc::now().date_naive();
    Ok((StatusCode::CREATED, Json(todo_response(todo, today))))
}

async fn update_todo(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, todo_id)): Path<(ProjectId, TodoId)>,
    Json(payload): Json<TodoPayload>,
) -> Result<impl IntoResponse> {
    if payload.title.trim().is_empty() {
        return Err(Error::invalid("title", "Title must not be empty"));
    }

    let todo = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            diesel::update(
                todos::table.filter(
                    todos::todo_id
                        .eq(todo_id)
                        .and(todos::project_id.eq(project_id)),
                ),
            )
            .set((
                todos::title.eq(payload.title),
                todos::description.eq(payload.description),
                todos::due_date.eq(payload.due_date),
                todos::updated.eq(Utc::now()),
            ))
            .get_result::<Todo>(conn)
            .optional()?
            .ok_or(Error::NotFound)
        })
        .await?;

    let today = Utc::now().date_naive();
    Ok(Json(todo_response(todo, today)))
}

async fn delete_todo(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, todo_id)): Path<(ProjectId, TodoId)>,
) -> Result<impl IntoResponse> {
    state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::Manage)?;

            let deleted = diesel::delete(
                todos::table.filter(
                    todos::todo_id
                        .eq(todo_id)
                        .and(todos::project_id.eq(project_id)),
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
struct TogglePayload {
    completed: bool,
}

/// The one todo mutation clients share with the owner.
async fn toggle_todo(
    Extension(ref state): Extension<AppState>,
    Authenticated(user_id): Authenticated,
    Path((project_id, todo_id)): Path<(ProjectId, TodoId)>,
    Json(payload): Json<TogglePayload>,
) -> Result<impl IntoResponse> {
    let todo = state
        .db
        .interact(move |conn| {
            require_project_access(conn, user_id, project_id, AccessLevel::ToggleCompletion)?;

            let exists = todos::table
                .filter(
                    todos::todo_id
                        .eq(todo_id)
                        .and(todos::project_id.eq(project_id)),
                )
                .select(todos::todo_id)
                .first::<TodoId>(conn)
                .optional()?;
            if exists.is_none() {
                return Err(Error::NotFound);
            }

            todos::set_completed(conn, todo_id, payload.completed)?.ok_or(Error::NotFound)
        })
        .await?;

    let today = Utc::now().date_naive();
    Ok(Json(todo_response(todo, today)))
}

pub fn configure() -> Router {
    Router::new()
        .route(
            "/projects/:project_id/todos",
            get(list_todos).post(create_todo),
        )
        .route("/projects/:project_id/todos/upcoming", get(upcoming_todos))
        .route(
            "/projects/:project_id/todos/:todo_id",
            put(update_todo).delete(delete_todo),
        )
        .route(
            "/projects/:project_id/todos/:todo_id/toggle",
            post(toggle_todo),
        )
}
