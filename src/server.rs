//! HTTP front end.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::context::{AppContext, Report};
use crate::forms::{CreateTaskForm, EditTaskForm, FormError, ReportForm};
use crate::model::Task;
use crate::scoring::Standing;

const LANDING_PAGE: &str = r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>tally</title></head>
  <body>
    <h1>tally</h1>
    <ul>
      <li><a href="/task">Tasks</a></li>
      <li><a href="/report">Daily report</a></li>
    </ul>
  </body>
</html>
"#;

/// Errors a handler can end with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("task {0} not found")]
    TaskNotFound(i64),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Form(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type HandlerResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub current: Standing,
}

/// Build the HTTP router.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health_check))
        .route("/task", get(list_tasks).post(create_task))
        .route("/task/delete/{id}", post(delete_task))
        .route("/task/edit/{id}", get(edit_task_page).post(edit_task))
        .route("/report", get(show_report).post(record_report))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Run store work on the blocking pool; SQLite calls block the thread.
async fn blocking<T, F>(ctx: AppContext, work: F) -> HandlerResult<T>
where
    F: FnOnce(&AppContext) -> HandlerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&ctx))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn list_tasks(State(ctx): State<AppContext>) -> HandlerResult<Json<TaskList>> {
    let list = blocking(ctx, |ctx| {
        let tasks = ctx.tasks.list()?;
        let current = crate::scoring::standing(&tasks);
        Ok(TaskList { tasks, current })
    })
    .await?;
    Ok(Json(list))
}

async fn create_task(
    State(ctx): State<AppContext>,
    Form(form): Form<CreateTaskForm>,
) -> HandlerResult<Redirect> {
    match form.into_new_task()? {
        Some(new_task) => {
            let task = blocking(ctx, move |ctx| Ok(ctx.tasks.create(&new_task)?)).await?;
            info!(id = task.id, title = %task.title, "created task");
        }
        None => debug!("ignoring task without a title"),
    }
    Ok(Redirect::to("/task"))
}

async fn delete_task(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> HandlerResult<Redirect> {
    if !blocking(ctx, move |ctx| Ok(ctx.tasks.delete(id)?)).await? {
        return Err(AppError::TaskNotFound(id));
    }
    info!(id, "deleted task");
    Ok(Redirect::to("/task"))
}

/// There is no separate edit page; the list is where tasks are edited.
async fn edit_task_page(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> HandlerResult<Redirect> {
    blocking(ctx, move |ctx| {
        ctx.tasks.get(id)?.ok_or(AppError::TaskNotFound(id))
    })
    .await?;
    Ok(Redirect::to("/task"))
}

async fn edit_task(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Form(form): Form<EditTaskForm>,
) -> HandlerResult<Redirect> {
    let task = blocking(ctx, move |ctx| {
        // Check existence first so a missing task is a 404 even with a bad form.
        ctx.tasks.get(id)?.ok_or(AppError::TaskNotFound(id))?;
        let update = form.into_update()?;
        ctx.tasks
            .update(id, &update)?
            .ok_or(AppError::TaskNotFound(id))
    })
    .await?;
    info!(id, priority = task.priority, progress = task.progress, "updated task");
    Ok(Redirect::to("/task"))
}

async fn show_report(State(ctx): State<AppContext>) -> HandlerResult<Json<Report>> {
    let report = blocking(ctx, |ctx| Ok(ctx.report()?)).await?;
    Ok(Json(report))
}

async fn record_report(
    State(ctx): State<AppContext>,
    Form(form): Form<ReportForm>,
) -> HandlerResult<Redirect> {
    let memo = form.memo();
    blocking(ctx, move |ctx| Ok(ctx.record_today(memo)?)).await?;
    Ok(Redirect::to("/report"))
}
