pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod services;

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::database::Store;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: &'static AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            config: config::config(),
        }
    }
}

/// Build the full router: public routes, protected `/api` routes behind the
/// JWT middleware, and the global trace/CORS layers
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(protected_routes(state.clone()))
        .layer(from_fn(middleware::trace_id_middleware));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/register", post(auth::register_post))
        .route("/api/login", post(auth::login_post))
        .route("/api/token/refresh", post(auth::refresh_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(project_routes())
        .merge(milestone_routes())
        .merge(task_routes())
        .merge(comment_routes())
        .merge(attachment_routes())
        .route_layer(from_fn_with_state(state, middleware::jwt_auth_middleware))
}

fn account_routes() -> Router<AppState> {
    use handlers::protected::auth;

    Router::new()
        .route("/api/me", get(auth::me_get))
        .route("/api/users/create", post(auth::user_create_post))
        .route("/api/user/tasks", get(auth::user_tasks_get))
}

fn project_routes() -> Router<AppState> {
    use handlers::protected::projects;

    Router::new()
        .route("/api/projects", get(projects::projects_get).post(projects::projects_post))
        .route(
            "/api/projects/:id",
            get(projects::project_get)
                .put(projects::project_update)
                .patch(projects::project_update)
                .delete(projects::project_delete),
        )
        .route("/api/projects/:id/total_hours", get(projects::total_hours_get))
        .route("/api/projects/:id/progress", get(projects::progress_get))
        .route(
            "/api/projects/:id/members",
            get(projects::members_get).post(projects::members_post),
        )
        .route("/api/projects/:id/members/:user_id", delete(projects::member_delete))
        .route("/api/projects/:id/available-users", get(projects::available_users_get))
}

fn milestone_routes() -> Router<AppState> {
    use handlers::protected::milestones;

    Router::new()
        .route(
            "/api/milestones",
            get(milestones::milestones_get).post(milestones::milestones_post),
        )
        .route(
            "/api/milestones/:id",
            get(milestones::milestone_get)
                .put(milestones::milestone_update)
                .patch(milestones::milestone_update)
                .delete(milestones::milestone_delete),
        )
}

fn task_routes() -> Router<AppState> {
    use handlers::protected::tasks;

    Router::new()
        .route("/api/tasks", get(tasks::tasks_get).post(tasks::tasks_post))
        .route(
            "/api/tasks/:id",
            get(tasks::task_get)
                .put(tasks::task_update)
                .patch(tasks::task_update)
                .delete(tasks::task_delete),
        )
        .route("/api/tasks/:id/log_time", post(tasks::log_time_post))
}

fn comment_routes() -> Router<AppState> {
    use handlers::protected::comments;

    Router::new()
        .route("/api/comments", get(comments::comments_get).post(comments::comments_post))
        .route(
            "/api/comments/:id",
            get(comments::comment_get)
                .put(comments::comment_update)
                .patch(comments::comment_update)
                .delete(comments::comment_delete),
        )
}

fn attachment_routes() -> Router<AppState> {
    use handlers::protected::attachments;

    Router::new()
        .route(
            "/api/attachments",
            get(attachments::attachments_get).post(attachments::attachments_post),
        )
        .route(
            "/api/attachments/:id",
            get(attachments::attachment_get)
                .put(attachments::attachment_update)
                .patch(attachments::attachment_update)
                .delete(attachments::attachment_delete),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Project Dashboard API",
            "version": version,
            "description": "Projects, milestones, tasks, time tracking and team membership",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/api/register, /api/login, /api/token/refresh (public)",
                "account": "/api/me, /api/users/create, /api/user/tasks (protected)",
                "projects": "/api/projects[/:id[/total_hours|/progress|/members|/available-users]] (protected)",
                "milestones": "/api/milestones[/:id] (protected)",
                "tasks": "/api/tasks[/:id[/log_time]] (protected)",
                "comments": "/api/comments[/:id] (protected)",
                "attachments": "/api/attachments[/:id] (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
