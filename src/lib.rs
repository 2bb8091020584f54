pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod state;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;

pub use state::AppState;

/// The complete HTTP application
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .route("/auth/signin", get(handlers::pages::sign_in_page))
        .merge(auth_public_routes())
        .merge(account_routes())
        .merge(organization_routes())
        .merge(page_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/signin", post(auth::signin_post))
        .route("/api/auth/signup", post(auth::signup_post))
        .route("/api/auth/signout", post(auth::signout_post))
        .route("/api/auth/check", get(auth::check_get))
        .route("/api/auth/reset-password", post(auth::reset_request_post))
        .route("/api/auth/reset-password/confirm", post(auth::reset_confirm_post))
}

/// Routes for any signed-in user, with or without an organization
fn account_routes() -> Router<AppState> {
    use handlers::protected::{organizations, time_entries, user};

    Router::new()
        .route(
            "/api/organizations",
            get(organizations::organization_get).post(organizations::organization_post),
        )
        .route("/api/user/profile", get(user::profile_get).put(user::profile_put))
        .route("/api/user/theme", get(user::theme_get).put(user::theme_put))
        .route(
            "/api/time-entries",
            get(time_entries::time_entries_get)
                .post(time_entries::time_entries_post)
                .put(time_entries::time_entries_put),
        )
}

/// Routes scoped to the caller's organization
fn organization_routes() -> Router<AppState> {
    use handlers::protected::{dashboard, projects, tags, tasks, teams, users};

    Router::new()
        .route("/api/projects", get(projects::projects_get).post(projects::projects_post))
        .route(
            "/api/projects/:project_id",
            get(projects::project_get).patch(projects::project_patch),
        )
        .route("/api/tasks", get(tasks::tasks_get).post(tasks::tasks_post))
        .route(
            "/api/tasks/:task_id",
            get(tasks::task_get)
                .put(tasks::task_put)
                .patch(tasks::task_patch)
                .delete(tasks::task_delete),
        )
        .route("/api/tags", get(tags::tags_get).post(tags::tags_post))
        .route("/api/tags/:tag_id", delete(tags::tag_delete))
        .route("/api/teams", get(teams::teams_get).post(teams::teams_post))
        .route(
            "/api/teams/:team_id/members",
            post(teams::team_members_post)
                .put(teams::team_members_put)
                .delete(teams::team_members_delete),
        )
        .route("/api/teams/:team_id/projects", post(teams::team_projects_post))
        .route(
            "/api/teams/:team_id/projects/:project_id",
            delete(teams::team_project_delete),
        )
        .route("/api/users", get(users::users_get).post(users::users_post))
        .route("/api/dashboard", get(dashboard::dashboard_get))
        .route("/api/analytics", get(dashboard::analytics_get))
}

/// Server-rendered pages behind the gatekeeper
fn page_routes(state: AppState) -> Router<AppState> {
    use handlers::pages::app_page;

    Router::new()
        .route("/", get(app_page))
        .route("/dashboard", get(app_page))
        .route("/dashboard/*rest", get(app_page))
        .route("/settings", get(app_page))
        .route("/settings/*rest", get(app_page))
        .route("/profile", get(app_page))
        .route("/profile/*rest", get(app_page))
        .route_layer(from_fn_with_state(state, middleware::gatekeeper))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match state.db.health_check().await {
        Ok(()) => Ok(Json(json!({
            "status": "ok",
            "service": "productiveflow",
            "version": env!("CARGO_PKG_VERSION"),
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Database unavailable"))
        }
    }
}
