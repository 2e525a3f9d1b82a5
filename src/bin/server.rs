//! lessongate REST API Server
//!
//! Run with: cargo run --features server --bin lessongate-server
//!
//! Endpoints:
//!   GET  /api/roles                    - Roles with rank and permissions
//!   GET  /api/roles/:role/permissions  - Permissions of one role
//!   POST /api/check                    - Check role/resource/action
//!   POST /api/profiles                 - Create a profile (409 if the id exists)
//!   GET  /api/profiles/:id             - Fetch a profile
//!   POST /api/profiles/:id/role        - Assign a role (actor needs users:update)
//!   POST /api/session/check            - Check for a user via their stored profile

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lessongate::{
    is_allowed, permissions_for, Action, GateError, Profile, ProfileStore, Resource, Role,
    SessionContext,
};

type AppState = Arc<ProfileStore>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct CheckReq {
    role: String,
    resource: String,
    action: String,
}

#[derive(Deserialize)]
struct ProfileReq {
    id: String,
    display_name: String,
    role: String,
}

#[derive(Deserialize)]
struct AssignRoleReq {
    actor: String,
    role: String,
}

#[derive(Deserialize)]
struct SessionCheckReq {
    user_id: String,
    resource: String,
    action: String,
}

#[derive(Serialize)]
struct RoleInfo {
    role: Role,
    rank: u8,
    permissions: Vec<String>,
}

#[derive(Serialize)]
struct CheckResult {
    allowed: bool,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse { ok: true, data: Some(data), error: None }))
}

fn fail<T>(e: GateError) -> Reply<T> {
    let status = match e {
        GateError::UnknownRole(_)
        | GateError::UnknownResource(_)
        | GateError::UnknownAction(_)
        | GateError::MalformedPermission(_)
        | GateError::InvalidUserId(_) => StatusCode::BAD_REQUEST,
        GateError::UnknownUser(_) => StatusCode::NOT_FOUND,
        GateError::UserExists(_) => StatusCode::CONFLICT,
        GateError::Forbidden { .. } => StatusCode::FORBIDDEN,
        GateError::Corrupted(_) | GateError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse { ok: false, data: None, error: Some(e.to_string()) }))
}

fn reply<T>(r: lessongate::Result<T>) -> Reply<T> {
    match r {
        Ok(v) => ok(v),
        Err(e) => fail(e),
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_roles() -> Reply<Vec<RoleInfo>> {
    ok(Role::by_rank()
        .into_iter()
        .map(|role| RoleInfo { role, rank: role.rank(), permissions: permissions_for(role).names() })
        .collect())
}

async fn get_role_permissions(Path(role): Path<String>) -> Reply<Vec<String>> {
    reply(role.parse::<Role>().map(|r| permissions_for(r).names()))
}

async fn post_check(Json(req): Json<CheckReq>) -> Reply<CheckResult> {
    reply((|| -> lessongate::Result<CheckResult> {
        let role: Role = req.role.parse()?;
        let resource: Resource = req.resource.parse()?;
        let action: Action = req.action.parse()?;
        Ok(CheckResult { allowed: is_allowed(role, resource, action) })
    })())
}

async fn post_profile(State(store): State<AppState>, Json(req): Json<ProfileReq>) -> Reply<Profile> {
    reply((|| -> lessongate::Result<Profile> {
        let profile = Profile::new(req.id, req.display_name, req.role.parse()?);
        store.create_profile(&profile)?;
        Ok(profile)
    })())
}

async fn get_profile(State(store): State<AppState>, Path(id): Path<String>) -> Reply<Profile> {
    reply(store.get_profile(&id).and_then(|p| p.ok_or(GateError::UnknownUser(id))))
}

async fn post_assign_role(
    State(store): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignRoleReq>,
) -> Reply<Profile> {
    reply((|| -> lessongate::Result<Profile> {
        let role: Role = req.role.parse()?;
        store.assign_role(&req.actor, &id, role)
    })())
}

async fn post_session_check(
    State(store): State<AppState>,
    Json(req): Json<SessionCheckReq>,
) -> Reply<CheckResult> {
    reply((|| -> lessongate::Result<CheckResult> {
        let resource: Resource = req.resource.parse()?;
        let action: Action = req.action.parse()?;
        let mut session = SessionContext::new();
        session.finish_restore(Some(&req.user_id));
        session.hydrate(&*store)?;
        Ok(CheckResult { allowed: session.has_permission(resource, action) })
    })())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_path = std::env::var("LESSONGATE_DB").unwrap_or_else(|_| "./data/lessongate.mdb".into());
    let store = ProfileStore::open(&db_path).expect("Failed to open profile store");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/roles", get(get_roles))
        .route("/api/roles/:role/permissions", get(get_role_permissions))
        .route("/api/check", post(post_check))
        .route("/api/profiles", post(post_profile))
        .route("/api/profiles/:id", get(get_profile))
        .route("/api/profiles/:id/role", post(post_assign_role))
        .route("/api/session/check", post(post_session_check))
        .layer(cors)
        .with_state(Arc::new(store));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    info!(%addr, db = %db_path, "lessongate server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await.expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
