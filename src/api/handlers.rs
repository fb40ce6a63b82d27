//! API Handlers
//!
//! HTTP request handlers for each replay server endpoint. Every mutating RPC
//! authenticates the caller, reads its request id, and runs through a replay
//! cache so retries never repeat the mutation.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};

use crate::auth::AuthenticationProvider;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    CreateFileRequest, FileResponse, HealthResponse, RenameFileRequest, StatsResponse,
};
use crate::namespace::{FileInfo, Namespace};
use crate::replay::{CallError, DomainError, PurgeExpired, ReplayCache, RequestId, RpcFailure};

/// Header carrying the caller-chosen request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Header carrying the authenticated user name
pub const AUTH_USER_HEADER: &str = "x-auth-user";
/// Header carrying the user's credential
pub const AUTH_CREDENTIAL_HEADER: &str = "x-auth-credential";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub namespace: Arc<Namespace>,
    /// Replay cache guarding `create_file`
    pub creates: ReplayCache<FileInfo>,
    /// Replay cache guarding `rename_file`
    pub renames: ReplayCache<FileInfo>,
    pub auth: Arc<dyn AuthenticationProvider>,
}

impl AppState {
    pub fn new(
        namespace: Namespace,
        creates: ReplayCache<FileInfo>,
        renames: ReplayCache<FileInfo>,
        auth: Arc<dyn AuthenticationProvider>,
    ) -> Self {
        Self {
            namespace: Arc::new(namespace),
            creates,
            renames,
            auth,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> std::result::Result<Self, crate::error::ConfigError> {
        let replay = config.replay()?;
        let namespace = match &config.journal_path {
            Some(path) => Namespace::with_journal(path),
            None => Namespace::new(),
        };
        Ok(Self::new(
            namespace,
            ReplayCache::new(replay.clone()),
            ReplayCache::new(replay),
            config.auth_type.provider(&config.auth_users),
        ))
    }

    /// Caches the cleanup task has to maintain.
    pub fn purgeables(&self) -> Vec<Arc<dyn PurgeExpired>> {
        vec![
            Arc::new(self.creates.clone()) as Arc<dyn PurgeExpired>,
            Arc::new(self.renames.clone()),
        ]
    }

    /// Authenticates the caller and extracts its request id.
    fn admit(&self, headers: &HeaderMap) -> Result<RequestId> {
        let user = header_str(headers, AUTH_USER_HEADER);
        let credential = header_str(headers, AUTH_CREDENTIAL_HEADER);
        self.auth.authenticate(user, credential)?;

        match header_str(headers, REQUEST_ID_HEADER) {
            "" => Err(ApiError::InvalidRequest(format!(
                "Missing {REQUEST_ID_HEADER} header"
            ))),
            id => Ok(RequestId::from(id)),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .trim()
}

/// Handler for POST /files
pub async fn create_file_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFileRequest>,
) -> Result<Json<FileResponse>> {
    let request_id = state.admit(&headers)?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let namespace = Arc::clone(&state.namespace);
    let info = state
        .creates
        .run_once(request_id, move || async move {
            Ok::<_, CallError<DomainError>>(namespace.create_file(&req.path).await?)
        })
        .await?;

    Ok(Json(FileResponse::from(info)))
}

/// Handler for POST /files/rename
pub async fn rename_file_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RenameFileRequest>,
) -> Result<Json<FileResponse>> {
    let request_id = state.admit(&headers)?;
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let namespace = Arc::clone(&state.namespace);
    let info = state
        .renames
        .run_once(request_id, move || async move {
            Ok::<_, CallError<RpcFailure>>(namespace.rename_file(&req.src, &req.dst).await?)
        })
        .await?;

    Ok(Json(FileResponse::from(info)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        create_file: state.creates.stats().into(),
        rename_file: state.renames.stats().into(),
        files: state.namespace.len().await,
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
