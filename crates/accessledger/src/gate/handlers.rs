//! Route handlers.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use accessledger_core::policy::join_path;
use accessledger_core::{
    EntryDescriptor, ListingOptions, Notifier, Permissions, User, is_authorized, is_visible,
};
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::{AppState, AuthenticatedUser, GateError};
use crate::model::ListingEntry;

/// GET `<paths.user>`: the caller's identity and permissions.
pub async fn user(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

/// GET `<paths.api>` and `<paths.api>/`: the served root.
pub async fn api_root<N: Notifier>(
    State(state): State<Arc<AppState<N>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    RawQuery(query): RawQuery,
) -> Result<Response, GateError> {
    serve(&state, &user, "/", query.as_deref()).await
}

/// GET `<paths.api>/<path>`: a file or directory below the root.
pub async fn api_path<N: Notifier>(
    State(state): State<Arc<AppState<N>>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, GateError> {
    serve(&state, &user, &format!("/{path}"), query.as_deref()).await
}

async fn serve<N: Notifier>(
    state: &AppState<N>,
    user: &User,
    path: &str,
    query: Option<&str>,
) -> Result<Response, GateError> {
    info!("{} is requesting {path}", user.email());

    if path.split('/').any(|segment| segment == "..") {
        return Err(GateError::NotFound);
    }

    let options = ListingOptions::from_query(query);
    let system_path = PathBuf::from(format!("{}{path}", state.config.system.root));
    let metadata = tokio::fs::metadata(&system_path)
        .await
        .map_err(|_| GateError::NotFound)?;

    let entry = EntryDescriptor::from_metadata(last_segment(path), &metadata);
    if !is_visible(&user.permissions, &entry, options)
        || !is_authorized(&user.permissions, path, entry.is_dir)
    {
        debug!("{path} withheld from {}", user.email());
        return Err(GateError::NotFound);
    }

    let response = if entry.is_dir {
        Json(list_dir(&system_path, path, &user.permissions, options).await?).into_response()
    } else {
        let file = tokio::fs::File::open(&system_path).await?;
        (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (header::CONTENT_LENGTH, metadata.len().to_string()),
            ],
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response()
    };

    state.audit.record_access(user, path);
    Ok(response)
}

/// Visible and authorized children of `dir`, sorted by name.
async fn list_dir(
    dir: &FsPath,
    request_path: &str,
    permissions: &Permissions,
    options: ListingOptions,
) -> Result<Vec<ListingEntry>, GateError> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(child) = reader.next_entry().await? {
        // Vanished since the directory was read.
        let Ok(metadata) = child.metadata().await else {
            continue;
        };

        let name = child.file_name().to_string_lossy().into_owned();
        let descriptor = EntryDescriptor::from_metadata(name.as_str(), &metadata);
        if !is_visible(permissions, &descriptor, options)
            || !is_authorized(permissions, &join_path(request_path, &name), descriptor.is_dir)
        {
            continue;
        }

        entries.push(ListingEntry::from_metadata(name, &metadata));
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Name the request path addresses; empty for the root.
fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}
