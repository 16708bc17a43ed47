//! End-to-end requests against the router over a temporary file tree.

#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use accessledger::{AppState, build_router};
use accessledger_core::{AuditBatch, AuditPipeline, Config, Notifier, PermissionTable, Result};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

const USERS: &str = r#"{
    "admin@example.com": {"admin": true, "canShowHidden": true, "canShowProtected": true},
    "alice@example.com": {"paths": ["/docs/*"]},
    "bob@example.com": {"paths": ["/docs/private/report.txt"]},
    "quiet@example.com": {"paths": ["/docs/*"], "ignoreAccess": true}
}"#;

struct Collecting {
    tx: mpsc::UnboundedSender<AuditBatch>,
}

impl Notifier for Collecting {
    fn notify(&self, batch: AuditBatch) -> impl Future<Output = Result<()>> + Send {
        let _ = self.tx.send(batch);
        async { Ok(()) }
    }
}

struct Fixture {
    root: TempDir,
    app: Router,
    state: Arc<AppState<Collecting>>,
    batches: mpsc::UnboundedReceiver<AuditBatch>,
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

fn write(root: &Path, relative: &str, contents: &str, mode: u32) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    set_mode(&path, mode);
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let base = root.path();

    write(base, "docs/a.txt", "alpha", 0o644);
    write(base, "docs/.secret", "hidden", 0o644);
    write(base, "docs/private.txt", "protected", 0o600);
    write(base, "docs/private/report.txt", "report", 0o644);
    write(base, "other/x.txt", "other", 0o644);
    std::fs::create_dir_all(base.join("public/empty")).unwrap();
    for dir in ["", "docs", "docs/private", "other", "public", "public/empty"] {
        set_mode(&base.join(dir), 0o755);
    }

    let mut config = Config::default();
    config.system.root = base.to_string_lossy().into_owned();

    let (tx, batches) = mpsc::unbounded_channel();
    let state = Arc::new(AppState {
        config: Arc::new(config),
        users: Arc::new(PermissionTable::from_json(USERS).unwrap()),
        audit: AuditPipeline::with_settings(Collecting { tx }, Duration::from_millis(300), 64),
    });

    Fixture {
        root,
        app: build_router(Arc::clone(&state)),
        state,
        batches,
    }
}

fn get(uri: &str, email: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(email) = email {
        builder = builder.header("x-user", email);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn listing(app: &Router, uri: &str, email: &str) -> Vec<String> {
    let resp = send(app, get(uri, Some(email))).await;
    assert_eq!(resp.status(), StatusCode::OK, "GET {uri} as {email}");

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let entries: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
    entries
        .iter()
        .map(|e| e["Name"].as_str().unwrap().to_string())
        .collect()
}

async fn status(app: &Router, uri: &str, email: &str) -> StatusCode {
    send(app, get(uri, Some(email))).await.status()
}

#[tokio::test]
async fn test_unknown_identity_is_forbidden() {
    let fx = fixture();

    for uri in ["/user", "/api", "/api/docs/a.txt"] {
        let resp = send(&fx.app, get(uri, Some("mallory@example.com"))).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&fx.app, get(uri, None)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_user_route_returns_permissions() {
    let fx = fixture();

    let request = Request::builder()
        .uri("/user")
        .header("x-user", "alice@example.com")
        .header("x-given-name", "Alice")
        .header("x-family-name", "Liddell")
        .body(Body::empty())
        .unwrap();
    let resp = send(&fx.app, request).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["givenName"], "Alice");
    assert_eq!(json["familyName"], "Liddell");
    assert_eq!(json["permissions"]["paths"][0], "/docs/*");
    assert_eq!(json["permissions"]["admin"], false);
}

#[tokio::test]
async fn test_listing_filters_hidden_and_protected() {
    let fx = fixture();

    assert_eq!(
        listing(&fx.app, "/api/docs", "alice@example.com").await,
        vec!["a.txt", "private"]
    );
    // Flags without the matching permission change nothing.
    assert_eq!(
        listing(&fx.app, "/api/docs?showHidden&showProtected", "alice@example.com").await,
        vec!["a.txt", "private"]
    );
    assert_eq!(
        listing(&fx.app, "/api/docs", "admin@example.com").await,
        vec!["a.txt", "private"]
    );
    assert_eq!(
        listing(&fx.app, "/api/docs?showHidden", "admin@example.com").await,
        vec![".secret", "a.txt", "private"]
    );
    assert_eq!(
        listing(&fx.app, "/api/docs?showHidden&showProtected", "admin@example.com").await,
        vec![".secret", "a.txt", "private", "private.txt"]
    );
}

#[tokio::test]
async fn test_ancestor_directories_are_listable() {
    let fx = fixture();

    assert_eq!(
        listing(&fx.app, "/api", "bob@example.com").await,
        vec!["docs"]
    );
    assert_eq!(
        listing(&fx.app, "/api/", "bob@example.com").await,
        vec!["docs"]
    );
    assert_eq!(
        listing(&fx.app, "/api/docs", "bob@example.com").await,
        vec!["private"]
    );
    assert_eq!(
        listing(&fx.app, "/api/docs/private", "bob@example.com").await,
        vec!["report.txt"]
    );
    assert_eq!(
        status(&fx.app, "/api/docs/a.txt", "bob@example.com").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_file_is_served() {
    let fx = fixture();

    let resp = send(&fx.app, get("/api/docs/private/report.txt", Some("bob@example.com"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"report");
}

#[tokio::test]
async fn test_large_file_is_streamed_whole() {
    let fx = fixture();
    let contents: String = (0..20_000).map(|i| format!("{i:05}\n")).collect();
    write(fx.root.path(), "docs/large.txt", &contents, 0o644);

    let resp = send(&fx.app, get("/api/docs/large.txt", Some("alice@example.com"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_LENGTH],
        contents.len().to_string().as_str()
    );
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.len(), contents.len());
    assert_eq!(&bytes[..], contents.as_bytes());
}

#[tokio::test]
async fn test_withheld_paths_are_not_found() {
    let fx = fixture();
    let alice = "alice@example.com";

    assert_eq!(status(&fx.app, "/api/other/x.txt", alice).await, StatusCode::NOT_FOUND);
    assert_eq!(status(&fx.app, "/api/other", alice).await, StatusCode::NOT_FOUND);
    assert_eq!(status(&fx.app, "/api/docs/missing.txt", alice).await, StatusCode::NOT_FOUND);
    assert_eq!(status(&fx.app, "/api/docs/.secret", alice).await, StatusCode::NOT_FOUND);
    assert_eq!(
        status(&fx.app, "/api/docs/private.txt", alice).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status(&fx.app, "/api/docs/../other/x.txt", "admin@example.com").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_hidden_file_served_with_flag_and_permission() {
    let fx = fixture();
    let admin = "admin@example.com";

    assert_eq!(status(&fx.app, "/api/docs/.secret", admin).await, StatusCode::NOT_FOUND);
    assert_eq!(
        status(&fx.app, "/api/docs/.secret?showHidden", admin).await,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_empty_directory_lists_as_empty_array() {
    let fx = fixture();
    assert!(
        listing(&fx.app, "/api/public/empty", "admin@example.com")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_method_and_route_errors() {
    let fx = fixture();

    let request = Request::builder()
        .method("POST")
        .uri("/api/docs/a.txt")
        .header("x-user", "alice@example.com")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        send(&fx.app, request).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );

    assert_eq!(
        status(&fx.app, "/nowhere", "alice@example.com").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_successful_reads_are_audited() {
    let mut fx = fixture();
    let alice = "alice@example.com";

    assert_eq!(status(&fx.app, "/api/other/x.txt", alice).await, StatusCode::NOT_FOUND);
    assert_eq!(status(&fx.app, "/api/docs/a.txt", alice).await, StatusCode::OK);
    assert_eq!(status(&fx.app, "/api/docs", alice).await, StatusCode::OK);

    let batch = tokio::time::timeout(Duration::from_secs(5), fx.batches.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.email, alice);
    assert_eq!(batch.paths().collect::<Vec<_>>(), vec!["/docs/a.txt", "/docs"]);
}

#[tokio::test]
async fn test_ignore_access_is_not_audited() {
    let fx = fixture();

    assert_eq!(
        status(&fx.app, "/api/docs/a.txt", "quiet@example.com").await,
        StatusCode::OK
    );
    assert_eq!(fx.state.audit.live_tasks(), 0);
}
