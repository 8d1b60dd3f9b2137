//! Local HTTP server staging synthesized audio for the renderer.
//!
//! The renderer fetches media over HTTP, so audio files written to the
//! working-directory tree are exposed under `/assets/`. URL resolution is
//! deterministic from the configuration alone: callers may compute URLs
//! before the listener is up, as long as they gate rendering on
//! `is_ready`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, RwLock};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::error::{PipelineError, PipelineResult};

/// Lifecycle state of the staging server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    NotStarted,
    Starting,
    Ready,
    Stopped,
}

/// Static file server for staged audio assets.
pub struct StagingServer {
    host: String,
    port: u16,
    root: PathBuf,
    state: RwLock<StagingState>,
    bound_port: RwLock<Option<u16>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl StagingServer {
    /// Create a staging server rooted at `root`. Does not bind.
    pub fn new(host: impl Into<String>, port: u16, root: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            root: root.into(),
            state: RwLock::new(StagingState::NotStarted),
            bound_port: RwLock::new(None),
            shutdown_tx: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> StagingState {
        *self.state.read().await
    }

    /// Whether the server is accepting requests.
    pub async fn is_ready(&self) -> bool {
        *self.state.read().await == StagingState::Ready
    }

    /// Bind the listener and start serving in a background task.
    ///
    /// Binding happens before the state flips to `Ready`, so a `Ready`
    /// observation guarantees the port is accepting connections. Port 0
    /// binds to an ephemeral port; the bound port is used for URL
    /// resolution from then on.
    pub async fn start(&self) -> PipelineResult<()> {
        {
            let mut state = self.state.write().await;
            if *state != StagingState::NotStarted {
                return Err(PipelineError::not_ready(format!(
                    "staging server already started (state {:?})",
                    *state
                )));
            }
            *state = StagingState::Starting;
        }

        // A bind failure must leave the server startable again.
        let (listener, bound) = match self.bind().await {
            Ok(pair) => pair,
            Err(e) => {
                *self.state.write().await = StagingState::NotStarted;
                return Err(e);
            }
        };

        let app = Router::new()
            .route("/health", get(|| async { "OK" }))
            .nest_service("/assets", ServeDir::new(&self.root));

        let (tx, rx) = oneshot::channel::<()>();
        *self.shutdown_tx.lock().await = Some(tx);

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = server.await {
                error!("Staging server error: {}", e);
            }
        });

        *self.bound_port.write().await = Some(bound.port());
        *self.state.write().await = StagingState::Ready;

        info!(addr = %bound, root = %self.root.display(), "Staging server ready");
        Ok(())
    }

    async fn bind(&self) -> PipelineResult<(TcpListener, SocketAddr)> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| PipelineError::config_error(format!("invalid staging address: {}", e)))?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            PipelineError::resource(format!("failed to bind staging server on {}: {}", addr, e))
        })?;
        let bound = listener
            .local_addr()
            .map_err(|e| PipelineError::resource(e.to_string()))?;
        Ok((listener, bound))
    }

    /// Resolve the staged URL for a file under the work root.
    ///
    /// Purely computational: the path must be under the root and its
    /// segments must be URL-safe ASCII, but the file need not exist and
    /// the server need not be running.
    pub async fn resolve_url(&self, path: &Path) -> PipelineResult<String> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            PipelineError::resource(format!(
                "{:?} is outside the staging root {:?}",
                path, self.root
            ))
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            let std::path::Component::Normal(part) = component else {
                return Err(PipelineError::resource(format!(
                    "{:?} contains a non-normal path component",
                    relative
                )));
            };
            let part = part
                .to_str()
                .filter(|s| is_url_safe_segment(s))
                .ok_or_else(|| {
                    PipelineError::resource(format!(
                        "path segment {:?} is not URL-safe",
                        part
                    ))
                })?;
            segments.push(part);
        }

        if segments.is_empty() {
            return Err(PipelineError::resource(
                "cannot stage the root directory itself",
            ));
        }

        let port = self.bound_port.read().await.unwrap_or(self.port);
        Ok(format!(
            "http://{}:{}/assets/{}",
            self.host,
            port,
            segments.join("/")
        ))
    }

    /// Signal the server to stop and mark it stopped.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }
        *self.state.write().await = StagingState::Stopped;
        info!("Staging server stopped");
    }
}

/// URL path segments: ASCII letters, digits and a small punctuation set
/// that needs no percent-encoding.
fn is_url_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_url_without_start() {
        let root = tempfile::tempdir().unwrap();
        let server = StagingServer::new("127.0.0.1", 3001, root.path());

        let path = root.path().join("job-1/question_1/question.mp3");
        let url = server.resolve_url(&path).await.unwrap();
        assert_eq!(
            url,
            "http://127.0.0.1:3001/assets/job-1/question_1/question.mp3"
        );
    }

    #[tokio::test]
    async fn test_resolve_url_rejects_outside_root() {
        let root = tempfile::tempdir().unwrap();
        let server = StagingServer::new("127.0.0.1", 3001, root.path());

        let result = server.resolve_url(Path::new("/etc/passwd")).await;
        assert!(matches!(result, Err(PipelineError::Resource(_))));
    }

    #[tokio::test]
    async fn test_resolve_url_rejects_unsafe_segment() {
        let root = tempfile::tempdir().unwrap();
        let server = StagingServer::new("127.0.0.1", 3001, root.path());

        let path = root.path().join("job 1/audio file.mp3");
        let result = server.resolve_url(&path).await;
        assert!(matches!(result, Err(PipelineError::Resource(_))));
    }

    #[tokio::test]
    async fn test_serves_staged_file() {
        let root = tempfile::tempdir().unwrap();
        let audio_path = root.path().join("job-1/question_1/question.mp3");
        tokio::fs::create_dir_all(audio_path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&audio_path, b"mp3-bytes").await.unwrap();

        let server = StagingServer::new("127.0.0.1", 0, root.path());
        assert_eq!(server.state().await, StagingState::NotStarted);
        server.start().await.unwrap();
        assert!(server.is_ready().await);

        let url = server.resolve_url(&audio_path).await.unwrap();
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"mp3-bytes");

        server.shutdown().await;
        assert_eq!(server.state().await, StagingState::Stopped);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let root = tempfile::tempdir().unwrap();
        let server = StagingServer::new("127.0.0.1", 0, root.path());
        server.start().await.unwrap();

        let url = server
            .resolve_url(&root.path().join("job-1/missing.mp3"))
            .await
            .unwrap();
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), 404);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_bind_leaves_server_startable() {
        let root = tempfile::tempdir().unwrap();

        // Occupy a port so the first start fails to bind.
        let blocker = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = blocker.local_addr().unwrap().port();

        let server = StagingServer::new("127.0.0.1", port, root.path());
        let result = server.start().await;
        assert!(matches!(result, Err(PipelineError::Resource(_))));
        assert_eq!(server.state().await, StagingState::NotStarted);

        // Free the port; the same server must now start cleanly.
        drop(blocker);
        server.start().await.unwrap();
        assert!(server.is_ready().await);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let server = StagingServer::new("127.0.0.1", 0, root.path());
        server.start().await.unwrap();

        let result = server.start().await;
        assert!(matches!(result, Err(PipelineError::NotReady(_))));

        server.shutdown().await;
    }
}
