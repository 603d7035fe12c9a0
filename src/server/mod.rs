// src/server/mod.rs

//! Live Reload Server: serves the output root and pushes reload messages to
//! connected browsers over a WebSocket.

pub mod reload;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ServerSection;
use crate::errors::{AssetflowError, Result};

pub use reload::{ReloadHandle, ReloadMessage};

/// WebSocket endpoint browsers connect to.
pub const WS_PATH: &str = "/__assetflow/ws";
/// Client script injected into served HTML.
pub const CLIENT_PATH: &str = "/__assetflow/client.js";

const CLIENT_JS: &str = include_str!("client.js");

#[derive(Debug, Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    reload: ReloadHandle,
}

/// Build the router for serving `root`.
pub fn router(root: PathBuf, reload: ReloadHandle) -> Router {
    let state = ServerState {
        root: Arc::new(root),
        reload,
    };

    Router::new()
        .route(WS_PATH, get(ws_upgrade))
        .route(CLIENT_PATH, get(client_script))
        .fallback(static_files::serve)
        .with_state(state)
}

/// A running server. Dropping it without [`LiveServer::shutdown`] leaves the
/// task running until the runtime stops.
#[derive(Debug)]
pub struct LiveServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl LiveServer {
    /// Bind `[server].host:port` and start serving. A bind failure is a
    /// startup error.
    pub async fn start(cfg: &ServerSection, root: PathBuf, reload: ReloadHandle) -> Result<Self> {
        let bind = format!("{}:{}", cfg.host, cfg.port);
        let listener = TcpListener::bind(&bind)
            .await
            .map_err(|e| AssetflowError::ServerError(format!("cannot bind {bind}: {e}")))?;
        let addr = listener.local_addr()?;

        let app = router(root.clone(), reload);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                    debug!("live reload server shutting down");
                })
                .await;
            if let Err(err) = served {
                warn!("live reload server stopped: {err}");
            }
        });

        info!(%addr, root = %root.display(), "serving on http://{addr}");
        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait briefly for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Open WebSocket sessions keep graceful shutdown waiting.
        if tokio::time::timeout(Duration::from_secs(2), &mut self.task)
            .await
            .is_err()
        {
            self.task.abort();
        }
    }
}

async fn client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_JS,
    )
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    let rx = state.reload.subscribe();
    ws.on_upgrade(move |socket| client_session(socket, rx))
}

/// Forward reload messages to one browser until either side goes away.
async fn client_session(socket: WebSocket, mut rx: broadcast::Receiver<ReloadMessage>) {
    let (mut sender, mut receiver) = socket.split();
    debug!("reload client connected");

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let msg = match msg {
                    Ok(msg) => msg,
                    // Missed messages: a full reload covers all of them.
                    Err(broadcast::error::RecvError::Lagged(_)) => ReloadMessage::Reload,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Ok(json) = serde_json::to_string(&msg) else {
                    continue;
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("reload client disconnected");
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn client_script_is_served() {
        let app = router(PathBuf::from("."), ReloadHandle::new());
        let response = app
            .oneshot(Request::builder().uri(CLIENT_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains(WS_PATH));
    }

    #[tokio::test]
    async fn start_and_shutdown_on_ephemeral_port() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServerSection {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let server = LiveServer::start(&cfg, dir.path().to_path_buf(), ReloadHandle::new())
            .await
            .unwrap();
        assert_ne!(server.local_addr().port(), 0);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn bind_failure_is_a_server_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cfg = ServerSection {
            host: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
        };
        let err = LiveServer::start(&cfg, PathBuf::from("."), ReloadHandle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetflowError::ServerError(_)));
    }
}
