//! Shared helpers: recording mock upstreams and a proxy bound to them.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;

use edge_proxy::config::model::{Config, Defaults, UpstreamConfig};
use edge_proxy::server::{self, AppState};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct MockUpstream {
    pub name: &'static str,
    pub addr: SocketAddr,
    pub calls: Arc<Mutex<Vec<Recorded>>>,
    /// Signalled when a `/slow` handler is dropped before it finishes.
    pub abandoned: Arc<Notify>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    name: &'static str,
    calls: Arc<Mutex<Vec<Recorded>>>,
    abandoned: Arc<Notify>,
}

/// Notifies on drop unless disarmed.
struct AbandonGuard {
    notify: Arc<Notify>,
    armed: bool,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if self.armed {
            self.notify.notify_one();
        }
    }
}

async fn mock_handler(State(state): State<MockState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let uri = parts.uri.to_string();
    let path = parts.uri.path().to_string();

    state.calls.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        uri: uri.clone(),
        headers: parts.headers.clone(),
        body,
    });

    if path.ends_with("/slow") {
        let mut guard = AbandonGuard {
            notify: Arc::clone(&state.abandoned),
            armed: true,
        };
        tokio::time::sleep(Duration::from_secs(3)).await;
        guard.armed = false;
        return "late".into_response();
    }
    if path.ends_with("/status/500") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("x-upstream-error", "database down")],
            "boom",
        )
            .into_response();
    }
    if path.ends_with("/redirect") {
        return (StatusCode::FOUND, [(header::LOCATION, "/landed")]).into_response();
    }
    if path.ends_with("/see-other") {
        return (StatusCode::SEE_OTHER, [(header::LOCATION, "/landed")]).into_response();
    }
    if path.ends_with("/temp-redirect") {
        return (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, "/landed")],
        )
            .into_response();
    }
    if path.ends_with("/loop") {
        return (StatusCode::FOUND, [(header::LOCATION, path.as_str())]).into_response();
    }

    let mut response = Response::new(Body::from(format!(
        "{}:{}:{}",
        state.name, parts.method, uri
    )));
    response
        .headers_mut()
        .insert("x-upstream", state.name.parse().unwrap());
    response
}

pub async fn spawn_upstream(name: &'static str) -> MockUpstream {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let abandoned = Arc::new(Notify::new());
    let router = Router::new().fallback(mock_handler).with_state(MockState {
        name,
        calls: Arc::clone(&calls),
        abandoned: Arc::clone(&abandoned),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockUpstream {
        name,
        addr,
        calls,
        abandoned,
    }
}

/// A local address nothing listens on.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub struct Upstreams {
    pub auth: MockUpstream,
    pub catalog: MockUpstream,
    pub order: MockUpstream,
    pub user: MockUpstream,
}

impl Upstreams {
    pub async fn spawn() -> Self {
        Self {
            auth: spawn_upstream("auth").await,
            catalog: spawn_upstream("catalog").await,
            order: spawn_upstream("order").await,
            user: spawn_upstream("user").await,
        }
    }

    pub fn total_calls(&self) -> usize {
        [&self.auth, &self.catalog, &self.order, &self.user]
            .iter()
            .map(|u| u.calls().len())
            .sum()
    }

    pub fn config(&self) -> Config {
        Config {
            upstreams: UpstreamConfig {
                auth: Some(self.auth.url()),
                catalog: Some(self.catalog.url()),
                order: Some(self.order.url()),
                user: Some(self.user.url()),
            },
            defaults: Defaults {
                timeout: 500,
                ..Defaults::default()
            },
        }
    }
}

pub async fn start_proxy(
    config: &Config,
    max_body: usize,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let state = Arc::new(AppState::from_config(config).unwrap());
    let router = server::build_router(state, max_body);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx)
}

/// Send a raw HTTP/1.1 request so the request target reaches the proxy
/// byte for byte (reqwest would normalize it first). Returns the status
/// line.
pub async fn raw_get(addr: SocketAddr, target: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
