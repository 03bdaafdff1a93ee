//! Live-reload server.
//!
//! Runs on its own port for the whole dev session so browsers stay
//! connected while the app server restarts underneath them.

use super::state::{LiveClients, LiveEvent};
use crate::error::Result;
use crate::server::{ServerHandle, bind};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

pub const LIVE_PATH: &str = "/live";
pub const SCRIPT_PATH: &str = "/live-reload.js";

const LIVE_RELOAD_SCRIPT: &str = include_str!("../../assets/live-reload.js");

/// URL the rendered pages load the live-reload client from
pub fn script_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}{SCRIPT_PATH}", addr.port())
    } else {
        format!("http://{addr}{SCRIPT_PATH}")
    }
}

pub fn router(clients: LiveClients) -> Router {
    Router::new()
        .route(LIVE_PATH, get(handle_events))
        .route(SCRIPT_PATH, get(handle_script))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(clients)
}

pub async fn start_live_server(host: &str, port: u16, clients: LiveClients) -> Result<ServerHandle> {
    let listener = bind(host, port, false).await?;
    ServerHandle::start(listener, router(clients))
}

/// Removes the client once its stream is dropped (browser went away)
struct Unregister {
    clients: LiveClients,
    id: u64,
}

impl Drop for Unregister {
    fn drop(&mut self) {
        self.clients.unregister(self.id);
    }
}

fn to_sse(event: &LiveEvent) -> Event {
    let data = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event.name()).data(data)
}

async fn handle_events(
    State(clients): State<LiveClients>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = clients.register();
    let guard = Unregister {
        clients: clients.clone(),
        id,
    };

    let stream = ReceiverStream::new(rx).map(move |event| {
        let _registered = &guard;
        Ok(to_sse(&event))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}

async fn handle_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        LIVE_RELOAD_SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn serves_the_client_script() {
        let response = router(LiveClients::new())
            .oneshot(Request::get(SCRIPT_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("EventSource"));
    }

    #[test]
    fn island_pages_are_morphed_instead_of_reloaded() {
        // The only full reload left is the fallback for a failed morph.
        assert_eq!(LIVE_RELOAD_SCRIPT.matches("location.reload()").count(), 1);
        assert!(LIVE_RELOAD_SCRIPT.contains("morphIsland"));
        assert!(LIVE_RELOAD_SCRIPT.contains("ctx.kept.add(from)"));
        assert!(LIVE_RELOAD_SCRIPT.contains("await import(url.href)"));
    }

    #[test]
    fn script_url_avoids_unspecified_hosts() {
        assert_eq!(
            script_url("0.0.0.0:35729".parse().unwrap()),
            "http://localhost:35729/live-reload.js"
        );
        assert_eq!(
            script_url("127.0.0.1:4000".parse().unwrap()),
            "http://127.0.0.1:4000/live-reload.js"
        );
    }

    #[tokio::test]
    async fn event_stream_registers_until_dropped() {
        let clients = LiveClients::new();
        let response = router(clients.clone())
            .oneshot(Request::get(LIVE_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(clients.len(), 1);
        assert_eq!(clients.broadcast(&LiveEvent::Reload { generation: 3 }), 1);

        drop(response);
        assert!(clients.is_empty());
    }
}
