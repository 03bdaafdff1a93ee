//! App server lifecycle.
//!
//! [`ServerHandle::start`] runs an axum router on a bound listener in a
//! background task; [`ServerHandle::stop`] shuts it down gracefully. The dev
//! coordinator stops and starts a fresh server on every successful rebuild.

mod dispatch;

pub use dispatch::{Dispatcher, PUBLIC_PREFIX};

use crate::error::{CliError, Result};
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Ports tried after the requested one when falling back
const PORT_FALLBACK_RANGE: u16 = 10;

/// Time in-flight requests get to finish before the server task is aborted
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Bind `host:port`, or with `fallback` the first free port of the next ten.
pub async fn bind(host: &str, port: u16, fallback: bool) -> Result<TcpListener> {
    let attempts = if fallback { PORT_FALLBACK_RANGE } else { 0 };
    let mut last_error = None;

    for offset in 0..=attempts {
        let candidate = port.saturating_add(offset);
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => {
                if offset > 0 {
                    crate::ui::warning(&format!(
                        "Port {port} is busy, using port {candidate} instead"
                    ));
                }
                return Ok(listener);
            }
            Err(err) => last_error = Some(err),
        }
    }

    let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
    let tried = if fallback {
        format!("{host}:{port}-{}", port.saturating_add(PORT_FALLBACK_RANGE))
    } else {
        format!("{host}:{port}")
    };
    Err(CliError::Server(format!("Failed to bind {tried}: {reason}")))
}

/// Result of stopping a server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// The server had already exited, e.g. after a bind or I/O failure
    AlreadyStopped,
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Serve `router` on `listener` until stopped.
    pub fn start(listener: TcpListener, router: Router) -> Result<Self> {
        let addr = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                    tracing::debug!(%addr, "server shutting down");
                })
                .await
        });

        tracing::debug!(%addr, "server started");
        Ok(Self {
            addr,
            shutdown: Some(shutdown),
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Shut the server down and wait for it to release its port.
    pub async fn stop(mut self) -> StopOutcome {
        let signalled = self
            .shutdown
            .take()
            .is_some_and(|shutdown| shutdown.send(()).is_ok());

        if !signalled || self.task.is_finished() {
            let _ = self.task.await;
            return StopOutcome::AlreadyStopped;
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => tracing::warn!(addr = %self.addr, error = %err, "server exited with error"),
            Ok(Err(err)) => tracing::warn!(addr = %self.addr, error = %err, "server task failed"),
            Err(_) => {
                tracing::warn!(addr = %self.addr, "graceful shutdown timed out, aborting");
                self.task.abort();
                let _ = self.task.await;
            }
        }
        StopOutcome::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn start_then_stop_releases_the_port() {
        let listener = bind("127.0.0.1", 0, false).await.unwrap();
        let server = ServerHandle::start(listener, Router::new().route("/", get(|| async { "ok" })))
            .unwrap();
        let addr = server.addr();
        assert!(server.is_running());
        assert_eq!(server.stop().await, StopOutcome::Stopped);

        // Same port is free again for the next generation.
        let again = bind("127.0.0.1", addr.port(), false).await.unwrap();
        assert_eq!(again.local_addr().unwrap().port(), addr.port());
    }

    #[tokio::test]
    async fn stopping_a_finished_server_is_tolerated() {
        let listener = bind("127.0.0.1", 0, false).await.unwrap();
        let server = ServerHandle::start(listener, Router::new()).unwrap();
        server.task.abort();
        while server.is_running() {
            tokio::task::yield_now().await;
        }
        assert_eq!(server.stop().await, StopOutcome::AlreadyStopped);
    }

    #[tokio::test]
    async fn busy_ports_fall_back() {
        let taken = bind("127.0.0.1", 0, false).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        assert!(bind("127.0.0.1", port, false).await.is_err());
        // The next ports may be busy too on a shared machine; any port in the
        // fallback range is fine.
        if let Ok(listener) = bind("127.0.0.1", port, true).await {
            let got = listener.local_addr().unwrap().port();
            assert!(got > port && got <= port.saturating_add(PORT_FALLBACK_RANGE));
        }
    }
}
