//! The dev-mode lifecycle: one build context, one app server.

use super::coordinator::{Lifecycle, RebuildOutcome};
use super::state::{LiveClients, LiveEvent};
use crate::error::Result;
use crate::project::Project;
use crate::server::{Dispatcher, ServerHandle, StopOutcome, bind};
use crate::ui;
use async_trait::async_trait;
use atoll_bundler::BuildContext;
use atoll_core::RouteTable;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct DevSession {
    project: Arc<Project>,
    ctx: Option<BuildContext>,
    server: Option<ServerHandle>,
    dispatcher: Dispatcher,
    addr: SocketAddr,
    clients: LiveClients,
    generation: u64,
}

impl std::fmt::Debug for DevSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevSession")
            .field("addr", &self.addr)
            .field("generation", &self.generation)
            .field("serving", &self.is_serving())
            .field("live_clients", &self.clients.len())
            .finish()
    }
}

impl DevSession {
    /// Initial build, then the app server on the configured port (or the
    /// next free one).
    ///
    /// Pages get the live-reload script from `live_reload_src` when given.
    pub async fn start(
        project: Arc<Project>,
        clients: LiveClients,
        live_reload_src: Option<String>,
    ) -> Result<Self> {
        let generation = 1;
        let prepared = project.prepare(generation).await?;
        project.print_summary(&prepared);

        let dispatcher = Dispatcher::new(
            prepared.table,
            project.composer(live_reload_src),
            project.client_dir(),
        );

        let config = project.config();
        let listener = bind(&config.host, config.port, true).await?;
        let server = ServerHandle::start(listener, dispatcher.router())?;

        Ok(Self {
            addr: server.addr(),
            project,
            ctx: Some(prepared.ctx),
            server: Some(server),
            dispatcher,
            clients,
            generation,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn routes(&self) -> Arc<RouteTable> {
        self.dispatcher.routes()
    }

    pub fn is_serving(&self) -> bool {
        self.server.as_ref().is_some_and(ServerHandle::is_running)
    }

    /// Build the next generation and, if it committed, swap the routes and
    /// restart the server on the same address.
    ///
    /// A failed build leaves the previous output and server in place.
    async fn rebuild(&mut self) -> Result<u64> {
        self.generation += 1;
        let generation = self.generation;

        let prepared = self.project.prepare(generation).await?;
        self.project.print_summary(&prepared);
        if let Some(previous) = self.ctx.replace(prepared.ctx) {
            previous.dispose();
        }

        if let Some(server) = self.server.take() {
            if server.stop().await == StopOutcome::AlreadyStopped {
                tracing::debug!(addr = %self.addr, "server was already stopped");
            }
        }

        self.dispatcher.replace_routes(prepared.table);

        let listener = bind(&self.addr.ip().to_string(), self.addr.port(), false).await?;
        self.server = Some(ServerHandle::start(listener, self.dispatcher.router())?);
        Ok(generation)
    }

    /// Stop the server and release the build context.
    pub async fn shutdown(mut self) {
        if let Some(server) = self.server.take() {
            server.stop().await;
        }
        if let Some(ctx) = self.ctx.take() {
            ctx.dispose();
        }
    }
}

#[async_trait]
impl Lifecycle for DevSession {
    async fn restart(&mut self) -> RebuildOutcome {
        match self.rebuild().await {
            Ok(generation) => {
                let reached = self.clients.broadcast(&LiveEvent::Reload { generation });
                ui::success(&format!("Reloaded {reached} browser(s)"));
                RebuildOutcome::Reloaded { generation }
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(generation = self.generation, error = %message, "rebuild failed");
                ui::error(&message);
                if self.is_serving() {
                    ui::info("Still serving the previous build");
                }
                self.clients.broadcast(&LiveEvent::BuildFailed {
                    message: message.clone(),
                });
                RebuildOutcome::Failed { message }
            }
        }
    }
}
