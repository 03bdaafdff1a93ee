//! `atoll dev`: build, serve, and rebuild on every source change.
//!
//! 1. Start the live-reload server; it outlives every app server restart.
//! 2. Initial build and app server (port falls back if busy).
//! 3. Watch the source root and hand changes to the coordinator until
//!    Ctrl+C.

use super::shutdown_signal;
use crate::dev::{
    Coordinator, DevSession, FileWatcher, LiveClients, WatchFilter, script_url,
    start_live_server,
};
use crate::error::Result;
use crate::project::Project;
use crate::ui;
use std::sync::Arc;

pub async fn execute(project: Arc<Project>) -> Result<()> {
    ui::info("Starting development server...");
    let config = project.config();

    let clients = LiveClients::new();
    let live = start_live_server(&config.host, config.live_port, clients.clone()).await?;

    let session = match DevSession::start(
        project.clone(),
        clients.clone(),
        Some(script_url(live.addr())),
    )
    .await
    {
        Ok(session) => session,
        Err(err) => {
            live.stop().await;
            return Err(err);
        }
    };
    ui::success(&format!("Development server running at {}", session.url()));
    ui::info(&format!("Live reload on {}", live.url()));

    let filter = WatchFilter::new(
        project.src_dir(),
        project.out_dir(),
        config.watch_ignore.clone(),
    );
    let (watcher, changes) = FileWatcher::new(filter, config.debounce_ms)?;
    ui::info(&format!("Watching {}", watcher.root().display()));

    let session = Coordinator::new(session)
        .run(changes, shutdown_signal())
        .await;

    ui::info("Shutting down...");
    drop(watcher);
    if let Some(session) = session {
        session.shutdown().await;
    }
    live.stop().await;
    Ok(())
}
