//! `atoll serve`: build once and serve until Ctrl+C.

use super::shutdown_signal;
use crate::error::Result;
use crate::project::Project;
use crate::server::{Dispatcher, ServerHandle, bind};
use crate::ui;

pub async fn execute(project: &Project) -> Result<()> {
    let prepared = project.prepare(1).await?;
    project.print_summary(&prepared);

    let dispatcher = Dispatcher::new(prepared.table, project.composer(None), project.client_dir());
    let config = project.config();
    let listener = bind(&config.host, config.port, false).await?;
    let server = ServerHandle::start(listener, dispatcher.router())?;
    ui::success(&format!("Serving at {}", server.url()));

    shutdown_signal().await;

    ui::info("Shutting down...");
    server.stop().await;
    prepared.ctx.dispose();
    Ok(())
}
