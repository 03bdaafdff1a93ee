//! `atoll build`: build once and check the route table.

use crate::error::Result;
use crate::project::Project;
use crate::ui;

pub async fn execute(project: &Project) -> Result<()> {
    ui::info(&format!("Building {}", project.src_dir().display()));

    let prepared = project.prepare(1).await?;
    project.print_summary(&prepared);

    for route in prepared.table.routes() {
        let methods: Vec<&str> = route.methods().iter().map(|m| m.as_str()).collect();
        let file = prepared.page_file(route);
        ui::info(&format!(
            "{:<24} {:<16} {}",
            route.url_pattern,
            methods.join(","),
            file.display()
        ));
    }

    ui::success(&format!("Output written to {}", project.out_dir().display()));
    prepared.ctx.dispose();
    Ok(())
}
