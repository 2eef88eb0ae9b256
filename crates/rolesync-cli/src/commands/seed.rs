//! Seed command - create roles from the manifests at a ref

use console::style;
use rolesync_core::Project;
use rolesync_sync::{GitRepository, RoleSynchronizer};
use std::path::Path;

use crate::commands::Context;
use crate::display;
use crate::error::Result;

pub fn run(ctx: &Context, repo: &Path, project_id: i64, permalink: &str, git_ref: &str) -> Result<()> {
    let config = ctx.config()?;
    let mut store = ctx.open_store(&config)?;

    let repository = GitRepository::new(repo);
    let project = Project::new(project_id, permalink);

    let created = RoleSynchronizer::from_config(&repository, &config)?.seed(&mut store, &project, git_ref)?;

    if created.is_empty() {
        println!(
            "{} All manifests at {} already have roles",
            style("✓").green(),
            style(git_ref).cyan()
        );
        return Ok(());
    }

    println!(
        "{} Created {} role(s) for {} at {}",
        style("✓").green().bold(),
        created.len(),
        style(permalink).bold(),
        style(git_ref).cyan()
    );
    display::print_created(&created);

    Ok(())
}
