//! Configured command - roles deployable from a ref

use rolesync_core::{Defaults, Project, Role};
use rolesync_sync::{ConfiguredRoleResolver, GitRepository, role_defaults};
use serde::Serialize;
use std::path::Path;

use crate::commands::Context;
use crate::display;
use crate::error::Result;

#[derive(Serialize)]
struct ConfiguredRole<'a> {
    #[serde(flatten)]
    role: &'a Role,
    defaults: Option<Defaults>,
}

pub fn run(ctx: &Context, repo: &Path, project_id: i64, git_ref: &str, json: bool) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;

    let repository = GitRepository::new(repo);
    // The permalink only matters when naming new roles
    let project = Project::new(project_id, "");

    let roles = ConfiguredRoleResolver::new(&repository).configured_for_project(&store, &project, git_ref)?;

    if json {
        let mut output = Vec::with_capacity(roles.len());
        for role in &roles {
            output.push(ConfiguredRole {
                role,
                defaults: role_defaults(&repository, role, git_ref)?,
            });
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if roles.is_empty() {
        println!("No roles of project {} are configured at {}", project_id, git_ref);
        return Ok(());
    }

    display::print_roles(&roles);
    Ok(())
}
