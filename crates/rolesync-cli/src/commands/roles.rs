//! Roles commands - inspect and manage registered roles

use console::style;
use rolesync_core::NewDeployGroupRole;
use rolesync_registry::{RegistryError, RoleStore};

use crate::commands::Context;
use crate::display;
use crate::error::Result;

/// List roles, optionally for one project and including deleted ones
pub fn list(ctx: &Context, project_id: Option<i64>, include_deleted: bool, json: bool) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;

    let roles: Vec<_> = store
        .all_roles()?
        .into_iter()
        .filter(|r| project_id.is_none_or(|id| r.project_id == id))
        .filter(|r| include_deleted || !r.is_deleted())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&roles)?);
        return Ok(());
    }

    if roles.is_empty() {
        println!("No roles found");
        return Ok(());
    }

    display::print_roles(&roles);
    Ok(())
}

/// Soft-delete a role
pub fn delete(ctx: &Context, id: i64) -> Result<()> {
    let config = ctx.config()?;
    let mut store = ctx.open_store(&config)?;

    let role = store.soft_delete_role(id)?;
    println!(
        "{} Deleted role {} ({})",
        style("✓").green(),
        style(&role.name).bold(),
        role.config_file
    );
    Ok(())
}

/// Create a deploy group override for a role
pub fn create_override(
    ctx: &Context,
    role_id: i64,
    deploy_group_id: i64,
    cpu: f64,
    ram: u64,
    replicas: u32,
) -> Result<()> {
    let config = ctx.config()?;
    let mut store = ctx.open_store(&config)?;

    let role = store
        .find_role(role_id)?
        .filter(|r| !r.is_deleted())
        .ok_or(RegistryError::RoleNotFound { id: role_id })?;

    let created = store.create_deploy_group_role(&NewDeployGroupRole {
        project_id: role.project_id,
        kubernetes_role_id: role.id,
        deploy_group_id,
        cpu,
        ram,
        replicas,
    })?;

    println!(
        "{} Role {} {} deploy group {}: cpu {}, ram {} MiB, {} replica(s)",
        style("✓").green(),
        style(&role.name).bold(),
        style("→").blue(),
        created.deploy_group_id,
        created.cpu,
        created.ram,
        created.replicas
    );
    Ok(())
}

/// List the deploy group overrides of a role
pub fn overrides(ctx: &Context, role_id: i64) -> Result<()> {
    let config = ctx.config()?;
    let store = ctx.open_store(&config)?;

    if store.find_role(role_id)?.is_none() {
        return Err(RegistryError::RoleNotFound { id: role_id }.into());
    }

    let overrides = store.deploy_group_roles_for_role(role_id)?;
    if overrides.is_empty() {
        println!("Role {} has no deploy group overrides", role_id);
        return Ok(());
    }

    display::print_overrides(&overrides);
    Ok(())
}
