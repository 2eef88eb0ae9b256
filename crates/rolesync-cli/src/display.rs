//! Display formatting for CLI output
//!
//! Tables for roles and deploy group overrides, plus the defaults summary.

use console::style;
use rolesync_core::{Defaults, DeployGroupRole, Role};

/// Print roles as a table
pub fn print_roles(roles: &[Role]) {
    println!(
        "{:<6} {:<8} {:<24} {:<32} {:<24} {:<10} {}",
        style("ID").bold(),
        style("PROJECT").bold(),
        style("NAME").bold(),
        style("RESOURCE").bold(),
        style("SERVICE").bold(),
        style("STATUS").bold(),
        style("CONFIG FILE").bold()
    );

    for role in roles {
        let status = if role.is_deleted() {
            style("deleted").dim()
        } else {
            style("active").green()
        };

        println!(
            "{:<6} {:<8} {:<24} {:<32} {:<24} {:<10} {}",
            role.id,
            role.project_id,
            role.name,
            role.resource_name,
            role.service_name.as_deref().unwrap_or("-"),
            status,
            role.config_file
        );
    }
}

/// Print one line per newly created role
pub fn print_created(roles: &[Role]) {
    for role in roles {
        let service = role
            .service_name
            .as_deref()
            .map(|s| format!(" (service {})", style(s).cyan()))
            .unwrap_or_default();
        println!(
            "  {} {} {} {}{}",
            style("✓").green(),
            role.config_file,
            style("→").blue(),
            style(&role.resource_name).bold(),
            service
        );
    }
}

/// Print deploy group overrides as a table
pub fn print_overrides(overrides: &[DeployGroupRole]) {
    println!(
        "{:<6} {:<14} {:<8} {:<10} {}",
        style("ID").bold(),
        style("DEPLOY GROUP").bold(),
        style("CPU").bold(),
        style("RAM (MiB)").bold(),
        style("REPLICAS").bold()
    );

    for dgr in overrides {
        println!(
            "{:<6} {:<14} {:<8} {:<10} {}",
            dgr.id, dgr.deploy_group_id, dgr.cpu, dgr.ram, dgr.replicas
        );
    }
}

/// Print resource defaults
pub fn print_defaults(defaults: &Defaults) {
    println!("{}: {}", style("CPU").bold(), defaults.cpu);
    match defaults.ram {
        Some(ram) => println!("{}: {} MiB", style("RAM").bold(), ram),
        None => println!("{}: {}", style("RAM").bold(), style("not declared").dim()),
    }
    println!("{}: {}", style("Replicas").bold(), defaults.replicas);
}
