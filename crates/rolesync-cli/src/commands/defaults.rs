//! Defaults command - resource defaults of a local manifest

use console::style;
use rolesync_core::{extract_defaults, parse_documents};
use std::path::Path;

use crate::display;
use crate::error::{CliError, Result};

pub fn run(file: &Path, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let path = file.display().to_string();

    let documents = parse_documents(&path, &content)?;
    let defaults = extract_defaults(&path, &documents)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&defaults)?);
        return Ok(());
    }

    let Some(defaults) = defaults else {
        return Err(CliError::Manifest {
            message: format!("{} declares no workload", path),
            help: Some("Roles need a Deployment, DaemonSet, StatefulSet, ReplicaSet or Job".into()),
        });
    };

    println!("{}", style(&path).cyan().bold());
    display::print_defaults(&defaults);
    Ok(())
}
