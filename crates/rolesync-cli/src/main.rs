//! Rolesync CLI - seed and inspect Kubernetes roles from manifests kept in git

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::Context;

#[derive(Parser)]
#[command(name = "rolesync")]
#[command(author = "Rolesync Contributors")]
#[command(version)]
#[command(about = "Seed and inspect Kubernetes roles from manifests kept in git", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (default: ~/.config/rolesync/config.yaml)
    #[arg(long, global = true, env = "ROLESYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Role registry database (default: from config, then the data directory)
    #[arg(long, global = true, env = "ROLESYNC_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create roles for every manifest the project does not have yet
    Seed {
        /// Path to the git checkout
        #[arg(long)]
        repo: PathBuf,

        /// Project id
        #[arg(long)]
        project_id: i64,

        /// Project permalink, used to disambiguate resource names
        #[arg(long)]
        permalink: String,

        /// Git ref to read manifests from
        #[arg(long = "ref", default_value = "HEAD")]
        git_ref: String,
    },

    /// List the project's roles that are deployable from a ref
    Configured {
        /// Path to the git checkout
        #[arg(long)]
        repo: PathBuf,

        /// Project id
        #[arg(long)]
        project_id: i64,

        /// Git ref to check
        #[arg(long = "ref", default_value = "HEAD")]
        git_ref: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resource defaults declared by a local manifest
    Defaults {
        /// Manifest file (.yml, .yaml or .json)
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect and manage registered roles
    Roles {
        #[command(subcommand)]
        command: RolesCommands,
    },
}

#[derive(Subcommand)]
enum RolesCommands {
    /// List roles
    List {
        /// Only roles of this project
        #[arg(long)]
        project_id: Option<i64>,

        /// Include deleted roles
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Soft-delete a role and drop its deploy group overrides
    Delete {
        /// Role id
        id: i64,
    },

    /// Override a role's resources for one deploy group
    Override {
        /// Role id
        #[arg(long)]
        role_id: i64,

        /// Deploy group id
        #[arg(long)]
        deploy_group: i64,

        /// CPU cores
        #[arg(long)]
        cpu: f64,

        /// Memory in MiB
        #[arg(long)]
        ram: u64,

        /// Replica count
        #[arg(long)]
        replicas: u32,
    },

    /// List a role's deploy group overrides
    Overrides {
        /// Role id
        id: i64,
    },
}

fn init_tracing(debug: bool) {
    let default = if debug { "rolesync=debug" } else { "rolesync=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    let ctx = Context::new(cli.config, cli.db);

    match cli.command {
        Commands::Seed {
            repo,
            project_id,
            permalink,
            git_ref,
        } => commands::seed::run(&ctx, &repo, project_id, &permalink, &git_ref),

        Commands::Configured {
            repo,
            project_id,
            git_ref,
            json,
        } => commands::configured::run(&ctx, &repo, project_id, &git_ref, json),

        Commands::Defaults { file, json } => commands::defaults::run(&file, json),

        Commands::Roles { command } => match command {
            RolesCommands::List {
                project_id,
                all,
                json,
            } => commands::roles::list(&ctx, project_id, all, json),
            RolesCommands::Delete { id } => commands::roles::delete(&ctx, id),
            RolesCommands::Override {
                role_id,
                deploy_group,
                cpu,
                ram,
                replicas,
            } => commands::roles::create_override(&ctx, role_id, deploy_group, cpu, ram, replicas),
            RolesCommands::Overrides { id } => commands::roles::overrides(&ctx, id),
        },
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
