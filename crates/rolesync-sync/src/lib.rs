//! Rolesync Sync - manifest discovery and role reconciliation
//!
//! Connects a source repository to the role registry:
//!
//! - **Locate**: find candidate manifests at a ref by directory convention
//! - **Seed**: create one role per manifest the project does not have yet
//! - **Resolve**: list the roles that are deployable from a ref
//!
//! ## Example
//!
//! ```rust,no_run
//! use rolesync_core::Project;
//! use rolesync_registry::SqliteRoleStore;
//! use rolesync_sync::{GitRepository, RoleSynchronizer};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = GitRepository::new("/srv/checkouts/shop");
//! let mut store = SqliteRoleStore::open()?;
//!
//! let created = RoleSynchronizer::new(&repo).seed(&mut store, &Project::new(1, "shop"), "main")?;
//! println!("created {} role(s)", created.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod locator;
pub mod repository;
pub mod resolver;
pub mod seed;

#[cfg(test)]
mod test_support;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use locator::ManifestLocator;
pub use repository::{GitRepository, InMemoryRepository, Repository};
pub use resolver::{ConfiguredRoleResolver, role_defaults};
pub use seed::{GENERATED_SERVICE_MARKER, RoleSynchronizer};
