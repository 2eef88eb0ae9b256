//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - invalid role, override or configuration
pub const VALIDATION_ERROR: i32 = 2;

/// Manifest error - missing, unparseable or invalid manifests
pub const MANIFEST_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Conflict - a unique name is already taken
pub const CONFLICT_ERROR: i32 = 6;
