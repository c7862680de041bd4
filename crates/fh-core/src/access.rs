//! Principals and the permissions artifacts may require.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Permissions an artifact definition can require of the hunt creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Schedule collections on clients.
    CollectClient,
    /// Run collections on the server itself.
    CollectServer,
    /// Launch external programs on endpoints.
    Execve,
    FilesystemRead,
    FilesystemWrite,
    NetworkAccess,
    /// Change endpoint state (kill processes, quarantine).
    MachineState,
}

impl Permission {
    /// Returns all available permissions.
    pub fn all() -> HashSet<Permission> {
        HashSet::from([
            Permission::CollectClient,
            Permission::CollectServer,
            Permission::Execve,
            Permission::FilesystemRead,
            Permission::FilesystemWrite,
            Permission::NetworkAccess,
            Permission::MachineState,
        ])
    }

    /// Returns the permission name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CollectClient => "COLLECT_CLIENT",
            Permission::CollectServer => "COLLECT_SERVER",
            Permission::Execve => "EXECVE",
            Permission::FilesystemRead => "FILESYSTEM_READ",
            Permission::FilesystemWrite => "FILESYSTEM_WRITE",
            Permission::NetworkAccess => "NETWORK_ACCESS",
            Permission::MachineState => "MACHINE_STATE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The identity and grants under which a hunt is created and compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// Principal name, recorded as the hunt creator and in audit rows.
    pub principal: String,
    /// Granted permissions.
    pub permissions: HashSet<Permission>,
}

impl AccessContext {
    /// Creates a context with no permissions.
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            permissions: HashSet::new(),
        }
    }

    /// Creates a context holding every permission.
    pub fn administrator(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            permissions: Permission::all(),
        }
    }

    /// Grants one more permission.
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    /// Checks if this context has a specific permission.
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns the first of `required` that is not granted.
    pub fn missing(&self, required: &[Permission]) -> Option<Permission> {
        required.iter().copied().find(|p| !self.has(*p))
    }
}
