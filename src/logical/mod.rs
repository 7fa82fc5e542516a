//! # Host Plugin Contract
//!
//! The secrets-management host drives the engine through these types. It
//! routes a [`Request`] carrying an [`Operation`], a mount-relative path,
//! request data and a [`Storage`] view, and expects an optional [`Response`]
//! back. Leases are described by [`Secret`]; the host keeps them and hands
//! them back to the engine on renew and revoke.
//!
//! Storage, encryption at rest and lease expiry belong to the host. This
//! module only models the seam, plus [`InmemStorage`] for tests and the dev
//! server.

pub mod field;
pub mod framework;
pub mod path;
pub mod request;
pub mod response;
pub mod secret;
pub mod storage;

pub use field::{FieldData, FieldSchema, FieldType, FieldValue};
pub use framework::{Backend, BackendConfig, LogicalBackend, SecretType};
pub use path::{generic_name_regex, OperationFuture, Path};
pub use request::Request;
pub use response::Response;
pub use secret::Secret;
pub use storage::{InmemStorage, Storage, StorageEntry};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Write to a path that does not exist yet
    Create,
    /// Read a path
    Read,
    /// Write to a path that already exists
    Update,
    /// Delete a path
    Delete,
    /// List the children of a path
    List,
    /// Extend a lease
    Renew,
    /// Revoke a lease
    Revoke,
    /// Return help text for a path
    Help,
}

impl Operation {
    /// Get the wire representation of this operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Renew => "renew",
            Self::Revoke => "revoke",
            Self::Help => "help",
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "list" => Ok(Self::List),
            "renew" => Ok(Self::Renew),
            "revoke" => Ok(Self::Revoke),
            "help" => Ok(Self::Help),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
