use crate::types::Marker;
use std::io;
use thiserror::Error;

/// Why an entry-point declaration was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointViolation {
    #[error("Main plugin class is not a class")]
    NotAClass,

    #[error("Main plugin class is not a top-level class")]
    NotTopLevel,

    #[error("Main plugin class cannot be static nested")]
    StaticNested,

    #[error("Main plugin class cannot be abstract")]
    Abstract,
}

/// Errors that abort a descriptor generation run
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Found more than one plugin main class ({0} candidates)")]
    MultipleEntryPoints(usize),

    #[error("{reason}: {name}")]
    InvalidEntryPoint {
        name: String,
        reason: EntryPointViolation,
    },

    #[error("Specified Command Executor class is not a class.")]
    InvalidCommandExecutor { name: String },

    #[error("Specified Permission holder class is not a class.")]
    InvalidPermissionHolder { name: String },

    #[error("{marker} is missing required field '{field}'")]
    MissingField { marker: Marker, field: String },

    #[error("Invalid value for {marker}.{field}: {value}")]
    InvalidValue {
        marker: Marker,
        field: String,
        value: String,
    },

    #[error("Scanner returned an unknown declaration handle: {0}")]
    UnknownDeclaration(usize),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize descriptor: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to parse declaration snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ManifestError {
    /// Declaration the diagnostic should point at, if any.
    ///
    /// Misused command/permission containers are reported unattributed.
    pub fn origin(&self) -> Option<&str> {
        match self {
            ManifestError::InvalidEntryPoint { name, .. } => Some(name),
            _ => None,
        }
    }
}
