//! Error type and helper functions.
//!
//! Every variant is fatal.  The binary reports it and exits 1; there
//! is no recovery path once the identity change has begun.

use std::fmt;
use std::ffi::NulError;

use std::error::Error;

use clap;
use nix;

#[derive(Debug)]
pub enum LaunchError {
    /// The command line is malformed; the caller must fix it.
    Usage      { detail: String },
    /// A descriptor field is not a valid id.
    BadField   { field: &'static str, value: String },
    /// clap rejected the command line (or wants to print help).
    Cli        { cause: clap::Error },
    TooManyGroups { count: usize, max: usize },
    NixError   { cause: nix::Error, detail: String },
    NulError   { cause: NulError, detail: String },
    /// The kernel reports credentials other than the ones we set.
    Unverified { detail: String },
}

impl LaunchError {
    /// True if the usage message should accompany the diagnostic.
    pub fn is_usage(&self) -> bool {
        match *self {
            LaunchError::Usage { .. }
            | LaunchError::BadField { .. }
            | LaunchError::Cli { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LaunchError::Usage { ref detail } => {
                write!(f, "{}.", detail)
            },
            LaunchError::BadField { field, ref value } => {
                write!(f, "Invalid {} '{}'.", field, value)
            },
            LaunchError::Cli { ref cause } => {
                write!(f, "{}", cause.message)
            },
            LaunchError::TooManyGroups { count, max } => {
                write!(f, "Too many groups: {} given, at most {} allowed.",
                       count, max)
            },
            LaunchError::NixError { ref cause, ref detail } => {
                write!(f, "{}: {}.", detail, cause)
            },
            LaunchError::NulError { ref detail, .. } => {
                write!(f, "Embedded NUL byte in {}.", detail)
            },
            LaunchError::Unverified { ref detail } => {
                write!(f, "Credential check failed: {}.", detail)
            },
        }
    }
}

impl Error for LaunchError {
    fn source(&self) -> Option<&(Error + 'static)> {
        match *self {
            LaunchError::Cli       { ref cause } => Some(cause),
            LaunchError::NixError  { ref cause, .. } => Some(cause),
            LaunchError::NulError  { ref cause, .. } => Some(cause),
            _ => None,
        }
    }
}

pub fn usage_err<S: Into<String>>(detail: S) -> LaunchError {
    LaunchError::Usage { detail: detail.into() }
}
pub fn map_cli_err(cause: clap::Error) -> LaunchError {
    LaunchError::Cli { cause: cause }
}
pub fn map_nix_err(cause: nix::Error, detail: String) -> LaunchError {
    LaunchError::NixError { cause: cause, detail: detail }
}
pub fn map_nul_err(cause: NulError, detail: String) -> LaunchError {
    LaunchError::NulError { cause: cause, detail: detail }
}
