//! Error types for netfind
//!
//! This module defines all error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

use crate::parser::ParseError;

/// Result type alias for netfind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for netfind
#[derive(Error, Debug)]
pub enum Error {
    /// A required external executable is not installed
    #[error("required tool '{tool}' was not found on PATH")]
    MissingExternalTool {
        /// Executable name
        tool: String,
    },

    /// The interface currently has no address to sweep
    #[error("interface {interface} has no assigned address")]
    InterfaceNotAssigned {
        /// Interface name
        interface: String,
    },

    /// The interface's address could not be determined
    #[error("address lookup for {interface} failed: {reason}")]
    AddressLookupFailed {
        /// Interface name
        interface: String,
        /// Failure detail
        reason: String,
    },

    /// The sweep process could not run or exited abnormally
    #[error("sweep of {target} failed: {reason}")]
    SweepInvocationFailed {
        /// Swept subnet or interface
        target: String,
        /// Failure detail (spawn error, exit status, stderr)
        reason: String,
    },

    /// The sweep did not finish within its time budget
    #[error("sweep of {target} timed out after {timeout:?}")]
    SweepTimedOut {
        /// Swept subnet or interface
        target: String,
        /// The configured budget
        timeout: Duration,
    },

    /// The sweep transcript did not match the expected grammar
    #[error("sweep output could not be parsed: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (addresses, MACs, interface names)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors while talking to external tools
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing-tool error
    pub fn missing_tool(tool: impl Into<String>) -> Self {
        Self::MissingExternalTool { tool: tool.into() }
    }

    /// Create an interface-not-assigned error
    pub fn not_assigned(interface: impl Into<String>) -> Self {
        Self::InterfaceNotAssigned {
            interface: interface.into(),
        }
    }

    /// Create an address lookup error
    pub fn lookup_failed(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AddressLookupFailed {
            interface: interface.into(),
            reason: reason.into(),
        }
    }

    /// Create a sweep invocation error
    pub fn sweep_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SweepInvocationFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a sweep timeout error
    pub fn sweep_timed_out(target: impl Into<String>, timeout: Duration) -> Self {
        Self::SweepTimedOut {
            target: target.into(),
            timeout,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error only affects one interface for one round
    pub fn is_per_interface(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotAssigned { .. }
                | Self::AddressLookupFailed { .. }
                | Self::SweepInvocationFailed { .. }
                | Self::SweepTimedOut { .. }
                | Self::Parse(_)
        )
    }
}
