// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for EasyShare.

use std::path::PathBuf;

use thiserror::Error;

/// Wire code for request-validation failures.
pub const CODE_ARG: &str = "ARG";

/// Wire code for everything that went wrong while saving.
pub const CODE_SAVE: &str = "SAVE";

/// Top-level error type for all EasyShare operations.
#[derive(Debug, Error)]
pub enum EasyshareError {
    // -- Request validation --
    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Persistence --
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to save: {0}")]
    SaveFailed(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl EasyshareError {
    /// The error code reported across the method channel.
    ///
    /// Only request-validation failures are `ARG`; a missing source file is
    /// reported as `SAVE` because the host treats it as a failed save.
    pub fn channel_code(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) | Self::InvalidArgument(_) => CODE_ARG,
            _ => CODE_SAVE,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EasyshareError>;
