// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for USSD Plus.

use thiserror::Error;

/// Top-level error type for all USSD Plus operations.
#[derive(Debug, Error)]
pub enum UssdPlusError {
    // -- Permission --
    #[error("permission not granted: {0}")]
    PermissionDenied(String),

    // -- Message store --
    #[error("message store query failed: {0}")]
    Store(String),

    #[error("column '{0}' does not exist")]
    MissingColumn(String),

    #[error("cannot read column '{column}': {detail}")]
    Coercion { column: String, detail: String },

    // -- Channel --
    #[error("method codec error: {0}")]
    Codec(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("invalid configuration: {0}")]
    Config(String),

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

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, UssdPlusError>;
