// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// USSD Plus — Core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod reply_errors;
pub mod types;

pub use config::BridgeConfig;
pub use error::UssdPlusError;
pub use types::*;
