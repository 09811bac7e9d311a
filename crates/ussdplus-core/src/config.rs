// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UssdPlusError};

/// Settings shared by the native handler and its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Method channel name; must match the name used by the application shell.
    pub channel: String,
    /// Content URI of the SMS inbox.
    pub inbox_uri: String,
    /// Maximum number of messages returned by one `getSMS` call.
    pub inbox_limit: usize,
    /// Launch the OS permission prompt when a call finds the permission missing.
    /// The call still fails; the prompt outcome is never awaited.
    pub request_permission_on_denial: bool,
    /// Query every column (`null` projection) instead of the four that are read.
    pub wildcard_projection: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel: "ussd_plus/sms".into(),
            inbox_uri: "content://sms/inbox".into(),
            inbox_limit: 100,
            request_permission_on_denial: true,
            wildcard_projection: false,
        }
    }
}

impl BridgeConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the handler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.channel.trim().is_empty() {
            return Err(UssdPlusError::Config("channel name is empty".into()));
        }
        if self.inbox_limit == 0 {
            return Err(UssdPlusError::Config("inbox_limit must be at least 1".into()));
        }
        if self.inbox_uri.trim().is_empty() {
            return Err(UssdPlusError::Config("inbox_uri is empty".into()));
        }
        Ok(())
    }
}
