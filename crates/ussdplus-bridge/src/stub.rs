// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds where no SMS store is reachable (desktop, CI, iOS).
//
// Every trait method returns `PlatformUnavailable`. The handler reads a
// failing permission check as "denied", so calls answer PERMISSION_DENIED.

use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::types::Capability;

use crate::traits::*;

/// No-op bridge returned on platforms without an SMS store.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl PermissionGate for StubBridge {
    fn is_granted(&self, _capability: Capability) -> Result<bool> {
        tracing::warn!("PermissionGate::is_granted called on stub bridge");
        Err(UssdPlusError::PlatformUnavailable)
    }

    fn request(&self, _capability: Capability) -> Result<()> {
        tracing::warn!("PermissionGate::request called on stub bridge");
        Err(UssdPlusError::PlatformUnavailable)
    }
}

impl MessageStore for StubBridge {
    fn query_inbox(
        &self,
        _query: &InboxQuery,
        _visit: &mut dyn FnMut(&mut dyn InboxCursor) -> Result<()>,
    ) -> Result<()> {
        tracing::warn!("MessageStore::query_inbox called on stub bridge");
        Err(UssdPlusError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_name() {
        assert_eq!(StubBridge.platform_name(), "Desktop (stub)");
    }

    #[test]
    fn every_call_is_unavailable() {
        let bridge = StubBridge;
        assert!(matches!(
            bridge.is_granted(Capability::ReadSms),
            Err(UssdPlusError::PlatformUnavailable)
        ));

        let mut visited = false;
        let query = InboxQuery::recent("content://sms/inbox", 100);
        let result = bridge.query_inbox(&query, &mut |_| {
            visited = true;
            Ok(())
        });
        assert!(matches!(result, Err(UssdPlusError::PlatformUnavailable)));
        assert!(!visited);
    }
}
