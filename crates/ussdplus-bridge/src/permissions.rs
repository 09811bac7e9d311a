// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixed-answer permission gate for hosts without a runtime permission model.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use ussdplus_core::error::Result;
use ussdplus_core::types::Capability;

use crate::traits::PermissionGate;

/// Permission gate whose answer is set by the host.
///
/// Requests are counted but never change the grant; the desktop host
/// toggles it explicitly with [`set_granted`](Self::set_granted).
#[derive(Debug, Default)]
pub struct StaticPermissionGate {
    granted: AtomicBool,
    requests: AtomicU32,
}

impl StaticPermissionGate {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            requests: AtomicU32::new(0),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    /// Number of permission prompts dispatched so far.
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionGate for StaticPermissionGate {
    fn is_granted(&self, _capability: Capability) -> Result<bool> {
        Ok(self.granted.load(Ordering::SeqCst))
    }

    fn request(&self, capability: Capability) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        tracing::info!(%capability, "permission prompt requested (static gate)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_does_not_grant() {
        let gate = StaticPermissionGate::new(false);
        gate.request(Capability::ReadSms).unwrap();
        gate.request(Capability::ReadSms).unwrap();

        assert_eq!(gate.request_count(), 2);
        assert!(!gate.is_granted(Capability::ReadSms).unwrap());
    }

    #[test]
    fn host_can_toggle_grant() {
        let gate = StaticPermissionGate::new(false);
        gate.set_granted(true);
        assert!(gate.is_granted(Capability::ReadSms).unwrap());
    }
}
