// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! USSD Plus — Native platform bridge abstractions.
//!
//! This crate defines the collaborator traits the SMS handler is written
//! against and the implementations behind them: the Android content provider
//! (through JNI), a SQLite inbox for desktop and CI runs, and a stub for
//! platforms with no SMS store.

pub mod permissions;
pub mod sqlite;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use permissions::StaticPermissionGate;
pub use sqlite::SqliteInbox;

/// Retrieves the bridge implementation for the target operating system.
///
/// RETURNS: A boxed trait object (`dyn PlatformBridge`) that hides the
/// underlying native SDK details.
pub fn platform_bridge() -> Box<dyn traits::PlatformBridge> {
    #[cfg(target_os = "android")]
    {
        // Android: uses `jni-rs` to reach ContentResolver and the Activity.
        Box::new(android::AndroidBridge::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI/iOS: no readable SMS store.
        Box::new(stub::StubBridge)
    }
}

#[cfg(all(test, not(target_os = "android")))]
mod tests {
    use ussdplus_core::types::Capability;

    use super::*;
    use crate::traits::{PermissionGate, PlatformBridge};

    #[test]
    fn desktop_builds_get_the_stub() {
        let bridge = platform_bridge();
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
        assert!(bridge.is_granted(Capability::ReadSms).is_err());
    }
}
