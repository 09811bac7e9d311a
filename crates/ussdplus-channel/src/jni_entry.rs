// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI entry points for the Android host.
//
// The Kotlin side calls `NativeSmsChannel.init(activity)` once from
// `configureFlutterEngine`, then installs a binary message handler on the
// `ussd_plus/sms` channel and forwards each message's bytes to
// `com.example.ussd_plus.NativeSmsChannel.handleMessage(byte[]): byte[]`.
// That call lands here on the platform thread, which is where
// `requestPermissions` has to be issued from, so the handler runs inline.
//
// Nothing here may unwind across the FFI boundary.

#![cfg(target_os = "android")]

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

use jni::JNIEnv;
use jni::objects::{JByteArray, JClass, JObject};
use jni::sys::jbyteArray;

use ussdplus_bridge::android::{self, AndroidBridge};
use ussdplus_core::BridgeConfig;

use crate::handler::SmsBridgeHandler;
use crate::registry::{UnavailableHandler, dispatch, dispatch_catching};

static HANDLER: OnceLock<SmsBridgeHandler> = OnceLock::new();

/// `static void NativeSmsChannel.init(Activity activity)`
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_ussd_1plus_NativeSmsChannel_init<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    activity: JObject<'local>,
) {
    let initialised = catch_unwind(AssertUnwindSafe(|| android::initialize(&mut env, &activity)));
    match initialised {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to initialise SMS bridge");
            return;
        }
        // Another runtime already published an NDK context; ours is still recorded.
        Err(_) => tracing::warn!("NDK context was already initialised by another runtime"),
    }

    if android::is_initialized() {
        HANDLER.get_or_init(|| {
            SmsBridgeHandler::with_bridge(Arc::new(AndroidBridge::new()), BridgeConfig::default())
        });
    }
}

/// `static byte[] NativeSmsChannel.handleMessage(byte[] message)`
///
/// Returns `null` only if the JVM refuses the array copy; every handler
/// outcome, including not-implemented, comes back as an envelope. Before
/// `init` has run, every call answers `SMS_ERROR`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_example_ussd_1plus_NativeSmsChannel_handleMessage<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    message: JByteArray<'local>,
) -> jbyteArray {
    let request = match env.convert_byte_array(&message) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to copy method call bytes");
            return std::ptr::null_mut();
        }
    };

    let reply = match HANDLER.get() {
        Some(handler) => dispatch_catching(handler, &request),
        None => dispatch(
            &UnavailableHandler::new(
                "Android bridge not initialised: call NativeSmsChannel.init(activity) first",
            ),
            &request,
        ),
    };

    match env.byte_array_from_slice(&reply) {
        Ok(array) => array.into_raw(),
        Err(e) => {
            tracing::error!(error = %e, "failed to allocate reply array");
            std::ptr::null_mut()
        }
    }
}
