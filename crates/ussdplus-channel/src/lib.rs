// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// USSD Plus — method channel side of the SMS bridge.
//
// Encoded calls come in by channel name, are decoded, answered by the
// `getSMS` handler, and go back out as encoded envelopes.

pub mod codec;
pub mod handler;
pub mod mapping;
pub mod registry;

#[cfg(target_os = "android")]
pub mod jni_entry;

pub use codec::{JsonMethodCodec, MethodCall, MethodReply};
pub use handler::SmsBridgeHandler;
pub use registry::{ChannelRegistry, MethodCallHandler, UnavailableHandler};
