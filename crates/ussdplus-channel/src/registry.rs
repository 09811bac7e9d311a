// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Name-addressed method channels.
//
// The registry maps channel names to handlers and turns an encoded call into
// an encoded reply. Handlers run on the blocking pool: store queries are
// synchronous and may be slow. Overlapping sends are neither deduplicated
// nor serialised here.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, warn};

use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::reply_errors::reply_error;

use crate::codec::{BAD_CALL, JsonMethodCodec, MethodCall, MethodReply};

/// Something that answers decoded method calls.
pub trait MethodCallHandler: Send + Sync {
    fn handle(&self, call: &MethodCall) -> MethodReply;
}

/// Decode, handle, and encode one message on the calling thread.
pub fn dispatch(handler: &dyn MethodCallHandler, message: &[u8]) -> Vec<u8> {
    let codec = JsonMethodCodec;
    let reply = match codec.decode_method_call(message) {
        Ok(call) => handler.handle(&call),
        Err(e) => {
            warn!(error = %e, bytes = message.len(), "undecodable method call");
            MethodReply::error(BAD_CALL, e.to_string())
        }
    };
    codec.encode_reply(&reply)
}

/// [`dispatch`] for foreign entry points: a panicking handler is answered
/// with an `SMS_ERROR` envelope instead of unwinding into the caller.
pub fn dispatch_catching(handler: &dyn MethodCallHandler, message: &[u8]) -> Vec<u8> {
    match catch_unwind(AssertUnwindSafe(|| dispatch(handler, message))) {
        Ok(reply) => reply,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!(%detail, "method handler panicked");
            let err = UssdPlusError::Bridge(format!("handler panicked: {detail}"));
            JsonMethodCodec.encode_reply(&reply_error(&err).into())
        }
    }
}

/// Stands in for a handler whose native side is not ready yet. Every call,
/// whatever the method, fails with `SMS_ERROR` carrying `reason`.
#[derive(Debug, Clone)]
pub struct UnavailableHandler {
    reason: String,
}

impl UnavailableHandler {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl MethodCallHandler for UnavailableHandler {
    fn handle(&self, call: &MethodCall) -> MethodReply {
        warn!(method = %call.method, reason = %self.reason, "channel not ready");
        reply_error(&UssdPlusError::Bridge(self.reason.clone())).into()
    }
}

/// Channel name → handler table.
#[derive(Default, Clone)]
pub struct ChannelRegistry {
    handlers: HashMap<String, Arc<dyn MethodCallHandler>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `channel`, replacing any previous handler.
    pub fn register(&mut self, channel: impl Into<String>, handler: Arc<dyn MethodCallHandler>) {
        let channel = channel.into();
        debug!(%channel, "method channel registered");
        self.handlers.insert(channel, handler);
    }

    pub fn is_registered(&self, channel: &str) -> bool {
        self.handlers.contains_key(channel)
    }

    /// Deliver an encoded call to `channel` and return the encoded reply.
    ///
    /// A channel with no handler answers with an empty reply, the same as a
    /// handler that does not implement the method.
    pub async fn send(&self, channel: &str, message: Vec<u8>) -> Result<Vec<u8>> {
        let Some(handler) = self.handlers.get(channel).cloned() else {
            debug!(%channel, "no handler on channel");
            return Ok(Vec::new());
        };

        tokio::task::spawn_blocking(move || dispatch(handler.as_ref(), &message))
            .await
            .map_err(|e| UssdPlusError::Bridge(format!("handler task failed: {e}")))
    }
}
