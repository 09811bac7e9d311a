// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `getSMS` method handler.
//
// Per call: permission check → inbox query → row mapping → reply. Nothing is
// kept between calls. Every failure leaves as a PERMISSION_DENIED or
// SMS_ERROR reply; no partial message list is ever returned.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use ussdplus_bridge::traits::{InboxQuery, MessageStore, PermissionGate, PlatformBridge};
use ussdplus_core::BridgeConfig;
use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::reply_errors::{ErrorKind, reply_error};
use ussdplus_core::types::{Capability, SmsMessage};

use crate::codec::{MethodCall, MethodReply};
use crate::mapping::{ColumnLayout, map_row};
use crate::registry::MethodCallHandler;

/// Method name answered by [`SmsBridgeHandler`].
pub const GET_SMS: &str = "getSMS";

/// Answers `getSMS` from an injected permission gate and message store.
pub struct SmsBridgeHandler {
    permissions: Arc<dyn PermissionGate>,
    store: Arc<dyn MessageStore>,
    config: BridgeConfig,
}

impl SmsBridgeHandler {
    pub fn new(
        permissions: Arc<dyn PermissionGate>,
        store: Arc<dyn MessageStore>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            permissions,
            store,
            config,
        }
    }

    /// Handler over a single platform bridge that provides both collaborators.
    pub fn with_bridge<B>(bridge: Arc<B>, config: BridgeConfig) -> Self
    where
        B: PlatformBridge + 'static,
    {
        debug!(platform = bridge.platform_name(), "building SMS handler");
        Self::new(bridge.clone(), bridge, config)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Read the most recent inbox messages, newest first.
    pub fn get_sms(&self) -> Result<Vec<SmsMessage>> {
        self.check_permission()?;
        self.read_inbox()
    }

    /// Fails with `PermissionDenied` unless READ_SMS is granted. A failing
    /// check counts as a denial.
    fn check_permission(&self) -> Result<()> {
        let capability = Capability::ReadSms;
        let granted = match self.permissions.is_granted(capability) {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, %capability, "permission check failed; treating as denied");
                false
            }
        };
        if granted {
            return Ok(());
        }

        if self.config.request_permission_on_denial {
            // Detached: the prompt's outcome never feeds back into this call.
            match self.permissions.request(capability) {
                Ok(()) => debug!(%capability, "permission prompt dispatched"),
                Err(e) => warn!(error = %e, %capability, "permission prompt could not be shown"),
            }
        }

        Err(UssdPlusError::PermissionDenied(capability.to_string()))
    }

    fn inbox_query(&self) -> InboxQuery {
        let query = InboxQuery::recent(self.config.inbox_uri.as_str(), self.config.inbox_limit);
        if self.config.wildcard_projection {
            query.with_wildcard_projection()
        } else {
            query
        }
    }

    fn read_inbox(&self) -> Result<Vec<SmsMessage>> {
        let query = self.inbox_query();
        let limit = query.limit;
        let mut messages = Vec::new();

        self.store.query_inbox(&query, &mut |cursor| {
            let layout = ColumnLayout::resolve(cursor.column_names())?;
            // Stores are asked for `limit` rows but not trusted to honour it.
            while messages.len() < limit {
                let Some(row) = cursor.next_row()? else {
                    break;
                };
                messages.push(map_row(&layout, &row)?);
            }
            Ok(())
        })?;

        info!(count = messages.len(), "read SMS inbox");
        Ok(messages)
    }

    fn fail(&self, err: &UssdPlusError) -> MethodReply {
        let reply = reply_error(err);
        match reply.kind {
            ErrorKind::PermissionDenied => warn!(code = reply.code(), "getSMS refused"),
            ErrorKind::SmsError => error!(code = reply.code(), error = %err, "getSMS failed"),
        }
        reply.into()
    }
}

impl MethodCallHandler for SmsBridgeHandler {
    #[instrument(skip_all, fields(method = %call.method, call_id = %Uuid::new_v4()))]
    fn handle(&self, call: &MethodCall) -> MethodReply {
        match call.method.as_str() {
            GET_SMS => match self.get_sms() {
                Ok(messages) => match serde_json::to_value(&messages) {
                    Ok(value) => MethodReply::Success(value),
                    Err(e) => self.fail(&e.into()),
                },
                Err(e) => self.fail(&e),
            },
            other => {
                debug!(method = other, "method not implemented");
                MethodReply::NotImplemented
            }
        }
    }
}
