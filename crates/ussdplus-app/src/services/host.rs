// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop stand-in for the mobile shell: owns the channel registry, a SQLite
// inbox, and a fixed permission gate, and sends encoded calls the way the
// shell would.

use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::info;

use ussdplus_bridge::StaticPermissionGate;
use ussdplus_bridge::sqlite::{NewSms, SqliteInbox};
use ussdplus_channel::{ChannelRegistry, JsonMethodCodec, MethodCall, MethodReply, SmsBridgeHandler};
use ussdplus_core::error::Result;
use ussdplus_core::reply_errors::ErrorKind;
use ussdplus_core::{BridgeConfig, SmsMessage};

/// Senders used for seeded messages. `None` stands in for a withheld sender.
const SEED_SENDERS: [Option<&str>; 5] = [
    Some("MPESA"),
    Some("Safaricom"),
    Some("+254712345678"),
    Some("EQUITYBANK"),
    None,
];

const SEED_BODIES: [&str; 4] = [
    "Confirmed. You have received Ksh500.00",
    "Your data bundle balance is 1.2GB. Dial *544# to buy more.",
    "Your OTP is 482913",
    "Airtime top-up of Ksh100 successful.",
];

pub struct DesktopHost {
    registry: ChannelRegistry,
    permissions: Arc<StaticPermissionGate>,
    config: BridgeConfig,
}

impl DesktopHost {
    /// Register a `getSMS` handler over the inbox at `inbox_path`.
    pub fn open(inbox_path: &Path, config: BridgeConfig, granted: bool) -> Result<Self> {
        config.validate()?;
        let inbox = Arc::new(SqliteInbox::open(inbox_path)?);
        let permissions = Arc::new(StaticPermissionGate::new(granted));
        let handler = SmsBridgeHandler::new(permissions.clone(), inbox, config.clone());

        let mut registry = ChannelRegistry::new();
        registry.register(config.channel.clone(), Arc::new(handler));
        info!(channel = %config.channel, inbox = %inbox_path.display(), granted, "desktop host ready");

        Ok(Self {
            registry,
            permissions,
            config,
        })
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    /// Permission prompts the handler has asked for so far.
    pub fn permission_requests(&self) -> u32 {
        self.permissions.request_count()
    }

    /// Grant the capability, as a user accepting the prompt would.
    pub fn grant(&self) {
        self.permissions.set_granted(true);
    }

    /// Like [`call`](Self::call), but if the call was refused and a prompt
    /// was raised, accept the prompt and call once more.
    pub async fn call_accepting_prompt(&self, method: &str) -> Result<MethodReply> {
        let reply = self.call(method).await?;
        let recoverable = match &reply {
            MethodReply::Error { code, .. } => {
                ErrorKind::from_code(code).is_some_and(|kind| kind.recoverable())
            }
            _ => false,
        };
        if !recoverable || self.permission_requests() == 0 {
            return Ok(reply);
        }

        info!(method, "accepting permission prompt and retrying");
        self.grant();
        self.call(method).await
    }

    /// Encode `method`, send it over the configured channel, decode the reply.
    pub async fn call(&self, method: &str) -> Result<MethodReply> {
        let codec = JsonMethodCodec;
        let message = codec.encode_method_call(&MethodCall::new(method));
        let envelope = self.registry.send(self.channel(), message).await?;
        codec.decode_reply(&envelope)
    }
}

/// Render a reply for the terminal. Message lists gain an RFC 3339
/// `received_at`; errors say whether retrying can help.
pub fn describe_reply(method: &str, reply: MethodReply) -> Value {
    match reply {
        MethodReply::Success(result) => match serde_json::from_value::<Vec<SmsMessage>>(result.clone()) {
            Ok(messages) => {
                let items: Vec<Value> = messages
                    .iter()
                    .map(|m| {
                        json!({
                            "_id": m.id,
                            "address": m.address,
                            "body": m.body,
                            "date": m.date,
                            "received_at": m
                                .received_at()
                                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
                        })
                    })
                    .collect();
                json!({ "result": items })
            }
            Err(_) => json!({ "result": result }),
        },
        MethodReply::Error { code, message } => {
            let recoverable = ErrorKind::from_code(&code).is_some_and(|kind| kind.recoverable());
            json!({ "error": { "code": code, "message": message, "recoverable": recoverable } })
        }
        MethodReply::NotImplemented => json!({ "notImplemented": method }),
    }
}

/// Fill `inbox_path` with `count` received messages, one minute apart,
/// newest at the current time.
pub fn seed_inbox(inbox_path: &Path, count: u32) -> Result<u64> {
    let inbox = SqliteInbox::open(inbox_path)?;
    let now = Utc::now().timestamp_millis();

    for i in 0..count as usize {
        let sms = NewSms::received(
            SEED_SENDERS[i % SEED_SENDERS.len()],
            Some(SEED_BODIES[i % SEED_BODIES.len()]),
            now - i as i64 * 60_000,
        );
        inbox.insert(&sms)?;
    }

    let total = inbox.count()?;
    info!(inserted = count, total, "inbox seeded");
    Ok(total)
}
