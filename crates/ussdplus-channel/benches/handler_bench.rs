// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for row mapping and a full getSMS dispatch in the
// ussdplus-channel crate.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ussdplus_bridge::sqlite::{NewSms, SqliteInbox};
use ussdplus_bridge::StaticPermissionGate;
use ussdplus_channel::mapping::{ColumnLayout, map_row};
use ussdplus_channel::registry::dispatch;
use ussdplus_channel::{JsonMethodCodec, MethodCall, SmsBridgeHandler};
use ussdplus_core::BridgeConfig;
use ussdplus_core::types::CellValue;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Map a full page of 100 rows, with a mix of text and null senders.
fn bench_map_rows(c: &mut Criterion) {
    let columns: Vec<String> = ["_id", "address", "body", "date"].map(String::from).to_vec();
    let layout = ColumnLayout::resolve(&columns).expect("layout");
    let rows: Vec<Vec<CellValue>> = (0..100)
        .map(|i| {
            vec![
                CellValue::Integer(i),
                if i % 7 == 0 {
                    CellValue::Null
                } else {
                    CellValue::Text("MPESA".into())
                },
                CellValue::Text(format!("Confirmed. Ksh{i}.00 received")),
                CellValue::Integer(1_700_000_000_000 - i * 60_000),
            ]
        })
        .collect();

    c.bench_function("map_rows (100)", |b| {
        b.iter(|| {
            for row in &rows {
                black_box(map_row(&layout, black_box(row)).expect("map"));
            }
        });
    });
}

/// Decode → permission → SQLite query → map → encode for 100 messages.
fn bench_dispatch_get_sms(c: &mut Criterion) {
    let inbox = SqliteInbox::open_in_memory().expect("inbox");
    for i in 0..150 {
        inbox
            .insert(&NewSms::received(Some("+254700000000"), Some("hello"), 1_000 + i))
            .expect("insert");
    }
    let handler = SmsBridgeHandler::new(
        Arc::new(StaticPermissionGate::new(true)),
        Arc::new(inbox),
        BridgeConfig::default(),
    );
    let message = JsonMethodCodec.encode_method_call(&MethodCall::new("getSMS"));

    c.bench_function("dispatch getSMS (100 of 150)", |b| {
        b.iter(|| {
            let reply = dispatch(&handler, black_box(&message));
            black_box(reply);
        });
    });
}

criterion_group!(benches, bench_map_rows, bench_dispatch_get_sms);
criterion_main!(benches);
