// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Store row → SmsMessage mapping.
//
// Identifiers and dates must be integers (or text holding one). Missing
// sender or body text becomes an empty string.

use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::types::{CellValue, SmsMessage};

/// Positions of the four SMS columns within a cursor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub id: usize,
    pub address: usize,
    pub body: usize,
    pub date: usize,
}

impl ColumnLayout {
    /// Locate the SMS columns, failing on the first one that is absent.
    pub fn resolve(columns: &[String]) -> Result<Self> {
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| UssdPlusError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            body: find("body")?,
            address: find("address")?,
            date: find("date")?,
            id: find("_id")?,
        })
    }
}

/// Build a message record from one row.
pub fn map_row(layout: &ColumnLayout, row: &[CellValue]) -> Result<SmsMessage> {
    Ok(SmsMessage {
        id: integer_cell("_id", cell(row, layout.id, "_id")?)?,
        address: text_cell("address", cell(row, layout.address, "address")?)?,
        body: text_cell("body", cell(row, layout.body, "body")?)?,
        date: integer_cell("date", cell(row, layout.date, "date")?)?,
    })
}

fn cell<'a>(row: &'a [CellValue], idx: usize, column: &str) -> Result<&'a CellValue> {
    row.get(idx).ok_or_else(|| UssdPlusError::Coercion {
        column: column.to_string(),
        detail: format!("row has {} cells, column index is {idx}", row.len()),
    })
}

fn integer_cell(column: &str, value: &CellValue) -> Result<i64> {
    let coercion = |detail: String| UssdPlusError::Coercion {
        column: column.to_string(),
        detail,
    };
    match value {
        CellValue::Integer(i) => Ok(*i),
        CellValue::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|e| coercion(format!("'{text}' is not an integer: {e}"))),
        CellValue::Real(f) if f.is_finite() && f.fract() == 0.0 => {
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            if *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(*f as i64)
            } else {
                Err(coercion(format!("{f} is outside the integer range")))
            }
        }
        other => Err(coercion(format!("expected integer, found {}", other.type_name()))),
    }
}

fn text_cell(column: &str, value: &CellValue) -> Result<String> {
    match value {
        CellValue::Null => Ok(String::new()),
        CellValue::Text(text) => Ok(text.clone()),
        CellValue::Integer(i) => Ok(i.to_string()),
        CellValue::Real(f) => Ok(f.to_string()),
        CellValue::Blob(_) => Err(UssdPlusError::Coercion {
            column: column.to_string(),
            detail: "expected text, found blob".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn layout_follows_column_order() {
        let layout =
            ColumnLayout::resolve(&columns(&["thread_id", "date", "body", "address", "_id"]))
                .unwrap();
        assert_eq!(
            layout,
            ColumnLayout {
                id: 4,
                address: 3,
                body: 2,
                date: 1
            }
        );
    }

    #[test]
    fn missing_column_named() {
        let err = ColumnLayout::resolve(&columns(&["_id", "address", "date"])).unwrap_err();
        assert!(matches!(err, UssdPlusError::MissingColumn(ref c) if c == "body"));
    }

    #[test]
    fn null_text_becomes_empty() {
        let layout = ColumnLayout::resolve(&columns(&["_id", "address", "body", "date"])).unwrap();
        let row = vec![
            CellValue::Integer(9),
            CellValue::Null,
            CellValue::Null,
            CellValue::Integer(1_700_000_000_000),
        ];
        let msg = map_row(&layout, &row).unwrap();
        assert_eq!(msg.address, "");
        assert_eq!(msg.body, "");
        assert_eq!(msg.id, 9);
    }

    #[test]
    fn textual_numbers_accepted() {
        let layout = ColumnLayout::resolve(&columns(&["_id", "address", "body", "date"])).unwrap();
        let row = vec![
            CellValue::Text("12".into()),
            CellValue::Integer(100),
            CellValue::Text("Your balance is 30.00".into()),
            CellValue::Text("1700000000000".into()),
        ];
        let msg = map_row(&layout, &row).unwrap();
        assert_eq!(msg.id, 12);
        assert_eq!(msg.address, "100");
        assert_eq!(msg.date, 1_700_000_000_000);
    }

    #[test]
    fn null_id_is_coercion_error() {
        let layout = ColumnLayout::resolve(&columns(&["_id", "address", "body", "date"])).unwrap();
        let row = vec![
            CellValue::Null,
            CellValue::Text("a".into()),
            CellValue::Text("b".into()),
            CellValue::Integer(1),
        ];
        let err = map_row(&layout, &row).unwrap_err();
        assert!(matches!(err, UssdPlusError::Coercion { ref column, .. } if column == "_id"));
    }

    #[test]
    fn fractional_date_rejected() {
        assert!(integer_cell("date", &CellValue::Real(1.5)).is_err());
        assert_eq!(integer_cell("date", &CellValue::Real(2.0)).unwrap(), 2);
    }

    #[test]
    fn out_of_range_real_rejected() {
        assert!(matches!(
            integer_cell("date", &CellValue::Real(1e300)),
            Err(UssdPlusError::Coercion { .. })
        ));
        assert!(integer_cell("date", &CellValue::Real(-1e300)).is_err());
        assert!(integer_cell("date", &CellValue::Real(9_223_372_036_854_775_808.0)).is_err());
        assert_eq!(
            integer_cell("date", &CellValue::Real(-9_223_372_036_854_775_808.0)).unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn blob_body_rejected() {
        assert!(text_cell("body", &CellValue::Blob(vec![0x00])).is_err());
    }

    #[test]
    fn short_row_rejected() {
        let layout = ColumnLayout::resolve(&columns(&["_id", "address", "body", "date"])).unwrap();
        let err = map_row(&layout, &[CellValue::Integer(1)]).unwrap_err();
        assert!(matches!(err, UssdPlusError::Coercion { .. }));
    }
}
