//! CSV event replay.
//!
//! Format (header row first; `#` comments and blank lines ignored):
//!
//! ```text
//! type,order_id,trader_id,side,price,qty
//! L,1,0,B,10000,100       NewLimit
//! X,2,1,S,,50             NewMarket ("MKT"-style spellings accepted)
//! C,1,,,,                 Cancel
//! M,2,,,,75               Modify qty (blank price = same price)
//! ```

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::types::{EventKind, OrderId, Price, Qty, Side, TraderId};

/// One parsed CSV row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayRow {
    pub kind: EventKind,
    pub order_id: OrderId,
    pub trader_id: TraderId,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: unknown event type {found:?}")]
    UnknownType { line: usize, found: String },
    #[error("line {line}: bad field {field}: {value:?}")]
    BadField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Load and parse a replay file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<ReplayRow>, ReplayError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_csv(&contents)
}

/// Parse replay rows from CSV text. The first non-comment line is the
/// header and is skipped.
pub fn parse_csv(contents: &str) -> Result<Vec<ReplayRow>, ReplayError> {
    let mut rows = Vec::new();
    let mut header_seen = false;

    for (idx, raw) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let type_field = fields[0];

        let kind = match type_field.chars().next() {
            Some('L') => EventKind::NewLimit,
            Some('X') => EventKind::NewMarket,
            Some('C') => EventKind::Cancel,
            // Single-letter "M" is a modify; longer M-spellings
            // ("MKT", "Market") mean a market order.
            Some('M') => {
                if type_field.len() == 1 {
                    EventKind::Modify
                } else {
                    EventKind::NewMarket
                }
            }
            _ => {
                return Err(ReplayError::UnknownType {
                    line: line_no,
                    found: type_field.to_string(),
                })
            }
        };

        let parse_u64 = |field: &'static str, value: &str| -> Result<u64, ReplayError> {
            value.parse().map_err(|_| ReplayError::BadField {
                line: line_no,
                field,
                value: value.to_string(),
            })
        };
        let parse_i64 = |field: &'static str, value: &str| -> Result<i64, ReplayError> {
            value.parse().map_err(|_| ReplayError::BadField {
                line: line_no,
                field,
                value: value.to_string(),
            })
        };

        let mut row = ReplayRow {
            kind,
            order_id: OrderId(0),
            trader_id: TraderId(0),
            side: Side::Buy,
            price: Price(0),
            qty: Qty(0),
        };

        if let Some(v) = fields.get(1).filter(|v| !v.is_empty()) {
            row.order_id = OrderId(parse_u64("order_id", v)?);
        }
        if let Some(v) = fields.get(2).filter(|v| !v.is_empty()) {
            row.trader_id = TraderId(parse_u64("trader_id", v)? as u32);
        }
        if let Some(v) = fields.get(3).filter(|v| !v.is_empty()) {
            row.side = if v.starts_with('B') { Side::Buy } else { Side::Sell };
        }
        if let Some(v) = fields.get(4).filter(|v| !v.is_empty()) {
            row.price = Price(parse_i64("price", v)?);
        }
        if let Some(v) = fields.get(5).filter(|v| !v.is_empty()) {
            row.qty = Qty(parse_i64("qty", v)?);
        }

        rows.push(row);
    }

    Ok(rows)
}
