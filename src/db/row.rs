//! Column codecs shared by the stores.

use crate::domain::value_objects::Money;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(crate) fn now_millis() -> i64 { Utc::now().timestamp_millis() }

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let millis: i64 = row.try_get(column)?;
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("timestamp {millis} out of range").into(),
    })
}

pub(crate) fn money(row: &SqliteRow, column: &str) -> Result<Money, sqlx::Error> {
    let cents: i64 = row.try_get(column)?;
    Ok(Money::from_cents(cents))
}

/// Escapes LIKE metacharacters; pair with `ESCAPE '\'`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
