use anyhow::Result;
use serde::Serialize;

use crate::summarize::SummaryRecord;

/// Pretty-print any serializable value as JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// A single record prints as an object, several as an array.
pub fn records_value(records: &[SummaryRecord]) -> Result<serde_json::Value> {
    Ok(match records {
        [single] => serde_json::to_value(single)?,
        many => serde_json::to_value(many)?,
    })
}
