//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use recsync::{FieldValue, ItemChange, ItemResult, Record};

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a record as one JSON line, or pretty-printed.
pub fn record(record: &Record, pretty: bool) -> Result<()> {
    if pretty {
        json_pretty(record)
    } else {
        json(record)
    }
}

/// Print one line per batch item as the store reports it.
pub fn item(item: &ItemResult) {
    match &item.outcome {
        Ok(ItemChange::Saved(_)) => println!("{} {}", "SAVED".green(), item.id),
        Ok(ItemChange::Deleted) => println!("{} {}", "DELETED".red(), item.id),
        Err(e) => println!("{} {} {}", "FAILED".yellow(), item.id, e.to_string().dimmed()),
    }
}

/// Short display form of a field value for tables and summaries.
pub fn field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Double(n) => n.to_string(),
        FieldValue::Date(d) => d.to_rfc3339(),
        FieldValue::Reference(r) => format!("-> {}", r.id()),
        FieldValue::Bytes(b) => format!("<{} bytes>", b.len()),
        FieldValue::List(items) => {
            let items: Vec<_> = items.iter().map(field_value).collect();
            format!("[{}]", items.join(", "))
        }
    }
}
