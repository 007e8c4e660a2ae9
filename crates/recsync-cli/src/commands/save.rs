//! Save command implementation.

use std::collections::BTreeMap;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use clap::Args;

use recsync::{FieldValue, ItemResult, Record, RecordId, RecordType, SavePolicy};

use super::parse_assignment;
use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Record type (e.g., Comment)
    pub record_type: String,

    /// Record name (a new one is generated if omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Set a field (repeatable), e.g. --set text=hello
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub fields: Vec<(String, FieldValue)>,

    /// JSON file of typed fields (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,

    /// Replace the whole server copy instead of merging changed fields
    #[arg(long)]
    pub replace: bool,
}

pub async fn run(args: SaveArgs) -> Result<()> {
    let client = Profile::resolve()?.connect()?;
    let record_type = RecordType::new(&args.record_type).context("Invalid record type")?;

    let mut record = match &args.id {
        Some(id) => Record::with_id(RecordId::new(id).context("Invalid record name")?, record_type),
        None => Record::new(record_type),
    };

    if let Some(path) = &args.json {
        for (key, value) in read_fields(path)? {
            record.set(key, value);
        }
    }
    for (key, value) in args.fields {
        record.set(key, value);
    }

    if record.fields().is_empty() {
        bail!("Nothing to save: pass --set or --json");
    }

    if !args.replace {
        let saved = client.save(record).await.context("Failed to save record")?;
        output::success(&format!("Saved {}", saved.id()));
        return output::record(&saved, true);
    }

    let mut report = |item: &ItemResult| output::item(item);
    let outcome = client
        .save_batch(vec![record], SavePolicy::AllKeys, Some(&mut report))
        .await;

    if let Some(e) = outcome.error {
        return Err(e).context("Failed to save record");
    }
    Ok(())
}

/// Read a JSON object of typed field values from a file or stdin.
fn read_fields(path: &str) -> Result<BTreeMap<String, FieldValue>> {
    let content = if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).context("Failed to read JSON file")?
    };

    serde_json::from_str(&content).context("Invalid field JSON")
}
