//! Query command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use futures_util::StreamExt;

use recsync::record::CREATION_DATE_KEY;
use recsync::{FieldValue, Predicate, Query, Record, RecordType};

use super::parse_assignment;
use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Record type (e.g., Comment)
    pub record_type: String,

    /// Require a field to equal a value (repeatable)
    #[arg(long = "eq", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub filters: Vec<(String, FieldValue)>,

    /// Only records created after this RFC 3339 time
    #[arg(long)]
    pub after: Option<DateTime<Utc>>,

    /// Only records created before this RFC 3339 time
    #[arg(long)]
    pub before: Option<DateTime<Utc>>,

    /// Only records created by the caller
    #[arg(long, conflicts_with_all = ["filters", "after", "before"])]
    pub mine: bool,

    /// Stop after this many records
    #[arg(long, conflicts_with = "mine")]
    pub max: Option<usize>,

    /// Records requested per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: QueryArgs) -> Result<()> {
    let client = Profile::resolve()?.connect()?;
    let record_type = RecordType::new(&args.record_type).context("Invalid record type")?;
    let pretty = args.pretty;

    if let Some(max) = args.max {
        let query = Query::new(record_type, predicate(&args)).with_limit(args.page_size);
        let mut records = client.fetch_stream(query).take(max);
        while let Some(record) = records.next().await {
            output::record(&record.context("Query failed")?, pretty)?;
        }
        return Ok(());
    }

    let mut count = 0usize;
    let mut print = |record: &Record| {
        count += 1;
        if let Err(e) = output::record(record, pretty) {
            output::error(&format!("Failed to print {}: {}", record.id(), e));
        }
    };

    let outcome = match (&args.after, &args.before) {
        _ if args.mine => {
            client
                .fetch_for_current_identity(&record_type, Some(&mut print))
                .await
        }
        (Some(after), Some(before)) if args.filters.is_empty() && args.page_size.is_none() => {
            client
                .fetch_in_date_range(&record_type, *after, *before, Some(&mut print))
                .await
        }
        _ => {
            let query = Query::new(record_type, predicate(&args)).with_limit(args.page_size);
            client.fetch_query(query, Some(&mut print)).await
        }
    };

    if count == 0 && outcome.error.is_none() {
        eprintln!("{}", "No records found.".dimmed());
    }

    match outcome.error {
        Some(e) => Err(e).with_context(|| format!("Query stopped after {} records", count)),
        None => Ok(()),
    }
}

fn predicate(args: &QueryArgs) -> Predicate {
    let mut predicate = Predicate::all();
    for (key, value) in &args.filters {
        predicate = predicate.and(Predicate::eq(key.clone(), value.clone()));
    }
    if let Some(after) = args.after {
        predicate = predicate.and(Predicate::gt(CREATION_DATE_KEY, after));
    }
    if let Some(before) = args.before {
        predicate = predicate.and(Predicate::lt(CREATION_DATE_KEY, before));
    }
    predicate
}
