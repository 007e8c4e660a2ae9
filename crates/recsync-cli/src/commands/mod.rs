//! Subcommand implementations.

mod clock;
mod configure;
mod delete;
mod get;
mod query;
mod save;
mod status;
mod subscription;
mod users;
mod whoami;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;

use recsync::FieldValue;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store the endpoint and token used by other commands
    Configure(configure::ConfigureArgs),

    /// Display the caller's identity record
    Whoami(whoami::WhoamiArgs),

    /// Check account status and discoverability permission
    Status(status::StatusArgs),

    /// Show discoverable users and their names
    Users(users::UsersArgs),

    /// Run a query and print every matching record
    Query(query::QueryArgs),

    /// Fetch a single record by name
    Get(get::GetArgs),

    /// Create or update a record
    Save(save::SaveArgs),

    /// Delete one or more records
    Delete(delete::DeleteArgs),

    /// Manage push-notification subscriptions
    #[command(subcommand)]
    Subscription(subscription::SubscriptionCommand),

    /// Watch the daily boundary window and its countdown
    Clock(clock::ClockArgs),
}

pub async fn handle(cmd: Command) -> Result<()> {
    match cmd {
        Command::Configure(args) => configure::run(args).await,
        Command::Whoami(args) => whoami::run(args).await,
        Command::Status(args) => status::run(args).await,
        Command::Users(args) => users::run(args).await,
        Command::Query(args) => query::run(args).await,
        Command::Get(args) => get::run(args).await,
        Command::Save(args) => save::run(args).await,
        Command::Delete(args) => delete::run(args).await,
        Command::Subscription(cmd) => subscription::handle(cmd).await,
        Command::Clock(args) => clock::run(args).await,
    }
}

/// Parse a `key=value` argument into a field name and typed value.
///
/// Values that parse as an integer, a float or an RFC 3339 timestamp keep
/// that type; anything else is a string. Prefix with `str:` to force a
/// string.
pub fn parse_assignment(arg: &str) -> Result<(String, FieldValue), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))?;

    if key.is_empty() {
        return Err(format!("missing field name in '{}'", arg));
    }

    Ok((key.to_string(), parse_value(value)))
}

fn parse_value(value: &str) -> FieldValue {
    if let Some(s) = value.strip_prefix("str:") {
        return FieldValue::from(s);
    }
    if let Ok(n) = value.parse::<i64>() {
        return FieldValue::from(n);
    }
    if let Ok(n) = value.parse::<f64>() {
        return FieldValue::from(n);
    }
    if let Ok(date) = value.parse::<DateTime<Utc>>() {
        return FieldValue::from(date);
    }
    FieldValue::from(value)
}
