//! Subscription subcommand implementations.

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;

use recsync::{
    FieldValue, NotificationInfo, Predicate, RecordType, Subscription, SubscriptionId,
    SubscriptionManager, SubscriptionTriggers,
};

use super::parse_assignment;
use crate::output;
use crate::profile::Profile;

#[derive(Subcommand, Debug)]
pub enum SubscriptionCommand {
    /// Register a subscription, replacing any with the same id
    Add(AddArgs),

    /// Remove a subscription
    Remove(IdArgs),

    /// List registered subscriptions
    List(ListArgs),

    /// Show one subscription
    Show(IdArgs),
}

/// Record changes that fire a notification.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Create,
    Update,
    Delete,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Record type to watch
    pub record_type: String,

    /// Subscription id
    #[arg(long)]
    pub id: String,

    /// Require a field to equal a value (repeatable)
    #[arg(long = "eq", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub filters: Vec<(String, FieldValue)>,

    /// Changes that fire a notification (defaults to all)
    #[arg(long = "on", value_enum, value_delimiter = ',')]
    pub triggers: Vec<Trigger>,

    /// Alert text shown to the user
    #[arg(long)]
    pub alert: Option<String>,

    /// Deliver silent content-available notifications
    #[arg(long)]
    pub silent: bool,

    /// Record fields to include in the payload (repeatable)
    #[arg(long = "key")]
    pub desired_keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Subscription id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle(cmd: SubscriptionCommand) -> Result<()> {
    let manager = Profile::resolve()?.connect()?.subscriptions();

    match cmd {
        SubscriptionCommand::Add(args) => add(&manager, args).await,
        SubscriptionCommand::Remove(args) => remove(&manager, args).await,
        SubscriptionCommand::List(args) => list(&manager, args).await,
        SubscriptionCommand::Show(args) => show(&manager, args).await,
    }
}

async fn add(manager: &SubscriptionManager, args: AddArgs) -> Result<()> {
    let record_type = RecordType::new(&args.record_type).context("Invalid record type")?;
    let id = SubscriptionId::new(&args.id).context("Invalid subscription id")?;

    let predicate = args
        .filters
        .into_iter()
        .fold(Predicate::all(), |p, (key, value)| {
            p.and(Predicate::eq(key, value))
        });

    let notification = NotificationInfo {
        alert_body: args.alert,
        content_available: args.silent,
        desired_keys: (!args.desired_keys.is_empty()).then_some(args.desired_keys),
    };

    let subscription = manager
        .subscribe(
            &record_type,
            predicate,
            id,
            triggers(&args.triggers),
            notification,
        )
        .await
        .context("Failed to register subscription")?;

    output::success(&format!("Subscribed {}", subscription.id()));
    print_summary(&subscription);
    Ok(())
}

async fn remove(manager: &SubscriptionManager, args: IdArgs) -> Result<()> {
    let id = SubscriptionId::new(&args.id).context("Invalid subscription id")?;
    let removed = manager
        .unsubscribe(&id)
        .await
        .context("Failed to remove subscription")?;
    output::success(&format!("Removed {}", removed));
    Ok(())
}

async fn list(manager: &SubscriptionManager, args: ListArgs) -> Result<()> {
    let subscriptions = manager
        .list_subscriptions()
        .await
        .context("Failed to list subscriptions")?;

    if args.json {
        return output::json_pretty(&subscriptions);
    }
    if subscriptions.is_empty() {
        eprintln!("{}", "No subscriptions.".dimmed());
    }
    for subscription in &subscriptions {
        print_summary(subscription);
    }
    Ok(())
}

async fn show(manager: &SubscriptionManager, args: IdArgs) -> Result<()> {
    let id = SubscriptionId::new(&args.id).context("Invalid subscription id")?;
    let subscription = manager
        .get_subscription(&id)
        .await
        .context("Failed to get subscription")?;
    output::json_pretty(&subscription)
}

fn triggers(selected: &[Trigger]) -> SubscriptionTriggers {
    if selected.is_empty() {
        return SubscriptionTriggers::all();
    }
    SubscriptionTriggers {
        on_create: selected.contains(&Trigger::Create),
        on_update: selected.contains(&Trigger::Update),
        on_delete: selected.contains(&Trigger::Delete),
    }
}

fn print_summary(subscription: &Subscription) {
    let t = subscription.triggers();
    let fired: Vec<&str> = [
        (t.on_create, "create"),
        (t.on_update, "update"),
        (t.on_delete, "delete"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();

    println!(
        "{} {} on {}",
        subscription.id().as_str().bold(),
        subscription.record_type().as_str().cyan(),
        fired.join(",")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_triggers_means_all() {
        assert_eq!(triggers(&[]), SubscriptionTriggers::all());
    }

    #[test]
    fn selected_triggers() {
        let t = triggers(&[Trigger::Create, Trigger::Delete]);
        assert!(t.on_create);
        assert!(!t.on_update);
        assert!(t.on_delete);
    }
}
