//! Account status command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use recsync::{AccountState, Advisor, Advisory, PermissionState};

use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Skip the discoverability permission check
    #[arg(long)]
    pub skip_permission: bool,
}

/// Prints advisories to the terminal.
struct TerminalAdvisor;

impl Advisor for TerminalAdvisor {
    fn present(&self, advisory: &Advisory) {
        eprintln!("{}", advisory.title.yellow().bold());
        for line in advisory.message.lines() {
            eprintln!("  {}", line);
        }
    }
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let client = Profile::resolve()?.connect()?;
    let gate = client.account_gate(Arc::new(TerminalAdvisor));

    let account = if args.skip_permission {
        gate.check_account().await
    } else {
        let (account, permission) = tokio::join!(gate.check_account(), gate.check_permission());
        output::field("Discoverability", describe_permission(permission));
        account
    };
    output::field("Account", &describe_account(&account));

    gate.ensure_available()
        .await
        .context("Synchronization is disabled")?;

    Ok(())
}

fn describe_account(state: &AccountState) -> String {
    match state {
        AccountState::Available => "available".green().to_string(),
        AccountState::Blocked(reason) => format!("{} ({})", "blocked".red(), reason),
        AccountState::Unchecked | AccountState::Checking => "unknown".dimmed().to_string(),
    }
}

fn describe_permission(state: PermissionState) -> &'static str {
    match state {
        PermissionState::Granted => "granted",
        PermissionState::Denied => "denied",
        PermissionState::Indeterminate => "indeterminate",
        PermissionState::Unchecked | PermissionState::Checking => "unknown",
    }
}
