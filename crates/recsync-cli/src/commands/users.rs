//! Users command implementation.

use anyhow::{Context, Result};
use clap::Args;

use recsync::{RecordId, UserIdentity};

use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Look up a single user record instead of listing everyone
    pub id: Option<String>,

    /// Print identities as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: UsersArgs) -> Result<()> {
    let client = Profile::resolve()?.connect()?;

    let Some(id) = args.id else {
        let users = client
            .fetch_discoverable_users()
            .await
            .context("Failed to list discoverable users")?;
        if args.json {
            return output::json_pretty(&users);
        }
        if users.is_empty() {
            output::warning("No discoverable users");
        }
        for user in &users {
            print_identity(user);
        }
        return Ok(());
    };

    let id = RecordId::new(&id).context("Invalid record name")?;
    match client.fetch_user_identity(&id).await {
        Some(user) if args.json => output::json_pretty(&user),
        Some(user) => {
            print_identity(&user);
            Ok(())
        }
        None => {
            output::warning(&format!("{} is not discoverable", id));
            Ok(())
        }
    }
}

fn print_identity(user: &UserIdentity) {
    let name = user.display_name().unwrap_or_else(|| "(no name)".to_string());
    output::field(user.user_record_id.as_str(), &name);
}
