//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the identity record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WhoamiArgs) -> Result<()> {
    let profile = Profile::resolve()?;
    let client = profile.connect()?;

    let record = client
        .fetch_current_identity_record()
        .await
        .context("Failed to resolve identity")?;

    if args.json {
        return output::json_pretty(&record);
    }

    output::field("Identity", record.id().as_str());
    output::field("Endpoint", &profile.endpoint);
    for (key, value) in record.fields() {
        output::field(key, &output::field_value(value));
    }

    Ok(())
}
