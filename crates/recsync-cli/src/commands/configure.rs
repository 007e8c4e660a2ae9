//! Configure command implementation.

use anyhow::{Context, Result};
use clap::Args;

use recsync::StoreUrl;

use crate::output;
use crate::profile::{Profile, storage};

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Store base URL
    #[arg(long, required_unless_present = "clear")]
    pub endpoint: Option<String>,

    /// API token sent as a bearer token
    #[arg(long)]
    pub token: Option<String>,

    /// Records requested per query page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Remove the stored profile instead
    #[arg(long, conflicts_with_all = ["endpoint", "token", "page_size"])]
    pub clear: bool,
}

pub async fn run(args: ConfigureArgs) -> Result<()> {
    if args.clear {
        if storage::clear_profile()? {
            output::success("Profile removed");
        } else {
            output::warning("No profile stored");
        }
        return Ok(());
    }

    let endpoint = args.endpoint.context("--endpoint is required")?;
    let url = StoreUrl::new(&endpoint).context("Invalid store endpoint")?;

    let profile = Profile {
        endpoint: url.to_string(),
        token: args.token,
        page_size: args.page_size,
    };
    let path = storage::save_profile(&profile).context("Failed to save profile")?;

    output::success("Profile saved");
    output::field("Endpoint", &profile.endpoint);
    output::field("Path", &path.display().to_string());

    Ok(())
}
