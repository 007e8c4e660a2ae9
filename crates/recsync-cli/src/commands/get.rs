//! Get command implementation.

use anyhow::{Context, Result};
use clap::Args;

use recsync::RecordId;

use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Record name
    pub id: String,

    /// Print compact JSON on one line
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(args: GetArgs) -> Result<()> {
    let client = Profile::resolve()?.connect()?;
    let id = RecordId::new(&args.id).context("Invalid record name")?;

    let record = client
        .fetch_by_id(&id)
        .await
        .context("Failed to get record")?;

    output::record(&record, !args.compact)
}
