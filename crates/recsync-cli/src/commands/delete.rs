//! Delete command implementation.

use anyhow::{Context, Result};
use clap::Args;

use recsync::{ItemResult, RecordId};

use crate::output;
use crate::profile::Profile;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Record names to delete
    #[arg(required = true)]
    pub ids: Vec<String>,
}

pub async fn run(args: DeleteArgs) -> Result<()> {
    let client = Profile::resolve()?.connect()?;
    let ids = args
        .ids
        .iter()
        .map(|id| RecordId::new(id).with_context(|| format!("Invalid record name '{}'", id)))
        .collect::<Result<Vec<_>>>()?;

    if let [id] = ids.as_slice() {
        client
            .delete_by_id(id)
            .await
            .context("Failed to delete record")?;
        output::success(&format!("Deleted {}", id));
        return Ok(());
    }

    let mut report = |item: &ItemResult| output::item(item);
    let outcome = client.delete_batch(ids, Some(&mut report)).await;

    if let Some(e) = outcome.error {
        return Err(e).context("Some deletions failed");
    }
    output::success(&format!("Deleted {} records", outcome.deleted.len()));
    Ok(())
}
