use serde::Serialize;

use super::source::RerunTrigger;
use crate::error::Result;

/// The build started by a retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetriedBuild {
    pub build_num: u64,
    /// Status of the new build as first reported (e.g., "queued")
    pub status: Option<String>,
}

/// Re-runs the whole workflow and returns the provider's message as-is.
pub async fn retry_workflow<C>(client: &C, workflow_id: &str) -> Result<String>
where
    C: RerunTrigger + ?Sized,
{
    client.rerun_workflow(workflow_id).await
}

/// Re-runs a single build through the v1.1 API.
pub async fn retry_build<C>(client: &C, build_num: u64) -> Result<RetriedBuild>
where
    C: RerunTrigger + ?Sized,
{
    let summary = client.retry_build(build_num).await?;
    Ok(RetriedBuild {
        build_num: summary.build_num,
        status: summary.status,
    })
}
