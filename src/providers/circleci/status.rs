use futures::future::try_join_all;
use indexmap::IndexMap;
use log::info;
use serde::Serialize;

use super::source::{BranchSummarySource, PipelineSource};
use super::types::{Pipeline, Workflow};
use crate::error::{CciError, Result};

/// Status of the most recent pipelines of a branch.
///
/// Pipelines are newest first; workflows and jobs keep the order CircleCI
/// returned them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub pipelines: Vec<Pipeline>,
}

impl Status {
    /// Returns the first workflow named `name` in the most recent pipeline.
    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.pipelines
            .first()?
            .workflows
            .iter()
            .find(|workflow| workflow.name == name)
    }
}

/// Collects the most recent pipelines of `branch` with their workflows and
/// jobs.
///
/// Pipelines are populated concurrently, one task per pipeline; inside a
/// pipeline, jobs are fetched workflow by workflow. The first failure fails
/// the whole call and nothing fetched so far is returned.
///
/// # Errors
///
/// Returns [`CciError::NoBranchSpecified`] for an empty branch before any
/// request is made, [`CciError::NoPipelines`] when the branch has no
/// pipelines, and any transport error unchanged.
pub async fn check_status<C>(client: &C, branch: &str, limit: usize) -> Result<Status>
where
    C: PipelineSource + ?Sized,
{
    if branch.is_empty() {
        return Err(CciError::NoBranchSpecified);
    }

    let limit = if limit == 0 { 1 } else { limit };

    info!("Checking status of branch {branch} (limit: {limit})");
    let pipelines = client.recent_pipelines(branch, limit).await?;

    let pipelines = try_join_all(
        pipelines
            .into_iter()
            .map(|pipeline| populate_pipeline(client, pipeline)),
    )
    .await?;

    Ok(Status { pipelines })
}

async fn populate_pipeline<C>(client: &C, mut pipeline: Pipeline) -> Result<Pipeline>
where
    C: PipelineSource + ?Sized,
{
    let mut workflows = client.workflows(&pipeline.id).await?;

    for workflow in &mut workflows {
        workflow.jobs = client.jobs(&workflow.id).await?;
    }

    pipeline.workflows = workflows;
    Ok(pipeline)
}

/// Per-workflow view of a branch built from the flat v1.1 build list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchSummary {
    pub workflows: Vec<SummaryWorkflow>,
}

impl BranchSummary {
    /// Returns the first workflow named `name`.
    pub fn workflow(&self, name: &str) -> Option<&SummaryWorkflow> {
        self.workflows.iter().find(|workflow| workflow.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryWorkflow {
    pub name: String,
    pub jobs: Vec<SummaryJob>,
}

impl SummaryWorkflow {
    /// Returns the first job named `name`.
    pub fn job(&self, name: &str) -> Option<&SummaryJob> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryJob {
    pub name: String,
    pub status: String,
    pub build_num: u64,
    pub workflow_name: String,
}

/// Groups the flat build list of `branch` by workflow name.
///
/// Workflows and the jobs inside each workflow are sorted by name so the
/// output is stable across calls.
pub async fn check_branch_summary<C>(client: &C, branch: &str) -> Result<BranchSummary>
where
    C: BranchSummarySource + ?Sized,
{
    if branch.is_empty() {
        return Err(CciError::NoBranchSpecified);
    }

    let builds = client.branch_summary(branch).await?;

    let mut jobs_by_workflow: IndexMap<String, Vec<SummaryJob>> = IndexMap::new();
    for build in builds {
        jobs_by_workflow
            .entry(build.workflows.workflow_name.clone())
            .or_default()
            .push(SummaryJob {
                name: build.workflows.job_name,
                status: build.status,
                build_num: build.build_num,
                workflow_name: build.workflows.workflow_name,
            });
    }
    jobs_by_workflow.sort_keys();

    let workflows = jobs_by_workflow
        .into_iter()
        .map(|(name, mut jobs)| {
            jobs.sort_by(|a, b| a.name.cmp(&b.name));
            SummaryWorkflow { name, jobs }
        })
        .collect();

    Ok(BranchSummary { workflows })
}
