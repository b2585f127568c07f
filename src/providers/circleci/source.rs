//! Capabilities the status, output and retry operations need from CircleCI.
//!
//! [`CircleCiClient`] implements all of them; tests substitute in-memory
//! doubles.

use async_trait::async_trait;

use super::client::CircleCiClient;
use super::types::{BranchBuild, BuildAction, BuildDetails, BuildSummary, Job, Pipeline, Workflow};
use crate::error::Result;

/// Anything that can list pipelines and walk their workflows and jobs.
#[async_trait]
pub trait PipelineSource: Send + Sync {
    async fn recent_pipelines(&self, branch: &str, limit: usize) -> Result<Vec<Pipeline>>;
    async fn workflows(&self, pipeline_id: &str) -> Result<Vec<Workflow>>;
    async fn jobs(&self, workflow_id: &str) -> Result<Vec<Job>>;
}

/// Flat per-job summary of a branch (v1.1 API).
#[async_trait]
pub trait BranchSummarySource: Send + Sync {
    async fn branch_summary(&self, branch: &str) -> Result<Vec<BranchBuild>>;
}

/// Step metadata and action output of a single build.
#[async_trait]
pub trait BuildSource: Send + Sync {
    async fn build_details(&self, build_num: u64) -> Result<BuildDetails>;
    async fn action_output(&self, build_num: u64, action: &BuildAction) -> Result<String>;
}

/// Triggers re-runs of workflows and builds.
#[async_trait]
pub trait RerunTrigger: Send + Sync {
    async fn rerun_workflow(&self, workflow_id: &str) -> Result<String>;
    async fn retry_build(&self, build_num: u64) -> Result<BuildSummary>;
}

#[async_trait]
impl PipelineSource for CircleCiClient {
    async fn recent_pipelines(&self, branch: &str, limit: usize) -> Result<Vec<Pipeline>> {
        CircleCiClient::recent_pipelines(self, branch, limit).await
    }

    async fn workflows(&self, pipeline_id: &str) -> Result<Vec<Workflow>> {
        CircleCiClient::workflows(self, pipeline_id).await
    }

    async fn jobs(&self, workflow_id: &str) -> Result<Vec<Job>> {
        CircleCiClient::jobs(self, workflow_id).await
    }
}

#[async_trait]
impl BranchSummarySource for CircleCiClient {
    async fn branch_summary(&self, branch: &str) -> Result<Vec<BranchBuild>> {
        CircleCiClient::branch_summary(self, branch).await
    }
}

#[async_trait]
impl BuildSource for CircleCiClient {
    async fn build_details(&self, build_num: u64) -> Result<BuildDetails> {
        CircleCiClient::build_details(self, build_num).await
    }

    async fn action_output(&self, build_num: u64, action: &BuildAction) -> Result<String> {
        CircleCiClient::action_output(self, build_num, action).await
    }
}

#[async_trait]
impl RerunTrigger for CircleCiClient {
    async fn rerun_workflow(&self, workflow_id: &str) -> Result<String> {
        CircleCiClient::rerun_workflow(self, workflow_id).await
    }

    async fn retry_build(&self, build_num: u64) -> Result<BuildSummary> {
        CircleCiClient::retry_build(self, build_num).await
    }
}
