use log::{debug, info};
use reqwest::StatusCode;

use super::core::{read_json, CircleCiClient};
use crate::error::Result;
use crate::providers::circleci::types::{
    ActionOutputMessage, BranchBuild, BuildAction, BuildDetails, BuildSummary,
};

impl CircleCiClient {
    /// Recent builds on `branch` through the v1.1 API, one entry per job.
    ///
    /// <https://circleci.com/docs/api/v1/#recent-builds-for-a-single-project>
    pub async fn branch_summary(&self, branch: &str) -> Result<Vec<BranchBuild>> {
        let url = self.v1_project_url(&["tree", branch]);
        self.get_json(url).await
    }

    /// Step and action metadata of a single build.
    ///
    /// <https://circleci.com/docs/api/v1/#single-job>
    pub async fn build_details(&self, build_num: u64) -> Result<BuildDetails> {
        let build = build_num.to_string();
        self.get_json(self.v1_project_url(&[build.as_str()])).await
    }

    /// Full output text of one action of `build_num`.
    ///
    /// Actions without output and pending actions yield an empty string
    /// without touching the network. Finished actions are read from their
    /// pre-signed output URL without credentials; anything still running is
    /// read through the authenticated per-action output endpoint.
    pub async fn action_output(&self, build_num: u64, action: &BuildAction) -> Result<String> {
        if !action.has_output {
            return Ok(String::new());
        }

        let response = match (action.status.as_str(), action.output_url.as_deref()) {
            ("pending", _) => return Ok(String::new()),
            ("success" | "failed", Some(output_url)) if !output_url.is_empty() => {
                debug!("GET {output_url}");
                self.http.get(output_url).send().await?
            }
            _ => {
                let (build, step, index) = (
                    build_num.to_string(),
                    action.step.to_string(),
                    action.index.to_string(),
                );
                let url = self.v1_project_url(&[
                    build.as_str(),
                    "output",
                    step.as_str(),
                    index.as_str(),
                ]);
                debug!("GET {url}");
                self.send_authenticated(self.http.get(url)).await?
            }
        };

        let messages: Vec<ActionOutputMessage> =
            read_json(response, |status| status == StatusCode::OK).await?;

        Ok(messages.into_iter().map(|m| m.message).collect())
    }

    /// Retries a build through the v1.1 API and returns the new build.
    ///
    /// <https://circleci.com/docs/api/v1/#retry-a-build>
    pub async fn retry_build(&self, build_num: u64) -> Result<BuildSummary> {
        let build = build_num.to_string();
        let url = self.v1_project_url(&[build.as_str(), "retry"]);
        debug!("POST {url}");

        let response = self.send_authenticated(self.http.post(url)).await?;
        let summary: BuildSummary = read_json(response, |status| status.is_success()).await?;

        info!("Build {build_num} retried as build {}", summary.build_num);
        Ok(summary)
    }
}
