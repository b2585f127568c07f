use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use super::core::{read_json, CircleCiClient};
use crate::error::{CciError, Result};
use crate::providers::circleci::types::{Job, Pipeline, RerunResponse, Workflow};

/// One page of a v2 list endpoint.
#[derive(serde::Deserialize)]
struct Page<T> {
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl CircleCiClient {
    /// Fetches one page of a v2 list endpoint, continuing from `page_token`.
    async fn fetch_page<T>(&self, mut url: Url, page_token: Option<&str>) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("page-token", token);
        }
        self.get_json(url).await
    }

    /// Follows `next_page_token` until the list is exhausted or `limit`
    /// items have been collected.
    async fn fetch_all<T>(&self, url: Url, limit: Option<usize>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut all_items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page: Page<T> = self.fetch_page(url.clone(), cursor.as_deref()).await?;
            let fetched = page.items.len();
            all_items.extend(page.items);

            if limit.is_some_and(|limit| all_items.len() >= limit) {
                break;
            }

            match page.next_page_token {
                Some(token) if cursor.as_deref() == Some(token.as_str()) => {
                    warn!("Page token {token} repeated for {url}, stopping");
                    break;
                }
                Some(token) if fetched > 0 && !token.is_empty() => cursor = Some(token),
                _ => break,
            }
        }

        Ok(all_items)
    }

    /// Most recent pipelines for `branch`, newest first.
    ///
    /// An empty result is reported as [`CciError::NoPipelines`]. At most
    /// `limit` pipelines are returned (a limit of zero is treated as one).
    ///
    /// <https://circleci.com/docs/api/v2/#operation/listPipelinesForProject>
    pub async fn recent_pipelines(&self, branch: &str, limit: usize) -> Result<Vec<Pipeline>> {
        let limit = limit.max(1);
        let mut url = self.v2_project_url(&["pipeline"]);
        if !branch.is_empty() {
            url.query_pairs_mut().append_pair("branch", branch);
        }

        let mut pipelines: Vec<Pipeline> = self.fetch_all(url, Some(limit)).await?;

        if pipelines.is_empty() {
            return Err(CciError::NoPipelines(branch.to_string()));
        }

        pipelines.truncate(limit);
        info!(
            "Fetched {} pipeline(s) for {} on branch {branch}",
            pipelines.len(),
            self.project().slug()
        );

        Ok(pipelines)
    }

    /// <https://circleci.com/docs/api/v2/#operation/listWorkflowsByPipelineId>
    pub async fn workflows(&self, pipeline_id: &str) -> Result<Vec<Workflow>> {
        let url = self.v2_url(&["pipeline", pipeline_id, "workflow"]);
        self.fetch_all(url, None).await
    }

    /// <https://circleci.com/docs/api/v2/#operation/listWorkflowJobs>
    pub async fn jobs(&self, workflow_id: &str) -> Result<Vec<Job>> {
        let url = self.v2_url(&["workflow", workflow_id, "job"]);
        self.fetch_all(url, None).await
    }

    /// Re-runs the given workflow and returns the provider's message.
    ///
    /// The endpoint documents a way to target individual jobs, but passing
    /// jobs still re-runs the whole workflow, so none are sent.
    ///
    /// <https://circleci.com/docs/api/v2/#operation/rerunWorkflow>
    pub async fn rerun_workflow(&self, workflow_id: &str) -> Result<String> {
        let url = self.v2_url(&["workflow", workflow_id, "rerun"]);
        debug!("POST {url}");

        let request = self.http.post(url).json(&serde_json::json!({}));
        let response = self.send_authenticated(request).await?;
        let rerun: RerunResponse =
            read_json(response, |status| status == StatusCode::ACCEPTED).await?;

        info!("Rerun of workflow {workflow_id} accepted");
        Ok(rerun.message)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use crate::auth::Token;
    use crate::error::CciError;
    use crate::providers::circleci::client::CircleCiClient;
    use crate::providers::circleci::types::Project;

    const PIPELINES_PATH: &str = "/api/v2/project/github/tmessi/cci/pipeline";

    fn client(url: &str) -> CircleCiClient {
        let project = Project {
            name: "cci".to_string(),
            organization: "tmessi".to_string(),
            vcs_type: "github".to_string(),
        };
        CircleCiClient::new(url, project, Token::from("valid-token")).unwrap()
    }

    fn pipeline_items(numbers: &[u64]) -> String {
        let items: Vec<_> = numbers
            .iter()
            .map(|n| {
                serde_json::json!({
                    "id": format!("p-{n}"),
                    "number": n,
                    "state": "created",
                    "updated_at": "2024-03-01T10:00:00Z",
                })
            })
            .collect();
        serde_json::json!({ "items": items, "next_page_token": null }).to_string()
    }

    #[tokio::test]
    async fn test_recent_pipelines_truncates_to_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PIPELINES_PATH)
            .match_query(Matcher::UrlEncoded("branch".into(), "main".into()))
            .with_status(200)
            .with_body(pipeline_items(&[12, 11, 10]))
            .create_async()
            .await;

        let pipelines = client(&server.url())
            .recent_pipelines("main", 2)
            .await
            .unwrap();

        assert_eq!(
            pipelines.iter().map(|p| p.number).collect::<Vec<_>>(),
            vec![12, 11]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_recent_pipelines_returns_all_below_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PIPELINES_PATH)
            .match_query(Matcher::UrlEncoded("branch".into(), "main".into()))
            .with_status(200)
            .with_body(pipeline_items(&[12, 11]))
            .create_async()
            .await;

        let pipelines = client(&server.url())
            .recent_pipelines("main", 5)
            .await
            .unwrap();

        assert_eq!(pipelines.len(), 2);
        assert!(pipelines.iter().all(|p| p.workflows.is_empty()));
    }

    #[tokio::test]
    async fn test_recent_pipelines_empty_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PIPELINES_PATH)
            .match_query(Matcher::UrlEncoded("branch".into(), "gone".into()))
            .with_status(200)
            .with_body(r#"{"items":[],"next_page_token":null}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .recent_pipelines("gone", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CciError::NoPipelines(ref branch) if branch == "gone"));
        assert_eq!(err.to_string(), "no pipelines for branch: gone");
    }

    #[tokio::test]
    async fn test_recent_pipelines_follows_page_token() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", PIPELINES_PATH)
            .match_query(Matcher::Exact("branch=main".into()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "items": [{ "id": "p-3", "number": 3, "state": "created" }],
                    "next_page_token": "next",
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", PIPELINES_PATH)
            .match_query(Matcher::Exact("branch=main&page-token=next".into()))
            .with_status(200)
            .with_body(pipeline_items(&[2, 1]))
            .create_async()
            .await;

        let pipelines = client(&server.url())
            .recent_pipelines("main", 2)
            .await
            .unwrap();

        assert_eq!(
            pipelines.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["p-3", "p-2"]
        );
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_repeated_page_token_stops_paging() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/workflow/w-1/job")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"items":[{"id":"j-1","job_number":1,"name":"unit","status":"success"}],
                    "next_page_token":"stuck"}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let jobs = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client(&server.url()).jobs("w-1"),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(jobs.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_workflows_and_jobs_keep_provider_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/pipeline/p-1/workflow")
            .with_status(200)
            .with_body(
                r#"{"items":[
                    {"id":"w-2","name":"tests","status":"failed"},
                    {"id":"w-1","name":"lint","status":"success"}
                ],"next_page_token":null}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/v2/workflow/w-2/job")
            .with_status(200)
            .with_body(
                r#"{"items":[
                    {"id":"j-9","job_number":9,"name":"unit","status":"failed"},
                    {"id":"j-8","job_number":8,"name":"integration","status":"success"}
                ],"next_page_token":null}"#,
            )
            .create_async()
            .await;

        let client = client(&server.url());
        let workflows = client.workflows("p-1").await.unwrap();
        let jobs = client.jobs("w-2").await.unwrap();

        assert_eq!(workflows[0].name, "tests");
        assert_eq!(workflows[1].name, "lint");
        assert_eq!(jobs[0].number, 9);
        assert_eq!(jobs[1].name, "integration");
    }

    #[tokio::test]
    async fn test_rerun_workflow_returns_message_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/workflow/w-1/rerun")
            .match_header("authorization", "Basic dmFsaWQtdG9rZW46")
            .with_status(202)
            .with_body(r#"{"message":"Accepted."}"#)
            .create_async()
            .await;

        let message = client(&server.url()).rerun_workflow("w-1").await.unwrap();

        assert_eq!(message, "Accepted.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rerun_workflow_requires_accepted_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v2/workflow/w-1/rerun")
            .with_status(200)
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .rerun_workflow("w-1")
            .await
            .unwrap_err();

        match err {
            CciError::ApiError { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body, r#"{"message":"ok"}"#);
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rerun_workflow_error_carries_body_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v2/workflow/w-1/rerun")
            .with_status(400)
            .with_body("Workflow is still running")
            .create_async()
            .await;

        let err = client(&server.url())
            .rerun_workflow("w-1")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            r#"response error: 400: "Workflow is still running""#
        );
    }
}
