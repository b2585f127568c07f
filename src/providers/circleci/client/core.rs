use log::debug;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{CciError, Result};
use crate::providers::circleci::types::Project;

/// HTTP client bound to one CircleCI project.
///
/// Speaks both API generations: the v1.1 project/build endpoints and the
/// v2 pipeline/workflow/job endpoints. Requests are authenticated with the
/// token as HTTP Basic username and an empty password.
#[derive(Clone)]
pub struct CircleCiClient {
    pub(super) http: Client,
    root_url: Url,
    project: Project,
    token: Token,
}

impl CircleCiClient {
    pub fn new(base_url: &str, project: Project, token: Token) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("cci/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CciError::Config(format!("Failed to create HTTP client: {e}")))?;

        Self::with_http(http, base_url, project, token)
    }

    /// Builds a client around an existing `reqwest::Client`.
    pub fn with_http(http: Client, base_url: &str, project: Project, token: Token) -> Result<Self> {
        let root_url = Url::parse(base_url)
            .map_err(|e| CciError::Config(format!("Invalid base URL: {e}")))?;

        if root_url.cannot_be_a_base() {
            return Err(CciError::Config(format!(
                "Invalid base URL: {base_url} cannot carry API paths"
            )));
        }

        debug!("CircleCI client for {} at {root_url}", project.slug());
        Ok(Self {
            http,
            root_url,
            project,
            token,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Root URL with the given path segments appended, each one encoded.
    pub(super) fn endpoint<I>(&self, segments: I) -> Url
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.root_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{root}/api/v1.1/project/{vcs}/{org}/{name}/...`
    pub(super) fn v1_project_url(&self, rest: &[&str]) -> Url {
        let base = [
            "api",
            "v1.1",
            "project",
            self.project.vcs_type.as_str(),
            self.project.organization.as_str(),
            self.project.name.as_str(),
        ];
        self.endpoint(base.iter().chain(rest.iter()))
    }

    /// `{root}/api/v2/project/{vcs}/{org}/{name}/...`
    pub(super) fn v2_project_url(&self, rest: &[&str]) -> Url {
        let base = [
            "api",
            "v2",
            "project",
            self.project.vcs_type.as_str(),
            self.project.organization.as_str(),
            self.project.name.as_str(),
        ];
        self.endpoint(base.iter().chain(rest.iter()))
    }

    /// `{root}/api/v2/...`
    pub(super) fn v2_url(&self, rest: &[&str]) -> Url {
        self.endpoint(["api", "v2"].iter().chain(rest.iter()))
    }

    /// Sends a request with the project credentials and JSON accept header.
    pub(super) async fn send_authenticated(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .basic_auth(self.token.as_str(), None::<&str>)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        Ok(response)
    }

    pub(super) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {url}");
        let response = self.send_authenticated(self.http.get(url)).await?;
        read_json(response, |status| status == StatusCode::OK).await
    }
}

/// Reads a response body and decodes it as JSON when `accept` approves the
/// status; otherwise fails with the status code and the raw, unparsed body.
pub(super) async fn read_json<T, F>(response: Response, accept: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(StatusCode) -> bool,
{
    let status = response.status();
    let body = response.text().await?;

    if !accept(status) {
        return Err(CciError::ApiError {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
