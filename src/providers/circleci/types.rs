use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CircleCI project, addressed by VCS type, organization and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Repository name (e.g., "cci")
    pub name: String,
    /// Organization or user owning the repository
    pub organization: String,
    /// VCS provider slug (e.g., "github", "bitbucket")
    pub vcs_type: String,
}

impl Project {
    /// Project slug as used in API paths: `{vcs}/{org}/{name}`.
    pub fn slug(&self) -> String {
        format!("{}/{}/{}", self.vcs_type, self.organization, self.name)
    }
}

/// One CI execution triggered by a commit.
///
/// Workflows are not part of the pipeline list response; they are attached
/// once by the status aggregation and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Opaque pipeline identifier (UUID)
    pub id: String,
    /// Project-scoped sequence number
    pub number: u64,
    /// Pipeline state (e.g., "created", "errored")
    #[serde(default)]
    pub state: String,
    /// Last time the pipeline was updated
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Workflows in provider order
    #[serde(default, skip_deserializing)]
    pub workflows: Vec<Workflow>,
}

/// A named group of jobs within a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    /// Free-form provider status (e.g., "success", "failed", "running")
    #[serde(default)]
    pub status: String,
    /// Jobs in provider order
    #[serde(default, skip_deserializing)]
    pub jobs: Vec<Job>,
}

impl Workflow {
    /// Returns the first job with exactly the given name.
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// One executable unit within a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: String,
    /// Build/job number, shared with the v1.1 build endpoints
    #[serde(rename = "job_number", default)]
    pub number: u64,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Entry of the legacy v1.1 recent-builds summary for a branch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BranchBuild {
    pub build_num: u64,
    #[serde(default)]
    pub status: String,
    /// Missing for builds that did not run as part of a workflow
    #[serde(default)]
    pub workflows: BranchBuildWorkflow,
}

/// Workflow coordinates of a legacy build.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BranchBuildWorkflow {
    pub job_name: String,
    pub workflow_name: String,
}

/// Summary of a build returned when retrying through the v1.1 API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildSummary {
    pub build_num: u64,
    #[serde(default)]
    pub status: Option<String>,
}

/// Execution steps of a single job run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildDetails {
    #[serde(default)]
    pub steps: Vec<BuildStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildStep {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<BuildAction>,
}

/// A sub-step of a job run with optionally captured output.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BuildAction {
    /// Pre-signed URL holding the full output of this action
    #[serde(default)]
    pub output_url: Option<String>,
    #[serde(default)]
    pub has_output: bool,
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub index: u64,
    #[serde(default)]
    pub status: String,
}

/// One chunk of action output.
#[derive(Debug, Deserialize)]
pub(crate) struct ActionOutputMessage {
    #[serde(default)]
    pub message: String,
}

/// Body of an accepted workflow rerun.
#[derive(Debug, Deserialize)]
pub(crate) struct RerunResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_ignores_workflows_on_decode() {
        let json = r#"{"id":"p-1","number":42,"state":"created","updated_at":"2024-01-02T03:04:05Z","workflows":[{"id":"w"}]}"#;
        let pipeline: Pipeline = serde_json::from_str(json).unwrap();
        assert_eq!(pipeline.number, 42);
        assert!(pipeline.workflows.is_empty());
        assert!(pipeline.updated_at.is_some());
    }

    #[test]
    fn test_job_number_field_name() {
        let job: Job =
            serde_json::from_str(r#"{"id":"j","job_number":7,"name":"unit","status":"success"}"#)
                .unwrap();
        assert_eq!(job.number, 7);
    }

    #[test]
    fn test_action_with_null_output_url() {
        let action: BuildAction =
            serde_json::from_str(r#"{"output_url":null,"has_output":false,"step":3,"index":0}"#)
                .unwrap();
        assert!(action.output_url.is_none());
        assert!(!action.has_output);
        assert_eq!(action.step, 3);
    }

    #[test]
    fn test_workflow_job_lookup_first_match() {
        let workflow = Workflow {
            id: "w".into(),
            name: "lint".into(),
            status: "success".into(),
            jobs: vec![
                Job {
                    id: "a".into(),
                    number: 1,
                    name: "gofmt".into(),
                    status: "failed".into(),
                },
                Job {
                    id: "b".into(),
                    number: 2,
                    name: "gofmt".into(),
                    status: "success".into(),
                },
            ],
        };
        assert_eq!(workflow.job("gofmt").map(|j| j.number), Some(1));
        assert!(workflow.job("GOFMT").is_none());
    }

    #[test]
    fn test_branch_build_without_workflow() {
        let build: BranchBuild =
            serde_json::from_str(r#"{"build_num":2,"status":"success"}"#).unwrap();
        assert_eq!(build.build_num, 2);
        assert_eq!(build.workflows, BranchBuildWorkflow::default());
    }

    #[test]
    fn test_project_slug() {
        let project = Project {
            name: "cci".into(),
            organization: "tmessi".into(),
            vcs_type: "github".into(),
        };
        assert_eq!(project.slug(), "github/tmessi/cci");
    }
}
