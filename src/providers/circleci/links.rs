use super::types::Project;

const APP_URL: &str = "https://app.circleci.com/pipelines";

/// Builds the web URL of a pipeline.
///
/// # Arguments
///
/// * `project` - Project the pipeline belongs to
/// * `number` - Pipeline number (e.g., 1234)
///
/// # Returns
///
/// Clickable URL (e.g., <https://app.circleci.com/pipelines/gh/org/repo/1234>)
pub fn pipeline_url(project: &Project, number: u64) -> String {
    format!(
        "{APP_URL}/{}/{}/{}/{number}",
        vcs_slug(&project.vcs_type),
        project.organization,
        project.name
    )
}

/// Builds the web URL of a job within a workflow of a pipeline.
pub fn job_url(
    project: &Project,
    pipeline_number: u64,
    workflow_id: &str,
    job_number: u64,
) -> String {
    format!(
        "{}/workflows/{workflow_id}/jobs/{job_number}",
        pipeline_url(project, pipeline_number)
    )
}

fn vcs_slug(vcs_type: &str) -> &str {
    match vcs_type {
        "github" => "gh",
        "bitbucket" => "bb",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(vcs_type: &str) -> Project {
        Project {
            name: "cci".to_string(),
            organization: "tmessi".to_string(),
            vcs_type: vcs_type.to_string(),
        }
    }

    #[test]
    fn test_pipeline_url_github() {
        assert_eq!(
            pipeline_url(&project("github"), 123),
            "https://app.circleci.com/pipelines/gh/tmessi/cci/123"
        );
    }

    #[test]
    fn test_pipeline_url_bitbucket() {
        assert_eq!(
            pipeline_url(&project("bitbucket"), 5),
            "https://app.circleci.com/pipelines/bb/tmessi/cci/5"
        );
    }

    #[test]
    fn test_pipeline_url_unknown_vcs_kept() {
        assert_eq!(
            pipeline_url(&project("circleci"), 5),
            "https://app.circleci.com/pipelines/circleci/tmessi/cci/5"
        );
    }

    #[test]
    fn test_job_url() {
        assert_eq!(
            job_url(&project("github"), 123, "0c1f", 456),
            "https://app.circleci.com/pipelines/gh/tmessi/cci/123/workflows/0c1f/jobs/456"
        );
    }
}
