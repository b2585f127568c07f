use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{Config, OutputFormat, Overrides, ResolvedSettings};
use crate::git::RepoDefaults;
use crate::output::{
    bright_green, dim, render_branch_summary, render_build_output, render_status, Spinner,
};
use crate::providers::circleci::{
    check_branch_summary, check_status, get_build_output, links, retry_build, retry_workflow,
    CircleCiClient, RetriedBuild,
};
use crate::signal::until_interrupted;

#[derive(Parser)]
#[command(name = "cci")]
#[command(author, version, about = "CircleCI status from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// CircleCI API token
    #[arg(
        long,
        visible_alias = "circleci-token",
        global = true,
        env = "CIRCLE_CI_TOKEN",
        hide_env_values = true
    )]
    token: Option<String>,

    /// Version control provider of the project (github or bitbucket)
    #[arg(long, global = true, env = "PROJECT_VCS_TYPE")]
    vcs_type: Option<String>,

    /// Organization owning the project
    #[arg(long, global = true, env = "PROJECT_ORG")]
    org: Option<String>,

    /// Project name
    #[arg(long, global = true, env = "PROJECT")]
    project: Option<String>,

    /// Branch to inspect, defaults to the current git branch
    #[arg(short, long, global = true, env = "CCI_BRANCH")]
    branch: Option<String>,

    /// CircleCI base URL
    #[arg(long, visible_alias = "root-url", global = true, env = "CIRCLE_CI_URL")]
    url: Option<String>,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show workflows and jobs of the latest pipelines of a branch
    #[command(visible_aliases = ["branch-status", "s"])]
    Status {
        /// Number of pipelines to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Use the flat v1.1 branch summary
        #[arg(long, default_value_t = false)]
        legacy: bool,
    },

    /// Print the captured output of a job
    #[command(visible_aliases = ["out", "o"])]
    Output {
        /// Job number, or workflow name when a job name follows
        target: String,

        /// Job name within the workflow
        job: Option<String>,

        /// Resolve names through the flat v1.1 branch summary
        #[arg(long, default_value_t = false)]
        legacy: bool,
    },

    /// Re-run a workflow of the latest pipeline, one of its jobs, or a build
    #[command(visible_alias = "r")]
    Retry {
        /// Workflow name; a number is treated as --build
        workflow: Option<String>,

        /// Retry only this job of the workflow
        job: Option<String>,

        #[arg(long, conflicts_with_all = ["workflow", "job"])]
        build: Option<u64>,

        /// Resolve the job through the flat v1.1 branch summary
        #[arg(long, default_value_t = false, requires = "job")]
        legacy: bool,
    },
}

/// Where and how command results are written.
struct Emitter<'a> {
    format: OutputFormat,
    pretty: bool,
    path: Option<&'a Path>,
}

impl Emitter<'_> {
    fn emit<T, F>(&self, value: &T, summary: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        let rendered = match self.format {
            OutputFormat::Json if self.pretty => {
                format!("{}\n", serde_json::to_string_pretty(value)?)
            }
            OutputFormat::Json => format!("{}\n", serde_json::to_string(value)?),
            OutputFormat::Summary => summary(value),
        };

        if let Some(path) = self.path {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Output written to: {}", path.display());
        } else {
            print!("{rendered}");
        }

        Ok(())
    }
}

/// What a `retry` invocation names.
struct RetryTarget<'a> {
    workflow: Option<&'a str>,
    job: Option<&'a str>,
    build: Option<u64>,
    legacy: bool,
}

#[derive(Serialize)]
struct RerunMessage<'a> {
    workflow: &'a str,
    message: String,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            token: self.token.clone(),
            base_url: self.url.clone(),
            vcs_type: self.vcs_type.clone(),
            org: self.org.clone(),
            project: self.project.clone(),
            branch: self.branch.clone(),
        }
    }

    async fn execute_status(
        &self,
        client: &CircleCiClient,
        branch: &str,
        limit: usize,
        legacy: bool,
        emitter: &Emitter<'_>,
    ) -> Result<()> {
        info!("Collecting status for branch: {branch}");
        let spinner = Spinner::start(&format!("Fetching status of {branch}"));

        if legacy {
            let summary = until_interrupted(check_branch_summary(client, branch)).await;
            spinner.clear();
            let summary = summary.context("Failed to fetch branch summary")?;
            return emitter.emit(&summary, render_branch_summary);
        }

        let status = until_interrupted(check_status(client, branch, limit)).await;
        spinner.clear();
        let status = status.context("Failed to fetch branch status")?;

        emitter.emit(&status, |status| {
            render_status(status, client.project(), Utc::now())
        })
    }

    async fn execute_output(
        &self,
        client: &CircleCiClient,
        branch: &str,
        target: &str,
        job: Option<&str>,
        legacy: bool,
        emitter: &Emitter<'_>,
    ) -> Result<()> {
        let build_num = match job {
            Some(job) if legacy => find_legacy_build_number(client, branch, target, job).await?,
            Some(job) => find_job_number(client, branch, target, job).await?,
            None => target
                .parse::<u64>()
                .with_context(|| format!("invalid job number: {target}"))?,
        };

        info!("Fetching output of build {build_num}");
        let spinner = Spinner::start(&format!("Fetching output of build {build_num}"));
        let build = until_interrupted(get_build_output(client, build_num)).await;
        spinner.clear();
        let build = build.with_context(|| format!("Failed to fetch output of build {build_num}"))?;

        emitter.emit(&build, render_build_output)
    }

    async fn execute_retry(
        &self,
        client: &CircleCiClient,
        branch: &str,
        target: RetryTarget<'_>,
        emitter: &Emitter<'_>,
    ) -> Result<()> {
        let RetryTarget {
            workflow,
            job,
            build,
            legacy,
        } = target;

        let build = match (build, workflow, job) {
            (Some(build_num), _, _) => Some(build_num),
            (None, Some(name), Some(job)) if legacy => {
                Some(find_legacy_build_number(client, branch, name, job).await?)
            }
            (None, Some(name), Some(job)) => {
                Some(find_job_number(client, branch, name, job).await?)
            }
            (None, Some(name), None) => name.parse::<u64>().ok(),
            (None, None, _) => None,
        };

        if let Some(build_num) = build {
            let retried: RetriedBuild = until_interrupted(retry_build(client, build_num))
                .await
                .with_context(|| format!("Failed to retry build {build_num}"))?;
            return emitter.emit(&retried, |retried| {
                let status = retried.status.as_deref().unwrap_or("unknown");
                format!(
                    "{} {}\n",
                    bright_green(format!(
                        "Build {build_num} retried as build {}",
                        retried.build_num
                    )),
                    dim(format!("({status})"))
                )
            });
        }

        let name = workflow.ok_or_else(|| anyhow!("retry needs a workflow name or --build"))?;
        let status = until_interrupted(check_status(client, branch, 1))
            .await
            .context("Failed to fetch branch status")?;
        let workflow = status.workflow(name).ok_or_else(|| {
            warn!("No workflow named {name} in the latest pipeline of {branch}");
            anyhow!("workflow not found: {name}")
        })?;

        let message = until_interrupted(retry_workflow(client, &workflow.id))
            .await
            .with_context(|| format!("Failed to rerun workflow {name}"))?;

        emitter.emit(
            &RerunMessage {
                workflow: name,
                message,
            },
            |rerun| format!("{}\n", bright_green(&rerun.message)),
        )
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
        let settings =
            ResolvedSettings::resolve(self.overrides(), &config, RepoDefaults::discover(&cwd));
        let client = settings.client()?;

        let emitter = Emitter {
            format: self.format.unwrap_or(config.output.format),
            pretty: self.pretty || config.output.pretty,
            path: self.output.as_deref(),
        };
        let branch = settings.branch.as_str();

        match &self.command {
            None => {
                self.execute_status(&client, branch, config.circleci.limit, false, &emitter)
                    .await
            }
            Some(Commands::Status { limit, legacy }) => {
                let limit = limit.unwrap_or(config.circleci.limit);
                self.execute_status(&client, branch, limit, *legacy, &emitter)
                    .await
            }
            Some(Commands::Output {
                target,
                job,
                legacy,
            }) => {
                self.execute_output(&client, branch, target, job.as_deref(), *legacy, &emitter)
                    .await
            }
            Some(Commands::Retry {
                workflow,
                job,
                build,
                legacy,
            }) => {
                let target = RetryTarget {
                    workflow: workflow.as_deref(),
                    job: job.as_deref(),
                    build: *build,
                    legacy: *legacy,
                };
                self.execute_retry(&client, branch, target, &emitter).await
            }
        }
    }
}

/// Resolves `workflow`/`job` in the latest pipeline of `branch` to a job number.
async fn find_job_number(
    client: &CircleCiClient,
    branch: &str,
    workflow: &str,
    job: &str,
) -> Result<u64> {
    let status = until_interrupted(check_status(client, branch, 1))
        .await
        .context("Failed to fetch branch status")?;

    let pipeline_number = status.pipelines.first().map_or(0, |pipeline| pipeline.number);
    let found_workflow = status.workflow(workflow).ok_or_else(|| {
        warn!("No workflow named {workflow} in the latest pipeline of {branch}");
        anyhow!("workflow not found: {workflow}")
    })?;
    let found = found_workflow.job(job).ok_or_else(|| {
        warn!("No job named {job} in workflow {workflow}");
        anyhow!("job not found: {job}")
    })?;

    eprintln!(
        "  {}",
        dim(links::job_url(
            client.project(),
            pipeline_number,
            &found_workflow.id,
            found.number
        ))
    );
    Ok(found.number)
}

/// Resolves `workflow`/`job` to a build number using the v1.1 summary.
async fn find_legacy_build_number(
    client: &CircleCiClient,
    branch: &str,
    workflow: &str,
    job: &str,
) -> Result<u64> {
    let summary = until_interrupted(check_branch_summary(client, branch))
        .await
        .context("Failed to fetch branch summary")?;

    let found = summary.workflow(workflow).ok_or_else(|| {
        warn!("No workflow named {workflow} in the summary of {branch}");
        anyhow!("workflow not found: {workflow}")
    })?;
    let found = found.job(job).ok_or_else(|| {
        warn!("No job named {job} in workflow {workflow}");
        anyhow!("job not found: {job}")
    })?;

    Ok(found.build_num)
}
