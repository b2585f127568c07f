use std::fmt::Write;

use chrono::{DateTime, Duration, Utc};
use comfy_table::{Cell, Table};

use crate::providers::circleci::{
    links, BranchSummary, Job, Pipeline, Project, Status, SummaryJob, SummaryWorkflow, Workflow,
};

use super::styling::{bright, cyan, dim};
use super::tables::{create_table, status_cell};

/// Renders pipelines, their workflows and jobs as one table per pipeline.
///
/// Each pipeline header shows its number, how long ago it was last updated
/// relative to `now`, and its web link.
pub fn render_status(status: &Status, project: &Project, now: DateTime<Utc>) -> String {
    let mut output = String::new();

    for pipeline in &status.pipelines {
        let _ = writeln!(
            output,
            "{} {}  {}",
            bright(format!("{} pipeline:", pipeline.number)).underlined(),
            dim(pipeline_age(pipeline, now)),
            dim(links::pipeline_url(project, pipeline.number))
        );
        let _ = writeln!(output, "{}\n", pipeline_table(pipeline));
    }

    output
}

fn pipeline_table(pipeline: &Pipeline) -> Table {
    let mut table = create_table(&["Workflow", "#", "Job", "Status"]);

    for workflow in &pipeline.workflows {
        add_workflow_rows(&mut table, workflow);
    }

    table
}

fn add_workflow_rows(table: &mut Table, workflow: &Workflow) {
    if workflow.jobs.is_empty() {
        table.add_row(vec![
            Cell::new(&workflow.name),
            Cell::new(""),
            Cell::new(""),
            status_cell(&workflow.status),
        ]);
        return;
    }

    for (i, job) in workflow.jobs.iter().enumerate() {
        let name = if i == 0 { workflow.name.as_str() } else { "" };
        table.add_row(job_row(name, job));
    }
}

fn job_row(workflow_name: &str, job: &Job) -> Vec<Cell> {
    vec![
        Cell::new(workflow_name),
        Cell::new(job.number),
        Cell::new(&job.name),
        status_cell(&job.status),
    ]
}

fn pipeline_age(pipeline: &Pipeline, now: DateTime<Utc>) -> String {
    match pipeline.updated_at {
        Some(updated_at) => match humanize_duration(now - updated_at) {
            age if age.is_empty() => "just now".to_string(),
            age => format!("{age} ago"),
        },
        None => "last update unknown".to_string(),
    }
}

/// Coarsest non-zero unit of a duration: "3 days", "1 hour", "42 seconds".
///
/// Returns an empty string for durations under one second.
pub fn humanize_duration(duration: Duration) -> String {
    let pluralize = |amount: i64, unit: &str| {
        if amount > 1 {
            format!("{amount} {unit}s")
        } else {
            format!("{amount} {unit}")
        }
    };

    let seconds = duration.num_seconds();

    if seconds / 86_400 > 0 {
        return pluralize(seconds / 86_400, "day");
    }
    if (seconds / 3_600) % 24 > 0 {
        return pluralize((seconds / 3_600) % 24, "hour");
    }
    if (seconds / 60) % 60 > 0 {
        return pluralize((seconds / 60) % 60, "minute");
    }
    if seconds % 60 > 0 {
        return pluralize(seconds % 60, "second");
    }

    String::new()
}

/// Renders the flat v1.1 summary, one block per workflow.
pub fn render_branch_summary(summary: &BranchSummary) -> String {
    let mut output = String::new();

    for workflow in &summary.workflows {
        let _ = writeln!(output, "{}", cyan(format!("{}:", workflow.name)));
        let _ = writeln!(output, "{}\n", summary_table(workflow));
    }

    output
}

fn summary_table(workflow: &SummaryWorkflow) -> Table {
    let mut table = create_table(&["Build", "Job", "Status"]);
    for job in &workflow.jobs {
        table.add_row(summary_row(job));
    }
    table
}

fn summary_row(job: &SummaryJob) -> Vec<Cell> {
    vec![
        Cell::new(job.build_num),
        Cell::new(&job.name),
        status_cell(&job.status),
    ]
}
