mod build_output;
mod client;
pub mod links;
mod retry;
mod source;
mod status;
mod types;

pub use build_output::{get_build_output, BuildOutput, StepOutput};
pub use client::CircleCiClient;
pub use retry::{retry_build, retry_workflow, RetriedBuild};
pub use status::{
    check_branch_summary, check_status, BranchSummary, Status, SummaryJob, SummaryWorkflow,
};
pub use types::{Job, Pipeline, Project, Workflow};
