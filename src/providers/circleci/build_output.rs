use log::info;
use serde::Serialize;

use super::source::BuildSource;
use crate::error::Result;

/// Output of one action, labelled with the name of its step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutput {
    pub name: String,
    pub output: String,
}

/// Captured output of a build, in step/action order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOutput {
    pub build_num: u64,
    pub steps: Vec<StepOutput>,
}

/// Fetches the output of every action of `build_num` that has any.
///
/// Actions are read one after another in the order CircleCI lists them;
/// actions without output get no entry. Any failed fetch fails the whole
/// call.
pub async fn get_build_output<C>(client: &C, build_num: u64) -> Result<BuildOutput>
where
    C: BuildSource + ?Sized,
{
    let details = client.build_details(build_num).await?;

    let mut steps = Vec::with_capacity(details.steps.len());
    for step in &details.steps {
        for action in step.actions.iter().filter(|action| action.has_output) {
            let output = client.action_output(build_num, action).await?;
            steps.push(StepOutput {
                name: step.name.clone(),
                output,
            });
        }
    }

    info!("Collected output of {} action(s) for build {build_num}", steps.len());
    Ok(BuildOutput { build_num, steps })
}
