use crate::providers::circleci::{BuildOutput, StepOutput};

/// Renders each captured step under a dashed header line.
pub fn render_build_output(build: &BuildOutput) -> String {
    build.steps.iter().map(render_step).collect()
}

fn render_step(step: &StepOutput) -> String {
    format!(
        "-- {:<50} -------------------------- \n\n{}\n",
        step.name, step.output
    )
}
