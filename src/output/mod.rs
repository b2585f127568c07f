mod build;
mod progress;
mod status;
mod styling;
mod tables;

pub use build::render_build_output;
pub use progress::Spinner;
pub use status::{render_branch_summary, render_status};
pub use styling::{bright_green, dim, magenta_bold};

/// Prints the `cci` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("cci"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CircleCI status from the terminal")
    );
}
