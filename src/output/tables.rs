use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table(labels: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            labels
                .iter()
                .map(|label| Cell::new(*label).fg(TableColor::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

/// Colors a CircleCI job or workflow status by outcome.
pub fn status_cell(status: &str) -> Cell {
    let cell = Cell::new(status);
    match status {
        "success" | "fixed" => cell.fg(TableColor::Green),
        "failed" | "failing" | "error" | "errored" | "infrastructure_fail" | "timedout"
        | "canceled" | "cancelled" | "unauthorized" => cell.fg(TableColor::Red),
        "running" | "on_hold" | "queued" | "blocked" | "not_running" | "scheduled" => {
            cell.fg(TableColor::Yellow)
        }
        _ => cell,
    }
}
