//! Terminal rendering of report pages.

use crate::adapters::Organization;
use crate::core::view::ReportView;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Current page as a table followed by `Page N of M`.
pub fn render_page(view: &ReportView) -> String {
    if view.rows().is_empty() {
        return format!("No data found for this {}.", view.schema().name);
    }

    let mut table = table();
    table.set_header(
        view.active_columns()
            .into_iter()
            .map(|c| c.label)
            .collect::<Vec<_>>(),
    );
    for row in view.formatted_page() {
        table.add_row(row);
    }

    format!(
        "{}\nPage {} of {} ({} of {} rows)",
        table,
        view.page_number(),
        view.page_count(),
        view.filtered_len(),
        view.rows().len()
    )
}

pub fn render_organizations(orgs: &[Organization]) -> String {
    if orgs.is_empty() {
        return "No organizations found.".to_string();
    }
    let mut table = table();
    table.set_header(vec!["ID", "Organization"]);
    for org in orgs {
        table.add_row(vec![org.id.as_str(), org.organization.as_str()]);
    }
    table.to_string()
}
