use feedback_core::{AppViewModel, ItemStatus, PicklistRowView, QueueRowView};

const PICKLIST_ROWS_SHOWN: usize = 20;

/// One-line summary printed whenever the view changes.
pub fn status_line(view: &AppViewModel) -> String {
    let mut line = format!(
        "[{:>3}%] {} | Items: {}",
        view.percent, view.status, view.item_count
    );
    if view.search_running {
        line.push_str(" | loading picklist");
    }
    if view.can_stop {
        line.push_str(" | `stop` to interrupt");
    }
    line
}

/// Full listing of both stores, printed on `show`.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![status_line(view)];
    if let Some(summary) = &view.failure_summary {
        lines.push(format!("Last run: {summary}"));
    }
    lines.push(format!("Pending: {}", view.raw_input));

    lines.push(format!("Queue ({}):", view.queue.len()));
    lines.extend(view.queue.iter().map(format_queue_row));

    let query = if view.search_query.is_empty() {
        "all".to_string()
    } else {
        format!("\"{}\"", view.search_query)
    };
    lines.push(format!("Picklist ({}, {query}):", view.picklist.len()));
    lines.extend(
        view.picklist
            .iter()
            .take(PICKLIST_ROWS_SHOWN)
            .enumerate()
            .map(|(index, row)| format_picklist_row(index + 1, row)),
    );
    if view.picklist.len() > PICKLIST_ROWS_SHOWN {
        lines.push(format!(
            "  ... {} more",
            view.picklist.len() - PICKLIST_ROWS_SHOWN
        ));
    }
    lines
}

fn format_queue_row(row: &QueueRowView) -> String {
    let status = match row.status {
        ItemStatus::Empty => "-",
        other => other.label(),
    };
    let mut line = format!("  {status:<6} {}", row.id);
    if !row.title.is_empty() {
        line.push_str(&format!("  {}", row.title));
    }
    if let Some(error) = &row.error {
        line.push_str(&format!("  ({error})"));
    }
    line
}

fn format_picklist_row(number: usize, row: &PicklistRowView) -> String {
    let image = if row.thumbnail_ready { "*" } else { " " };
    format!("  {number:>3}. {image} {} {}", row.id, row.title)
}
