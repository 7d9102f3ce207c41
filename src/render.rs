//! Plain-text table output for event listings.

use unicode_width::UnicodeWidthStr;

use crate::event::EventRecord;

const HEADER: [&str; 3] = ["start", "id", "title"];

/// One table line: the event's start, id and title.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub start: String,
    pub id: String,
    pub title: String,
}

impl From<&EventRecord> for EventRow {
    fn from(record: &EventRecord) -> Self {
        EventRow {
            start: record.start.to_string(),
            id: record.id.clone(),
            title: record.title.clone(),
        }
    }
}

impl EventRow {
    fn cells(&self) -> [&str; 3] {
        [&self.start, &self.id, &self.title]
    }
}

/// Render rows under a `start | id | title` header, columns left-aligned to
/// their widest cell as displayed in a terminal.
///
/// ```text
/// +-------+----+-------+
/// | start | id | title |
/// +-------+----+-------+
/// ```
pub fn render_table(rows: &[EventRow]) -> String {
    let mut widths = HEADER.map(|h| h.width());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.width());
        }
    }

    let border = render_border(&widths);

    let mut lines = vec![border.clone(), render_line(HEADER, &widths), border.clone()];
    lines.extend(rows.iter().map(|row| render_line(row.cells(), &widths)));
    if !rows.is_empty() {
        lines.push(border);
    }

    lines.join("\n")
}

fn render_border(widths: &[usize; 3]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    format!("+{}+", segments.join("+"))
}

fn render_line(cells: [&str; 3], widths: &[usize; 3]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width - cell.width();
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect();
    format!("|{}|", padded.join("|"))
}
