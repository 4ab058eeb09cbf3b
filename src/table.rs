// Grid rendering of booking rows

use crate::record::{Booking, COLUMN_COUNT, HEADER_LABELS};
use colored::Colorize;
use unicode_width::UnicodeWidthStr;

/// Render bookings as a boxed grid with centered cells.
///
/// Widths are terminal display columns, so wide characters stay aligned. Cell text containing line breaks is shown
/// with the breaks replaced by spaces.
pub fn render(bookings: &[Booking]) -> String {
    let rows: Vec<[String; COLUMN_COUNT]> = bookings
        .iter()
        .map(|b| b.fields().map(|f| f.replace(['\r', '\n'], " ")))
        .collect();

    let mut widths = HEADER_LABELS.map(|l| l.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let border = border_line(&widths, '-');
    let header = row_line(
        &widths,
        HEADER_LABELS.map(|l| l.bold().to_string()),
        &HEADER_LABELS.map(|l| l.width()),
    );

    let mut lines = vec![border.clone(), header];
    if rows.is_empty() {
        lines.push(border);
    } else {
        lines.push(border_line(&widths, '='));
        for row in rows {
            let lengths = row.each_ref().map(|c| c.width());
            lines.push(row_line(&widths, row, &lengths));
            lines.push(border.clone());
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn border_line(widths: &[usize; COLUMN_COUNT], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat_n(fill, width + 2));
        line.push('+');
    }
    line
}

// `lengths` are the display widths; `cells` may carry color escapes
fn row_line(widths: &[usize; COLUMN_COUNT], cells: [String; COLUMN_COUNT], lengths: &[usize; COLUMN_COUNT]) -> String {
    let mut line = String::from("|");
    for ((cell, width), len) in cells.iter().zip(widths).zip(lengths) {
        let pad = width - len;
        let left = pad / 2;
        line.push(' ');
        line.extend(std::iter::repeat_n(' ', left));
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', pad - left));
        line.push_str(" |");
    }
    line
}
