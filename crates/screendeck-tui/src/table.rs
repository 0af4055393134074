// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use screendeck_app::ResultRow;

/// Widest table the presentation will draw, regardless of row width.
pub const MAX_COLUMNS: usize = 10;

/// Display-ready slice of a result set.
///
/// Headers come from the first row's keys. Every row contributes its own
/// first [`MAX_COLUMNS`] values positionally, so rows whose shape differs
/// from the first one line up by position rather than by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableProjection {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableProjection {
    pub fn from_results(results: &[ResultRow]) -> Self {
        let columns = results
            .first()
            .map(|first| {
                first
                    .keys()
                    .take(MAX_COLUMNS)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let rows = results
            .iter()
            .map(|row| {
                row.values()
                    .take(MAX_COLUMNS)
                    .map(ToString::to_string)
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.columns.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Plain-text rendering with padded columns, used by the headless commands.
pub fn render_table_text(projection: &TableProjection) -> String {
    let width = projection.column_count();
    if width == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; width];
    for (index, slot) in widths.iter_mut().enumerate() {
        *slot = std::iter::once(cell_at(&projection.columns, index))
            .chain(projection.rows.iter().map(|row| cell_at(row, index)))
            .map(|text| text.chars().count())
            .max()
            .unwrap_or(0);
    }

    let format_line = |row: &[String]| {
        let line = widths
            .iter()
            .enumerate()
            .map(|(index, column_width)| {
                format!("{:<width$}", cell_at(row, index), width = *column_width)
            })
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_owned()
    };

    let mut out = String::new();
    out.push_str(&format_line(&projection.columns));
    out.push('\n');
    let rule = widths
        .iter()
        .map(|column_width| "-".repeat(*column_width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&rule);
    out.push('\n');
    for row in &projection.rows {
        out.push_str(&format_line(row));
        out.push('\n');
    }
    out
}

fn cell_at(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}
