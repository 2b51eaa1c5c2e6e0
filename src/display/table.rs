use crate::api::models::Page;
use crate::core::query_params::QueryParamSet;
use crate::error::DisplayError;
use crate::utils::text::{single_line, truncate_text_unicode};
use chrono::{DateTime, Local};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use crossterm::terminal;
use serde_json::Value;

/// Widest a single cell may get before truncation
const MAX_CELL_WIDTH: usize = 60;

/// Formatter for list pages and parameter sets
pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Render one page of a resource listing.
    ///
    /// `columns` are `(attribute path, title)` pairs; paths use `.` to reach
    /// into nested objects (`user.username`).
    pub fn render_page(
        &self,
        page: &Page<Value>,
        columns: &[(&str, &str)],
    ) -> Result<String, DisplayError> {
        if columns.is_empty() {
            return Err(DisplayError::TableFormat(
                "no columns configured".to_string(),
            ));
        }
        if page.content.is_empty() {
            return Ok("No records found".to_string());
        }

        let mut table = self.new_table();
        table.set_header(columns.iter().map(|(_, title)| self.header_cell(title)));

        let cell_width = self.cell_width(columns.len());
        for item in &page.content {
            let row = columns.iter().map(|(path, _)| {
                let value = lookup_path(item, path);
                let text = truncate_text_unicode(&format_cell_value(value), cell_width);
                if self.use_colors && matches!(value, None | Some(Value::Null)) {
                    Cell::new(text).fg(Color::DarkGrey)
                } else {
                    Cell::new(text)
                }
            });
            table.add_row(row);
        }

        Ok(table.to_string())
    }

    /// Render a parameter set as a two-column key/value table.
    pub fn render_params(&self, params: &QueryParamSet) -> String {
        if params.is_empty() {
            return "No query parameters".to_string();
        }

        let mut table = self.new_table();
        table.set_header(vec![self.header_cell("Parameter"), self.header_cell("Value")]);
        for (key, value) in params.iter() {
            let key_cell = if self.use_colors {
                Cell::new(key).fg(Color::Cyan)
            } else {
                Cell::new(key)
            };
            table.add_row(vec![key_cell, Cell::new(value)]);
        }
        table.to_string()
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        // Leave room for borders and padding.
        let width = self.max_width.unwrap_or(80).saturating_sub(6).max(40);
        table.set_width(width as u16);
        table
    }

    fn header_cell(&self, title: &str) -> Cell {
        if self.use_colors {
            Cell::new(title)
                .add_attribute(Attribute::Bold)
                .fg(Color::Green)
        } else {
            Cell::new(title).add_attribute(Attribute::Bold)
        }
    }

    fn cell_width(&self, column_count: usize) -> usize {
        let width = self.max_width.unwrap_or(80);
        (width / column_count.max(1)).clamp(8, MAX_CELL_WIDTH)
    }
}

/// Follow a dotted attribute path through nested objects.
pub fn lookup_path<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(item, |current, segment| current.get(segment))
}

pub fn format_cell_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
            Ok(timestamp) => format_timestamp(timestamp.with_timezone(&Local)),
            Err(_) => single_line(s),
        },
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(arr)) if arr.is_empty() => "[]".to_string(),
        Some(Value::Array(arr)) => format!("[{} items]", arr.len()),
        Some(Value::Object(obj)) if obj.is_empty() => "{}".to_string(),
        Some(Value::Object(obj)) => format!("{{{} fields}}", obj.len()),
    }
}

fn format_timestamp(timestamp: DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}
