use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{Cell, ReportError, ReportSink, RowStyle};

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME: usize = 31;

/// Excel's limit on characters in one cell.
const MAX_CELL_CHARS: usize = 32_767;

/// An `.xlsx` workbook written one row at a time.
///
/// Worksheets are filled in memory and the file is written by [`close`].
///
/// [`close`]: ReportBook::close
pub struct ReportBook {
    workbook: Workbook,
    path: PathBuf,
    sheet: Option<Worksheet>,
    sheet_names: Vec<String>,
    row: u32,
    bold: Format,
}

impl ReportBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReportBook {
            workbook: Workbook::new(),
            path: path.into(),
            sheet: None,
            sheet_names: Vec::new(),
            row: 0,
            bold: Format::new().set_bold().set_align(FormatAlign::Left),
        }
    }

    /// Names of the worksheets added so far, in order.
    #[cfg(test)]
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Write the workbook to disk.
    pub fn close(mut self) -> Result<(), ReportError> {
        if let Some(sheet) = self.sheet.take() {
            self.workbook.push_worksheet(sheet);
        }
        self.workbook.save(&self.path)?;
        debug!(path = %self.path.display(), sheets = ?self.sheet_names, "workbook saved");
        Ok(())
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &str| self.sheet_names.iter().any(|n| n.eq_ignore_ascii_case(name));
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| {
                let suffix = format!(" ({n})");
                let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
                let stem: String = base.chars().take(keep).collect();
                format!("{stem}{suffix}")
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

impl ReportSink for ReportBook {
    fn add_worksheet(&mut self, name: &str) -> Result<(), ReportError> {
        if let Some(sheet) = self.sheet.take() {
            self.workbook.push_worksheet(sheet);
        }
        let name = self.unique_name(&sheet_name(name));
        let mut sheet = Worksheet::new();
        sheet.set_name(&name)?;
        debug!(sheet = %name, "added worksheet");
        self.sheet_names.push(name);
        self.sheet = Some(sheet);
        self.row = 0;
        Ok(())
    }

    fn write(&mut self, style: RowStyle, cells: &[Cell]) -> Result<(), ReportError> {
        if style == RowStyle::Title && cells.contains(&Cell::Empty) {
            warn!(row = self.row, "absent value in title row");
        }
        let sheet = self.sheet.as_mut().ok_or(ReportError::NoWorksheet)?;
        for (column, cell) in cells.iter().enumerate() {
            let col = u16::try_from(column).map_err(|_| ReportError::TooWide(column))?;
            let text = fit_cell(cell.to_string());
            if style.is_bold(column) {
                sheet.write_string_with_format(self.row, col, text, &self.bold)?;
            } else {
                sheet.write_string(self.row, col, text)?;
            }
        }
        self.row += 1;
        Ok(())
    }

    fn add_space(&mut self) {
        self.row += 1;
    }
}

/// Cut `text` to the longest prefix Excel accepts in a cell.
fn fit_cell(mut text: String) -> String {
    if let Some((end, _)) = text.char_indices().nth(MAX_CELL_CHARS) {
        warn!(chars = text.chars().count(), "truncating cell to {MAX_CELL_CHARS} characters");
        text.truncate(end);
    }
    text
}

/// Worksheet name for a branch: its last path segment, with characters Excel
/// rejects replaced by `-`, cut to 31 characters.
pub fn sheet_name(branch: &str) -> String {
    let leaf = branch.rsplit('/').next().unwrap_or(branch);
    let cleaned: String = leaf
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '-',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    if cleaned.is_empty() {
        "branch".to_string()
    } else {
        cleaned.to_string()
    }
}
