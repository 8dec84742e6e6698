use chrono::{DateTime, Utc};

/// Timestamp layout used in every sheet.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formatting applied to a written row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    /// Bold label in the first cell, plain values after it
    Title,
    /// Every cell bold
    Header,
    /// No formatting
    Plain,
}

impl RowStyle {
    pub fn is_bold(self, column: usize) -> bool {
        match self {
            RowStyle::Title => column == 0,
            RowStyle::Header => true,
            RowStyle::Plain => false,
        }
    }
}

/// A single spreadsheet value. Everything is written as a string.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(u64),
    Date(DateTime<Utc>),
    /// An absent value; rendered as an empty string
    Empty,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Number(value)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Date(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}
