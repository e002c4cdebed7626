use crate::row::ScriptRow;
use serde::Serialize;
use thiserror::Error;

/// Column headers shared by the page and every export, in column order
pub const HEADERS: [&str; 4] = ["페이지 번호", "애니메이션 적용 대상", "효과 설명", "사용할 대본"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("The script table is empty.")]
    Empty,
}

/// Ordered, append-only table of script rows
///
/// Rows have no identity beyond their position. The table only grows at the
/// tail, shrinks at the tail, or is replaced wholesale by [`ScriptTable::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptTable {
    rows: Vec<ScriptRow>,
}

impl ScriptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row at the tail and return the new length
    pub fn append(&mut self, row: ScriptRow) -> usize {
        self.rows.push(row);
        self.rows.len()
    }

    /// Remove and return the last row
    ///
    /// # Errors
    /// * `TableError::Empty` if there is nothing to remove; the table is left untouched
    pub fn delete_last(&mut self) -> Result<ScriptRow, TableError> {
        self.rows.pop().ok_or(TableError::Empty)
    }

    /// Replace the table with an empty one
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn rows(&self) -> &[ScriptRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &'static [&'static str; 4] {
        &HEADERS
    }
}
