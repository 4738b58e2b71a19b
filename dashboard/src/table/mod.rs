//! @ai:module:intent Per-student assessment scores held column-wise
//! @ai:module:layer domain
//! @ai:module:public_api AssessmentTable, TableError, TableLoader, EGRA_TASKS, EGMA_TASKS

pub mod loader;
pub mod tasks;

pub use loader::{TableLoader, TableLoaderTrait};
pub use tasks::{template_columns, EGMA_TASKS, EGRA_TASKS};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
}

/// @ai:intent Ordered student records with optional numeric scores per task column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl AssessmentTable {
    /// @ai:intent Build a table from a header and rows of equal width
    /// @ai:pre every row has columns.len() cells
    /// @ai:effects pure
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self, TableError> {
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i + 1,
                    found: row.len(),
                    expected: columns.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// @ai:intent Iterate over one column's cells, or nothing if the column is absent
    /// @ai:effects pure
    pub fn column_values<'a>(&'a self, name: &str) -> impl Iterator<Item = Option<f64>> + 'a {
        let index = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.map(|i| row[i]))
    }

    /// @ai:intent Catalog tasks present in this table, EGRA first then EGMA
    /// @ai:effects pure
    pub fn available_tasks(&self) -> Vec<&'static str> {
        EGRA_TASKS
            .iter()
            .chain(EGMA_TASKS.iter())
            .copied()
            .filter(|task| self.has_column(task))
            .collect()
    }

    /// @ai:intent Default selection: first three available EGRA and first three available EGMA tasks
    /// @ai:effects pure
    pub fn default_selection(&self) -> Vec<String> {
        let egra = EGRA_TASKS.iter().filter(|t| self.has_column(t)).take(3);
        let egma = EGMA_TASKS.iter().filter(|t| self.has_column(t)).take(3);
        egra.chain(egma).map(|t| t.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = AssessmentTable::new(cols(&["clpm", "orf"]), vec![vec![Some(1.0)]]).unwrap_err();
        assert!(matches!(err, TableError::RaggedRow { row: 1, found: 1, expected: 2 }));
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let err = AssessmentTable::new(cols(&["clpm", "clpm"]), vec![]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateColumn(ref c) if c == "clpm"));
    }

    #[test]
    fn test_column_values_absent_column_is_empty() {
        let table = AssessmentTable::new(cols(&["clpm"]), vec![vec![Some(0.0)], vec![None]]).unwrap();
        assert_eq!(table.column_values("clpm").collect::<Vec<_>>(), vec![Some(0.0), None]);
        assert_eq!(table.column_values("orf").count(), 0);
    }

    #[test]
    fn test_available_tasks_follow_catalog_order() {
        let table = AssessmentTable::new(
            cols(&["pupil_id", "addition", "orf", "clpm", "school"]),
            vec![],
        )
        .unwrap();
        assert_eq!(table.available_tasks(), vec!["clpm", "orf", "addition"]);
    }

    #[test]
    fn test_default_selection_takes_three_of_each() {
        let table = AssessmentTable::new(
            cols(&[
                "clpm", "phoneme", "sound_word", "cwpm", "number_id", "discrimin",
                "missing_number", "addition",
            ]),
            vec![],
        )
        .unwrap();
        assert_eq!(
            table.default_selection(),
            cols(&["clpm", "phoneme", "sound_word", "number_id", "discrimin", "missing_number"])
        );
    }
}
