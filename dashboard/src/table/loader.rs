//! @ai:module:intent CSV loader for assessment tables
//! @ai:module:layer infrastructure
//! @ai:module:public_api TableLoader
//! @ai:module:stateless true

use crate::table::tasks::is_task;
use crate::table::{template_columns, AssessmentTable, TableError};
use std::io::Read;
use std::path::Path;

/// @ai:intent Trait for loading assessment tables
pub trait TableLoaderTrait: Send + Sync {
    /// @ai:intent Load a table from a CSV file with a header row
    fn load_path(&self, path: &Path) -> Result<AssessmentTable, TableError>;

    /// @ai:intent Load a table from any CSV reader
    fn load_reader<R: Read>(&self, reader: R) -> Result<AssessmentTable, TableError>;
}

/// @ai:intent Reads CSV files, treating empty and non-numeric cells as missing
pub struct TableLoader {
    delimiter: u8,
}

impl TableLoader {
    /// @ai:intent Create a comma-delimited loader
    /// @ai:effects pure
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// @ai:intent Use a different field delimiter (e.g. `;` for French spreadsheets)
    /// @ai:effects pure
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn read_table<R: Read>(&self, reader: R, path: &Path) -> Result<AssessmentTable, TableError> {
        let wrap = |source| TableError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        // Byte records so that Latin-1 exports load; only task cells need to be numeric
        let headers: Vec<String> = csv_reader
            .byte_headers()
            .map_err(wrap)?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        let columns = name_unlabelled_columns(headers);

        let mut rows = Vec::new();
        for record in csv_reader.byte_records() {
            let record = record.map_err(wrap)?;
            let mut row: Vec<Option<f64>> = record
                .iter()
                .map(|cell| std::str::from_utf8(cell).ok().and_then(parse_score))
                .collect();
            if row.len() != columns.len() {
                tracing::debug!(
                    "Record {} has {} cells for {} columns; padding with missing values",
                    rows.len() + 1,
                    row.len(),
                    columns.len()
                );
                row.resize(columns.len(), None);
            }
            rows.push(row);
        }

        tracing::debug!(
            "Loaded {} rows x {} columns from {}",
            rows.len(),
            columns.len(),
            path.display()
        );

        AssessmentTable::new(columns, rows)
    }
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableLoaderTrait for TableLoader {
    /// @ai:effects fs:read
    fn load_path(&self, path: &Path) -> Result<AssessmentTable, TableError> {
        let file = std::fs::File::open(path).map_err(|e| TableError::Read {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        self.read_table(file, path)
    }

    /// @ai:effects pure
    fn load_reader<R: Read>(&self, reader: R) -> Result<AssessmentTable, TableError> {
        self.read_table(reader, Path::new("<reader>"))
    }
}

/// @ai:intent Give blank and repeated context headers a positional `column_N` name
/// @ai:post repeated task headers are left as-is so the table rejects them
/// @ai:effects pure
fn name_unlabelled_columns(headers: Vec<String>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for (i, header) in headers.into_iter().enumerate() {
        let unusable = header.is_empty() || (columns.contains(&header) && !is_task(&header));
        if !unusable {
            columns.push(header);
            continue;
        }

        let mut name = format!("column_{}", i + 1);
        let mut suffix = 2;
        while columns.contains(&name) {
            name = format!("column_{}_{}", i + 1, suffix);
            suffix += 1;
        }
        tracing::debug!("Header {} {:?} renamed to {}", i + 1, header, name);
        columns.push(name);
    }
    columns
}

/// @ai:intent Parse one cell; blanks, NA markers and text are missing values
/// @ai:effects pure
fn parse_score(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    // Accept a decimal comma as exported by French-locale spreadsheets
    let normalized = cell.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// @ai:intent Write an empty CSV with the upload template header
/// @ai:effects fs:write
pub fn write_template(path: &Path) -> Result<(), TableError> {
    let wrap = |source| TableError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    writer.write_record(template_columns()).map_err(wrap)?;
    writer.flush().map_err(|e| wrap(e.into()))?;
    Ok(())
}
