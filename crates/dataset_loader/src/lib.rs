//! Dataset loader crate for historical loan applications.
//!
//! This crate wraps the `csv` library to read the training dataset into
//! typed rows. Header names and cells are trimmed, since the public loan
//! approval dataset pads both with spaces. Numeric cells may be missing;
//! imputation happens later in `feature_extractor`.

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use loan_structs::{CATEGORICAL_COLUMNS, FEATURE_COUNT, FEATURES, ID_COLUMN, LoanStatus, TARGET_COLUMN};
use tracing::{debug, info};

/// Cell values treated as a missing number.
const MISSING_MARKERS: [&str; 5] = ["", "na", "nan", "null", "none"];

/// Errors raised while reading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Line {line}: invalid number {value:?} in column {column}")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("Line {line}: missing value in column {column}")]
    MissingValue { line: u64, column: &'static str },

    #[error("Line {line}: invalid loan status {value:?}")]
    InvalidLabel { line: u64, value: String },

    #[error("Dataset contains no rows")]
    Empty,
}

/// One historical loan application as read from the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    /// Row identifier. Carries no signal and is never fed to the model.
    pub loan_id: Option<String>,
    /// Numeric features in schema order; `None` marks a missing cell.
    pub features: [Option<f64>; FEATURE_COUNT],
    /// Raw categorical values, in `CATEGORICAL_COLUMNS` order.
    pub categorical: [String; CATEGORICAL_COLUMNS.len()],
    /// Ground-truth outcome.
    pub loan_status: LoanStatus,
}

/// A fully parsed dataset.
#[derive(Debug, Clone, Default)]
pub struct ParsedDataset {
    pub rows: Vec<LoanApplication>,
}

impl ParsedDataset {
    /// Returns the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Counts missing numeric cells across all rows.
    #[must_use]
    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.features.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

/// Loads a dataset from a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a required column is
/// absent, or a row cannot be parsed.
pub fn load_dataset(path: &Path) -> Result<ParsedDataset, DatasetError> {
    info!(path = %path.display(), "Loading dataset");
    let reader = reader_builder().from_path(path)?;
    let dataset = read_rows(reader)?;
    info!(
        rows = dataset.len(),
        missing_cells = dataset.missing_cells(),
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Parses a dataset from any reader producing CSV text.
///
/// # Errors
///
/// Same as [`load_dataset`].
pub fn parse_dataset<R: io::Read>(reader: R) -> Result<ParsedDataset, DatasetError> {
    read_rows(reader_builder().from_reader(reader))
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.trim(Trim::All);
    builder
}

fn read_rows<R: io::Read>(mut reader: csv::Reader<R>) -> Result<ParsedDataset, DatasetError> {
    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = record.position().map_or(i as u64 + 2, csv::Position::line);
        rows.push(columns.parse_row(&record, line)?);
    }

    if rows.is_empty() {
        return Err(DatasetError::Empty);
    }

    debug!(rows = rows.len(), "Parsed dataset rows");
    Ok(ParsedDataset { rows })
}

/// Positions of the required columns within a header row.
#[derive(Debug)]
struct ColumnIndex {
    id: Option<usize>,
    features: [usize; FEATURE_COUNT],
    categorical: [usize; CATEGORICAL_COLUMNS.len()],
    target: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or(DatasetError::MissingColumn(name))
        };

        let mut features = [0; FEATURE_COUNT];
        for (slot, feature) in features.iter_mut().zip(FEATURES.iter()) {
            *slot = find(feature.name)?;
        }

        let mut categorical = [0; CATEGORICAL_COLUMNS.len()];
        for (slot, name) in categorical.iter_mut().zip(CATEGORICAL_COLUMNS) {
            *slot = find(name)?;
        }

        Ok(Self {
            id: find(ID_COLUMN).ok(),
            features,
            categorical,
            target: find(TARGET_COLUMN)?,
        })
    }

    fn parse_row(&self, record: &StringRecord, line: u64) -> Result<LoanApplication, DatasetError> {
        let cell = |idx: usize| record.get(idx).unwrap_or_default();

        let mut features = [None; FEATURE_COUNT];
        for ((slot, &idx), feature) in features.iter_mut().zip(&self.features).zip(FEATURES.iter()) {
            *slot = parse_numeric(cell(idx)).ok_or_else(|| DatasetError::InvalidNumber {
                line,
                column: feature.name,
                value: cell(idx).to_string(),
            })?;
        }

        let mut categorical: [String; CATEGORICAL_COLUMNS.len()] = Default::default();
        for ((slot, &idx), column) in categorical
            .iter_mut()
            .zip(&self.categorical)
            .zip(CATEGORICAL_COLUMNS)
        {
            let value = cell(idx);
            if value.is_empty() {
                return Err(DatasetError::MissingValue { line, column });
            }
            *slot = value.to_string();
        }

        let label = cell(self.target);
        let loan_status = label
            .parse::<LoanStatus>()
            .map_err(|_| DatasetError::InvalidLabel {
                line,
                value: label.to_string(),
            })?;

        Ok(LoanApplication {
            loan_id: self.id.map(|idx| cell(idx).to_string()),
            features,
            categorical,
            loan_status,
        })
    }
}

/// Parses a numeric cell.
///
/// Returns `Some(None)` for a missing value and `None` for text that is not
/// a finite number.
fn parse_numeric(value: &str) -> Option<Option<f64>> {
    if MISSING_MARKERS.contains(&value.to_lowercase().as_str()) {
        return Some(None);
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some)
}
