//! CSV dataset loader.
//!
//! Reads a delimited file with a header row. The last column is the 0/1
//! label, all preceding columns are numeric features. Feature names are
//! taken from the header.

use std::path::Path;

use ndarray::{Array1, Array2};
use thiserror::Error;

use super::Dataset;

/// Errors raised while loading a dataset.
///
/// I/O failures (unreadable file) are kept distinguishable from parse
/// failures (malformed tabular input).
#[derive(Debug, Error)]
pub enum DataError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be parsed. Line numbers are 1-based and include
    /// the header.
    #[error("malformed input at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// The file parsed but contains no data rows.
    #[error("dataset contains no data rows")]
    Empty,
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => DataError::Io(io),
                _ => unreachable!(),
            }
        } else {
            let line = err.position().map_or(0, |p| p.line() as usize);
            DataError::Parse { line, reason: err.to_string() }
        }
    }
}

/// Load a CSV dataset from `path`.
///
/// The header row names the columns; the last column is the label. Every
/// field must parse as `f64`. Ragged rows and non-numeric cells surface as
/// [`DataError::Parse`] with the offending line.
pub fn load_csv(path: &Path) -> Result<Dataset, DataError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(DataError::Parse {
            line: 1,
            reason: format!(
                "expected at least one feature column and a label column, found {} column(s)",
                headers.len()
            ),
        });
    }
    let n_features = headers.len() - 1;
    let feature_names: Vec<String> = headers.iter().take(n_features).map(str::to_owned).collect();

    let mut features = Vec::new();
    let mut labels = Vec::new();
    let mut n_rows = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        // Header occupies line 1.
        let line = idx + 2;

        for (col, field) in record.iter().enumerate() {
            let value: f64 = field.trim().parse().map_err(|_| DataError::Parse {
                line,
                reason: format!("column {:?} holds non-numeric value {:?}", headers.get(col).unwrap_or(""), field),
            })?;
            if col < n_features {
                features.push(value);
            } else {
                labels.push(value);
            }
        }
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(DataError::Empty);
    }

    let features = Array2::from_shape_vec((n_rows, n_features), features)
        .expect("row-major buffer matches dimensions");
    let labels = Array1::from_vec(labels);

    Ok(Dataset::new(features, labels, feature_names))
}
