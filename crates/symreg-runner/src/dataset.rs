//! Tabular input parsing and schema validation
//!
//! Input arrives as delimited rows with a header line. The target and
//! feature columns are selected by name; rows with missing cells are
//! dropped. Every error here is a caller error and maps to
//! `MalformedInput` at the runner boundary.

use thiserror::Error;

/// Dataset validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Input data is empty")]
    Empty,

    #[error("Column '{0}' not found in data")]
    MissingColumn(String),

    #[error("No feature columns available")]
    NoFeatures,

    #[error("Row {row} has {got} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Non-numeric value '{value}' in column '{column}' at row {row}")]
    NonNumeric {
        column: String,
        value: String,
        row: usize,
    },

    #[error("No rows remain after dropping incomplete rows")]
    NoUsableRows,
}

/// Validated numeric table, split into feature columns and a target column
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature column names, declaration order
    pub feature_names: Vec<String>,

    /// Target column name
    pub target_name: String,

    /// Feature values, column-major: one vector per feature
    pub features: Vec<Vec<f64>>,

    /// Target values, one per retained row
    pub target: Vec<f64>,
}

impl Dataset {
    /// Parse delimited rows with a header and select the named columns.
    ///
    /// An empty `x_names` selects every column except the target. Cells
    /// that are empty or literally `nan` mark their row incomplete; such
    /// rows are dropped.
    pub fn parse(input: &str, y_name: &str, x_names: &[String]) -> Result<Self, DatasetError> {
        let mut lines = input.lines().map(str::trim).filter(|l| !l.is_empty());

        let header: Vec<String> = match lines.next() {
            Some(line) => line.split(',').map(|c| c.trim().to_string()).collect(),
            None => return Err(DatasetError::Empty),
        };

        let y_idx = header
            .iter()
            .position(|c| c == y_name)
            .ok_or_else(|| DatasetError::MissingColumn(y_name.to_string()))?;

        let (feature_names, feature_idx): (Vec<String>, Vec<usize>) = if x_names.is_empty() {
            header
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != y_idx)
                .map(|(i, name)| (name.clone(), i))
                .unzip()
        } else {
            let mut idx = Vec::with_capacity(x_names.len());
            for name in x_names {
                let i = header
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| DatasetError::MissingColumn(name.clone()))?;
                idx.push(i);
            }
            (x_names.to_vec(), idx)
        };

        if feature_names.is_empty() {
            return Err(DatasetError::NoFeatures);
        }

        let mut features: Vec<Vec<f64>> = vec![Vec::new(); feature_names.len()];
        let mut target = Vec::new();

        for (row_no, line) in lines.enumerate() {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != header.len() {
                return Err(DatasetError::RaggedRow {
                    row: row_no + 1,
                    expected: header.len(),
                    got: cells.len(),
                });
            }

            let mut row_values = Vec::with_capacity(feature_idx.len() + 1);
            let mut complete = true;
            for (&col, name) in feature_idx.iter().zip(&feature_names) {
                match parse_cell(cells[col], name, row_no + 1)? {
                    Some(v) => row_values.push(v),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            let y_value = if complete {
                parse_cell(cells[y_idx], y_name, row_no + 1)?
            } else {
                None
            };

            match y_value {
                Some(y) if complete => {
                    for (column, value) in features.iter_mut().zip(row_values) {
                        column.push(value);
                    }
                    target.push(y);
                }
                // Incomplete row: dropped, mirroring NaN filtering
                _ => continue,
            }
        }

        if target.is_empty() {
            return Err(DatasetError::NoUsableRows);
        }

        Ok(Self {
            feature_names,
            target_name: y_name.to_string(),
            features,
            target,
        })
    }

    /// Number of retained rows
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// "features x rows" shape string used in result metadata
    pub fn shape(&self) -> String {
        format!("{}x{}", self.n_features(), self.n_rows())
    }
}

fn parse_cell(cell: &str, column: &str, row: usize) -> Result<Option<f64>, DatasetError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| DatasetError::NonNumeric {
            column: column.to_string(),
            value: cell.to_string(),
            row,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "a,b,y\n1,2,3\n4,5,6\n7,8,9\n";

    #[test]
    fn test_parse_with_declared_features() {
        let ds = Dataset::parse(DATA, "y", &["a".into(), "b".into()]).unwrap();
        assert_eq!(ds.feature_names, vec!["a", "b"]);
        assert_eq!(ds.features[0], vec![1.0, 4.0, 7.0]);
        assert_eq!(ds.features[1], vec![2.0, 5.0, 8.0]);
        assert_eq!(ds.target, vec![3.0, 6.0, 9.0]);
        assert_eq!(ds.shape(), "2x3");
    }

    #[test]
    fn test_infer_features_when_none_declared() {
        let ds = Dataset::parse(DATA, "y", &[]).unwrap();
        assert_eq!(ds.feature_names, vec!["a", "b"]);
        assert_eq!(ds.n_rows(), 3);
    }

    #[test]
    fn test_missing_target_column() {
        let err = Dataset::parse(DATA, "z", &[]).unwrap_err();
        assert_eq!(err, DatasetError::MissingColumn("z".into()));
    }

    #[test]
    fn test_missing_feature_column() {
        let err = Dataset::parse(DATA, "y", &["z".into()]).unwrap_err();
        assert_eq!(err, DatasetError::MissingColumn("z".into()));
    }

    #[test]
    fn test_single_column_has_no_features() {
        let err = Dataset::parse("y\n1\n2\n", "y", &[]).unwrap_err();
        assert_eq!(err, DatasetError::NoFeatures);
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let data = "a,y\n1,2\nnan,4\n5,\n7,8\n";
        let ds = Dataset::parse(data, "y", &[]).unwrap();
        assert_eq!(ds.features[0], vec![1.0, 7.0]);
        assert_eq!(ds.target, vec![2.0, 8.0]);
    }

    #[test]
    fn test_all_rows_incomplete() {
        let data = "a,y\nnan,2\n3,nan\n";
        let err = Dataset::parse(data, "y", &[]).unwrap_err();
        assert_eq!(err, DatasetError::NoUsableRows);
    }

    #[test]
    fn test_non_numeric_cell() {
        let data = "a,y\n1,2\nfoo,4\n";
        let err = Dataset::parse(data, "y", &[]).unwrap_err();
        assert!(matches!(err, DatasetError::NonNumeric { row: 2, .. }));
    }

    #[test]
    fn test_ragged_row() {
        let data = "a,b,y\n1,2,3\n4,5\n";
        let err = Dataset::parse(data, "y", &[]).unwrap_err();
        assert_eq!(
            err,
            DatasetError::RaggedRow {
                row: 2,
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Dataset::parse("", "y", &[]).unwrap_err(), DatasetError::Empty);
        assert_eq!(
            Dataset::parse("  \n\n", "y", &[]).unwrap_err(),
            DatasetError::Empty
        );
    }
}
