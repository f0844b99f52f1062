use saccade_core::{Matrix, Result, SaccadeError, mask_from_values};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the position and label matrices live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory prefix joined onto every filename
    pub datapath: PathBuf,
    /// Horizontal eye position, one trial per row
    pub x_filename: String,
    /// Vertical eye position, optional
    pub y_filename: Option<String>,
    /// Ground-truth labels, optional
    pub labels_filename: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            datapath: PathBuf::new(),
            x_filename: "X.csv".to_string(),
            y_filename: Some("Y.csv".to_string()),
            labels_filename: None,
        }
    }
}

impl DataConfig {
    pub fn x_path(&self) -> PathBuf {
        self.datapath.join(&self.x_filename)
    }

    pub fn y_path(&self) -> Option<PathBuf> {
        self.y_filename.as_ref().map(|f| self.datapath.join(f))
    }

    pub fn labels_path(&self) -> Option<PathBuf> {
        self.labels_filename.as_ref().map(|f| self.datapath.join(f))
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.x_filename.trim().is_empty() {
            return Err("x_filename must not be empty".to_string());
        }
        if matches!(&self.y_filename, Some(f) if f.trim().is_empty()) {
            return Err("y_filename must not be empty when set".to_string());
        }
        if matches!(&self.labels_filename, Some(f) if f.trim().is_empty()) {
            return Err("labels_filename must not be empty when set".to_string());
        }
        Ok(())
    }
}

/// Loads a rectangular float matrix from `.csv`, `.txt` or `.json`.
pub fn load_matrix(path: &Path) -> Result<Matrix<f64>> {
    if !path.is_file() {
        return Err(SaccadeError::not_found("data file", path));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| SaccadeError::UnsupportedFormat(path.to_path_buf()))?;

    let matrix = match extension.as_str() {
        "csv" | "txt" => parse_csv(&fs::read_to_string(path)?)?,
        "json" => {
            let rows: Vec<Vec<f64>> = serde_json::from_str(&fs::read_to_string(path)?)?;
            Matrix::from_rows(rows)?
        }
        _ => return Err(SaccadeError::UnsupportedFormat(path.to_path_buf())),
    };

    let (rows, cols) = matrix.shape();
    info!("Loaded {} ({} trials x {} samples)", path.display(), rows, cols);
    Ok(matrix)
}

/// Optional companion matrix: `None` when not configured.
pub fn load_optional(path: Option<&Path>) -> Result<Option<Matrix<f64>>> {
    path.map(load_matrix).transpose()
}

/// Loads a ground-truth label matrix; every cell must be 0 or 1.
pub fn load_labels(path: &Path) -> Result<Matrix<u8>> {
    let values = load_matrix(path)?;
    let (rows, cols) = values.shape();
    Matrix::from_vec(rows, cols, mask_from_values(values.as_slice())?)
}

pub fn parse_csv(raw: &str) -> Result<Matrix<f64>> {
    let lines = raw
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect::<Vec<_>>();

    match parse_rows(&lines) {
        Ok(matrix) => Ok(matrix),
        Err(err) => {
            // A single textual header row is tolerated
            if lines.len() > 1 && looks_like_header(lines[0].1) {
                debug!("Skipping CSV header on line {}", lines[0].0);
                return parse_rows(&lines[1..]);
            }
            Err(err)
        }
    }
}

fn parse_rows(lines: &[(usize, &str)]) -> Result<Matrix<f64>> {
    let rows = lines
        .iter()
        .map(|&(line_no, line)| {
            line.split(',')
                .map(str::trim)
                .enumerate()
                .map(|(col, cell)| {
                    cell.parse::<f64>().map_err(|_| SaccadeError::Parse {
                        line: line_no,
                        column: col + 1,
                        message: format!("'{cell}' is not a number"),
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Matrix::from_rows(rows)
}

fn looks_like_header(line: &str) -> bool {
    line.split(',')
        .map(str::trim)
        .all(|cell| !cell.is_empty() && cell.parse::<f64>().is_err())
}

/// Writes a matrix as comma-separated rows.
pub fn write_csv<T: std::fmt::Display>(path: &Path, matrix: &Matrix<T>) -> Result<()> {
    let mut out = String::new();
    for row in matrix.iter_rows() {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // Writing into a String cannot fail
            let _ = write!(out, "{value}");
        }
        out.push('\n');
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, out)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_csv_rectangular() {
        let m = parse_csv("1,2,3\n4,5,6\n").unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(1).unwrap(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_parse_csv_skips_header_and_blank_lines() {
        let m = parse_csv("t0,t1\n\n0.5,nan\n1.5,2.5\n").unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert!(m.row(0).unwrap()[1].is_nan());
    }

    #[test]
    fn test_parse_csv_ragged() {
        let err = parse_csv("1,2\n3\n").unwrap_err();
        assert!(matches!(err, SaccadeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_parse_csv_bad_cell() {
        match parse_csv("1,2\n3,x\n") {
            Err(SaccadeError::Parse { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 2);
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_matrix(&dir.path().join("X.csv")).unwrap_err();
        assert!(matches!(err, SaccadeError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("X.mat");
        fs::write(&path, b"MATLAB 5.0").unwrap();
        assert!(matches!(
            load_matrix(&path),
            Err(SaccadeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("X.json");
        fs::write(&path, "[[0.0, 1.0], [2.0, 3.0]]").unwrap();
        let m = load_matrix(&path).unwrap();
        assert_eq!(m.shape(), (2, 2));
    }

    #[test]
    fn test_write_then_load_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("L.csv");
        let labels = Matrix::from_rows(vec![vec![0u8, 1, 1], vec![1, 0, 0]]).unwrap();
        write_csv(&path, &labels).unwrap();
        let loaded = load_matrix(&path).unwrap();
        assert_eq!(loaded.row(0).unwrap(), &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_load_labels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Labels.csv");
        fs::write(&path, "0,1,1\n1,0,0\n").unwrap();
        let labels = load_labels(&path).unwrap();
        assert_eq!(labels.row(0).unwrap(), &[0, 1, 1]);

        fs::write(&path, "0,2,1\n").unwrap();
        assert!(matches!(
            load_labels(&path),
            Err(SaccadeError::InvalidLabelValue { value, .. }) if value == 2.0
        ));
    }

    #[test]
    fn test_data_config_paths() {
        let config = DataConfig {
            datapath: PathBuf::from("data/dataset1"),
            labels_filename: Some("Labels.csv".to_string()),
            ..DataConfig::default()
        };
        assert_eq!(config.x_path(), PathBuf::from("data/dataset1/X.csv"));
        assert_eq!(config.y_path(), Some(PathBuf::from("data/dataset1/Y.csv")));
        assert_eq!(
            config.labels_path(),
            Some(PathBuf::from("data/dataset1/Labels.csv"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_data_config_rejects_empty_names() {
        let config = DataConfig {
            x_filename: " ".to_string(),
            ..DataConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
