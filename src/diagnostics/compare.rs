//! Cross-implementation comparison of diagnostic dumps.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Largest absolute elementwise difference between two same-named files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiff {
    pub name: String,
    pub max_abs_diff: f64,
}

/// Loads a whitespace-separated text matrix. Blank lines are skipped; every
/// remaining line is one row.
pub fn load_txt<P: AsRef<Path>>(path: P) -> Result<Matrix> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let display = path.display().to_string();

    let mut data = Vec::new();
    let mut rows = 0;
    let mut cols = None;
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut width = 0;
        for token in line.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| NnError::Parse {
                path: display.clone(),
                line: idx + 1,
                message: format!("'{token}' is not a number"),
            })?;
            data.push(value);
            width += 1;
        }
        match cols {
            None => cols = Some(width),
            Some(c) if c != width => {
                return Err(NnError::Parse {
                    path: display,
                    line: idx + 1,
                    message: format!("expected {c} values, found {width}"),
                })
            }
            Some(_) => {}
        }
        rows += 1;
    }

    Array2::from_shape_vec((rows, cols.unwrap_or(0)), data)
        .map_err(|e| NnError::Parse { path: display, line: 0, message: e.to_string() })
}

/// Largest absolute element-wise difference. A NaN on either side makes the
/// result NaN so a diverged dump never compares as identical.
pub fn max_abs_diff(a: &Matrix, b: &Matrix) -> Result<f64> {
    if a.dim() != b.dim() {
        return Err(NnError::ShapeMismatch {
            context: "max_abs_diff".to_string(),
            expected: a.dim(),
            found: b.dim(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, |acc: f64, d| {
            if acc.is_nan() || d.is_nan() {
                f64::NAN
            } else {
                acc.max(d)
            }
        }))
}

/// Compares identically named files in two directories.
///
/// With `names == None` every `.txt` file in `left` is compared, in name order.
pub fn compare_dirs<P: AsRef<Path>, Q: AsRef<Path>>(
    left: P,
    right: Q,
    names: Option<&[String]>,
) -> Result<Vec<FileDiff>> {
    let left = left.as_ref();
    let right = right.as_ref();

    let names: Vec<String> = match names {
        Some(names) => names.to_vec(),
        None => {
            let mut found = Vec::new();
            for entry in fs::read_dir(left)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(".txt") && entry.file_type()?.is_file() {
                    found.push(name);
                }
            }
            found.sort();
            found
        }
    };

    names
        .into_iter()
        .map(|name| {
            let a = load_txt(left.join(&name))?;
            let b = load_txt(right.join(&name))?;
            let max_abs_diff = max_abs_diff(&a, &b)?;
            Ok(FileDiff { name, max_abs_diff })
        })
        .collect()
}
