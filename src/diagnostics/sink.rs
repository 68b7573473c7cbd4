use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::ArrayView2;

use crate::diagnostics::{DiagnosticsSink, Record};
use crate::error::Result;
use crate::math::matrix::Matrix;

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _record: &Record<'_>) -> Result<()> {
        Ok(())
    }
}

/// Keeps owned copies of every record, keyed by file name, in emission order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<(String, Matrix)>,
}

impl MemorySink {
    /// Last record written under `file_name`.
    pub fn get(&self, file_name: &str) -> Option<&Matrix> {
        self.records.iter().rev().find(|(name, _)| name == file_name).map(|(_, m)| m)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&mut self, record: &Record<'_>) -> Result<()> {
        self.records.push((record.file_name(), record.matrix.to_owned()));
        Ok(())
    }
}

/// Writes each record as its own text file inside `dir`.
#[derive(Debug, Clone)]
pub struct TxtDirSink {
    dir: PathBuf,
}

impl TxtDirSink {
    /// Creates `dir` (and parents) if needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<TxtDirSink> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(TxtDirSink { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DiagnosticsSink for TxtDirSink {
    fn record(&mut self, record: &Record<'_>) -> Result<()> {
        let path = self.dir.join(record.file_name());
        fs::write(path, format_txt(record.matrix))?;
        Ok(())
    }
}

/// One row per line, values separated by a single space, 18 digits after the
/// decimal point. Byte-compatible with `numpy.savetxt(fmt='%.18f')`.
pub fn format_txt(matrix: ArrayView2<'_, f64>) -> String {
    let mut out = String::new();
    for row in matrix.rows() {
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                out.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{:.18}", value);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn format_txt_matches_savetxt_layout() {
        let m = array![[1.0, -0.5], [0.25, 0.0]];
        assert_eq!(
            format_txt(m.view()),
            "1.000000000000000000 -0.500000000000000000\n\
             0.250000000000000000 0.000000000000000000\n"
        );
    }
}
