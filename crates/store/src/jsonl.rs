//! Append-only JSON-lines reporting sink.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use capflow_primitives::ReportDocument;
use capflow_traits::{ReportingSink, StoreError};
use serde_json::json;

/// Writes each published document as one line
/// `{"id": .., "collection": .., "document": {..}}`.
///
/// Ids are line numbers, so they keep increasing across reopenings of the
/// same file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    lines: usize,
}

impl JsonLinesSink {
    /// Open a sink appending to `path`, creating parent directories as needed.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if an existing file cannot be read or the
    /// directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lines = match File::open(&path) {
            Ok(file) => BufReader::new(file).lines().count(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, lines })
    }

    /// File written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportingSink for JsonLinesSink {
    fn publish(&mut self, document: &ReportDocument) -> Result<String, StoreError> {
        let id = (self.lines + 1).to_string();
        let line = serde_json::to_string(&json!({
            "id": id,
            "collection": document.collection(),
            "document": document,
        }))
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        file.flush()?;

        self.lines += 1;
        Ok(id)
    }
}
