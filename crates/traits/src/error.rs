//! Store error and write report types.

/// Errors raised by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing database rejected the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded or encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The record violates a store constraint.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Outcome of a bulk upsert: one result per row, in input order.
#[derive(Debug)]
pub struct WriteReport {
    table: &'static str,
    rows: Vec<Result<(), StoreError>>,
}

impl WriteReport {
    /// Create a report for a table.
    #[must_use]
    pub const fn new(table: &'static str, rows: Vec<Result<(), StoreError>>) -> Self {
        Self { table, rows }
    }

    /// Table written to.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Rows attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.rows.len()
    }

    /// Rows written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| r.is_ok()).count()
    }

    /// Rows that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Whether every row was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(Result::is_ok)
    }

    /// Failed rows with their input index.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &StoreError)> {
        self.rows.iter().enumerate().filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Backend("database is locked".to_string());
        assert_eq!(err.to_string(), "backend error: database is locked");
    }

    #[test]
    fn report_counts() {
        let report = WriteReport::new(
            "positions",
            vec![Ok(()), Err(StoreError::InvalidRecord("nan".to_string())), Ok(())],
        );
        assert_eq!(report.table(), "positions");
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failures().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
    }
}
