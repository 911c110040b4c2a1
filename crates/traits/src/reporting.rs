//! Reporting sink trait definition.

use capflow_primitives::ReportDocument;

use crate::StoreError;

/// Document store for externally displayed portfolio summaries.
pub trait ReportingSink {
    /// Insert a document into its collection, returning the assigned id.
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be written.
    fn publish(&mut self, document: &ReportDocument) -> Result<String, StoreError>;
}
