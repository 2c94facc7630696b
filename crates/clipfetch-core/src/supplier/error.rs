//! Error taxonomy for the metadata supplier.

/// Errors from the Helix API side of a run.
///
/// `Auth` is batch-fatal: without a token and broadcaster id there is nothing
/// to process. `Listing` stops pagination but keeps the clips gathered so far.
#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("clip listing failed: {0}")]
    Listing(String),
}

impl SupplierError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SupplierError::Auth(_))
    }
}
