use crucible_registry::RegistryError;
use crucible_types::Address;
use thiserror::Error;

// ================================
// Factory Error Types
// ================================

/// Errors surfaced by the deployment factory.
///
/// Every variant aborts the whole request: no retries, no partial commit,
/// no audit record. The caller's recourse is to change inputs (a different
/// namespace/name, an approved implementation, a corrected initializer
/// payload) and resubmit.
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("implementation {0} is not registered")]
    NotRegistered(Address),

    #[error("implementation {0} is deprecated")]
    Deprecated(Address),

    #[error("address {0} already holds code")]
    AddressOccupied(Address),

    #[error("initialization call failed: {reason}")]
    InitializationFailed { reason: String },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FactoryError>;
