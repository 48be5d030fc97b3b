use thiserror::Error;

// ================================
// Registry Error Types
// ================================

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Implementation not found: {0}")]
    ImplementationNotFound(String),

    #[error("Implementation already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Registry backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
