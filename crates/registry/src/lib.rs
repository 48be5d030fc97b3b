// ================================
// Crucible Registry
// ================================

pub mod error;
pub mod implementations;

pub use error::*;
pub use implementations::*;

// ================================
// Registry Tests
// ================================
