// ================================
// Crucible Types
// ================================

pub mod address;
pub mod salt;

pub use address::*;
pub use salt::*;
