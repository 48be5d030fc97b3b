//! Implementation approval registry
//!
//! The registry is the single authority on which implementation addresses a
//! deployment factory may clone. The factory only ever reads the two flags;
//! registration and deprecation bookkeeping stay on this side of the seam.

use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use crucible_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Approval state tracked for a single implementation address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationStatus {
    pub registered: bool,
    pub deprecated: bool,
}

/// Read side of the registry, consumed by the deployment factory.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Whether the implementation is registered and approved for cloning.
    async fn is_approved(&self, implementation: &Address) -> Result<bool>;

    /// Whether the implementation has been flagged obsolete.
    ///
    /// A deprecated implementation is still registered; the two flags are
    /// independent reads.
    async fn is_deprecated(&self, implementation: &Address) -> Result<bool>;
}

/// In-memory registry backend for development and testing.
pub struct InMemoryRegistry {
    entries: Arc<RwLock<HashMap<Address, ImplementationStatus>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register (approve) an implementation address.
    pub fn register(&self, implementation: Address) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(implementation).or_default();
        if entry.registered {
            return Err(RegistryError::AlreadyRegistered(implementation.to_string()));
        }
        entry.registered = true;
        info!(%implementation, "implementation registered");
        Ok(())
    }

    /// Flag a registered implementation as deprecated.
    pub fn deprecate(&self, implementation: &Address) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        match entries.get_mut(implementation) {
            Some(entry) if entry.registered => {
                entry.deprecated = true;
                info!(%implementation, "implementation deprecated");
                Ok(())
            }
            _ => Err(RegistryError::ImplementationNotFound(
                implementation.to_string(),
            )),
        }
    }

    /// Current status of an implementation; default flags when unknown.
    pub fn status(&self, implementation: &Address) -> ImplementationStatus {
        let entries = self.entries.read().unwrap();
        entries.get(implementation).copied().unwrap_or_default()
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn is_approved(&self, implementation: &Address) -> Result<bool> {
        Ok(self.status(implementation).registered)
    }

    async fn is_deprecated(&self, implementation: &Address) -> Result<bool> {
        Ok(self.status(implementation).deprecated)
    }
}
