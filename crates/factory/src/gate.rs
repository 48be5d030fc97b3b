//! Registry gating

use crate::error::{FactoryError, Result};
use crucible_registry::Registry;
use crucible_types::Address;
use std::sync::Arc;
use tracing::debug;

/// Approval gate over the external implementation registry.
///
/// The registry handle is fixed at construction and never reassigned.
pub struct RegistryGate {
    registry: Arc<dyn Registry>,
}

impl RegistryGate {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Pass-through approval query.
    pub async fn is_approved(&self, implementation: &Address) -> Result<bool> {
        Ok(self.registry.is_approved(implementation).await?)
    }

    /// Pass-through deprecation query.
    pub async fn is_deprecated(&self, implementation: &Address) -> Result<bool> {
        Ok(self.registry.is_deprecated(implementation).await?)
    }

    /// Enforce the approval policy for `implementation`.
    ///
    /// With `required` set, an unapproved implementation fails with
    /// [`FactoryError::NotRegistered`] and an approved-but-obsolete one with
    /// [`FactoryError::Deprecated`]. Without it the registry is not
    /// consulted at all, which is how custom task implementations opt out.
    pub async fn enforce(&self, implementation: &Address, required: bool) -> Result<()> {
        if !required {
            debug!(%implementation, "registry check skipped");
            return Ok(());
        }
        if !self.registry.is_approved(implementation).await? {
            return Err(FactoryError::NotRegistered(*implementation));
        }
        if self.registry.is_deprecated(implementation).await? {
            return Err(FactoryError::Deprecated(*implementation));
        }
        debug!(%implementation, "registry check passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_registry::InMemoryRegistry;

    fn gate_over(registry: &Arc<InMemoryRegistry>) -> RegistryGate {
        RegistryGate::new(Arc::clone(registry) as Arc<dyn Registry>)
    }

    #[tokio::test]
    async fn test_enforce_rejects_unregistered() {
        let registry = Arc::new(InMemoryRegistry::new());
        let gate = gate_over(&registry);
        let implementation = Address::new_unique();

        let result = gate.enforce(&implementation, true).await;
        assert!(matches!(result, Err(FactoryError::NotRegistered(a)) if a == implementation));
    }

    #[tokio::test]
    async fn test_enforce_rejects_deprecated() {
        let registry = Arc::new(InMemoryRegistry::new());
        let gate = gate_over(&registry);
        let implementation = Address::new_unique();

        registry.register(implementation).unwrap();
        registry.deprecate(&implementation).unwrap();

        let result = gate.enforce(&implementation, true).await;
        assert!(matches!(result, Err(FactoryError::Deprecated(a)) if a == implementation));
    }

    #[tokio::test]
    async fn test_enforce_passes_approved() {
        let registry = Arc::new(InMemoryRegistry::new());
        let gate = gate_over(&registry);
        let implementation = Address::new_unique();

        registry.register(implementation).unwrap();
        gate.enforce(&implementation, true).await.unwrap();

        assert!(gate.is_approved(&implementation).await.unwrap());
        assert!(!gate.is_deprecated(&implementation).await.unwrap());
    }

    #[tokio::test]
    async fn test_enforce_not_required_skips_registry() {
        let registry = Arc::new(InMemoryRegistry::new());
        let gate = gate_over(&registry);
        let implementation = Address::new_unique();

        // Unregistered, but the check is opted out of
        gate.enforce(&implementation, false).await.unwrap();
    }
}
