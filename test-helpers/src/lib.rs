//! Shared test fixtures
//!
//! Behaviors standing in for the deployable component kinds, plus wiring
//! for an orchestrator over fresh in-memory collaborators.

use crucible_factory::{
    Behavior, ExecutionEnvironment, InMemoryEnvironment, InitializeCall, Orchestrator,
    OrchestratorConfig, Storage,
};
use crucible_registry::{InMemoryRegistry, Registry};
use crucible_types::Address;
use std::sync::Arc;

/// Storage key a permission manager records its owner list under.
pub const OWNERS_KEY: &[u8] = b"owners";
/// Storage key a vault records its authorizer under.
pub const AUTHORIZER_KEY: &[u8] = b"authorizer";
/// Storage key a vault records its configured feed count under.
pub const FEED_COUNT_KEY: &[u8] = b"feed_count";
/// Storage key the counting task keeps its invocation count under.
pub const COUNTER_KEY: &[u8] = b"counter";

/// Permission manager logic: decodes the initialize call and records the
/// owner list.
pub struct PermissionManagerBehavior;

impl Behavior for PermissionManagerBehavior {
    fn call(&self, storage: &mut Storage, input: &[u8]) -> Result<Vec<u8>, String> {
        match InitializeCall::decode(input) {
            Ok(InitializeCall::PermissionManager { owners }) => {
                if owners.is_empty() {
                    return Err("owner list must not be empty".to_string());
                }
                let encoded = serde_json::to_vec(&owners).map_err(|e| e.to_string())?;
                storage.insert(OWNERS_KEY.to_vec(), encoded);
                Ok(Vec::new())
            }
            _ => Err("unexpected initialize payload".to_string()),
        }
    }
}

/// Vault logic: records the authorizer and how many feeds were configured.
pub struct VaultBehavior;

impl Behavior for VaultBehavior {
    fn call(&self, storage: &mut Storage, input: &[u8]) -> Result<Vec<u8>, String> {
        match InitializeCall::decode(input) {
            Ok(InitializeCall::Vault {
                authorizer,
                price_oracle: _,
                price_feeds,
            }) => {
                storage.insert(AUTHORIZER_KEY.to_vec(), authorizer.as_bytes().to_vec());
                storage.insert(
                    FEED_COUNT_KEY.to_vec(),
                    (price_feeds.len() as u64).to_le_bytes().to_vec(),
                );
                Ok(Vec::new())
            }
            _ => Err("unexpected initialize payload".to_string()),
        }
    }
}

/// Task logic: every call increments a persistent counter and echoes the
/// payload back.
pub struct CountingTaskBehavior;

impl Behavior for CountingTaskBehavior {
    fn call(&self, storage: &mut Storage, input: &[u8]) -> Result<Vec<u8>, String> {
        let count = storage
            .get(COUNTER_KEY)
            .and_then(|bytes| bytes.as_slice().try_into().ok())
            .map(u64::from_le_bytes)
            .unwrap_or(0)
            + 1;
        storage.insert(COUNTER_KEY.to_vec(), count.to_le_bytes().to_vec());
        Ok(input.to_vec())
    }
}

/// Logic that rejects every call with a fixed reason.
pub struct RevertingBehavior(pub &'static str);

impl Behavior for RevertingBehavior {
    fn call(&self, _: &mut Storage, _: &[u8]) -> Result<Vec<u8>, String> {
        Err(self.0.to_string())
    }
}

/// An orchestrator wired over fresh in-memory collaborators.
pub struct Fixture {
    pub environment: Arc<InMemoryEnvironment>,
    pub registry: Arc<InMemoryRegistry>,
    pub orchestrator: Orchestrator,
}

impl Fixture {
    pub fn new() -> Self {
        let environment = Arc::new(InMemoryEnvironment::new());
        let registry = Arc::new(InMemoryRegistry::new());
        let orchestrator = Orchestrator::new(
            Address::new_unique(),
            Arc::clone(&registry) as Arc<dyn Registry>,
            Arc::clone(&environment) as Arc<dyn ExecutionEnvironment>,
            OrchestratorConfig::default(),
        );
        Self {
            environment,
            registry,
            orchestrator,
        }
    }

    /// Install `behavior` and register its address with the registry.
    pub fn approved_implementation(&self, behavior: Arc<dyn Behavior>) -> Address {
        let address = self.environment.install_implementation(behavior);
        self.registry.register(address).expect("fresh address");
        address
    }

    /// Install `behavior` without registering it.
    pub fn unregistered_implementation(&self, behavior: Arc<dyn Behavior>) -> Address {
        self.environment.install_implementation(behavior)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
