//! Deployment flow orchestration
//!
//! Every flow follows one template: derive the salt, enforce the registry
//! policy, deploy the clone, run the flow-specific initializer, emit the
//! audit record. A failure anywhere aborts the whole request with nothing
//! left behind — no code at the predicted address and no record.

use crate::clone::CloneFactory;
use crate::derive;
use crate::environment::{CallError, ExecutionEnvironment};
use crate::error::{FactoryError, Result};
use crate::events::{DeploymentEvents, DeploymentRecord, FlowKind};
use crate::gate::RegistryGate;
use crate::interface::{InitializeCall, PriceFeedParam};
use chrono::Utc;
use crucible_registry::Registry;
use crucible_types::{Address, Salt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Capacity of the audit record broadcast channel.
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}

/// Request to deploy a permission manager instance.
#[derive(Debug, Clone)]
pub struct PermissionManagerRequest {
    pub namespace: String,
    pub name: String,
    pub implementation: Address,
    pub owners: Vec<Address>,
}

/// Request to deploy a vault instance.
#[derive(Debug, Clone)]
pub struct VaultRequest {
    pub namespace: String,
    pub name: String,
    pub implementation: Address,
    pub authorizer: Address,
    pub price_oracle: Option<Address>,
    pub price_feeds: Vec<PriceFeedParam>,
}

/// Request to deploy a task instance.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub namespace: String,
    pub name: String,
    pub implementation: Address,
    /// Custom tasks bypass the registry check entirely.
    pub custom: bool,
    /// Opaque initializer payload; empty skips initialization.
    pub initialize_data: Vec<u8>,
}

/// Composes salt derivation, registry gating and clone deployment into the
/// three deployment flows.
///
/// Flows share no mutable state; each invocation stands alone. The reads
/// (salt and address derivation) are idempotent, the write is not: at most
/// one deployment per (caller, namespace, name) can ever succeed, enforced
/// by the salted address itself rather than a lock.
pub struct Orchestrator {
    address: Address,
    gate: RegistryGate,
    clones: CloneFactory,
    environment: Arc<dyn ExecutionEnvironment>,
    events: DeploymentEvents,
}

impl Orchestrator {
    pub fn new(
        address: Address,
        registry: Arc<dyn Registry>,
        environment: Arc<dyn ExecutionEnvironment>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            address,
            gate: RegistryGate::new(registry),
            clones: CloneFactory::new(address, Arc::clone(&environment)),
            environment,
            events: DeploymentEvents::new(config.event_capacity),
        }
    }

    /// The factory's own identity, one of the two inputs to address
    /// prediction.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Subscribe to the audit record stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentRecord> {
        self.events.subscribe()
    }

    // ================================
    // Read-only query surface
    // ================================

    /// Salt for (caller, namespace, name). Pure; no validation.
    pub fn get_salt(&self, caller: &Address, namespace: &str, name: &str) -> Salt {
        derive::derive_salt(caller, namespace, name)
    }

    /// Address the instance for (caller, namespace, name) will be — or was —
    /// deployed at. Pure; requires no deployment to have happened.
    pub fn get_address(&self, caller: &Address, namespace: &str, name: &str) -> Address {
        derive::predict_address(&self.address, &self.get_salt(caller, namespace, name))
    }

    // ================================
    // Deployment flows
    // ================================

    /// Deploy and initialize a permission manager instance.
    pub async fn deploy_permission_manager(
        &self,
        caller: &Address,
        request: PermissionManagerRequest,
    ) -> Result<Address> {
        let salt = self.get_salt(caller, &request.namespace, &request.name);
        let payload = InitializeCall::PermissionManager {
            owners: request.owners,
        }
        .encode()?;

        self.gate.enforce(&request.implementation, true).await?;
        let instance = self.clones.deploy_clone(&salt, &request.implementation).await?;
        self.initialize(instance, &payload).await?;

        self.commit(
            FlowKind::PermissionManager,
            request.namespace,
            request.name,
            instance,
            request.implementation,
        );
        Ok(instance)
    }

    /// Deploy and initialize a vault instance.
    pub async fn deploy_vault(&self, caller: &Address, request: VaultRequest) -> Result<Address> {
        let salt = self.get_salt(caller, &request.namespace, &request.name);
        let payload = InitializeCall::Vault {
            authorizer: request.authorizer,
            price_oracle: request.price_oracle,
            price_feeds: request.price_feeds,
        }
        .encode()?;

        self.gate.enforce(&request.implementation, true).await?;
        let instance = self.clones.deploy_clone(&salt, &request.implementation).await?;
        self.initialize(instance, &payload).await?;

        self.commit(
            FlowKind::Vault,
            request.namespace,
            request.name,
            instance,
            request.implementation,
        );
        Ok(instance)
    }

    /// Deploy a task instance, optionally running a caller-supplied
    /// initializer payload against it.
    pub async fn deploy_task(&self, caller: &Address, request: TaskRequest) -> Result<Address> {
        let salt = self.get_salt(caller, &request.namespace, &request.name);

        self.gate.enforce(&request.implementation, !request.custom).await?;
        let instance = self.clones.deploy_clone(&salt, &request.implementation).await?;
        if !request.initialize_data.is_empty() {
            self.initialize(instance, &request.initialize_data).await?;
        }

        self.commit(
            FlowKind::Task,
            request.namespace,
            request.name,
            instance,
            request.implementation,
        );
        Ok(instance)
    }

    /// Run an initializer against a freshly created instance, discarding the
    /// instance on failure so an aborted flow leaves no code behind.
    async fn initialize(&self, instance: Address, payload: &[u8]) -> Result<()> {
        match self.environment.call(&instance, payload).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.environment.discard(&instance).await;
                let reason = match err {
                    CallError::Reverted(reason) => reason,
                    CallError::NoCode(address) => format!("no code at {address}"),
                };
                warn!(%instance, %reason, "initializer failed, deployment discarded");
                Err(FactoryError::InitializationFailed { reason })
            }
        }
    }

    fn commit(
        &self,
        kind: FlowKind,
        namespace: String,
        name: String,
        instance: Address,
        implementation: Address,
    ) {
        info!(%kind, %namespace, %name, %instance, %implementation, "instance deployed");
        self.events.emit(DeploymentRecord {
            kind,
            namespace,
            name,
            instance,
            implementation,
            deployed_at: Utc::now(),
        });
    }
}
