//! Crucible deployment factory
//!
//! Deterministic two-stage deployment of trust-sensitive components: a salt
//! derived from (caller, namespace, name) fixes an instance address before
//! anything exists there, the registry gates which implementations may back
//! an instance, and a minimal delegating proxy is installed and initialized
//! atomically. The broadcast audit record is the only durable trace — the
//! factory itself keeps no ledger of what it deployed.

pub mod clone;
pub mod derive;
pub mod environment;
pub mod error;
pub mod events;
pub mod gate;
pub mod interface;
pub mod orchestrator;

pub use clone::CloneFactory;
pub use derive::{derive_salt, predict_address};
pub use environment::{Behavior, CallError, ExecutionEnvironment, InMemoryEnvironment, Storage};
pub use error::{FactoryError, Result};
pub use events::{DeploymentEvents, DeploymentRecord, FlowKind};
pub use gate::RegistryGate;
pub use interface::{InitializeCall, PriceFeedParam};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, PermissionManagerRequest, TaskRequest, VaultRequest,
};

// Re-export the collaborator surfaces the factory is wired against.
pub use crucible_registry::{InMemoryRegistry, Registry};
pub use crucible_types::{Address, Salt};
