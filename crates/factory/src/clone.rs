//! Minimal-proxy deployment

use crate::environment::ExecutionEnvironment;
use crate::error::Result;
use crucible_types::{Address, Salt};
use std::sync::Arc;
use tracing::debug;

/// Deterministic clone deployment under a single deployer identity.
///
/// A clone is a fixed-size forwarding stub: every invocation is delegated to
/// the implementation it was deployed over, executed against the clone's own
/// storage. The clone's address comes from the salt alone, so it is knowable
/// before the implementation is chosen.
pub struct CloneFactory {
    deployer: Address,
    environment: Arc<dyn ExecutionEnvironment>,
}

impl CloneFactory {
    pub fn new(deployer: Address, environment: Arc<dyn ExecutionEnvironment>) -> Self {
        Self {
            deployer,
            environment,
        }
    }

    /// The identity clones are deployed under.
    pub fn deployer(&self) -> &Address {
        &self.deployer
    }

    /// Address a clone keyed by `salt` would be (or was) deployed at.
    pub fn predict(&self, salt: &Salt) -> Address {
        self.environment.predict_address(&self.deployer, salt)
    }

    /// Deploy a minimal proxy over `implementation` at the salted address.
    ///
    /// Returns exactly the address [`predict`](Self::predict) computes for
    /// the same salt; fails with `AddressOccupied` when that address already
    /// holds code. All-or-nothing.
    pub async fn deploy_clone(&self, salt: &Salt, implementation: &Address) -> Result<Address> {
        let instance = self
            .environment
            .create_proxy(&self.deployer, salt, implementation)
            .await?;
        debug!(%instance, %implementation, "clone deployed");
        Ok(instance)
    }
}
