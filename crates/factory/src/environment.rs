//! Execution environment capability
//!
//! The platform underneath the factory provides deterministic,
//! content-independent allocation: the address of a creation depends only on
//! the deployer's identity and a salt, never on the code installed there.
//! That is what makes address prediction valid before an implementation is
//! even chosen. [`ExecutionEnvironment`] abstracts this capability together
//! with the minimal-proxy call path so the factory itself stays
//! platform-neutral.
//!
//! Creation is two-stage: the environment first reserves the salted address,
//! then attaches the proxy's runtime behavior. [`InMemoryEnvironment`]
//! performs both stages under one write lock, so a creation is never
//! observable half-done.

use crate::derive;
use crate::error::{FactoryError, Result};
use async_trait::async_trait;
use crucible_types::{Address, Salt};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Key/value storage owned by a single account.
pub type Storage = HashMap<Vec<u8>, Vec<u8>>;

/// Logic installed at an implementation address.
///
/// `call` runs against the storage of whichever account the call was
/// addressed to. For a proxy that is the proxy's own storage, which is what
/// gives each clone independent state over shared logic. An `Err` carries
/// the failure reason and is forwarded verbatim.
pub trait Behavior: Send + Sync {
    fn call(&self, storage: &mut Storage, input: &[u8]) -> std::result::Result<Vec<u8>, String>;
}

/// Failure of a call against a deployed account.
#[derive(Error, Debug)]
pub enum CallError {
    /// The callee rejected the call; the reason passes through untouched.
    #[error("{0}")]
    Reverted(String),

    /// No executable code at the call target.
    #[error("no code at {0}")]
    NoCode(Address),
}

/// The deterministic allocation and call capability of the platform.
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    /// The address a creation keyed by `salt` lands at for `deployer`.
    ///
    /// Every environment uses the one platform formula; implementors must
    /// not override this, or predicted and actual addresses drift apart.
    fn predict_address(&self, deployer: &Address, salt: &Salt) -> Address {
        derive::predict_address(deployer, salt)
    }

    /// Whether any code is installed at `address`.
    async fn has_code(&self, address: &Address) -> bool;

    /// Install a minimal proxy over `implementation` at the address derived
    /// from (`deployer`, `salt`).
    ///
    /// Fails with [`FactoryError::AddressOccupied`] when the target already
    /// holds code; succeeds all-or-nothing otherwise. The implementation is
    /// not validated here — gating is the factory's concern.
    async fn create_proxy(
        &self,
        deployer: &Address,
        salt: &Salt,
        implementation: &Address,
    ) -> Result<Address>;

    /// Invoke the account at `address` with `input`.
    ///
    /// A proxy forwards the full payload to its implementation's logic,
    /// executed against the proxy's own storage; return data and failure
    /// reasons pass through verbatim.
    async fn call(&self, address: &Address, input: &[u8])
        -> std::result::Result<Vec<u8>, CallError>;

    /// Remove a creation made earlier in the current request.
    ///
    /// A transactional platform rolls creations back implicitly when the
    /// enclosing request aborts; an in-process environment must do it
    /// explicitly so a failed flow leaves no code behind.
    async fn discard(&self, address: &Address);
}

enum AccountCode {
    Implementation(Arc<dyn Behavior>),
    Proxy { implementation: Address },
}

struct AccountEntry {
    code: AccountCode,
    storage: Storage,
}

/// In-memory execution environment for development and testing.
pub struct InMemoryEnvironment {
    accounts: Arc<RwLock<HashMap<Address, AccountEntry>>>,
}

impl InMemoryEnvironment {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Install implementation logic at a fresh address and return it.
    pub fn install_implementation(&self, behavior: Arc<dyn Behavior>) -> Address {
        let address = Address::new_unique();
        let mut accounts = self.accounts.write().unwrap();
        accounts.insert(
            address,
            AccountEntry {
                code: AccountCode::Implementation(behavior),
                storage: Storage::new(),
            },
        );
        debug!(%address, "implementation installed");
        address
    }

    /// Read one storage slot of an account.
    pub fn storage_value(&self, address: &Address, key: &[u8]) -> Option<Vec<u8>> {
        let accounts = self.accounts.read().unwrap();
        accounts.get(address)?.storage.get(key).cloned()
    }

    /// The implementation a proxy at `address` delegates to.
    pub fn proxy_implementation(&self, address: &Address) -> Option<Address> {
        let accounts = self.accounts.read().unwrap();
        match accounts.get(address)?.code {
            AccountCode::Proxy { implementation } => Some(implementation),
            AccountCode::Implementation(_) => None,
        }
    }
}

impl Default for InMemoryEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionEnvironment for InMemoryEnvironment {
    async fn has_code(&self, address: &Address) -> bool {
        self.accounts.read().unwrap().contains_key(address)
    }

    async fn create_proxy(
        &self,
        deployer: &Address,
        salt: &Salt,
        implementation: &Address,
    ) -> Result<Address> {
        let address = self.predict_address(deployer, salt);
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&address) {
            return Err(FactoryError::AddressOccupied(address));
        }
        // Stage one reserved `address` from the salt alone; stage two
        // attaches the forwarding code. Both happen under the same lock.
        accounts.insert(
            address,
            AccountEntry {
                code: AccountCode::Proxy {
                    implementation: *implementation,
                },
                storage: Storage::new(),
            },
        );
        debug!(%address, %implementation, "proxy installed");
        Ok(address)
    }

    async fn call(
        &self,
        address: &Address,
        input: &[u8],
    ) -> std::result::Result<Vec<u8>, CallError> {
        let behavior = {
            let accounts = self.accounts.read().unwrap();
            match &accounts.get(address).ok_or(CallError::NoCode(*address))?.code {
                AccountCode::Implementation(behavior) => Arc::clone(behavior),
                AccountCode::Proxy { implementation } => match accounts.get(implementation) {
                    Some(AccountEntry {
                        code: AccountCode::Implementation(behavior),
                        ..
                    }) => Arc::clone(behavior),
                    // Chained proxies are not modeled; only implementation
                    // accounts hold executable logic.
                    _ => return Err(CallError::NoCode(*implementation)),
                },
            }
        };
        let mut accounts = self.accounts.write().unwrap();
        let entry = accounts
            .get_mut(address)
            .ok_or(CallError::NoCode(*address))?;
        behavior
            .call(&mut entry.storage, input)
            .map_err(CallError::Reverted)
    }

    async fn discard(&self, address: &Address) {
        let removed = self.accounts.write().unwrap().remove(address);
        if removed.is_some() {
            warn!(%address, "creation discarded");
        }
    }
}
