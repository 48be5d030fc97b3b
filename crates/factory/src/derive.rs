//! Salt derivation and address prediction
//!
//! Both functions are pure and stateless. The predicted address is a
//! function of the factory's identity and the salt only — never of the code
//! that will live there — so callers can compute and hand out instance
//! addresses before anything is deployed.

use crucible_types::{Address, Salt};

const SALT_DOMAIN: &[u8] = b"crucible:salt:v1";
const INSTANCE_DOMAIN: &[u8] = b"crucible:instance:v1";

/// Derive the deployment salt for (caller, namespace, name).
///
/// Identical inputs always yield the identical salt. The string inputs are
/// length-framed before hashing so adjacent fields cannot be reassociated:
/// `("ab", "c")` and `("a", "bc")` hash differently.
pub fn derive_salt(caller: &Address, namespace: &str, name: &str) -> Salt {
    let mut hasher = blake3::Hasher::new();
    hasher.update(SALT_DOMAIN);
    hasher.update(caller.as_bytes());
    update_framed(&mut hasher, namespace.as_bytes());
    update_framed(&mut hasher, name.as_bytes());
    Salt::new(*hasher.finalize().as_bytes())
}

/// Predict the address a deployment keyed by `salt` lands at for `factory`.
///
/// No validation, no side effects; callable at any time, by anyone, for any
/// inputs.
pub fn predict_address(factory: &Address, salt: &Salt) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(INSTANCE_DOMAIN);
    hasher.update(factory.as_bytes());
    hasher.update(salt.as_bytes());
    Address::new(*hasher.finalize().as_bytes())
}

fn update_framed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
