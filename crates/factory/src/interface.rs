//! Wire encoding of the initializer entrypoints the factory invokes

use crucible_types::Address;
use serde::{Deserialize, Serialize};

/// Price feed wiring handed to a vault at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeedParam {
    pub base: Address,
    pub quote: Address,
    pub feed: Address,
}

/// Initialize entrypoints of the deployable component kinds.
///
/// Tasks are absent on purpose: a task's initializer payload is opaque
/// caller-supplied bytes the factory forwards without interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializeCall {
    PermissionManager {
        owners: Vec<Address>,
    },
    Vault {
        authorizer: Address,
        price_oracle: Option<Address>,
        price_feeds: Vec<PriceFeedParam>,
    },
}

impl InitializeCall {
    /// Encode for transport to a freshly deployed instance.
    pub fn encode(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a payload an instance received.
    pub fn decode(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_permission_manager() {
        let call = InitializeCall::PermissionManager {
            owners: vec![Address::new_unique(), Address::new_unique()],
        };
        let decoded = InitializeCall::decode(&call.encode().unwrap()).unwrap();
        assert_eq!(decoded, call);
    }

    #[test]
    fn test_encode_decode_vault() {
        let call = InitializeCall::Vault {
            authorizer: Address::new_unique(),
            price_oracle: None,
            price_feeds: vec![PriceFeedParam {
                base: Address::new_unique(),
                quote: Address::new_unique(),
                feed: Address::new_unique(),
            }],
        };
        let decoded = InitializeCall::decode(&call.encode().unwrap()).unwrap();
        assert_eq!(decoded, call);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(InitializeCall::decode(b"not json").is_err());
    }
}
