//! Deployment audit events
//!
//! The factory keeps no ledger of what it deployed. These broadcast records
//! are the only durable trace a flow leaves, and downstream indexers rely on
//! them exclusively to discover instances. A record is emitted once per
//! successful flow, never on failure.

use chrono::{DateTime, Utc};
use crucible_types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::debug;

/// Which deployment flow produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    PermissionManager,
    Vault,
    Task,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::PermissionManager => write!(f, "PERMISSION_MANAGER"),
            FlowKind::Vault => write!(f, "VAULT"),
            FlowKind::Task => write!(f, "TASK"),
        }
    }
}

/// One successful deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub kind: FlowKind,
    pub namespace: String,
    pub name: String,
    pub instance: Address,
    pub implementation: Address,
    pub deployed_at: DateTime<Utc>,
}

/// Broadcast stream of deployment records.
pub struct DeploymentEvents {
    sender: broadcast::Sender<DeploymentRecord>,
}

impl DeploymentEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to records emitted after this point.
    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentRecord> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, record: DeploymentRecord) {
        // A send error only means there are no subscribers right now
        if self.sender.send(record).is_err() {
            debug!("deployment record emitted with no subscribers");
        }
    }
}
