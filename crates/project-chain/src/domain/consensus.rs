//! Consensus model and leader election
//!
//! The consensus model is carried on every project and folded into its
//! genesis hash, but nothing enforces it yet: the leader is always the first
//! shareholder and no majority check is made. `LeaderElection` is the seam
//! where a real policy plugs in.

use super::NodeIdentity;
use serde::{Deserialize, Serialize};

/// Default approval threshold, in percent.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Named agreement policy of a project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConsensusModel {
    /// Majority vote above `threshold` percent.
    Democratic { threshold: f64 },
}

impl ConsensusModel {
    pub fn democratic() -> Self {
        ConsensusModel::Democratic {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConsensusModel::Democratic { .. } => "democratic",
        }
    }
}

impl Default for ConsensusModel {
    fn default() -> Self {
        Self::democratic()
    }
}

/// Picks the state-sync leader of a new project.
pub trait LeaderElection: Send + Sync {
    fn elect(&self, shareholders: &[NodeIdentity], model: &ConsensusModel)
        -> Option<NodeIdentity>;
}

/// First shareholder leads. Ignores the consensus model.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstShareholder;

impl LeaderElection for FirstShareholder {
    fn elect(
        &self,
        shareholders: &[NodeIdentity],
        _model: &ConsensusModel,
    ) -> Option<NodeIdentity> {
        shareholders.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::SigningKey;
    use shared_types::Uid;

    #[test]
    fn test_first_shareholder_leads() {
        let a = NodeIdentity::new(Uid::new(), SigningKey::generate().verify_key());
        let b = NodeIdentity::new(Uid::new(), SigningKey::generate().verify_key());

        let leader = FirstShareholder.elect(&[a.clone(), b], &ConsensusModel::default());
        assert_eq!(leader, Some(a));
        assert_eq!(FirstShareholder.elect(&[], &ConsensusModel::default()), None);
    }

    #[test]
    fn test_default_model() {
        assert_eq!(
            ConsensusModel::default(),
            ConsensusModel::Democratic { threshold: 50.0 }
        );
        assert_eq!(ConsensusModel::default().name(), "democratic");
    }
}
