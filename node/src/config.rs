//! In-process node configuration: peers, quorum slice, and timing. No CLI
//! parsing lives here; this is the typed object a `--network`/`--keypair`
//! flag set would eventually populate, grounded on `botho/src/config.rs`'s
//! `NetworkConfig`/`QuorumConfig` shape.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fbc_consensus_scp_types::QuorumSlice;

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    90
}

/// How a node decides when its peers agree with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Public keys of the peers this node trusts.
    pub members: Vec<String>,
    /// How many of `members` must agree. `None` defaults to 2/3+1 of
    /// `members`, the common "simple majority plus one" shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<usize>,
}

impl QuorumConfig {
    pub fn to_quorum_slice(&self) -> QuorumSlice {
        match self.threshold {
            Some(threshold) => QuorumSlice::new(self.members.clone(), threshold),
            None => QuorumSlice::majority_of(self.members.clone()),
        }
    }
}

/// Everything a node needs to start up besides its key pair and store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Addresses of peers to connect to, in whatever form the transport
    /// layer expects (left opaque here; dialing a peer is an external
    /// collaborator).
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default)]
    pub quorum: QuorumConfig,
    /// How often to send a keepalive line on an otherwise idle connection.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// How long a connection may go silent before it is considered dead.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            peers: Vec::new(),
            quorum: QuorumConfig::default(),
            keep_alive_secs: default_keep_alive_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NodeConfig {
    pub fn quorum_slice(&self) -> QuorumSlice {
        self.quorum.to_quorum_slice()
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_peers_and_the_usual_timings() {
        let config = NodeConfig::default();
        assert!(config.peers.is_empty());
        assert_eq!(config.keep_alive(), Duration::from_secs(30));
        assert_eq!(config.timeout(), Duration::from_secs(90));
    }

    #[test]
    fn quorum_config_defaults_the_threshold_to_a_two_thirds_majority() {
        let members: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let quorum = QuorumConfig { members: members.clone(), threshold: None };
        assert_eq!(quorum.to_quorum_slice(), QuorumSlice::majority_of(members));
    }

    #[test]
    fn an_explicit_threshold_overrides_the_majority_default() {
        let members: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let quorum = QuorumConfig { members: members.clone(), threshold: Some(1) };
        assert_eq!(quorum.to_quorum_slice(), QuorumSlice::new(members, 1));
    }

    #[test]
    fn deserializes_from_a_minimal_document() {
        let json = r#"{"quorum":{"members":["a","b","c"]}}"#;
        let config: NodeConfig = serde_json::from_str(json).unwrap();
        assert!(config.peers.is_empty());
        assert_eq!(config.quorum.members, vec!["a", "b", "c"]);
        assert_eq!(config.keep_alive_secs, 30);
    }
}
