//! Per-invocation entropy boundary.
//!
//! The core never consumes local randomness. Every sample is a deterministic
//! function of data the host sequenced for the current invocation, so every
//! replica that validates the same invocation derives the same value.

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("host beacon missing for this invocation")]
    MissingBeacon,
    #[error("scripted entropy feed exhausted")]
    FeedExhausted,
}

/// Host-sequenced randomness for one invocation: the most recent chain hash
/// and the slot it was taken at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostBeacon {
    pub recent_hash: [u8; 32],
    pub slot: u64,
}

/// Capability seam for the single sample each invocation draws. Injected so
/// the engine can be replayed against a scripted feed and verified for exact
/// reproducibility.
pub trait EntropySource {
    fn sample(&mut self) -> Result<u64, EntropyError>;
}

/// Production source: the first 8 little-endian bytes of
/// `blake3(recent_hash || slot || chain_seed || authority)`.
#[derive(Clone, Debug)]
pub struct HostEntropy {
    value: u64,
}

impl HostEntropy {
    pub fn from_beacon(beacon: &HostBeacon, chain_seed: &[u8], authority: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(&beacon.recent_hash);
        hasher.update(&beacon.slot.to_le_bytes());
        hasher.update(chain_seed);
        hasher.update(authority.as_bytes());
        let digest = hasher.finalize();

        let mut le = [0u8; 8];
        le.copy_from_slice(&digest.as_bytes()[..8]);
        HostEntropy {
            value: u64::from_le_bytes(le),
        }
    }
}

impl EntropySource for HostEntropy {
    fn sample(&mut self) -> Result<u64, EntropyError> {
        Ok(self.value)
    }
}

/// Replay/test source: serves a scripted sequence of samples in order.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEntropy {
    feed: std::collections::VecDeque<u64>,
}

impl ScriptedEntropy {
    pub fn new(samples: impl IntoIterator<Item = u64>) -> Self {
        ScriptedEntropy {
            feed: samples.into_iter().collect(),
        }
    }
}

impl EntropySource for ScriptedEntropy {
    fn sample(&mut self) -> Result<u64, EntropyError> {
        self.feed.pop_front().ok_or(EntropyError::FeedExhausted)
    }
}
