use crate::types::PulseRecord;
use blake3::Hasher;
use serde::{Deserialize, Serialize};

/// What a committed invocation did to the record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PulseOutcome {
    /// Record created and genesis grant issued.
    Genesis,
    /// Calibration sample absorbed, quota not yet reached.
    Calibrated,
    /// Final calibration sample; baseline sealed, record born.
    Born,
    /// Post-birth transition admitted under the admission law.
    Admitted,
}

/// Receipt for one committed invocation. Rejected and failed invocations
/// produce no event; they leave no trace in the record either.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PulseEvent {
    pub record_id: String,
    pub outcome: PulseOutcome,
    /// `None` only for genesis, which has no prior state.
    pub prev_state_hash: Option<String>,
    pub new_state_hash: String,
    /// Base units issued within this invocation; 0 when none.
    pub reward_issued: u64,
    pub timestamp_utc: String,
}

/// blake3 over the record id and the serialized record; hex digest.
pub fn hash_record(record_id: &str, record: &PulseRecord) -> String {
    let mut hasher = Hasher::new();
    hasher.update(record_id.as_bytes());
    hasher.update(serde_json::to_string(record).unwrap().as_bytes());
    hasher.finalize().to_hex().to_string()
}
