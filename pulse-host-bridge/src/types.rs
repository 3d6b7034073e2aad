use pulse_chain::{HostBeacon, PulseMode, PulseRecord};
use serde::{Deserialize, Serialize};

/// One genesis invocation as presented by the host shell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitializeRequest {
    pub record_id: String,
    pub authority: String,
    pub epsilon: u64,
    pub timestamp_utc: String,
}

/// One transition invocation: the signer plus the sequencing-point beacon.
/// A missing beacon is a host-context failure, fatal for the invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub record_id: String,
    pub signer: String,
    pub beacon: Option<HostBeacon>,
    pub timestamp_utc: String,
}

/// Caller-visible result of one invocation against one record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvocationReport {
    pub record_id: String,
    /// False only for an admission rejection, which is expected and
    /// retryable; every other failure surfaces as a bridge error instead.
    pub applied: bool,
    pub reason: String,
    pub mode: PulseMode,
    pub is_born: bool,
    pub calib_count: u32,
    pub pause_count: u64,
    /// Base units issued within this invocation; 0 when none.
    pub reward_issued: u64,
    pub prev_state_hash: Option<String>,
    pub new_state_hash: Option<String>,
}

impl InvocationReport {
    /// Snapshot of the record's externally readable fields into a report.
    pub(crate) fn from_record(
        record_id: &str,
        record: &PulseRecord,
        applied: bool,
        reason: String,
        reward_issued: u64,
        prev_state_hash: Option<String>,
        new_state_hash: Option<String>,
    ) -> Self {
        InvocationReport {
            record_id: record_id.to_string(),
            applied,
            reason,
            mode: record.mode,
            is_born: record.is_born,
            calib_count: record.calib_count,
            pause_count: record.pause_count,
            reward_issued,
            prev_state_hash,
            new_state_hash,
        }
    }
}
