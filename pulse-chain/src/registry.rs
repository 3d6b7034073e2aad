//! Authoritative record registry.
//!
//! The only mutation paths are the two atomic operations `initialize` and
//! `try_transition`; everything else is a pure read. Each operation computes
//! a complete candidate snapshot first and swaps it in only after every
//! fallible step has succeeded, so a rejected or failed invocation observes
//! and performs no mutation at all. Serialization of invocations against one
//! record is the host runtime's job, not handled here.

use std::collections::HashMap;

use log::{info, warn};
use thiserror::Error;

use crate::admission::{admit_transition, AdmissionError};
use crate::asset::{AssetError, AssetLedger};
use crate::calibration::absorb_sample;
use crate::consensus::{hash_record, PulseEvent, PulseOutcome};
use crate::entropy::{EntropyError, EntropySource};
use crate::types::{ModeBands, PulseRecord, GENESIS_GRANT, REGIME_REWARD};

#[derive(Debug, Error)]
pub enum PulseError {
    #[error("already initialized: {0}")]
    AlreadyInitialized(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("signer {signer} is not the record authority")]
    Unauthorized { signer: String },
    #[error("admission: {0}")]
    Admission(#[from] AdmissionError),
    #[error("entropy: {0}")]
    Entropy(#[from] EntropyError),
    #[error("asset ledger: {0}")]
    Asset(#[from] AssetError),
}

impl PulseError {
    /// Expected, retryable outcome of the admission law, as opposed to an
    /// infrastructural fault of the invocation.
    pub fn is_admission_rejection(&self) -> bool {
        matches!(self, PulseError::Admission(AdmissionError::Rejected { .. }))
    }
}

pub struct PulseRegistry {
    bands: ModeBands,
    records: HashMap<String, PulseRecord>,
}

impl PulseRegistry {
    pub fn new(bands: ModeBands) -> Self {
        PulseRegistry {
            bands,
            records: HashMap::new(),
        }
    }

    /// Pure query: the full field set, no side effects.
    pub fn record(&self, record_id: &str) -> Option<&PulseRecord> {
        self.records.get(record_id)
    }

    /// Genesis routine. Creates the record and issues the genesis grant to
    /// the authority's balance; the two commit together or not at all.
    pub fn initialize(
        &mut self,
        record_id: &str,
        authority: &str,
        epsilon: u64,
        ledger: &mut dyn AssetLedger,
        timestamp_utc: &str,
    ) -> Result<PulseEvent, PulseError> {
        if self.records.contains_key(record_id) || ledger.balance_of(authority).is_some() {
            return Err(PulseError::AlreadyInitialized(record_id.to_string()));
        }

        let record = PulseRecord::genesis(authority, epsilon);
        ledger.issue(authority, GENESIS_GRANT)?;
        let new_state_hash = hash_record(record_id, &record);
        self.records.insert(record_id.to_string(), record);

        info!("[PULSE] genesis committed for {record_id}, epsilon={epsilon}");
        Ok(PulseEvent {
            record_id: record_id.to_string(),
            outcome: PulseOutcome::Genesis,
            prev_state_hash: None,
            new_state_hash,
            reward_issued: GENESIS_GRANT,
            timestamp_utc: timestamp_utc.to_string(),
        })
    }

    /// One transition invocation: exactly one entropy sample, then either a
    /// calibration step (always commits) or the admission-gated transition.
    pub fn try_transition(
        &mut self,
        record_id: &str,
        signer: &str,
        entropy: &mut dyn EntropySource,
        ledger: &mut dyn AssetLedger,
        timestamp_utc: &str,
    ) -> Result<PulseEvent, PulseError> {
        // 1. Locate the record and gate on its authority.
        let record = self
            .records
            .get(record_id)
            .ok_or_else(|| PulseError::NotFound(record_id.to_string()))?;
        if record.authority != signer {
            return Err(PulseError::Unauthorized {
                signer: signer.to_string(),
            });
        }

        // 2. The single entropy draw of this invocation.
        let sample = entropy.sample()?;
        let prev_hash = hash_record(record_id, record);

        // 3. Pre-birth: calibration absorbs the sample unconditionally.
        if !record.is_born {
            let next = absorb_sample(record, sample);
            let outcome = if next.is_born {
                info!("[PULSE] {record_id} born after {} samples", next.calib_count);
                PulseOutcome::Born
            } else {
                PulseOutcome::Calibrated
            };
            let new_state_hash = hash_record(record_id, &next);
            self.records.insert(record_id.to_string(), next);
            return Ok(PulseEvent {
                record_id: record_id.to_string(),
                outcome,
                prev_state_hash: Some(prev_hash),
                new_state_hash,
                reward_issued: 0,
                timestamp_utc: timestamp_utc.to_string(),
            });
        }

        // 4. Post-birth: the admission gate projects the candidate snapshot.
        let admitted = match admit_transition(record, sample, &self.bands) {
            Ok(a) => a,
            Err(e) => {
                warn!("[PULSE] {record_id} rejected: {e}");
                return Err(e.into());
            }
        };

        // 5. Issuance runs before the swap; a failed issue aborts the
        //    invocation with nothing committed.
        let mut reward_issued = 0;
        if admitted.regime_crossed_up {
            ledger.issue(signer, REGIME_REWARD)?;
            reward_issued = REGIME_REWARD;
            info!(
                "[PULSE] {record_id} crossed into {:?} (load {}), reward issued",
                admitted.next.mode, admitted.load
            );
        }

        let new_state_hash = hash_record(record_id, &admitted.next);
        self.records.insert(record_id.to_string(), admitted.next);
        Ok(PulseEvent {
            record_id: record_id.to_string(),
            outcome: PulseOutcome::Admitted,
            prev_state_hash: Some(prev_hash),
            new_state_hash,
            reward_issued,
            timestamp_utc: timestamp_utc.to_string(),
        })
    }
}
