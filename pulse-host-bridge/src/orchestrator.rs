//! Host-side invocation orchestrator.
//!
//! One instance per shell; it borrows the registry and the asset ledger for
//! exactly one invocation per call, mirroring the host runtime's
//! one-invocation-at-a-time contract. Admission rejections are reported, not
//! escalated; everything else aborts the invocation as a bridge error.

use log::{info, warn};
use thiserror::Error;

use pulse_chain::{
    hash_record, AssetLedger, EntropyError, HostEntropy, PulseError, PulseRegistry,
};

use crate::types::{InitializeRequest, InvocationReport, TransitionRequest};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("core error: {0}")]
    Core(#[from] PulseError),
}

pub struct PulseOrchestrator<'a> {
    pub registry: &'a mut PulseRegistry,
    pub ledger: &'a mut dyn AssetLedger,
    /// Chain-wide seed folded into every entropy derivation; the analog of
    /// the deployed program identity.
    pub chain_seed: Vec<u8>,
}

impl<'a> PulseOrchestrator<'a> {
    pub fn new(
        registry: &'a mut PulseRegistry,
        ledger: &'a mut dyn AssetLedger,
        chain_seed: &[u8],
    ) -> Self {
        PulseOrchestrator {
            registry,
            ledger,
            chain_seed: chain_seed.to_vec(),
        }
    }

    pub fn handle_initialize(
        &mut self,
        req: &InitializeRequest,
    ) -> Result<InvocationReport, BridgeError> {
        let event = self.registry.initialize(
            &req.record_id,
            &req.authority,
            req.epsilon,
            self.ledger,
            &req.timestamp_utc,
        )?;
        let record = self
            .registry
            .record(&req.record_id)
            .ok_or_else(|| PulseError::NotFound(req.record_id.clone()))?;

        info!("[BRIDGE] initialized {}", req.record_id);
        Ok(InvocationReport::from_record(
            &req.record_id,
            record,
            true,
            "genesis committed".to_string(),
            event.reward_issued,
            event.prev_state_hash,
            Some(event.new_state_hash),
        ))
    }

    pub fn handle_transition(
        &mut self,
        req: &TransitionRequest,
    ) -> Result<InvocationReport, BridgeError> {
        let beacon = req
            .beacon
            .as_ref()
            .ok_or(PulseError::Entropy(EntropyError::MissingBeacon))?;
        let mut entropy = HostEntropy::from_beacon(beacon, &self.chain_seed, &req.signer);

        let result = self.registry.try_transition(
            &req.record_id,
            &req.signer,
            &mut entropy,
            self.ledger,
            &req.timestamp_utc,
        );

        match result {
            Ok(event) => {
                let record = self
                    .registry
                    .record(&req.record_id)
                    .ok_or_else(|| PulseError::NotFound(req.record_id.clone()))?;
                Ok(InvocationReport::from_record(
                    &req.record_id,
                    record,
                    true,
                    format!("{:?}", event.outcome),
                    event.reward_issued,
                    event.prev_state_hash,
                    Some(event.new_state_hash),
                ))
            }
            Err(e) if e.is_admission_rejection() => {
                // Expected under the admission law; the record is untouched.
                warn!("[BRIDGE] {} not applied: {e}", req.record_id);
                let record = self
                    .registry
                    .record(&req.record_id)
                    .ok_or_else(|| PulseError::NotFound(req.record_id.clone()))?;
                let current_hash = hash_record(&req.record_id, record);
                Ok(InvocationReport::from_record(
                    &req.record_id,
                    record,
                    false,
                    e.to_string(),
                    0,
                    Some(current_hash),
                    None,
                ))
            }
            Err(e) => Err(BridgeError::Core(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_chain::{
        HostBeacon, MemoryAssetLedger, ModeBands, PulseMode, ScriptedEntropy, ASSET_UNIT,
        CALIBRATION_QUOTA,
    };

    const TS: &str = "2026-08-06T00:00:00Z";
    const SEED: &[u8] = b"pulse-dev-chain";

    fn beacon(byte: u8, slot: u64) -> HostBeacon {
        HostBeacon {
            recent_hash: [byte; 32],
            slot,
        }
    }

    fn init_request(epsilon: u64) -> InitializeRequest {
        InitializeRequest {
            record_id: "r1".to_string(),
            authority: "host-a".to_string(),
            epsilon,
            timestamp_utc: TS.to_string(),
        }
    }

    fn transition_request(beacon: Option<HostBeacon>) -> TransitionRequest {
        TransitionRequest {
            record_id: "r1".to_string(),
            signer: "host-a".to_string(),
            beacon,
            timestamp_utc: TS.to_string(),
        }
    }

    /// Calibrate r1 to birth with an all-zero scripted feed, leaving zeroed
    /// baselines so post-birth outcomes are predictable.
    fn calibrate_to_birth(registry: &mut PulseRegistry, ledger: &mut MemoryAssetLedger) {
        let mut feed = ScriptedEntropy::new(vec![0u64; CALIBRATION_QUOTA as usize]);
        for _ in 0..CALIBRATION_QUOTA {
            registry
                .try_transition("r1", "host-a", &mut feed, ledger, TS)
                .unwrap();
        }
    }

    #[test]
    fn initialize_reports_genesis_state_and_grant() {
        let mut registry = PulseRegistry::new(ModeBands::default());
        let mut ledger = MemoryAssetLedger::new();
        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);

        let report = orchestrator.handle_initialize(&init_request(1_000_000)).unwrap();
        assert!(report.applied);
        assert!(!report.is_born);
        assert_eq!(report.mode, PulseMode::S0);
        assert_eq!(report.reward_issued, 3 * ASSET_UNIT);
        assert!(report.prev_state_hash.is_none());
        assert!(report.new_state_hash.is_some());
    }

    #[test]
    fn second_initialize_is_a_hard_error() {
        let mut registry = PulseRegistry::new(ModeBands::default());
        let mut ledger = MemoryAssetLedger::new();
        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);

        orchestrator.handle_initialize(&init_request(5)).unwrap();
        let err = orchestrator.handle_initialize(&init_request(5)).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Core(PulseError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn missing_beacon_is_a_hard_error() {
        let mut registry = PulseRegistry::new(ModeBands::default());
        let mut ledger = MemoryAssetLedger::new();
        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);

        orchestrator.handle_initialize(&init_request(5)).unwrap();
        let err = orchestrator
            .handle_transition(&transition_request(None))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Core(PulseError::Entropy(EntropyError::MissingBeacon))
        ));
    }

    #[test]
    fn beacon_transitions_apply_under_a_permissive_threshold() {
        let mut registry = PulseRegistry::new(ModeBands::default());
        let mut ledger = MemoryAssetLedger::new();

        {
            let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);
            orchestrator
                .handle_initialize(&init_request(u64::MAX))
                .unwrap();
        }
        calibrate_to_birth(&mut registry, &mut ledger);

        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);
        let report = orchestrator
            .handle_transition(&transition_request(Some(beacon(7, 42))))
            .unwrap();
        assert!(report.applied);
        assert_eq!(report.pause_count, 1);
        assert!(report.new_state_hash.is_some());
    }

    #[test]
    fn rejection_maps_to_a_soft_report_with_no_mutation() {
        let mut registry = PulseRegistry::new(ModeBands::default());
        let mut ledger = MemoryAssetLedger::new();

        {
            let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);
            // Epsilon 0: any nonzero projected delta rejects.
            orchestrator.handle_initialize(&init_request(0)).unwrap();
        }
        calibrate_to_birth(&mut registry, &mut ledger);
        let before = registry.record("r1").unwrap().clone();

        let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);
        let report = orchestrator
            .handle_transition(&transition_request(Some(beacon(9, 1))))
            .unwrap();
        assert!(!report.applied);
        assert_eq!(report.pause_count, 0);
        assert!(report.new_state_hash.is_none());
        assert_eq!(registry.record("r1").unwrap(), &before);
    }

    #[test]
    fn replaying_one_beacon_is_deterministic() {
        let run = || {
            let mut registry = PulseRegistry::new(ModeBands::default());
            let mut ledger = MemoryAssetLedger::new();
            {
                let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);
                orchestrator
                    .handle_initialize(&init_request(u64::MAX))
                    .unwrap();
            }
            calibrate_to_birth(&mut registry, &mut ledger);
            let mut orchestrator = PulseOrchestrator::new(&mut registry, &mut ledger, SEED);
            orchestrator
                .handle_transition(&transition_request(Some(beacon(11, 99))))
                .unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first.new_state_hash, second.new_state_hash);
        assert_eq!(first.pause_count, second.pause_count);
    }
}
