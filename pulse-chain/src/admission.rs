//! Admission law and post-birth transition derivation.
//!
//! The gate projects a complete candidate record; only the caller swaps it
//! in. A rejected invocation never touches the stored record.

use thiserror::Error;

use crate::types::{ModeBands, PulseMode, PulseRecord};

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("transition rejected: delta {delta} exceeds epsilon {epsilon}")]
    Rejected { delta: u64, epsilon: u64 },
}

/// An admitted transition: the full candidate record plus the signals the
/// caller needs for receipts and reward issuance.
#[derive(Clone, Debug)]
pub struct AdmittedTransition {
    pub next: PulseRecord,
    pub delta: u64,
    pub load: u64,
    /// True when the recomputed mode is a strictly higher regime.
    pub regime_crossed_up: bool,
}

/// Quarter-weight fold: next = (3 * current + contribution) / 4.
/// u128 intermediate keeps the fold exact and overflow-free.
fn fold_quarter(current: u64, contribution: u64) -> u64 {
    ((3 * current as u128 + contribution as u128) / 4) as u64
}

/// Control load in per-mille of the dynamic ceiling (one implied decimal
/// digit of precision). `x_max` is at least 1 by construction.
pub fn control_load(x_control: u64, x_max: u64) -> u64 {
    let load = x_control as u128 * 1000 / x_max.max(1) as u128;
    load.min(u64::MAX as u128) as u64
}

pub fn mode_for_load(load: u64, bands: &ModeBands) -> PulseMode {
    if load <= bands.idle_ceiling {
        PulseMode::S0
    } else if load < bands.surge_floor {
        PulseMode::S1
    } else {
        PulseMode::S2
    }
}

/// The canonical admission gate for a born record.
pub fn admit_transition(
    record: &PulseRecord,
    sample: u64,
    bands: &ModeBands,
) -> Result<AdmittedTransition, AdmissionError> {
    // 1. Candidate signals, monotone in the sample and the prior state.
    let v_prev = record.variance_index;
    let v_next = fold_quarter(v_prev, sample);
    let x_next = fold_quarter(record.x_control, sample.abs_diff(v_prev));

    // 2. Deviation magnitude between successive energy signals.
    let delta = v_next.abs_diff(v_prev);

    // 3. Admission law: delta within epsilon or the whole invocation aborts.
    if delta > record.epsilon {
        return Err(AdmissionError::Rejected {
            delta,
            epsilon: record.epsilon,
        });
    }

    // 4. Regime from control load against the dynamic ceiling.
    let x_max = v_next.max(record.epsilon.max(1));
    let load = control_load(x_next, x_max);
    let mode = mode_for_load(load, bands);
    let regime_crossed_up = mode > record.mode;

    let mut next = record.clone();
    next.variance_index = v_next;
    next.x_control = x_next;
    next.pause_count += 1;
    next.mode = mode;

    Ok(AdmittedTransition {
        next,
        delta,
        load,
        regime_crossed_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::absorb_sample;
    use crate::types::CALIBRATION_QUOTA;

    fn born_record(epsilon: u64) -> PulseRecord {
        let mut record = PulseRecord::genesis("host-a", epsilon);
        for _ in 0..CALIBRATION_QUOTA {
            record = absorb_sample(&record, 0);
        }
        assert!(record.is_born);
        record
    }

    #[test]
    fn delta_at_epsilon_admits() {
        // v = 0, so sample 4_000_000 projects v' = delta = 1_000_000.
        let record = born_record(1_000_000);
        let admitted = admit_transition(&record, 4_000_000, &ModeBands::default()).unwrap();
        assert_eq!(admitted.delta, 1_000_000);
        assert_eq!(admitted.next.variance_index, 1_000_000);
        assert_eq!(admitted.next.pause_count, 1);
    }

    #[test]
    fn delta_above_epsilon_rejects() {
        let record = born_record(1_000_000);
        let err = admit_transition(&record, 4_000_008, &ModeBands::default()).unwrap_err();
        match err {
            AdmissionError::Rejected { delta, epsilon } => {
                assert_eq!(delta, 1_000_002);
                assert_eq!(epsilon, 1_000_000);
            }
        }
    }

    #[test]
    fn surge_load_lands_in_s2_and_crosses_up() {
        // sample 4_000_000: v' = x' = 1_000_000, ceiling 1_000_000, load 1000.
        let record = born_record(1_000_000);
        let admitted = admit_transition(&record, 4_000_000, &ModeBands::default()).unwrap();
        assert_eq!(admitted.load, 1000);
        assert_eq!(admitted.next.mode, PulseMode::S2);
        assert!(admitted.regime_crossed_up);
    }

    #[test]
    fn mid_load_lands_in_s1() {
        // sample 2_000_000: v' = x' = 500_000, ceiling epsilon, load 500.
        let record = born_record(1_000_000);
        let admitted = admit_transition(&record, 2_000_000, &ModeBands::default()).unwrap();
        assert_eq!(admitted.load, 500);
        assert_eq!(admitted.next.mode, PulseMode::S1);
        assert!(admitted.regime_crossed_up);
    }

    #[test]
    fn near_zero_load_stays_idle_without_reward_crossing() {
        // sample 40_000: load 10, at the idle ceiling.
        let record = born_record(1_000_000);
        let admitted = admit_transition(&record, 40_000, &ModeBands::default()).unwrap();
        assert_eq!(admitted.load, 10);
        assert_eq!(admitted.next.mode, PulseMode::S0);
        assert!(!admitted.regime_crossed_up);
    }

    #[test]
    fn dropping_to_a_lower_regime_is_not_a_crossing() {
        let mut record = born_record(1_000_000);
        record.mode = PulseMode::S2;
        record.variance_index = 875_000;
        record.x_control = 750_000;
        // sample equal to v: delta 0, control decays, load 562 -> S1.
        let admitted = admit_transition(&record, 875_000, &ModeBands::default()).unwrap();
        assert_eq!(admitted.next.mode, PulseMode::S1);
        assert!(!admitted.regime_crossed_up);
    }

    #[test]
    fn bands_are_tunable() {
        let wide_idle = ModeBands {
            idle_ceiling: 600,
            surge_floor: 900,
        };
        let record = born_record(1_000_000);
        // load 500 is S1 under the defaults, S0 under a wider idle band.
        let admitted = admit_transition(&record, 2_000_000, &wide_idle).unwrap();
        assert_eq!(admitted.next.mode, PulseMode::S0);
    }

    #[test]
    fn rejection_borrows_only() {
        let record = born_record(0);
        let before = record.clone();
        let _ = admit_transition(&record, u64::MAX, &ModeBands::default());
        assert_eq!(record, before);
    }
}
