//! Calibration phase: absorb entropy samples until the quota is reached and
//! the admission baseline exists. Calibration steps always commit; the law
//! that gates post-birth transitions has nothing to compare against yet.

use crate::types::{PulseRecord, CALIBRATION_QUOTA};

/// Midpoint fold of one contribution into a running baseline.
/// u128 intermediate keeps the average exact and overflow-free.
fn fold_midpoint(current: u64, contribution: u64) -> u64 {
    ((current as u128 + contribution as u128) / 2) as u64
}

/// Absorb one calibration sample into a fresh snapshot of the record.
/// At the quota the snapshot is born, with the folded baselines as the
/// initial energy/control signals and the mode left at its default.
pub fn absorb_sample(record: &PulseRecord, sample: u64) -> PulseRecord {
    let mut next = record.clone();

    let prev_variance = next.variance_index;
    next.variance_index = fold_midpoint(prev_variance, sample);
    next.x_control = fold_midpoint(next.x_control, sample.abs_diff(prev_variance));
    next.calib_count += 1;

    if next.calib_count >= CALIBRATION_QUOTA {
        next.is_born = true;
    }

    next
}
