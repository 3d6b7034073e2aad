use serde::{Deserialize, Serialize};

/// Leading format tag of every persisted record.
pub const RECORD_SCHEMA_VERSION: &str = "pulse-record.v1";

/// Calibration samples absorbed before the record is born.
/// Not read from configuration: the admission law divides by a derived
/// ceiling, so no invocation may be gated before the baseline exists.
pub const CALIBRATION_QUOTA: u32 = 16;

/// Incentive-asset precision: base units per whole unit (9 decimals).
pub const ASSET_DECIMALS: u32 = 9;
pub const ASSET_UNIT: u64 = 1_000_000_000;

/// Issued to the authority once, at genesis (3 whole units).
pub const GENESIS_GRANT: u64 = 3 * ASSET_UNIT;

/// Issued when an admitted transition crosses into a higher regime (0.1 unit).
pub const REGIME_REWARD: u64 = ASSET_UNIT / 10;

/// Post-birth operating regime, derived from the control/ceiling load ratio.
/// Ordering follows regime height: S0 < S1 < S2.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum PulseMode {
    #[default]
    S0,
    S1,
    S2,
}

/// Per-mille load cutoffs separating the three regimes.
/// The three-band structure is fixed; the cutoff values are tunable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeBands {
    /// Load at or below this is S0 (idle).
    pub idle_ceiling: u64,
    /// Load at or above this is S2 (sustained high control activity).
    pub surge_floor: u64,
}

impl Default for ModeBands {
    fn default() -> Self {
        ModeBands {
            idle_ceiling: 10,
            surge_floor: 750,
        }
    }
}

/// Persistent per-instance state. Created by genesis, mutated only by the
/// transition path, readable at any time as a pure query.
///
/// Pre-birth, `variance_index` and `x_control` double as the calibration
/// accumulators; post-birth they carry the latest derived energy and control
/// signals.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PulseRecord {
    pub schema_version: String,
    /// Owning identity; set at genesis, never changes.
    pub authority: String,
    /// Admission threshold; immutable after genesis.
    pub epsilon: u64,
    /// Calibration samples absorbed so far (0..=CALIBRATION_QUOTA).
    pub calib_count: u32,
    /// Monotonic false -> true, flipped exactly once at the quota.
    pub is_born: bool,
    /// S0 until birth; one of S0/S1/S2 thereafter.
    pub mode: PulseMode,
    /// Latest derived energy signal.
    pub variance_index: u64,
    /// Latest derived control signal.
    pub x_control: u64,
    /// Admitted post-birth transitions; never decreases.
    pub pause_count: u64,
}

impl PulseRecord {
    /// Fresh record exactly as the genesis routine creates it.
    pub fn genesis(authority: &str, epsilon: u64) -> Self {
        PulseRecord {
            schema_version: RECORD_SCHEMA_VERSION.to_string(),
            authority: authority.to_string(),
            epsilon,
            calib_count: 0,
            is_born: false,
            mode: PulseMode::S0,
            variance_index: 0,
            x_control: 0,
            pause_count: 0,
        }
    }
}
