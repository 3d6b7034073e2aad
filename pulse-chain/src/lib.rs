pub mod admission;
pub mod asset;
pub mod calibration;
pub mod consensus;
pub mod entropy;
pub mod registry;
pub mod types;

pub use admission::{AdmissionError, AdmittedTransition};
pub use asset::{AssetError, AssetLedger, MemoryAssetLedger};
pub use consensus::{hash_record, PulseEvent, PulseOutcome};
pub use entropy::{EntropyError, EntropySource, HostBeacon, HostEntropy, ScriptedEntropy};
pub use registry::{PulseError, PulseRegistry};
pub use types::{
    ModeBands, PulseMode, PulseRecord, ASSET_DECIMALS, ASSET_UNIT, CALIBRATION_QUOTA,
    GENESIS_GRANT, REGIME_REWARD,
};
