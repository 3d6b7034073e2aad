pub mod orchestrator;
pub mod types;

pub use orchestrator::{BridgeError, PulseOrchestrator};
pub use types::{InitializeRequest, InvocationReport, TransitionRequest};
