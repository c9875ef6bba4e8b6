//! Trust-anchor and TSL rotation against the system under test.

mod rotation;
mod step;

pub use rotation::{RotationOutcome, RotationWorkflow, TrustAnchorSwitchOutcome};
pub use step::{RotationStep, RotationTiming, SignerIdentity};
