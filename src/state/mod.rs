mod sequence;

pub use sequence::{SequenceTracker, INITIAL_SEQ_NR};
