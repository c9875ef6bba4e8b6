use std::path::{Path, PathBuf};

use crate::contracts::SequenceError;

/// Sequence number a fresh run assumes is active in the SUT.
pub const INITIAL_SEQ_NR: u64 = 1;

/// TSL sequence-number state of the system under test across a test run.
///
/// One instance per run, constructed with [`SequenceTracker::load`] and passed
/// by reference into every workflow step. Every state change is written to
/// the backing file before the call returns, so the file always holds the most
/// recent of the initial value, the last offered number and the last saved
/// number. Not safe for concurrent writers; callers serialize access.
#[derive(Debug)]
pub struct SequenceTracker {
    path: PathBuf,
    current_in_sut: u64,
    expected_in_sut: u64,
    last_offered: u64,
}

impl SequenceTracker {
    /// Loads the state from `path`, or initializes and persists
    /// [`INITIAL_SEQ_NR`] if the file does not exist yet.
    ///
    /// An existing file that cannot be read or does not hold a decimal
    /// number is [`SequenceError::Corrupt`].
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SequenceError> {
        let path = path.into();
        let current = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| SequenceError::Corrupt {
                path: path.clone(),
                content: e.to_string(),
            })?;
            let contents = String::from_utf8_lossy(&bytes);
            contents
                .trim()
                .parse::<u64>()
                .map_err(|_| SequenceError::Corrupt {
                    path: path.clone(),
                    content: contents.to_string(),
                })?
        } else {
            persist(&path, INITIAL_SEQ_NR)?;
            INITIAL_SEQ_NR
        };

        tracing::debug!(path = %path.display(), current_in_sut = current, "Loaded TSL sequence state");

        Ok(Self {
            path,
            current_in_sut: current,
            expected_in_sut: current,
            last_offered: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_in_sut(&self) -> u64 {
        self.current_in_sut
    }

    pub fn expected_in_sut(&self) -> u64 {
        self.expected_in_sut
    }

    /// Highest sequence number offered in this run, 0 if none yet.
    pub fn last_offered(&self) -> u64 {
        self.last_offered
    }

    pub fn set_expected(&mut self, seq_nr: u64) {
        self.expected_in_sut = seq_nr;
    }

    /// Records that a TSL with `seq_nr` is now exposed to the SUT.
    ///
    /// Does not touch `current_in_sut`: call [`save`](Self::save) once the SUT
    /// has adopted it.
    pub fn record_offered(&mut self, seq_nr: u64) -> Result<(), SequenceError> {
        persist(&self.path, seq_nr)?;
        self.last_offered = seq_nr;
        tracing::info!(seq_nr, "Recorded offered TSL sequence number");
        Ok(())
    }

    /// Records that the SUT now runs with `seq_nr`.
    pub fn save(&mut self, seq_nr: u64) -> Result<(), SequenceError> {
        persist(&self.path, seq_nr)?;
        self.current_in_sut = seq_nr;
        tracing::info!(seq_nr, "Saved current TSL sequence number of SUT");
        Ok(())
    }

    /// One past the highest of `last_offered` and `current_in_sut`.
    pub fn next_to_offer(&self) -> u64 {
        self.last_offered.max(self.current_in_sut).saturating_add(1)
    }
}

/// Writes the whole file via a sibling temp file and a rename.
fn persist(path: &Path, seq_nr: u64) -> Result<(), SequenceError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, seq_nr.to_string())
        .map_err(|e| SequenceError::PersistFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| SequenceError::PersistFailed(e.to_string()))
}
