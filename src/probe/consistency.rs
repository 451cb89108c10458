//! Byte-exact consistency check for downloaded content

use thiserror::Error;

/// Downloaded bytes differ from the expected fixture.
///
/// This means the store accepted the read and returned wrong data —
/// corruption, not unreachability — so it is metered separately from any
/// transport failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("downloaded content mismatch: expected {expected_len} bytes, got {actual_len}")]
pub struct MismatchError {
    pub expected_len: usize,
    pub actual_len: usize,
}

/// Compare downloaded bytes against the expected fixture, byte for byte.
/// Payloads are small and infrequent; no size or hash shortcut.
pub fn verify(expected: &[u8], actual: &[u8]) -> Result<(), MismatchError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MismatchError {
            expected_len: expected.len(),
            actual_len: actual.len(),
        })
    }
}
