//! Save state error types.

use thiserror::Error;

/// Save state operation error
#[derive(Debug, Error)]
pub enum SaveStateError {
    /// Invalid magic bytes (expected 'NSCR')
    #[error("Invalid magic bytes (expected 'NSCR')")]
    InvalidMagic,

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {CURRENT_VERSION})")]
    UnsupportedVersion(u32),

    /// ROM mismatch (save state doesn't match the loaded ROM)
    #[error("ROM mismatch: save state was for fingerprint {expected:016x}, got {actual:016x}")]
    RomMismatch {
        /// Expected ROM fingerprint.
        expected: u64,
        /// Actual ROM fingerprint.
        actual: u64,
    },

    /// Checksum mismatch (data corruption)
    #[error("Checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum
        expected: u32,
        /// Actual checksum
        actual: u32,
    },

    /// Insufficient data
    #[error("Insufficient data: need {needed} bytes, got {available}")]
    InsufficientData {
        /// Bytes needed
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const CURRENT_VERSION: u32 = super::SAVE_STATE_VERSION;
