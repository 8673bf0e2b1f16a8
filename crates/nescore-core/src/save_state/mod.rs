//! Save state system for `NesCore` emulator.
//!
//! This module provides instant save/load functionality for complete emulator
//! state, enabling features like rewind, TAS recording, and quick save/load.
//!
//! # Format
//!
//! Save states serialize a [`ConsoleState`] snapshot to JSON and wrap it in a
//! small binary header:
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │ Header (32 bytes)                      │
//! │  - Magic: "NSCR"                       │
//! │  - Version: u32                        │
//! │  - Checksum: u32 (FNV-1a of body)      │
//! │  - ROM fingerprint: u64 (FNV-1a)       │
//! │  - Frame count: u64                    │
//! ├───────────────────────────────────────┤
//! │ Body: JSON-encoded ConsoleState        │
//! └───────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use nescore_core::Console;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rom = std::fs::read("game.nes")?;
//! let mut console = Console::from_rom_bytes(&rom)?;
//!
//! for _ in 0..1000 {
//!     console.run_frame();
//! }
//!
//! # #[cfg(feature = "serde")]
//! let bytes = console.save_state_to_bytes()?;
//!
//! for _ in 0..500 {
//!     console.run_frame();
//! }
//!
//! # #[cfg(feature = "serde")]
//! console.load_state_from_bytes(&bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::SaveStateError;

use nescore_apu::ApuState;
use nescore_cpu::CpuSnapshot;
use nescore_ppu::PpuState;

use crate::bus::BusState;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Save state format version
pub const SAVE_STATE_VERSION: u32 = 1;

/// Magic bytes for save state files
pub const SAVE_STATE_MAGIC: &[u8; 4] = b"NSCR";

/// Size of the binary save-state header, in bytes.
const HEADER_SIZE: usize = 32;

/// Complete emulator save state.
///
/// Contains everything needed to resume emulation from the exact point it
/// was captured, short of mapper-internal banking state (see
/// [`crate::bus::NesBus::export_state`]).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsoleState {
    /// CPU architectural register state.
    pub cpu: CpuSnapshot,
    /// PPU state.
    pub ppu: PpuState,
    /// APU state.
    pub apu: ApuState,
    /// Bus-local state (RAM, controllers, DMA bookkeeping).
    pub bus: BusState,
    /// Total CPU cycles executed at the time of the snapshot.
    pub total_cycles: u64,
    /// Frame counter at the time of the snapshot.
    pub frame_count: u64,
}

/// FNV-1a, 32-bit.
fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = 0x811c_9dc5_u32;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// FNV-1a, 64-bit. Used as a cheap ROM identity fingerprint; collisions are
/// astronomically unlikely for the handful of ROM images a player swaps
/// between in one session.
#[must_use]
pub fn rom_fingerprint(prg_rom: &[u8], chr_rom: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for &byte in prg_rom.iter().chain(chr_rom.iter()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
    }
    hash
}

/// Serialize a [`ConsoleState`] to the binary save-state envelope.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
#[cfg(feature = "serde")]
pub fn save_state_to_bytes(
    state: &ConsoleState,
    rom_fingerprint: u64,
) -> Result<Vec<u8>, SaveStateError> {
    let body =
        serde_json::to_vec(state).map_err(|e| SaveStateError::Serialization(e.to_string()))?;
    let checksum = fnv1a_32(&body);

    let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
    bytes.extend_from_slice(SAVE_STATE_MAGIC);
    bytes.extend_from_slice(&SAVE_STATE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes.extend_from_slice(&rom_fingerprint.to_le_bytes());
    bytes.extend_from_slice(&state.frame_count.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Deserialize a [`ConsoleState`] from the binary save-state envelope,
/// verifying the header against the currently loaded ROM's fingerprint.
///
/// # Errors
///
/// Returns an error if the envelope is too short, the magic or version is
/// unrecognized, the checksum doesn't match, the ROM fingerprint doesn't
/// match `expected_rom_fingerprint`, or the body fails to deserialize.
#[cfg(feature = "serde")]
pub fn load_state_from_bytes(
    bytes: &[u8],
    expected_rom_fingerprint: u64,
) -> Result<ConsoleState, SaveStateError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SaveStateError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let (magic, rest) = bytes.split_at(4);
    if magic != SAVE_STATE_MAGIC {
        return Err(SaveStateError::InvalidMagic);
    }

    let (version, rest) = rest.split_at(4);
    let version = u32::from_le_bytes(version.try_into().unwrap());
    if version != SAVE_STATE_VERSION {
        return Err(SaveStateError::UnsupportedVersion(version));
    }

    let (checksum, rest) = rest.split_at(4);
    let expected_checksum = u32::from_le_bytes(checksum.try_into().unwrap());

    let (fingerprint, rest) = rest.split_at(8);
    let actual_fingerprint = u64::from_le_bytes(fingerprint.try_into().unwrap());
    if actual_fingerprint != expected_rom_fingerprint {
        return Err(SaveStateError::RomMismatch {
            expected: expected_rom_fingerprint,
            actual: actual_fingerprint,
        });
    }

    // Frame count is carried in the header for quick inspection without a
    // full JSON decode; the body also carries it as the source of truth.
    let (_frame_count, body) = rest.split_at(8);

    let actual_checksum = fnv1a_32(body);
    if actual_checksum != expected_checksum {
        return Err(SaveStateError::ChecksumMismatch {
            expected: expected_checksum,
            actual: actual_checksum,
        });
    }

    serde_json::from_slice(body).map_err(|e| SaveStateError::Serialization(e.to_string()))
}
