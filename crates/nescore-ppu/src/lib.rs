//! NES 2C02 PPU (Picture Processing Unit) emulation.
//!
//! This crate provides a cycle-accurate implementation of the NES PPU,
//! responsible for all graphics rendering.
//!
//! # Overview
//!
//! The PPU operates at 3x the CPU clock rate and generates a 256x240 pixel
//! image. It consists of several subsystems:
//!
//! - **Registers**: Control, Mask, Status, OAM Address, Scroll, Address, Data
//! - **Background rendering**: Nametables, pattern tables, attribute tables
//! - **Sprite rendering**: OAM, sprite evaluation, sprite 0 hit detection
//! - **Palette**: 32-byte palette RAM with mirroring
//!
//! # Timing
//!
//! NTSC timing (the primary target):
//! - Master clock: 21.477272 MHz
//! - PPU clock: 5.369318 MHz (master / 4)
//! - 341 dots per scanline
//! - 262 scanlines per frame
//! - 89,341-89,342 dots per frame (odd frame skip)
//!
//! # Usage
//!
//! The PPU does not own its CHR memory directly; callers pass closures that
//! read/write CHR space through the cartridge mapper so this crate stays
//! decoupled from `nescore-mappers`.
//!
//! ```no_run
//! use nescore_ppu::{Ppu, Mirroring};
//!
//! let mut ppu = Ppu::new(Mirroring::Vertical);
//! let mut read_chr = |_addr: u16| -> u8 { 0 };
//! let mut write_chr = |_addr: u16, _value: u8| {};
//!
//! // Step the PPU (call 3 times per CPU cycle for NTSC)
//! let (frame_complete, nmi) = ppu.step_with_chr(&mut read_chr);
//! if nmi {
//!     // Trigger NMI in CPU
//! }
//!
//! // Access registers from CPU
//! ppu.write_register(0x2000, 0x80, &mut write_chr); // Enable NMI
//! let status = ppu.read_register(0x2002, &mut read_chr);
//! ```
//!
//! # Features
//!
//! - `serde`: Enable serialization support for save states

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod timing;
mod vram;

pub use oam::{Oam, SecondaryOam, Sprite};
pub use ppu::{FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH, Ppu, PpuState};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::ScrollRegisters;
pub use sprites::{SpriteEvaluator, SpriteRenderer};
pub use vram::{Mirroring, Vram};

/// Dots (PPU cycles) per scanline.
pub const DOTS_PER_SCANLINE: u16 = 341;
/// Scanlines per frame.
pub const SCANLINES_PER_FRAME: u16 = 262;
/// The pre-render scanline index.
pub const PRE_RENDER_SCANLINE: u16 = 261;
/// The scanline on which VBlank begins.
pub const VBLANK_START_SCANLINE: u16 = 241;
