//! NES Console Implementation.
//!
//! The Console struct provides the high-level emulation API, managing the
//! CPU, PPU, APU, and mapper integration with proper timing.

use crate::bus::{ControllerState, NesBus};
use crate::input::Button;
use crate::save_state::ConsoleState;
use nescore_cpu::Cpu;
use nescore_mappers::{Mapper, Rom, RomError, create_mapper};
use thiserror::Error;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};

/// NES emulation timing constants.
pub mod timing {
    /// Master clock frequency (NTSC).
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock frequency (NTSC).
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// PPU clock frequency (NTSC).
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// CPU cycles per frame (NTSC).
    pub const CPU_CYCLES_PER_FRAME: u32 = 29_780;
    /// PPU dots per scanline.
    pub const PPU_DOTS_PER_SCANLINE: u16 = 341;
    /// Total scanlines (including vblank).
    pub const PPU_SCANLINES: u16 = 262;
    /// Target frame rate (NTSC).
    pub const FRAME_RATE_NTSC: f64 = 60.0988;

    /// Master clock frequency (PAL).
    pub const MASTER_CLOCK_PAL: u32 = 26_601_712;
    /// CPU clock frequency (PAL).
    pub const CPU_CLOCK_PAL: u32 = MASTER_CLOCK_PAL / 16;
    /// PPU clock frequency (PAL).
    pub const PPU_CLOCK_PAL: u32 = MASTER_CLOCK_PAL / 5;
    /// Total scanlines (PAL, including vblank).
    pub const PPU_SCANLINES_PAL: u16 = 312;
    /// Target frame rate (PAL).
    pub const FRAME_RATE_PAL: f64 = 50.007;
    /// CPU cycles per frame (PAL), rounded to the nearest whole cycle.
    ///
    /// PAL's PPU:CPU clock ratio is 3.2, not the NTSC 3:1, so this is an
    /// approximation: [`crate::bus::NesBus::step_ppu`] always advances the
    /// PPU by exactly 3 dots per CPU cycle. True PAL timing needs a
    /// fractional dot accumulator that this emulator does not yet implement.
    pub const CPU_CYCLES_PER_FRAME_PAL: u32 = 33_247;
}

/// Default audio sample rate used by [`Console::from_rom_bytes`].
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Default audio batch size used by [`Console::from_rom_bytes`].
pub const DEFAULT_AUDIO_BATCH: usize = 512;

/// Number of pixels in one video frame (256x240).
pub const FRAME_PIXELS: usize = 256 * 240;

/// Callback invoked with a freshly rendered video frame, packed as 0xAARRGGBB.
pub type VideoSink = Box<dyn FnMut(&[u32; FRAME_PIXELS])>;
/// Callback invoked with a batch of freshly generated audio samples.
pub type AudioSink = Box<dyn FnMut(&[f32])>;

/// Console region, determining clock rates and frame timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// NTSC (60 Hz, North America/Japan).
    #[default]
    Ntsc,
    /// PAL (50 Hz, Europe).
    Pal,
}

impl Region {
    /// CPU clock frequency for this region, in Hz.
    #[must_use]
    pub const fn cpu_clock_hz(self) -> u32 {
        match self {
            Self::Ntsc => timing::CPU_CLOCK_NTSC,
            Self::Pal => timing::CPU_CLOCK_PAL,
        }
    }

    /// PPU clock frequency for this region, in Hz.
    #[must_use]
    pub const fn ppu_clock_hz(self) -> u32 {
        match self {
            Self::Ntsc => timing::PPU_CLOCK_NTSC,
            Self::Pal => timing::PPU_CLOCK_PAL,
        }
    }

    /// Target frame rate for this region, in frames per second.
    #[must_use]
    pub const fn fps(self) -> f64 {
        match self {
            Self::Ntsc => timing::FRAME_RATE_NTSC,
            Self::Pal => timing::FRAME_RATE_PAL,
        }
    }

    /// Total scanlines per frame for this region, including vblank.
    #[must_use]
    pub const fn scanlines(self) -> u16 {
        match self {
            Self::Ntsc => timing::PPU_SCANLINES,
            Self::Pal => timing::PPU_SCANLINES_PAL,
        }
    }

    /// CPU cycles per frame for this region.
    #[must_use]
    pub const fn cpu_cycles_per_frame(self) -> u32 {
        match self {
            Self::Ntsc => timing::CPU_CYCLES_PER_FRAME,
            Self::Pal => timing::CPU_CYCLES_PER_FRAME_PAL,
        }
    }
}

/// Statistics for a single [`Console::run_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// CPU cycles executed during the frame.
    pub cpu_cycles: u64,
    /// PPU dots advanced during the frame (`cpu_cycles * 3`, NTSC stepping).
    pub ppu_cycles: u64,
    /// Number of complete frames rendered by this call (always 1).
    pub frames_completed: u64,
    /// Running frame index after this call.
    pub frame_index: u64,
    /// Number of unofficial (undocumented) 6502 opcodes executed this frame.
    pub illegal_opcodes: u64,
}

/// Error type for all fallible `Console` operations.
#[derive(Debug, Error)]
pub enum NescoreError {
    /// The ROM image could not be parsed or uses an unsupported mapper.
    #[error("invalid ROM: {0}")]
    RomInvalid(#[from] RomError),
    /// A save-state blob failed to load.
    #[error("invalid save state: {0}")]
    StateInvalid(#[from] crate::save_state::SaveStateError),
    /// An out-of-range or unrecognized argument was passed to a `Console`
    /// method. Methods that can hit this (e.g. [`Console::set_button`])
    /// ignore the bad input rather than propagate this variant; it exists
    /// for callers that want to validate input themselves.
    #[error("invalid argument: {0}")]
    BadArgument(String),
}

/// NES console emulator.
pub struct Console {
    /// 6502 CPU.
    cpu: Cpu,
    /// System bus (PPU, APU, mapper, RAM).
    bus: NesBus,
    /// Frame buffer (256x240 RGBA).
    framebuffer: Vec<u8>,
    /// Frame buffer packed as 0xAARRGGBB u32s, for [`Console::set_video_sink`].
    video_frame: Box<[u32; FRAME_PIXELS]>,
    /// Audio sample buffer.
    audio_buffer: Vec<f32>,
    /// Total CPU cycles executed.
    total_cycles: u64,
    /// Frame counter.
    frame_count: u64,
    /// Cumulative count of unofficial opcodes executed, for `FrameStats`.
    illegal_opcode_total: u64,
    /// Is emulation running?
    running: bool,
    /// Console region (NTSC/PAL).
    region: Region,
    /// Optional video frame callback, invoked at the end of each `run_frame`.
    video_sink: Option<VideoSink>,
    /// Optional audio batch callback, invoked at the end of each `run_frame`.
    audio_sink: Option<AudioSink>,
    /// Fingerprint of the loaded ROM image, used to validate save states.
    /// `None` when the console was built via [`Console::with_mapper`], which
    /// has no raw ROM bytes to fingerprint.
    rom_fingerprint: Option<u64>,
}

impl Console {
    /// Create a new console with the given ROM.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn new(rom_data: &[u8]) -> Result<Self, NescoreError> {
        let rom = Rom::load(rom_data)?;
        let mapper = create_mapper(&rom)?;
        let mut console = Self::with_mapper(mapper)?;
        console.rom_fingerprint = Some(crate::save_state::rom_fingerprint(
            &rom.prg_rom,
            &rom.chr_rom,
        ));
        Ok(console)
    }

    /// Create a new console from ROM bytes, defaulting to NTSC timing, a
    /// 44,100 Hz audio sample rate, and a 512-sample audio batch size.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn from_rom_bytes(rom_data: &[u8]) -> Result<Self, NescoreError> {
        Self::new(rom_data)
    }

    /// Create a new console from ROM bytes, resampling audio output to
    /// `sample_rate` Hz instead of the default 44,100 Hz.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM cannot be loaded or uses an unsupported mapper.
    pub fn from_rom_bytes_with_sample_rate(
        rom_data: &[u8],
        sample_rate: u32,
    ) -> Result<Self, NescoreError> {
        let mut console = Self::new(rom_data)?;
        console.bus.set_sample_rate(sample_rate);
        Ok(console)
    }

    /// Create a console with a pre-created mapper.
    ///
    /// # Errors
    ///
    /// Returns an error if the console cannot be initialized.
    pub fn with_mapper(mapper: Box<dyn Mapper>) -> Result<Self, NescoreError> {
        let bus = NesBus::new(mapper);
        let cpu = Cpu::new();

        Ok(Self {
            cpu,
            bus,
            framebuffer: vec![0; 256 * 240 * 4],
            video_frame: Box::new([0u32; FRAME_PIXELS]),
            audio_buffer: Vec::with_capacity(2048),
            total_cycles: 0,
            frame_count: 0,
            illegal_opcode_total: 0,
            running: true,
            region: Region::Ntsc,
            video_sink: None,
            audio_sink: None,
            rom_fingerprint: None,
        })
    }

    /// Reset the console to initial state (equivalent to power-cycling).
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.reset();
        self.total_cycles = 0;
        self.running = true;
    }

    /// Reset the console via the console's reset button.
    ///
    /// On real hardware this differs from a power cycle mainly in what
    /// retains charge across the reset; this emulator does not yet model
    /// that distinction; so, behaviorally, this is an alias for
    /// [`Console::reset`].
    pub fn soft_reset(&mut self) {
        self.reset();
    }

    /// Power on the console (cold boot).
    pub fn power_on(&mut self) {
        self.reset();
    }

    /// Get the console's region (NTSC/PAL).
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Set the console's region (NTSC/PAL).
    ///
    /// Changes [`Console::run_frame`]'s cycle budget immediately; see
    /// [`timing::CPU_CYCLES_PER_FRAME_PAL`] for the PAL timing caveat.
    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    /// Register a callback invoked with the rendered frame (packed as
    /// 0xAARRGGBB u32 pixels) at the end of every [`Console::run_frame`].
    pub fn set_video_sink(&mut self, sink: impl FnMut(&[u32; FRAME_PIXELS]) + 'static) {
        self.video_sink = Some(Box::new(sink));
    }

    /// Register a callback invoked with each batch of audio samples produced
    /// during [`Console::run_frame`]. Draining the internal audio buffer via
    /// [`Console::take_audio`] is unaffected if no sink is registered.
    pub fn set_audio_sink(&mut self, sink: impl FnMut(&[f32]) + 'static) {
        self.audio_sink = Some(Box::new(sink));
    }

    /// Set a single button's pressed state on a controller port.
    ///
    /// `port` must be 0 or 1; `name` must match a [`Button`] variant name
    /// case-insensitively (`"a"`, `"B"`, `"select"`, `"Start"`, `"up"`,
    /// `"down"`, `"left"`, `"right"`). Unrecognized ports or names are
    /// silently ignored, matching how real hardware has no way to signal
    /// "invalid button" back to the caller.
    pub fn set_button(&mut self, port: u8, name: &str, pressed: bool) {
        let Some(button) = Button::from_name(name) else {
            return;
        };
        match port {
            0 => self.set_button_1(button, pressed),
            1 => self.set_button_2(button, pressed),
            _ => {}
        }
    }

    /// Set a single button's pressed state on controller 1.
    pub fn set_button_1(&mut self, button: Button, pressed: bool) {
        Self::apply_button(&mut self.bus.controller1, button, pressed);
    }

    /// Set a single button's pressed state on controller 2.
    pub fn set_button_2(&mut self, button: Button, pressed: bool) {
        Self::apply_button(&mut self.bus.controller2, button, pressed);
    }

    fn apply_button(state: &mut ControllerState, button: Button, pressed: bool) {
        let mask = button as u8;
        if pressed {
            state.buttons |= mask;
        } else {
            state.buttons &= !mask;
        }
    }

    /// Run emulation for one CPU instruction, or for one pending DMA/stall
    /// slice.
    ///
    /// Returns the number of CPU cycles executed (up to 514, for OAM DMA
    /// starting on an odd cycle, hence `u16` rather than `u8`).
    pub fn step(&mut self) -> u16 {
        if !self.running {
            return 0;
        }

        // Handle DMC DMA stall
        if self.bus.dmc_stall_active() {
            self.bus.decrement_dmc_stall();
            self.step_components(1);
            self.total_cycles += 1;
            return 1;
        }

        // Handle OAM DMA
        if self.bus.oam_dma_pending() {
            let dma_cycles = self.bus.execute_oam_dma();
            self.step_components(dma_cycles);
            self.total_cycles += u64::from(dma_cycles);
            return dma_cycles;
        }

        // Handle interrupts
        if self.bus.nmi_pending() {
            self.bus.acknowledge_nmi();
            self.cpu.trigger_nmi();
        }
        self.cpu.set_irq(self.bus.irq_pending());

        // Execute one CPU instruction
        let cycles = self.cpu.step(&mut self.bus);
        self.step_components(u16::from(cycles));
        self.bus.add_cpu_cycles(cycles);
        self.total_cycles += u64::from(cycles);
        if self.cpu.last_opcode_unofficial() {
            self.illegal_opcode_total += 1;
        }

        u16::from(cycles)
    }

    /// Run emulation forward until exactly one CPU instruction has executed,
    /// first draining any pending OAM/DMC DMA stall cycles.
    ///
    /// Returns the number of CPU cycles the instruction itself took.
    pub fn step_instruction(&mut self) -> u16 {
        while self.running && (self.bus.dmc_stall_active() || self.bus.oam_dma_pending()) {
            self.step();
        }
        self.step()
    }

    /// Step PPU and APU for the given number of CPU cycles.
    fn step_components(&mut self, cpu_cycles: u16) {
        for _ in 0..cpu_cycles {
            // Step PPU (3 dots per CPU cycle)
            self.bus.step_ppu();

            // Step APU (1:1 with CPU)
            if let Some(sample) = self.bus.step_apu() {
                self.audio_buffer.push(sample);
            }
        }
    }

    /// Run emulation for one frame (approximately 29,780 CPU cycles).
    ///
    /// Returns the actual number of CPU cycles executed.
    pub fn step_frame(&mut self) -> u64 {
        let start_cycles = self.total_cycles;
        let target_cycles = self.total_cycles + u64::from(timing::CPU_CYCLES_PER_FRAME);

        while self.total_cycles < target_cycles && self.running {
            self.step();
        }

        // Copy PPU framebuffer
        self.update_framebuffer();
        self.frame_count += 1;

        self.total_cycles - start_cycles
    }

    /// Run emulation for one frame with cycle-accurate timing.
    ///
    /// This is an alias for `step_frame()` for API compatibility.
    /// Returns the actual number of CPU cycles executed.
    pub fn step_frame_accurate(&mut self) -> u64 {
        self.step_frame()
    }

    /// Run emulation for one frame, invoking any registered video/audio
    /// sinks, and return timing statistics for the frame.
    pub fn run_frame(&mut self) -> FrameStats {
        let start_cycles = self.total_cycles;
        let start_illegal = self.illegal_opcode_total;
        let target_cycles = self.total_cycles + u64::from(self.region.cpu_cycles_per_frame());

        while self.total_cycles < target_cycles && self.running {
            self.step();
        }

        self.update_framebuffer();
        self.frame_count += 1;

        if let Some(sink) = self.video_sink.as_mut() {
            sink(&self.video_frame);
        }
        if let Some(sink) = self.audio_sink.as_mut() {
            sink(&self.audio_buffer);
            self.audio_buffer.clear();
        }

        let cpu_cycles = self.total_cycles - start_cycles;
        FrameStats {
            cpu_cycles,
            ppu_cycles: cpu_cycles * 3,
            frames_completed: 1,
            frame_index: self.frame_count,
            illegal_opcodes: self.illegal_opcode_total - start_illegal,
        }
    }

    /// Update the framebuffer from PPU output.
    fn update_framebuffer(&mut self) {
        let ppu_buffer = self.bus.ppu.frame_buffer();

        // Convert PPU palette indices to RGBA, and to packed 0xAARRGGBB for
        // the video sink.
        for (i, &palette_idx) in ppu_buffer.iter().enumerate() {
            let rgb = crate::palette::NES_PALETTE[palette_idx as usize & 0x3F];
            let offset = i * 4;
            self.framebuffer[offset] = rgb.0; // R
            self.framebuffer[offset + 1] = rgb.1; // G
            self.framebuffer[offset + 2] = rgb.2; // B
            self.framebuffer[offset + 3] = 255; // A

            self.video_frame[i] = 0xFF00_0000
                | (u32::from(rgb.0) << 16)
                | (u32::from(rgb.1) << 8)
                | u32::from(rgb.2);
        }
    }

    /// Get the current video frame, packed as 0xAARRGGBB u32 pixels.
    #[must_use]
    pub fn video_frame(&self) -> &[u32; FRAME_PIXELS] {
        &self.video_frame
    }

    /// Get the current framebuffer (256x240 RGBA).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Take the audio buffer (drains accumulated samples).
    pub fn take_audio(&mut self) -> Vec<f32> {
        core::mem::take(&mut self.audio_buffer)
    }

    /// Get the audio buffer without draining.
    #[must_use]
    pub fn audio_buffer(&self) -> &[f32] {
        &self.audio_buffer
    }

    /// Get audio samples (alias for `audio_buffer`).
    #[must_use]
    pub fn audio_samples(&self) -> &[f32] {
        &self.audio_buffer
    }

    /// Clear the audio sample buffer.
    pub fn clear_audio_samples(&mut self) {
        self.audio_buffer.clear();
    }

    /// Set controller 1 state from button byte.
    pub fn set_controller_1(&mut self, buttons: u8) {
        self.bus.controller1 = ControllerState { buttons };
    }

    /// Set controller 2 state from button byte.
    pub fn set_controller_2(&mut self, buttons: u8) {
        self.bus.controller2 = ControllerState { buttons };
    }

    /// Set controller 1 state.
    pub fn set_controller1(&mut self, state: ControllerState) {
        self.bus.controller1 = state;
    }

    /// Set controller 2 state.
    pub fn set_controller2(&mut self, state: ControllerState) {
        self.bus.controller2 = state;
    }

    /// Get controller 1 state.
    #[must_use]
    pub fn controller1(&self) -> ControllerState {
        self.bus.controller1
    }

    /// Get controller 2 state.
    #[must_use]
    pub fn controller2(&self) -> ControllerState {
        self.bus.controller2
    }

    /// Get the total CPU cycles executed.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Get the frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check if emulation is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pause emulation.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume emulation.
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Get a reference to the CPU for debugging.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Get a reference to the PPU for debugging.
    #[must_use]
    pub fn ppu(&self) -> &nescore_ppu::Ppu {
        &self.bus.ppu
    }

    /// Get a reference to the APU for debugging.
    #[must_use]
    pub fn apu(&self) -> &nescore_apu::Apu {
        &self.bus.apu
    }

    /// Get the total CPU cycles (alias for `total_cycles`).
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Peek at memory without side effects.
    ///
    /// This is useful for debugging/display purposes where we don't want
    /// to trigger PPU register side effects or mapper state changes.
    #[must_use]
    pub fn peek_memory(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Get a reference to the bus for debugging.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Get a mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Get the mapper number.
    #[must_use]
    pub fn mapper_number(&self) -> u16 {
        self.bus.mapper.mapper_number()
    }

    /// Get the mapper name.
    #[must_use]
    pub fn mapper_name(&self) -> &'static str {
        self.bus.mapper.mapper_name()
    }

    /// Check if the ROM has battery-backed RAM.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.bus.mapper.has_battery()
    }

    /// Get battery-backed RAM for saving.
    #[must_use]
    pub fn battery_ram(&self) -> Option<&[u8]> {
        self.bus.mapper.battery_ram()
    }

    /// Load battery-backed RAM.
    pub fn load_battery_ram(&mut self, data: &[u8]) {
        self.bus.mapper.set_battery_ram(data);
    }

    /// Capture a save state of the CPU, PPU, APU, and bus-local state.
    ///
    /// Mapper bank-select state is not captured; see
    /// [`crate::bus::NesBus::export_state`].
    #[must_use]
    pub fn save_state(&self) -> ConsoleState {
        ConsoleState {
            cpu: self.cpu.export_state(),
            ppu: self.bus.ppu.export_state(),
            apu: self.bus.apu.export_state(),
            bus: self.bus.export_state(),
            total_cycles: self.total_cycles,
            frame_count: self.frame_count,
        }
    }

    /// Restore a save state captured by [`Console::save_state`].
    pub fn load_state(&mut self, state: &ConsoleState) {
        self.cpu.import_state(&state.cpu);
        self.bus.ppu.import_state(&state.ppu);
        self.bus.apu.import_state(&state.apu);
        self.bus.import_state(&state.bus);
        self.total_cycles = state.total_cycles;
        self.frame_count = state.frame_count;
        self.running = true;
    }

    /// Serialize a save state to the binary envelope format, tagged with
    /// this console's ROM fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    #[cfg(feature = "serde")]
    pub fn save_state_to_bytes(&self) -> Result<Vec<u8>, NescoreError> {
        let state = self.save_state();
        let bytes =
            crate::save_state::save_state_to_bytes(&state, self.rom_fingerprint.unwrap_or(0))?;
        Ok(bytes)
    }

    /// Deserialize and restore a save state produced by
    /// [`Console::save_state_to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is malformed, corrupt, version
    /// mismatched, or was captured against a different ROM.
    #[cfg(feature = "serde")]
    pub fn load_state_from_bytes(&mut self, bytes: &[u8]) -> Result<(), NescoreError> {
        let state = crate::save_state::load_state_from_bytes(
            bytes,
            self.rom_fingerprint.unwrap_or(0),
        )?;
        self.load_state(&state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nescore_mappers::{Mirroring, Nrom, RomHeader};

    #[cfg(not(feature = "std"))]
    use alloc::{boxed::Box, vec, vec::Vec};

    fn create_test_console() -> Console {
        let rom = Rom {
            header: RomHeader {
                prg_rom_size: 32768,
                chr_rom_size: 8192,
                mapper_number: 0,
                submapper: 0,
                nes2_format: false,
                prg_ram_size: 0,
                prg_nvram_size: 0,
                chr_ram_size: 0,
                chr_nvram_size: 0,
                mirroring: Mirroring::Vertical,
                has_battery: false,
                has_trainer: false,
            },
            // Simple program: NOP loop at $8000
            prg_rom: {
                let mut prg = vec![0xEA; 32768]; // Fill with NOPs
                // Reset vector at $FFFC points to $8000
                prg[0x7FFC] = 0x00;
                prg[0x7FFD] = 0x80;
                prg
            },
            chr_rom: vec![0; 8192],
            trainer: None,
        };
        Console::with_mapper(Box::new(Nrom::new(&rom))).unwrap()
    }

    #[test]
    fn test_console_creation() {
        let console = create_test_console();
        assert_eq!(console.mapper_number(), 0);
        assert_eq!(console.mapper_name(), "NROM");
    }

    #[test]
    fn test_console_step() {
        let mut console = create_test_console();
        console.reset();

        let cycles = console.step();
        assert!(cycles > 0);
        assert!(console.total_cycles() > 0);
    }

    #[test]
    fn test_console_framebuffer() {
        let console = create_test_console();
        let fb = console.framebuffer();
        assert_eq!(fb.len(), 256 * 240 * 4);
    }

    #[test]
    fn test_console_pause_resume() {
        let mut console = create_test_console();
        assert!(console.is_running());

        console.pause();
        assert!(!console.is_running());

        console.resume();
        assert!(console.is_running());
    }

    #[test]
    fn test_controller_state() {
        let mut console = create_test_console();

        let state = ControllerState {
            buttons: ControllerState::A | ControllerState::START,
        };
        console.set_controller1(state);

        assert_eq!(console.controller1().buttons, 0x09);
    }

    #[test]
    fn test_console_reset() {
        let mut console = create_test_console();

        // Run some cycles
        for _ in 0..100 {
            console.step();
        }

        let cycles_before = console.total_cycles();
        assert!(cycles_before > 0);

        console.reset();
        assert_eq!(console.total_cycles(), 0);
    }
}
