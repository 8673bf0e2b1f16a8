//! Named end-to-end scheduler scenarios.
//!
//! Each test below exercises one scenario against a synthetic 32 KiB NROM
//! image built in-memory, mirroring how `benches/emulation_benchmarks.rs`
//! constructs a minimal ROM rather than depending on external test-ROM files.

use nescore_core::{Button, Console};

const PRG_SIZE: usize = 32 * 1024;
const CHR_SIZE: usize = 8 * 1024;

/// Build a minimal iNES 1.0 NROM (mapper 0) image with 32 KiB PRG-ROM
/// (mirroring disabled, the whole bank maps straight to $8000-$FFFF) and
/// 8 KiB CHR-ROM, given the raw PRG bytes (which must be exactly
/// `PRG_SIZE` long).
fn build_rom(prg: [u8; PRG_SIZE]) -> Vec<u8> {
    let mut rom = vec![0u8; 16 + PRG_SIZE + CHR_SIZE];
    rom[0] = 0x4E; // 'N'
    rom[1] = 0x45; // 'E'
    rom[2] = 0x53; // 'S'
    rom[3] = 0x1A; // EOF
    rom[4] = 2; // 32 KiB PRG-ROM (2 x 16 KiB units)
    rom[5] = 1; // 8 KiB CHR-ROM
    rom[6] = 0x00; // Mapper 0, horizontal mirroring
    rom[16..16 + PRG_SIZE].copy_from_slice(&prg);
    rom
}

/// A PRG image that is all NOPs (`$EA`) except for a given list of
/// `(offset, bytes)` patches. `offset` is relative to $8000.
fn prg_with_patches(patches: &[(usize, &[u8])]) -> [u8; PRG_SIZE] {
    let mut prg = [0xEAu8; PRG_SIZE];
    for &(offset, bytes) in patches {
        prg[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
    prg
}

/// Scenario 1: reset vector.
///
/// Overwriting the last 4 bytes of the vector table so `$FFFC = $34`,
/// `$FFFD = $12` must leave `cpu.pc == 0x1234` after `reset()`.
#[test]
fn scenario_reset_vector() {
    let prg = prg_with_patches(&[(0x7FFC, &[0x34, 0x12])]);
    let rom = build_rom(prg);
    let mut console = Console::from_rom_bytes(&rom).unwrap();

    console.reset();

    assert_eq!(console.cpu().pc, 0x1234);
}

/// Scenario 2: immediate LDA and flag updates.
///
/// `LDA #$00` then `LDA #$80`, each run via `step_instruction()`, must each
/// cost 2 cycles and leave the expected A/Z/N state.
#[test]
fn scenario_immediate_lda_flags() {
    use nescore_cpu::Status;

    let prg = prg_with_patches(&[
        (0x7FFC, &[0x00, 0x80]), // reset vector -> $8000
        (0x0000, &[0xA9, 0x00, 0xA9, 0x80]),
    ]);
    let rom = build_rom(prg);
    let mut console = Console::from_rom_bytes(&rom).unwrap();
    console.reset();

    let cycles1 = console.step_instruction();
    assert_eq!(cycles1, 2);
    assert_eq!(console.cpu().a, 0x00);
    assert!(console.cpu().status.contains(Status::Z));
    assert!(!console.cpu().status.contains(Status::N));

    let cycles2 = console.step_instruction();
    assert_eq!(cycles2, 2);
    assert_eq!(console.cpu().a, 0x80);
    assert!(!console.cpu().status.contains(Status::Z));
    assert!(console.cpu().status.contains(Status::N));
}

/// Scenario 3: OAM DMA cost.
///
/// `LDA #$02; STA $4014` from a clean reset must cost `2 + 4 + 513 = 519`
/// total CPU cycles, and the transferred page must land unmodified in OAM.
#[test]
fn scenario_oam_dma_cost() {
    let prg = prg_with_patches(&[
        (0x7FFC, &[0x00, 0x80]), // reset vector -> $8000
        (0x0000, &[0xA9, 0x02, 0x8D, 0x14, 0x40]), // LDA #$02; STA $4014
    ]);
    let rom = build_rom(prg);
    let mut console = Console::from_rom_bytes(&rom).unwrap();
    console.reset();

    // Distinguish the transferred page from the rest of RAM without
    // spending extra CPU cycles on setup instructions.
    console.bus_mut().ram[0x0200] = 0x77;
    console.bus_mut().ram[0x02FF] = 0x99;

    let c1 = console.step(); // LDA #$02
    let c2 = console.step(); // STA $4014 (arms OAM DMA)
    let c3 = console.step(); // OAM DMA itself

    assert_eq!(c1, 2);
    assert_eq!(c2, 4);
    assert_eq!(c3, 513);
    assert_eq!(console.total_cycles(), 519);

    let ram_page: Vec<u8> = (0..256).map(|i| console.bus().ram[0x0200 + i]).collect();
    let oam = console.ppu().export_state().oam;
    assert_eq!(oam, ram_page);
    assert_eq!(oam[0], 0x77);
    assert_eq!(oam[0xFF], 0x99);
}

/// Scenario 4: VBlank NMI.
///
/// With PPUCTRL bit 7 set, running one NTSC frame from a clean reset must
/// invoke the NMI vector exactly once.
#[test]
fn scenario_vblank_nmi() {
    let prg = prg_with_patches(&[
        (0x7FFC, &[0x00, 0x80]), // reset vector -> $8000
        (0x7FFA, &[0x00, 0x90]), // NMI vector -> $9000
        (0x0000, &[0xA9, 0x80, 0x8D, 0x00, 0x20, 0x4C, 0x05, 0x80]), // LDA #$80; STA $2000; loop: JMP loop
        (0x1000, &[0xEE, 0x10, 0x00, 0x40]), // INC $0010; RTI
    ]);
    let rom = build_rom(prg);
    let mut console = Console::from_rom_bytes(&rom).unwrap();
    console.reset();

    let stats = console.run_frame();

    assert_eq!(stats.frames_completed, 1);
    assert_eq!(console.bus().ram[0x0010], 1, "NMI handler must run exactly once");
}

/// Scenario 5: controller strobe.
///
/// With only Start pressed on port 1, strobing then reading 8 times must
/// reproduce the latched button order {A, B, Select, Start, Up, Down, Left,
/// Right} as `0,0,0,1,0,0,0,0` in bit 0 of each read.
#[test]
fn scenario_controller_strobe() {
    let prg = prg_with_patches(&[
        (0x7FFC, &[0x00, 0x80]), // reset vector -> $8000
        (
            0x0000,
            &[
                0xA9, 0x01, // LDA #$01
                0x8D, 0x16, 0x40, // STA $4016
                0xA9, 0x00, // LDA #$00
                0x8D, 0x16, 0x40, // STA $4016
                0xAD, 0x16, 0x40, // LDA $4016  (x8)
                0xAD, 0x16, 0x40, //
                0xAD, 0x16, 0x40, //
                0xAD, 0x16, 0x40, //
                0xAD, 0x16, 0x40, //
                0xAD, 0x16, 0x40, //
                0xAD, 0x16, 0x40, //
                0xAD, 0x16, 0x40, //
            ],
        ),
    ]);
    let rom = build_rom(prg);
    let mut console = Console::from_rom_bytes(&rom).unwrap();
    console.reset();

    console.set_button_1(Button::Start, true);

    console.step_instruction(); // LDA #$01
    console.step_instruction(); // STA $4016
    console.step_instruction(); // LDA #$00
    console.step_instruction(); // STA $4016

    let mut reads = [0u8; 8];
    for slot in &mut reads {
        console.step_instruction(); // LDA $4016
        *slot = console.cpu().a & 0x01;
    }

    assert_eq!(reads, [0, 0, 0, 1, 0, 0, 0, 0]);
}

/// Scenario 6: APU length counter.
///
/// Configuring pulse 1 with a nonzero length counter and enabling it via
/// `$4015`, then running one NTSC (4-step) frame, must clock exactly two
/// half-frame length-counter decrements.
#[test]
fn scenario_apu_length_counter() {
    let prg = prg_with_patches(&[
        (0x7FFC, &[0x00, 0x80]), // reset vector -> $8000
        (
            0x0000,
            &[
                0xA9, 0x30, // LDA #$30
                0x8D, 0x00, 0x40, // STA $4000 (constant volume, duty)
                0xA9, 0x08, // LDA #$08
                0x8D, 0x03, 0x40, // STA $4003 (loads length counter)
                0xA9, 0xFF, // LDA #$FF
                0x8D, 0x15, 0x40, // STA $4015 (enable all channels)
                0x4C, 0x0F, 0x80, // loop: JMP loop
            ],
        ),
    ]);
    let rom = build_rom(prg);
    let mut console = Console::from_rom_bytes(&rom).unwrap();
    console.reset();

    for _ in 0..6 {
        console.step_instruction();
    }

    let before = console.apu().pulse1_length();
    console.run_frame();
    let after = console.apu().pulse1_length();

    assert_eq!(
        before.saturating_sub(after),
        2,
        "NTSC 4-step sequencer clocks the length counter on 2 half-frame steps per frame"
    );
}
