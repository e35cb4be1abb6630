#![doc = r#"
Cycle-accurate NES console core.

Modules:
- bus: page-table memory bus with stacked, OR-aggregated device handlers
- cpu: 6502 (2A03) execution engine over a 256-entry opcode table
- ppu: dot-clocked picture processor, register file and frame handoff
- apu: APU/I-O register window, frame counter, OAM DMA, controller ports
- cartridge: iNES v1 container parsing
- mapper / mappers: mapper registry and the NROM and MMC1 boards
- controller: standard joypad shift register
- clock: master clock scheduler with injectable time source
- nes: console wiring, the usual entry point

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod clock;
pub mod controller;
pub mod cpu;
pub mod mapper;
pub mod mappers;
pub mod nes;
pub mod ppu;

pub use bus::Bus;
pub use cartridge::{Cartridge, CartridgeError};
pub use clock::{ClockControl, MasterClock, NTSC_MASTER_HZ};
pub use controller::{Button, Controller};
pub use cpu::{Cpu, CpuSignals};
pub use mapper::MapperRegistry;
pub use nes::Nes;
pub use ppu::{Frame, FrameHandle, Mirroring, Ppu};

#[cfg(test)]
pub mod test_utils;
