//! CPU-facing register window.
//!
//! The whole $2000-$3FFF range mirrors the eight PPU registers every 8
//! bytes; the device forwards each access to the shared PPU, which
//! decodes `addr & 7` itself.

use crate::bus::BusDevice;
use crate::ppu::SharedPpu;

pub struct PpuRegisters {
    ppu: SharedPpu,
}

impl PpuRegisters {
    pub fn new(ppu: SharedPpu) -> Self {
        PpuRegisters { ppu }
    }
}

impl BusDevice for PpuRegisters {
    fn read(&mut self, addr: u16) -> u8 {
        self.ppu.borrow_mut().read_register(addr)
    }

    fn write(&mut self, addr: u16, value: u8) -> u8 {
        self.ppu.borrow_mut().write_register(addr, value);
        // Register ports latch the value without driving the data lines.
        0
    }

    fn len(&self) -> u32 {
        0x2000
    }

    fn label(&self) -> &'static str {
        "ppu registers"
    }
}
