/*!
NROM (mapper 0): no banking at all.

- CPU $6000-$7FFF: header-sized PRG RAM (Family Basic boards; harmless
  elsewhere).
- CPU $8000-$FFFF: the whole PRG ROM. A 16 KiB image mirrors into both
  halves through the ROM's modulo addressing.
- PPU $0000-$1FFF: CHR ROM, or CHR RAM when the header declares none.
*/

use crate::bus::{Bus, Ram, Rom, share};
use crate::cartridge::{Cartridge, CartridgeError};
use crate::ppu::SharedPpu;

pub fn attach(cartridge: &Cartridge, cpu_bus: &Bus, ppu: &SharedPpu) -> Result<(), CartridgeError> {
    cpu_bus.map(0x6000, 0x2000, share(Ram::new(cartridge.prg_ram_size())));
    cpu_bus.map(0x8000, 0x8000, share(Rom::new(cartridge.prg().to_vec())));
    ppu.borrow().vram().map(0x0000, 0x2000, cartridge.chr_device());
    Ok(())
}
