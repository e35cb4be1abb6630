/*!
MMC1 (mapper 1, SxROM boards): serial-port bank switching.

Writes to $8000-$FFFF feed a 5-bit shift register one bit at a time; the
fifth write dispatches the accumulated value to one of four internal
registers selected by the written address: control ($8000-$9FFF), CHR
bank 0 ($A000-$BFFF), CHR bank 1 ($C000-$DFFF), PRG bank ($E000-$FFFF).
A write with bit 7 set resets the shift register and locks the PRG mode
to fix-last. The control register also drives nametable mirroring.

PRG modes: 0/1 switch 32 KiB at $8000 (bank low bit ignored), 2 fixes the
first bank at $8000 and switches $C000, 3 fixes the last bank at $C000
and switches $8000. CHR switches as one 8 KiB bank or two 4 KiB banks.
*/

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::{Bus, BusDevice, Null, Ram, Rom, SharedDevice, Slice, share};
use crate::cartridge::{Cartridge, CartridgeError};
use crate::ppu::{Mirroring, SharedPpu};

/// Shift register seed; the set bit surfacing at bit 0 marks the fifth write.
const SHIFT_SEED: u8 = 0x10;

const PRG_BANK: usize = 0x4000;
const CHR_BANK: usize = 0x1000;

pub fn attach(cartridge: &Cartridge, cpu_bus: &Bus, ppu: &SharedPpu) -> Result<(), CartridgeError> {
    let chr = if cartridge.chr_is_ram() {
        Chr::Ram(share(Ram::new(0x2000)))
    } else {
        Chr::Rom(Rom::new(cartridge.chr().to_vec()))
    };
    let mut board = Mmc1 {
        ppu: ppu.clone(),
        prg: Rom::new(cartridge.prg().to_vec()),
        chr,
        prg_ram: share(Ram::new(cartridge.prg_ram_size())),
        shift: SHIFT_SEED,
        prg_mode: 3,
        chr_mode: 0,
        chr_select: [0; 2],
        prg_select: 0,
        chr_banks: [share(Null), share(Null)],
        prg_banks: [share(Null), share(Null)],
    };
    board.update_banks();

    let board = Rc::new(RefCell::new(board));
    cpu_bus.map(0x6000, 0xA000, board.clone());
    ppu.borrow().vram().map(0x0000, 0x2000, board);
    Ok(())
}

/// CHR storage: raw image banks for ROM, live-device windows for RAM so
/// writes stay visible through every view.
enum Chr {
    Rom(Rom),
    Ram(SharedDevice),
}

impl Chr {
    fn bank(&self, start: usize, end: usize) -> SharedDevice {
        match self {
            Chr::Rom(rom) => rom.bank(start, end),
            Chr::Ram(ram) => Slice::over(ram.clone(), start as u32, end as u32),
        }
    }
}

pub struct Mmc1 {
    ppu: SharedPpu,
    prg: Rom,
    chr: Chr,
    prg_ram: SharedDevice,

    shift: u8,
    prg_mode: u8,
    chr_mode: u8,
    chr_select: [u8; 2],
    prg_select: u8,

    // Current bank views: CHR for $0000/$1000, PRG for $8000/$C000.
    chr_banks: [SharedDevice; 2],
    prg_banks: [SharedDevice; 2],
}

impl Mmc1 {
    fn serial_write(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.shift = SHIFT_SEED;
            self.prg_mode = 3; // reset locks fix-last
            self.update_banks();
            return;
        }

        let fifth = self.shift & 1 != 0;
        self.shift = (self.shift >> 1) | ((value & 1) << 4);
        if !fifth {
            return;
        }
        let v = self.shift;
        self.shift = SHIFT_SEED;

        match addr {
            0x8000..=0x9FFF => self.write_control(v),
            0xA000..=0xBFFF => {
                log::trace!("mmc1: chr bank 0 -> {v:#04x}");
                self.chr_select[0] = v;
                self.update_banks();
            }
            0xC000..=0xDFFF => {
                log::trace!("mmc1: chr bank 1 -> {v:#04x}");
                self.chr_select[1] = v;
                self.update_banks();
            }
            _ => {
                if v != self.prg_select {
                    log::trace!("mmc1: prg bank -> {v:#04x}");
                    self.prg_select = v;
                    self.update_banks();
                }
            }
        }
    }

    fn write_control(&mut self, v: u8) {
        let mirroring = match v & 3 {
            0 => Mirroring::SingleScreenLow,
            1 => Mirroring::SingleScreenHigh,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        };
        self.prg_mode = (v >> 2) & 3;
        self.chr_mode = (v >> 4) & 1;
        log::trace!(
            "mmc1: control {v:#04x}: {mirroring:?}, prg mode {}, chr mode {}",
            self.prg_mode,
            self.chr_mode
        );
        self.ppu.borrow_mut().set_mirroring(mirroring);
        self.update_banks();
    }

    fn update_banks(&mut self) {
        match self.prg_mode {
            0 | 1 => {
                let n = (self.prg_select as usize & 0x1E) * PRG_BANK;
                let both = self.prg.bank(n, n + 2 * PRG_BANK);
                self.prg_banks = [both.clone(), both];
            }
            2 => {
                let n = self.prg_select as usize * PRG_BANK;
                self.prg_banks = [self.prg.bank(0, PRG_BANK), self.prg.bank(n, n + PRG_BANK)];
            }
            _ => {
                let n = self.prg_select as usize * PRG_BANK;
                let size = self.prg.len() as usize;
                self.prg_banks = [
                    self.prg.bank(n, n + PRG_BANK),
                    self.prg.bank(size - PRG_BANK, size),
                ];
            }
        }

        match self.chr_mode {
            0 => {
                let n = (self.chr_select[0] as usize & 0x1E) * CHR_BANK;
                let both = self.chr.bank(n, n + 2 * CHR_BANK);
                self.chr_banks = [both.clone(), both];
            }
            _ => {
                let n0 = self.chr_select[0] as usize * CHR_BANK;
                let n1 = self.chr_select[1] as usize * CHR_BANK;
                self.chr_banks = [
                    self.chr.bank(n0, n0 + CHR_BANK),
                    self.chr.bank(n1, n1 + CHR_BANK),
                ];
            }
        }
    }
}

impl BusDevice for Mmc1 {
    fn read(&mut self, addr: u16) -> u8 {
        match addr >> 12 {
            0 => self.chr_banks[0].borrow_mut().read(addr),
            1 => self.chr_banks[1].borrow_mut().read(addr),
            6 | 7 => self.prg_ram.borrow_mut().read(addr),
            8..=0xB => self.prg_banks[0].borrow_mut().read(addr),
            0xC..=0xF => self.prg_banks[1].borrow_mut().read(addr),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> u8 {
        match addr >> 12 {
            0 => self.chr_banks[0].borrow_mut().write(addr, value),
            1 => self.chr_banks[1].borrow_mut().write(addr, value),
            6 | 7 => self.prg_ram.borrow_mut().write(addr, value),
            8..=0xF => {
                self.serial_write(addr, value);
                0
            }
            _ => 0,
        }
    }

    fn len(&self) -> u32 {
        0x1_0000
    }

    fn label(&self) -> &'static str {
        "mmc1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuSignals;
    use crate::ppu::Ppu;
    use crate::test_utils::build_ines;

    /// 4x16K PRG, 2x8K CHR, each PRG bank tagged at its first byte and
    /// each 4K CHR bank tagged likewise.
    fn mmc1_image() -> Vec<u8> {
        let mut image = build_ines(4, 2, 1, 0);
        for bank in 0..4 {
            image[16 + bank * 0x4000] = 0x10 + bank as u8;
        }
        let chr_start = 16 + 4 * 0x4000;
        for bank in 0..4 {
            image[chr_start + bank * 0x1000] = 0x20 + bank as u8;
        }
        image
    }

    fn wire() -> (Bus, SharedPpu) {
        let cart = Cartridge::from_bytes(&mmc1_image()).unwrap();
        let bus = Bus::new();
        let ppu = Rc::new(RefCell::new(Ppu::new(CpuSignals::new())));
        attach(&cart, &bus, &ppu).unwrap();
        (bus, ppu)
    }

    /// Clock a 5-bit value into the serial port, LSB first.
    fn serial(bus: &Bus, addr: u16, value: u8) {
        for i in 0..5 {
            bus.write(addr, (value >> i) & 1);
        }
    }

    #[test]
    fn power_on_fixes_the_last_bank_high() {
        let (bus, _) = wire();
        assert_eq!(bus.read(0x8000), 0x10, "switchable window starts at bank 0");
        assert_eq!(bus.read(0xC000), 0x13, "fixed window shows the last bank");
    }

    #[test]
    fn prg_bank_register_switches_the_low_window() {
        let (bus, _) = wire();
        serial(&bus, 0xE000, 2);
        assert_eq!(bus.read(0x8000), 0x12);
        assert_eq!(bus.read(0xC000), 0x13, "fixed window unaffected");
    }

    #[test]
    fn thirty_two_kilobyte_mode_ignores_the_low_bank_bit() {
        let (bus, _) = wire();
        serial(&bus, 0x8000, 0x00); // control: 32K PRG mode, one-screen low
        serial(&bus, 0xE000, 3); // low bit ignored, selects banks 2+3
        assert_eq!(bus.read(0x8000), 0x12);
        assert_eq!(bus.read(0xC000), 0x13);
    }

    #[test]
    fn reset_bit_restores_fix_last_mode() {
        let (bus, _) = wire();
        serial(&bus, 0x8000, 0x00); // 32K mode
        bus.write(0x8000, 0x80); // reset
        serial(&bus, 0xE000, 1);
        assert_eq!(bus.read(0x8000), 0x11, "switchable again after reset");
        assert_eq!(bus.read(0xC000), 0x13);
    }

    #[test]
    fn reset_bit_discards_partial_shift_input() {
        let (bus, _) = wire();
        bus.write(0xE000, 1); // two stray bits
        bus.write(0xE000, 1);
        bus.write(0xE000, 0x80);
        serial(&bus, 0xE000, 2); // a clean 5-bit sequence still lands
        assert_eq!(bus.read(0x8000), 0x12);
    }

    #[test]
    fn chr_four_kilobyte_banking() {
        let (bus, ppu) = wire();
        serial(&bus, 0x8000, 0x10 | 0x0C); // chr mode 1, prg mode 3
        serial(&bus, 0xA000, 2);
        serial(&bus, 0xC000, 1);
        let vram = ppu.borrow().vram();
        assert_eq!(vram.read(0x0000), 0x22);
        assert_eq!(vram.read(0x1000), 0x21);
    }

    #[test]
    fn control_register_drives_mirroring() {
        let (bus, ppu) = wire();
        serial(&bus, 0x8000, 0x0E); // vertical mirroring, prg mode 3
        let vram = ppu.borrow().vram();
        vram.write(0x2005, 0x3C);
        assert_eq!(vram.read(0x2805), 0x3C, "vertical: quadrant 2 aliases 0");
        assert_eq!(vram.read(0x2405), 0x00);
    }

    #[test]
    fn prg_ram_window_works() {
        let (bus, _) = wire();
        bus.write(0x7010, 0x99);
        assert_eq!(bus.read(0x7010), 0x99);
    }
}
