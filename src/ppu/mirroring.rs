/*!
Nametable mirroring.

The $2000-$2FFF window holds four logical 1 KiB nametable quadrants backed
by less physical RAM than that. A single router mechanism covers every
layout: a 4-entry key table maps each logical quadrant to a physical bank,
and the router rewrites address bits 10-11 before forwarding to the
backing RAM. Changing the mirroring mode swaps the router in place on the
video bus.
*/

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::{Bus, BusDevice, Ram, SharedDevice, share};

/// Nametable layouts selectable by cartridges and mappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// Quadrants {0,0,1,1}: scrolling wraps vertically.
    Horizontal,
    /// Quadrants {0,1,0,1}: scrolling wraps horizontally.
    Vertical,
    /// All four quadrants show the first 1 KiB bank.
    SingleScreenLow,
    /// All four quadrants show the second 1 KiB bank.
    SingleScreenHigh,
    /// Four distinct banks, cartridge supplies the extra RAM.
    FourScreen,
    /// Quadrants {0,1,1,0}, seen on a few oddball boards.
    Diagonal,
}

impl Mirroring {
    /// Logical-quadrant to physical-bank keys.
    pub fn keys(self) -> [u8; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::SingleScreenLow => [0, 0, 0, 0],
            Mirroring::SingleScreenHigh => [1, 1, 1, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
            Mirroring::Diagonal => [0, 1, 1, 0],
        }
    }

    /// Physical nametable RAM needed to back this layout.
    fn ram_size(self) -> usize {
        match self {
            Mirroring::FourScreen => 0x1000,
            _ => 0x800,
        }
    }
}

/// Forwards nametable accesses to the backing RAM with address bits 10-11
/// rewritten through the key table.
pub(crate) struct MirrorRouter {
    keys: [u8; 4],
    backing: SharedDevice,
}

impl MirrorRouter {
    pub(crate) fn new(keys: [u8; 4], backing: SharedDevice) -> Self {
        MirrorRouter { keys, backing }
    }

    #[inline]
    fn translate(&self, addr: u16) -> u16 {
        let quadrant = ((addr >> 10) & 3) as usize;
        (addr & 0x03FF) | ((self.keys[quadrant] as u16) << 10)
    }
}

impl BusDevice for MirrorRouter {
    fn read(&mut self, addr: u16) -> u8 {
        let at = self.translate(addr);
        self.backing.borrow_mut().read(at)
    }

    fn write(&mut self, addr: u16, value: u8) -> u8 {
        let at = self.translate(addr);
        self.backing.borrow_mut().write(at, value)
    }

    fn len(&self) -> u32 {
        0x1000
    }

    fn label(&self) -> &'static str {
        "nametable router"
    }
}

/// Install (or re-install) the nametable mapping for `mode` on the video
/// bus. Returns the backing RAM so callers can retain it across mode
/// changes initiated by a mapper.
pub(crate) fn install_nametables(
    vram: &Bus,
    mode: Mirroring,
    backing: Option<SharedDevice>,
) -> SharedDevice {
    let wanted = mode.ram_size() as u32;
    let backing = match backing {
        Some(ram) if ram.borrow().len() >= wanted => ram,
        _ => share(Ram::new(mode.ram_size())),
    };
    vram.unmap(0x2000, 0x1000);
    vram.map(
        0x2000,
        0x1000,
        Rc::new(RefCell::new(MirrorRouter::new(mode.keys(), backing.clone()))),
    );
    backing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Bus;

    fn quadrant_targets(mode: Mirroring) -> [u16; 4] {
        let vram = Bus::new();
        let backing = install_nametables(&vram, mode, None);
        let mut out = [0u16; 4];
        for (q, slot) in out.iter_mut().enumerate() {
            // Tag each quadrant, then find which physical 1 KiB bank took it.
            let probe = 0x2000 + (q as u16) * 0x400 + 5;
            vram.write(probe, 0xA0 | q as u8);
            let mut backing = backing.borrow_mut();
            // First match wins: small backing RAM aliases high bank indexes.
            for bank in 0..4u16 {
                if backing.read(bank * 0x400 + 5) == (0xA0 | q as u8) {
                    *slot = bank;
                    break;
                }
            }
            backing.write((*slot) * 0x400 + 5, 0);
        }
        out
    }

    #[test]
    fn horizontal_maps_quadrants_0011() {
        assert_eq!(quadrant_targets(Mirroring::Horizontal), [0, 0, 1, 1]);
    }

    #[test]
    fn vertical_maps_quadrants_0101() {
        assert_eq!(quadrant_targets(Mirroring::Vertical), [0, 1, 0, 1]);
    }

    #[test]
    fn four_screen_keeps_quadrants_distinct() {
        assert_eq!(quadrant_targets(Mirroring::FourScreen), [0, 1, 2, 3]);
    }

    #[test]
    fn horizontal_aliases_share_storage() {
        let vram = Bus::new();
        install_nametables(&vram, Mirroring::Horizontal, None);
        vram.write(0x2005, 0x42);
        assert_eq!(vram.read(0x2405), 0x42, "quadrant 1 aliases quadrant 0");
        assert_eq!(vram.read(0x2805), 0x00, "quadrant 2 is a separate bank");
    }

    #[test]
    fn mode_change_reuses_backing_ram() {
        let vram = Bus::new();
        let backing = install_nametables(&vram, Mirroring::Vertical, None);
        vram.write(0x2405, 0x77); // lands in physical bank 1
        let backing = install_nametables(&vram, Mirroring::Horizontal, Some(backing));
        assert_eq!(vram.read(0x2805), 0x77, "bank 1 content survives the switch");
        drop(backing);
    }
}
