/*!
PPU timing and rendering state machine.

Purpose
- Dot-exact frame timing: 262 scanlines of 341 dots, odd frames skipping
  the last idle dot of the pre-render line when rendering is enabled.
- Background fetch pipeline and per-scanline sprite evaluation feeding a
  per-dot pixel compositor (fetch, sprites, renderer submodules).
- CPU-visible registers $2000-$2007 with the loopy V/T/X/W scroll model,
  exposed to the CPU bus through the `registers` device wrapper.

VBlank and NMI
- The VBlank status bit sets at scanline 241 dot 1 and clears, together
  with the sprite-zero and overflow bits, at scanline 261 dot 1. NMI
  delivery trails the flag by a few dots of detection latency, so a
  status read landing inside that window suppresses the frame's NMI, and
  a read on the exact set dot hides the flag as well. The completed frame
  is published to the front buffer at VBlank start.

Video memory
- The PPU owns its own 14-bit bus: pattern tables are mapped by the
  cartridge mapper, nametables go through the mirroring router, and the
  32-byte palette is internal with the $3F10/$3F14/$3F18/$3F1C mirrors.
*/

pub mod fetch;
pub mod frame;
pub mod mirroring;
pub(crate) mod palette;
pub mod registers;
pub mod renderer;
pub mod sprites;


pub use frame::{Frame, FrameHandle};
pub use mirroring::Mirroring;
pub use registers::PpuRegisters;

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::{Bus, SharedDevice};
use crate::cpu::CpuSignals;
use crate::ppu::frame::FrameBuffers;
use crate::ppu::mirroring::install_nametables;

// PPUCTRL
pub const CTRL_NAMETABLE: u8 = 0x03;
pub const CTRL_INCREMENT: u8 = 0x04;
pub const CTRL_SPRITE_TABLE: u8 = 0x08;
pub const CTRL_BACKGROUND_TABLE: u8 = 0x10;
pub const CTRL_SPRITE_SIZE: u8 = 0x20;
pub const CTRL_NMI: u8 = 0x80;

// PPUMASK
pub const MASK_SHOW_LEFT_BG: u8 = 0x02;
pub const MASK_SHOW_LEFT_SPRITES: u8 = 0x04;
pub const MASK_SHOW_BG: u8 = 0x08;
pub const MASK_SHOW_SPRITES: u8 = 0x10;

// PPUSTATUS
pub const STATUS_OVERFLOW: u8 = 0x20;
pub const STATUS_SPRITE_ZERO: u8 = 0x40;
pub const STATUS_VBLANK: u8 = 0x80;

/// Dots between the VBlank flag and NMI delivery (detection latency).
const NMI_LATENCY: u8 = 3;

pub type SharedPpu = Rc<RefCell<Ppu>>;

pub struct Ppu {
    // CPU-visible registers
    pub(crate) ctrl: u8,
    pub(crate) mask: u8,
    pub(crate) status: u8,
    oam_addr: u8,
    pub(crate) oam: [u8; 256],
    pub(crate) palette: [u8; 32],

    // Loopy scroll registers
    pub(crate) v: u16,
    pub(crate) t: u16,
    pub(crate) x: u8,
    pub(crate) w: bool,
    read_buf: u8,

    // Timing
    pub(crate) dot: u16,
    pub(crate) scanline: u16,
    frame: u64,
    odd_frame: bool,

    // VBlank/NMI bookkeeping
    nmi_occurred: bool,
    nmi_delay: u8,

    // Background fetch pipeline
    pub(crate) nt_byte: u8,
    pub(crate) at_byte: u8,
    pub(crate) low_tile: u8,
    pub(crate) high_tile: u8,
    pub(crate) tile_data: u64,

    // Sprites pre-evaluated for the current scanline
    pub(crate) sprite_count: usize,
    pub(crate) sprite_patterns: [u32; 8],
    pub(crate) sprite_positions: [u8; 8],
    pub(crate) sprite_priorities: [u8; 8],
    pub(crate) sprite_indexes: [u8; 8],

    pub(crate) vram: Bus,
    nt_backing: SharedDevice,
    signals: CpuSignals,
    pub(crate) frames: FrameBuffers,
}

impl Ppu {
    pub fn new(signals: CpuSignals) -> Self {
        let vram = Bus::new();
        let nt_backing = install_nametables(&vram, Mirroring::Horizontal, None);
        Ppu {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            oam: [0; 256],
            palette: [0; 32],
            v: 0,
            t: 0,
            x: 0,
            w: false,
            read_buf: 0,
            dot: 0,
            scanline: 0,
            frame: 0,
            odd_frame: false,
            nmi_occurred: false,
            nmi_delay: 0,
            nt_byte: 0,
            at_byte: 0,
            low_tile: 0,
            high_tile: 0,
            tile_data: 0,
            sprite_count: 0,
            sprite_patterns: [0; 8],
            sprite_positions: [0; 8],
            sprite_priorities: [0; 8],
            sprite_indexes: [0; 8],
            vram,
            nt_backing,
            signals,
            frames: FrameBuffers::new(),
        }
    }

    /// Handle to the 14-bit video bus; mappers install pattern-table
    /// handlers here.
    pub fn vram(&self) -> Bus {
        self.vram.clone()
    }

    /// Reconfigure nametable mirroring, preserving the backing RAM where
    /// the new layout fits in it.
    pub fn set_mirroring(&mut self, mode: Mirroring) {
        log::debug!("ppu: mirroring set to {mode:?}");
        self.nt_backing = install_nametables(&self.vram, mode, Some(self.nt_backing.clone()));
    }

    /// Align the dot counter with a CPU that spent `cpu_cycles` on its own
    /// reset sequence (3 dots per CPU cycle).
    pub fn reset(&mut self, cpu_cycles: u64) {
        self.dot = (cpu_cycles * 3) as u16;
        self.scanline = 0;
        self.frame = 0;
        self.odd_frame = false;
        self.nmi_occurred = false;
        self.nmi_delay = 0;
    }

    pub fn frame_handle(&self) -> FrameHandle {
        self.frames.handle()
    }

    /// Completed frames since power-on.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    #[inline]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    #[inline]
    pub(crate) fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_SHOW_BG | MASK_SHOW_SPRITES) != 0
    }

    #[inline]
    pub(crate) fn ctrl_flag(&self, flag: u8) -> bool {
        self.ctrl & flag == flag
    }

    #[inline]
    pub(crate) fn mask_flag(&self, flag: u8) -> bool {
        self.mask & flag == flag
    }

    /// Advance one dot.
    pub fn tick(&mut self) {
        // NMI detection latency: deliver once the countdown expires, if
        // nothing suppressed it in the meantime.
        if self.nmi_delay > 0 {
            self.nmi_delay -= 1;
            if self.nmi_delay == 0 && self.ctrl_flag(CTRL_NMI) && self.nmi_occurred {
                self.signals.raise_nmi(1);
            }
        }

        self.advance_counters();

        if self.rendering_enabled() {
            self.render_tick();
        }

        if self.scanline == 241 && self.dot == 1 {
            self.begin_vblank();
        }
        if self.scanline == 261 && self.dot == 1 {
            self.end_vblank();
        }
    }

    fn advance_counters(&mut self) {
        // Odd frames skip the last idle dot of the pre-render line when
        // rendering is on.
        if self.rendering_enabled() && self.odd_frame && self.scanline == 261 && self.dot == 339 {
            self.dot = 0;
            self.scanline = 0;
            self.frame += 1;
            self.odd_frame = !self.odd_frame;
            return;
        }
        self.dot += 1;
        if self.dot > 340 {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > 261 {
                self.scanline = 0;
                self.frame += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    fn begin_vblank(&mut self) {
        // Publish the frame painted over the visible lines just ended.
        self.frames.swap();
        self.status |= STATUS_VBLANK;
        self.nmi_occurred = true;
        self.nmi_delay = NMI_LATENCY;
    }

    fn end_vblank(&mut self) {
        self.status &= !(STATUS_VBLANK | STATUS_SPRITE_ZERO | STATUS_OVERFLOW);
        self.nmi_occurred = false;
    }

    // Register file, indexed by `addr & 7`. The CPU-facing bus device in
    // `registers` routes the whole $2000-$3FFF window here.

    pub fn read_register(&mut self, addr: u16) -> u8 {
        match addr & 7 {
            2 => self.read_status(),
            4 => self.read_oam_data(),
            7 => self.read_data(),
            reg => {
                log::warn!("ppu: read from write-only register ${:04X}", 0x2000 + reg);
                0
            }
        }
    }

    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr & 7 {
            0 => self.write_ctrl(value),
            1 => self.mask = value,
            3 => self.oam_addr = value,
            4 => self.write_oam_data(value),
            5 => self.write_scroll(value),
            6 => self.write_addr(value),
            7 => self.write_data(value),
            _ => log::warn!("ppu: write to read-only register $2002 (${value:02X})"),
        }
    }

    fn read_status(&mut self) -> u8 {
        let mut result = self.status;
        if self.scanline == 241 && self.dot == 1 {
            // Reading on the exact set dot returns the flag as clear and
            // suppresses the NMI for this frame.
            result &= !STATUS_VBLANK;
        }
        if self.scanline == 241 && self.dot <= NMI_LATENCY as u16 {
            self.nmi_delay = 0;
            self.signals.cancel_nmi();
        }
        self.status &= !STATUS_VBLANK;
        self.nmi_occurred = false;
        self.w = false;
        result
    }

    fn read_oam_data(&self) -> u8 {
        // Attribute bytes have three unimplemented bits that read zero.
        if self.oam_addr & 0x03 == 0x02 {
            self.oam[self.oam_addr as usize] & 0xE3
        } else {
            self.oam[self.oam_addr as usize]
        }
    }

    fn read_data(&mut self) -> u8 {
        let at = self.v & 0x3FFF;
        // Non-palette reads are buffered one access behind; palette reads
        // bypass the buffer (which still refills from the underlying bus).
        let mut result = self.read_buf;
        self.read_buf = self.vram_read(at);
        if at >= 0x3F00 {
            result = self.palette[pal_addr(at)];
        }
        self.v = self.v.wrapping_add(self.increment());
        result
    }

    fn write_ctrl(&mut self, value: u8) {
        let was_enabled = self.ctrl_flag(CTRL_NMI);
        let enabled = value & CTRL_NMI != 0;
        if was_enabled && !enabled {
            // Disabling the output withdraws an undelivered NMI.
            self.nmi_delay = 0;
            self.signals.cancel_nmi();
        }
        if !was_enabled && enabled && self.nmi_occurred {
            // Re-arming with the flag still set fires immediately.
            self.signals.raise_nmi(1);
        }
        self.ctrl = value;
        // t: ....BA.. ........ = d: ......BA
        self.t = (self.t & 0xF3FF) | ((value as u16 & 0x03) << 10);
    }

    fn write_oam_data(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn write_scroll(&mut self, value: u8) {
        if !self.w {
            // t: ........ ...HGFED = d: HGFED...,  x = d: .....CBA
            self.t = (self.t & 0xFFE0) | (value as u16 >> 3);
            self.x = value & 0x07;
            self.w = true;
        } else {
            // t: .CBA..HG FED..... = d: HGFEDCBA
            self.t = (self.t & 0x8FFF) | ((value as u16 & 0x07) << 12);
            self.t = (self.t & 0xFC1F) | ((value as u16 & 0xF8) << 2);
            self.w = false;
        }
    }

    fn write_addr(&mut self, value: u8) {
        if !self.w {
            // t: ..FEDCBA ........ = d: ..FEDCBA, bit 14 cleared
            self.t = (self.t & 0x80FF) | ((value as u16 & 0x3F) << 8);
            self.w = true;
        } else {
            self.t = (self.t & 0xFF00) | value as u16;
            self.v = self.t;
            self.w = false;
        }
    }

    fn write_data(&mut self, value: u8) {
        let at = self.v & 0x3FFF;
        if at >= 0x3F00 {
            self.palette[pal_addr(at)] = value;
        } else {
            self.vram_write(at, value);
        }
        self.v = self.v.wrapping_add(self.increment());
    }

    #[inline]
    fn increment(&self) -> u16 {
        if self.ctrl_flag(CTRL_INCREMENT) { 32 } else { 1 }
    }

    // Video bus accessors with the $3000-$3EFF nametable mirror folded down.

    pub(crate) fn vram_read(&mut self, addr: u16) -> u8 {
        self.vram.read(mirror_vram(addr))
    }

    pub(crate) fn vram_write(&mut self, addr: u16, value: u8) {
        self.vram.write(mirror_vram(addr), value);
    }
}

/// Fold $3000-$3EFF onto $2000-$2EFF and mask to the 14-bit space.
#[inline]
fn mirror_vram(addr: u16) -> u16 {
    let addr = addr & 0x3FFF;
    if (0x3000..0x3F00).contains(&addr) {
        addr - 0x1000
    } else {
        addr
    }
}

/// Palette index for an address in $3F00-$3FFF, applying the
/// $3F10/$3F14/$3F18/$3F1C backdrop mirrors.
#[inline]
pub(crate) fn pal_addr(addr: u16) -> usize {
    let v = addr % 0x20;
    match v {
        0x10 | 0x14 | 0x18 | 0x1C => (v & 0x0C) as usize,
        _ => v as usize,
    }
}
