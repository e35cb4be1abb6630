/*!
Background fetch pipeline and scroll-counter updates.

Each rendering scanline interleaves an 8-dot fetch cadence with pixel
output: nametable byte at dot 1 (mod 8), attribute byte at 3, low pattern
byte at 5, high pattern byte at 7, and a pipeline store at 0. The pipeline
is a 64-bit register holding 16 pixels worth of 4-bit palette indexes; it
shifts 4 bits per fetch dot and the renderer samples its top half offset
by fine-X.
*/

use crate::ppu::{CTRL_BACKGROUND_TABLE, Ppu};

impl Ppu {
    /// Per-dot work while rendering is enabled: pixel output, fetch
    /// cadence, scroll-counter updates, and sprite evaluation.
    pub(crate) fn render_tick(&mut self) {
        let pre_line = self.scanline == 261;
        let visible_line = self.scanline < 240;
        let render_line = pre_line || visible_line;
        let pre_fetch = (321..=336).contains(&self.dot);
        let visible_dot = (1..=256).contains(&self.dot);
        let fetch_dot = pre_fetch || visible_dot;

        if visible_line && visible_dot {
            self.render_pixel();
        }

        if render_line && fetch_dot {
            self.tile_data <<= 4;
            match self.dot & 7 {
                1 => self.fetch_nametable_byte(),
                3 => self.fetch_attribute_byte(),
                5 => self.fetch_low_tile_byte(),
                7 => self.fetch_high_tile_byte(),
                0 => self.store_tile_data(),
                _ => {}
            }
        }

        if pre_line && (280..=304).contains(&self.dot) {
            self.copy_y();
        }

        if render_line {
            if fetch_dot && self.dot % 8 == 0 {
                self.increment_x();
            }
            if self.dot == 256 {
                self.increment_y();
            }
            if self.dot == 257 {
                self.copy_x();
            }
        }

        if self.dot == 257 {
            if visible_line {
                self.evaluate_sprites();
            } else {
                self.sprite_count = 0;
            }
        }
    }

    fn fetch_nametable_byte(&mut self) {
        let addr = 0x2000 | (self.v & 0x0FFF);
        self.nt_byte = self.vram_read(addr);
    }

    fn fetch_attribute_byte(&mut self) {
        let v = self.v;
        let addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
        let shift = ((v >> 4) & 4) | (v & 2);
        self.at_byte = ((self.vram_read(addr) >> shift) & 3) << 2;
    }

    fn tile_address(&self) -> u16 {
        let fine_y = (self.v >> 12) & 7;
        let table: u16 = if self.ctrl_flag(CTRL_BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        };
        table | ((self.nt_byte as u16) << 4) | fine_y
    }

    fn fetch_low_tile_byte(&mut self) {
        let addr = self.tile_address();
        self.low_tile = self.vram_read(addr);
    }

    fn fetch_high_tile_byte(&mut self) {
        let addr = self.tile_address() + 8;
        self.high_tile = self.vram_read(addr);
    }

    /// Pack the fetched tile row into the low 32 bits of the pipeline,
    /// one 4-bit palette index per pixel, leftmost pixel in the top nibble.
    fn store_tile_data(&mut self) {
        let mut data: u32 = 0;
        let a = self.at_byte;
        let mut low = self.low_tile;
        let mut high = self.high_tile;
        for _ in 0..8 {
            let p1 = (low & 0x80) >> 7;
            let p2 = (high & 0x80) >> 6;
            low <<= 1;
            high <<= 1;
            data = (data << 4) | (a | p1 | p2) as u32;
        }
        self.tile_data |= data as u64;
    }

    // Loopy counter updates. V packs coarse-X(5) / coarse-Y(5) /
    // nametable(2) / fine-Y(3).

    fn increment_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= 0xFFE0;
            self.v ^= 0x0400; // wrap into the adjacent horizontal nametable
        } else {
            self.v += 1;
        }
    }

    pub(crate) fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000; // fine Y
        } else {
            self.v &= 0x8FFF;
            let mut y = (self.v & 0x03E0) >> 5;
            if y == 29 {
                y = 0;
                self.v ^= 0x0800; // row 29 wraps into the next nametable
            } else if y == 31 {
                y = 0; // row 31 wraps without the nametable toggle
            } else {
                y += 1;
            }
            self.v = (self.v & 0xFC1F) | (y << 5);
        }
    }

    fn copy_x(&mut self) {
        // v: .....F.. ...EDCBA = t: .....F.. ...EDCBA
        self.v = (self.v & 0xFBE0) | (self.t & 0x041F);
    }

    fn copy_y(&mut self) {
        // v: .IHGF.ED CBA..... = t: .IHGF.ED CBA.....
        self.v = (self.v & 0x841F) | (self.t & 0x7BE0);
    }
}
