/*!
Per-dot pixel composition.

Combines the background pipeline sample with the first opaque sprite
pixel under the documented priority rules, resolves the palette entry,
and paints the back buffer. Sprite zero overlapping an opaque background
pixel before column 255 raises the sprite-zero-hit status bit.
*/

use crate::ppu::palette::NES_PALETTE;
use crate::ppu::{MASK_SHOW_BG, MASK_SHOW_LEFT_BG, MASK_SHOW_LEFT_SPRITES, Ppu, STATUS_SPRITE_ZERO};

impl Ppu {
    pub(crate) fn render_pixel(&mut self) {
        let x = (self.dot - 1) as usize;
        let y = self.scanline as usize;

        let mut background = self.background_pixel();
        let (slot, mut sprite) = self.sprite_pixel();
        if x < 8 && !self.mask_flag(MASK_SHOW_LEFT_BG) {
            background = 0;
        }
        if x < 8 && !self.mask_flag(MASK_SHOW_LEFT_SPRITES) {
            sprite = 0;
        }

        let bg_opaque = background % 4 != 0;
        let sp_opaque = sprite % 4 != 0;
        let color = match (bg_opaque, sp_opaque) {
            (false, false) => 0, // backdrop
            (false, true) => sprite | 0x10,
            (true, false) => background,
            (true, true) => {
                if self.sprite_indexes[slot] == 0 && x < 255 {
                    self.status |= STATUS_SPRITE_ZERO;
                }
                if self.sprite_priorities[slot] == 0 {
                    sprite | 0x10
                } else {
                    background
                }
            }
        };

        let entry = self.read_palette(color as u16) as usize % 64;
        self.frames.back_mut().put_pixel(x, y, NES_PALETTE[entry]);
    }

    /// 4-bit palette index from the top half of the pipeline, offset by
    /// fine-X.
    pub(crate) fn background_pixel(&self) -> u8 {
        if !self.mask_flag(MASK_SHOW_BG) {
            return 0;
        }
        let data = (self.tile_data >> 32) as u32;
        ((data >> ((7 - self.x) * 4)) & 0x0F) as u8
    }

    /// Palette lookup for rendering: sprite backdrop entries mirror the
    /// background ones.
    pub(crate) fn read_palette(&self, mut address: u16) -> u8 {
        if address >= 16 && address % 4 == 0 {
            address -= 16;
        }
        self.palette[address as usize]
    }
}
