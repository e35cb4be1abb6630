/*!
Sprite evaluation and pattern pre-fetch.

At dot 257 of every visible scanline all 64 OAM entries are scanned; up to
8 whose vertical span covers the next row are latched with their pattern
rows pre-decoded into 8 pixels of 4-bit palette indexes, honoring the
flip bits and the 8x16 tile-pair layout. More than 8 matches raises the
sprite-overflow status bit.
*/

use crate::ppu::{CTRL_SPRITE_SIZE, CTRL_SPRITE_TABLE, MASK_SHOW_SPRITES, Ppu, STATUS_OVERFLOW};

impl Ppu {
    pub(crate) fn evaluate_sprites(&mut self) {
        let height: i32 = if self.ctrl_flag(CTRL_SPRITE_SIZE) { 16 } else { 8 };
        let mut count = 0usize;
        for i in 0..64 {
            let y = self.oam[i * 4];
            let attributes = self.oam[i * 4 + 2];
            let x = self.oam[i * 4 + 3];
            let row = self.scanline as i32 - y as i32;
            if row < 0 || row >= height {
                continue;
            }
            if count < 8 {
                self.sprite_patterns[count] = self.fetch_sprite_pattern(i, row as u16);
                self.sprite_positions[count] = x;
                self.sprite_priorities[count] = (attributes >> 5) & 1;
                self.sprite_indexes[count] = i as u8;
            }
            count += 1;
        }
        if count > 8 {
            count = 8;
            self.status |= STATUS_OVERFLOW;
        }
        self.sprite_count = count;
    }

    /// Decode one pattern row into 8 pixels of 4-bit palette indexes,
    /// leftmost pixel in the top nibble.
    fn fetch_sprite_pattern(&mut self, i: usize, mut row: u16) -> u32 {
        let mut tile = self.oam[i * 4 + 1];
        let attributes = self.oam[i * 4 + 2];

        let address = if !self.ctrl_flag(CTRL_SPRITE_SIZE) {
            if attributes & 0x80 != 0 {
                row = 7 - row;
            }
            let table: u16 = if self.ctrl_flag(CTRL_SPRITE_TABLE) {
                0x1000
            } else {
                0x0000
            };
            table + (tile as u16) * 16 + row
        } else {
            // 8x16: bit 0 of the tile index selects the pattern table,
            // the pair occupies two consecutive tiles.
            if attributes & 0x80 != 0 {
                row = 15 - row;
            }
            let table = (tile & 1) as u16;
            tile &= 0xFE;
            if row > 7 {
                tile += 1;
                row -= 8;
            }
            (table << 12) | ((tile as u16) << 4) | row
        };

        let a = (attributes & 3) << 2;
        let mut low = self.vram_read(address);
        let mut high = self.vram_read(address + 8);
        let mut data: u32 = 0;
        for _ in 0..8 {
            let (p1, p2);
            if attributes & 0x40 != 0 {
                // horizontal flip: consume from the right edge
                p1 = low & 1;
                p2 = (high & 1) << 1;
                low >>= 1;
                high >>= 1;
            } else {
                p1 = (low & 0x80) >> 7;
                p2 = (high & 0x80) >> 6;
                low <<= 1;
                high <<= 1;
            }
            data = (data << 4) | (a | p1 | p2) as u32;
        }
        data
    }

    /// First opaque sprite pixel at the current dot, as (slot, color).
    pub(crate) fn sprite_pixel(&self) -> (usize, u8) {
        if !self.mask_flag(MASK_SHOW_SPRITES) {
            return (0, 0);
        }
        for i in 0..self.sprite_count {
            let offset = (self.dot as i32 - 1) - self.sprite_positions[i] as i32;
            if !(0..=7).contains(&offset) {
                continue;
            }
            let shift = (7 - offset) * 4;
            let color = ((self.sprite_patterns[i] >> shift) & 0x0F) as u8;
            if color % 4 == 0 {
                continue;
            }
            return (i, color);
        }
        (0, 0)
    }
}
