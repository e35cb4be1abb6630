//! Test helpers for building minimal iNES (v1) images.
//!
//! Layout reminder: 16-byte header, optional 512-byte trainer, then PRG
//! in 16 KiB units and CHR in 8 KiB units. Flags 6 carries mirroring,
//! battery, trainer and the mapper's low nibble; flags 7 carries the
//! mapper's high nibble.

#![allow(dead_code)]

/// Zero-filled image: `flags6_low` supplies the low four flag bits
/// (mirroring, battery, trainer, four-screen), the mapper id is spread
/// across both flag bytes.
pub fn build_ines(prg_units: u8, chr_units: u8, mapper: u8, flags6_low: u8) -> Vec<u8> {
    let body = prg_units as usize * 0x4000 + chr_units as usize * 0x2000;
    let mut image = Vec::with_capacity(16 + body);
    image.extend_from_slice(b"NES\x1A");
    image.push(prg_units);
    image.push(chr_units);
    image.push(((mapper & 0x0F) << 4) | (flags6_low & 0x0F));
    image.push(mapper & 0xF0);
    image.extend_from_slice(&[0u8; 8]);
    image.resize(16 + body, 0);
    image
}

/// NROM-128 image carrying `program` at $8000, with the reset, NMI and
/// IRQ vectors all pointing at `reset`.
pub fn build_nrom_program(program: &[u8], reset: u16) -> Vec<u8> {
    assert!(program.len() <= 0x4000 - 6, "program must fit one PRG bank");
    let mut image = build_ines(1, 1, 0, 0);
    image[16..16 + program.len()].copy_from_slice(program);
    for vector in 0..3 {
        let at = 16 + 0x3FFA + vector * 2;
        image[at] = reset as u8;
        image[at + 1] = (reset >> 8) as u8;
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_spreads_the_mapper_across_both_flag_bytes() {
        let image = build_ines(1, 1, 0x47, 0x01);
        assert_eq!(&image[0..4], b"NES\x1A");
        assert_eq!(image[6], 0x71);
        assert_eq!(image[7], 0x40);
        assert_eq!(image.len(), 16 + 0x4000 + 0x2000);
    }

    #[test]
    fn program_image_places_vectors_at_the_bank_top() {
        let image = build_nrom_program(&[0xEA], 0xC123);
        assert_eq!(image[16], 0xEA);
        assert_eq!(image[16 + 0x3FFC], 0x23);
        assert_eq!(image[16 + 0x3FFD], 0xC1);
    }
}
