/*!
Cartridge image: iNES (v1) container parsing.

Purpose
- Validate the 16-byte header, slice out PRG ROM and CHR ROM (skipping a
  512-byte trainer when present), and surface mapper id, mirroring and
  PRG RAM size for the mapper layer.
- Load failures abort setup with a typed error; nothing is silently
  defaulted.

NES 2.0 images are detected and rejected. A CHR size of zero means the
board carries CHR RAM instead of ROM; `chr_device` allocates it.
*/

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::bus::{Ram, Rom, SharedDevice, share};
use crate::ppu::Mirroring;

const INES_MAGIC: &[u8; 4] = b"NES\x1A";
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_UNIT: usize = 0x4000;
const CHR_UNIT: usize = 0x2000;
const PRG_RAM_UNIT: usize = 0x2000;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("image too small: header or declared ROM data missing")]
    Truncated,
    #[error("bad iNES header magic")]
    BadMagic,
    #[error("NES 2.0 images are not supported")]
    Nes2Unsupported,
    #[error("unsupported mapper {0}")]
    UnknownMapper(u8),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct Cartridge {
    prg: Vec<u8>,
    /// Empty means the board uses CHR RAM.
    chr: Vec<u8>,
    mapper_id: u8,
    mirroring: Mirroring,
    battery: bool,
    prg_ram_size: usize,
}

impl Cartridge {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated);
        }
        if &data[0..4] != INES_MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        let prg_units = data[4] as usize;
        let chr_units = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];
        let prg_ram_units = data[8] as usize;

        if (flags7 >> 2) & 3 == 2 {
            return Err(CartridgeError::Nes2Unsupported);
        }

        let mapper_id = (flags6 >> 4) | (flags7 & 0xF0);
        let battery = flags6 & 0x02 != 0;
        let has_trainer = flags6 & 0x04 != 0;
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg_start = HEADER_LEN + if has_trainer { TRAINER_LEN } else { 0 };
        let prg_len = prg_units * PRG_UNIT;
        let chr_start = prg_start + prg_len;
        let chr_len = chr_units * CHR_UNIT;
        if data.len() < chr_start + chr_len {
            return Err(CartridgeError::Truncated);
        }

        log::info!(
            "cartridge: {}x16K PRG, {}x8K CHR, mapper {}, {:?} mirroring{}",
            prg_units,
            chr_units,
            mapper_id,
            mirroring,
            if battery { ", battery" } else { "" }
        );

        Ok(Cartridge {
            prg: data[prg_start..prg_start + prg_len].to_vec(),
            chr: data[chr_start..chr_start + chr_len].to_vec(),
            mapper_id,
            mirroring,
            battery,
            // A zero header byte means one 8 KiB unit, per the v1 convention.
            prg_ram_size: prg_ram_units.max(1) * PRG_RAM_UNIT,
        })
    }

    pub fn prg(&self) -> &[u8] {
        &self.prg
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr.is_empty()
    }

    /// Pattern-table device for boards without CHR banking: the CHR ROM,
    /// or fresh CHR RAM when the header declares none.
    pub fn chr_device(&self) -> SharedDevice {
        if self.chr_is_ram() {
            share(Ram::new(CHR_UNIT))
        } else {
            share(Rom::new(self.chr.clone()))
        }
    }

    pub fn mapper_id(&self) -> u8 {
        self.mapper_id
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn battery(&self) -> bool {
        self.battery
    }

    pub fn prg_ram_size(&self) -> usize {
        self.prg_ram_size
    }
}
