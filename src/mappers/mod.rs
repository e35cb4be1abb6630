//! Board implementations, one module per iNES mapper id.

pub mod mmc1;
pub mod nrom;
