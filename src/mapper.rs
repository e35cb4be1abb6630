/*!
Mapper registry.

A mapper is whatever the board puts between the buses and the cartridge:
the attach function installs its handlers on the CPU bus and the video
bus, and bank-switching boards keep their state inside the installed
device. The registry maps iNES mapper ids to attach functions; callers
construct a registry explicitly (no global table) so tests and frontends
can register their own boards.
*/

use std::collections::BTreeMap;

use crate::bus::Bus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::ppu::SharedPpu;

/// Installs a board's handlers for `cartridge` onto the two buses.
pub type MapperAttach = fn(&Cartridge, &Bus, &SharedPpu) -> Result<(), CartridgeError>;

pub struct MapperRegistry {
    boards: BTreeMap<u8, MapperAttach>,
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl MapperRegistry {
    /// Empty registry, for callers supplying their own boards.
    pub fn new() -> Self {
        MapperRegistry {
            boards: BTreeMap::new(),
        }
    }

    /// Registry with the built-in boards: NROM (0) and MMC1 (1).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(0, crate::mappers::nrom::attach);
        registry.register(1, crate::mappers::mmc1::attach);
        registry
    }

    /// Register or replace the board for `id`.
    pub fn register(&mut self, id: u8, attach: MapperAttach) {
        self.boards.insert(id, attach);
    }

    pub fn supports(&self, id: u8) -> bool {
        self.boards.contains_key(&id)
    }

    /// Wire `cartridge` into the CPU and video buses and apply the
    /// header's mirroring (boards with mirroring control override it
    /// later through their own registers).
    pub fn attach(
        &self,
        cartridge: &Cartridge,
        cpu_bus: &Bus,
        ppu: &SharedPpu,
    ) -> Result<(), CartridgeError> {
        let attach = self
            .boards
            .get(&cartridge.mapper_id())
            .ok_or(CartridgeError::UnknownMapper(cartridge.mapper_id()))?;
        attach(cartridge, cpu_bus, ppu)?;
        ppu.borrow_mut().set_mirroring(cartridge.mirroring());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::cpu::CpuSignals;
    use crate::ppu::Ppu;
    use crate::test_utils::build_ines;

    #[test]
    fn unknown_mapper_is_rejected() {
        let image = build_ines(1, 1, 7, 0);
        let cart = Cartridge::from_bytes(&image).unwrap();
        let bus = Bus::new();
        let ppu = Rc::new(RefCell::new(Ppu::new(CpuSignals::new())));
        let registry = MapperRegistry::with_builtins();
        assert!(matches!(
            registry.attach(&cart, &bus, &ppu),
            Err(CartridgeError::UnknownMapper(7))
        ));
    }

    #[test]
    fn custom_boards_can_be_registered() {
        fn no_op(_: &Cartridge, _: &Bus, _: &SharedPpu) -> Result<(), CartridgeError> {
            Ok(())
        }
        let mut registry = MapperRegistry::new();
        assert!(!registry.supports(7));
        registry.register(7, no_op);
        assert!(registry.supports(7));
    }
}
