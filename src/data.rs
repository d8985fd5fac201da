//! Static boot ROM payloads and the [`BootRom`] enumeration used to pick
//! between them.

use crate::gb::GameBoyMode;

/// Identifies which boot ROM image (if any) is currently loaded into the
/// bottom of the cartridge address space.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BootRom {
    /// Original DMG boot ROM.
    Dmg,

    /// Super Game Boy boot ROM, DMG compatible at the instruction level.
    Sgb,

    /// Open source DMG-compatible boot ROM replacement.
    DmgBootix,

    /// Open source MGB-compatible boot ROM replacement.
    MgbBootix,

    /// Original CGB boot ROM.
    Cgb,

    /// Locally built CGB-compatible boot ROM replacement, used when no
    /// original dump is available.
    CgbCustom,

    /// A boot ROM loaded from an arbitrary file path, contents unknown
    /// to this enum.
    Other,

    /// No boot ROM loaded, execution starts straight at the post-boot
    /// CPU/PPU register state.
    #[default]
    None,
}

impl BootRom {
    pub fn description(&self) -> &'static str {
        match self {
            BootRom::Dmg => "DMG",
            BootRom::Sgb => "SGB",
            BootRom::DmgBootix => "DMG Bootix",
            BootRom::MgbBootix => "MGB Bootix",
            BootRom::Cgb => "CGB",
            BootRom::CgbCustom => "CGB Custom",
            BootRom::Other => "Other",
            BootRom::None => "None",
        }
    }

    /// Whether this boot ROM is meant to run on a DMG-mode machine.
    pub fn is_dmg_compat(&self) -> bool {
        matches!(
            self,
            BootRom::Dmg | BootRom::Sgb | BootRom::DmgBootix | BootRom::MgbBootix | BootRom::Other
        )
    }

    /// Whether this boot ROM is meant to run on a CGB-mode machine.
    pub fn is_cgb_compat(&self) -> bool {
        matches!(self, BootRom::Cgb | BootRom::CgbCustom | BootRom::Other)
    }

    /// Given the mode the machine is about to run in, returns the boot
    /// ROM that should be reused, falling back to a mode-appropriate
    /// default when the current selection doesn't apply.
    pub fn reusable(&self, mode: GameBoyMode) -> Option<BootRom> {
        let compatible = match mode {
            GameBoyMode::Cgb => self.is_cgb_compat(),
            _ => self.is_dmg_compat(),
        };
        if compatible && *self != BootRom::None {
            Some(*self)
        } else {
            None
        }
    }
}

/// Size in bytes of a DMG-family boot ROM (original or Bootix replacement).
pub const BOOT_DMG_SIZE: usize = 256;

/// Size in bytes of a CGB-family boot ROM.
pub const BOOT_CGB_SIZE: usize = 2304;

/// Original DMG boot ROM.
///
/// Placeholder payload: the real Nintendo dump is not distributed with
/// this crate for licensing reasons, load one at runtime with
/// [`crate::gb::GameBoy::load_boot_file`] instead of relying on this array.
pub static DMG_BOOT: [u8; BOOT_DMG_SIZE] = [0x00; BOOT_DMG_SIZE];

/// Original Super Game Boy boot ROM. Placeholder, see [`DMG_BOOT`].
pub static SGB_BOOT: [u8; BOOT_DMG_SIZE] = [0x00; BOOT_DMG_SIZE];

/// Open source DMG-compatible boot ROM replacement. Placeholder, see
/// [`DMG_BOOT`].
pub static DMG_BOOTIX: [u8; BOOT_DMG_SIZE] = [0x00; BOOT_DMG_SIZE];

/// Open source MGB-compatible boot ROM replacement. Placeholder, see
/// [`DMG_BOOT`].
pub static MGB_BOOTIX: [u8; BOOT_DMG_SIZE] = [0x00; BOOT_DMG_SIZE];

/// Original CGB boot ROM. Placeholder, see [`DMG_BOOT`].
pub static CGB_BOOT: [u8; BOOT_CGB_SIZE] = [0x00; BOOT_CGB_SIZE];

/// Locally assembled CGB-compatible boot ROM replacement. Placeholder,
/// see [`DMG_BOOT`].
pub static CGB_CUSTOM: [u8; BOOT_CGB_SIZE] = [0x00; BOOT_CGB_SIZE];

#[cfg(test)]
mod tests {
    use super::BootRom;
    use crate::gb::GameBoyMode;

    #[test]
    fn test_compat() {
        assert!(BootRom::Dmg.is_dmg_compat());
        assert!(!BootRom::Dmg.is_cgb_compat());
        assert!(BootRom::Cgb.is_cgb_compat());
        assert!(!BootRom::Cgb.is_dmg_compat());
        assert!(BootRom::Other.is_dmg_compat());
        assert!(BootRom::Other.is_cgb_compat());
    }

    #[test]
    fn test_reusable() {
        assert_eq!(
            BootRom::DmgBootix.reusable(GameBoyMode::Dmg),
            Some(BootRom::DmgBootix)
        );
        assert_eq!(BootRom::DmgBootix.reusable(GameBoyMode::Cgb), None);
        assert_eq!(BootRom::None.reusable(GameBoyMode::Dmg), None);
    }
}
