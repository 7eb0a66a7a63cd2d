/// # Quirks
/// Interpreters written after the COSMAC VIP changed the behavior of a handful of instructions,
/// and ROMs were written against one behavior or the other. Each field selects one side.
///
/// - `shift_reads_vy` 8XY6/8XYE shift Vy into Vx instead of shifting Vx in place
/// - `jump_offset_uses_vx` BNNN jumps to NNN + Vx instead of NNN + V0
/// - `clip_sprites` DXYN drops pixels past the screen edge instead of wrapping them around
/// - `load_store_advances_index` FX55/FX65 leave I pointing past the last byte they touched
/// - `address_mode` what happens when an address falls outside of memory
///
/// Most ROMs found today expect `Quirks::MODERN`. Programs written for the original hardware
/// (many of the 1970s games) expect `Quirks::COSMAC_VIP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub shift_reads_vy: bool,
    pub jump_offset_uses_vx: bool,
    pub clip_sprites: bool,
    pub load_store_advances_index: bool,
    pub address_mode: AddressMode,
}

/// How addresses outside of memory are treated.
/// This applies to instruction fetches as well as to reads and writes relative to I.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Addresses wrap around modulo the memory size, as the original hardware did
    Wrap,
    /// Addresses outside of memory raise `MachineFault::AddressOutOfRange`
    Strict,
}

impl Quirks {
    pub const MODERN: Quirks = Quirks {
        shift_reads_vy: false,
        jump_offset_uses_vx: false,
        clip_sprites: false,
        load_store_advances_index: false,
        address_mode: AddressMode::Wrap,
    };

    pub const COSMAC_VIP: Quirks = Quirks {
        shift_reads_vy: true,
        jump_offset_uses_vx: false,
        clip_sprites: true,
        load_store_advances_index: true,
        address_mode: AddressMode::Wrap,
    };
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::MODERN
    }
}
