/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// ROMs are loaded into memory starting here, and the program counter starts here
pub const PROGRAM_START: u16 = 0x200;

/// The highest address an instruction can start at
pub const LAST_INSTRUCTION: u16 = (MEMORY_SIZE - 2) as u16;

/// The largest ROM that fits between `PROGRAM_START` and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// The built in font lives at the very start of memory
pub const FONT_START: u16 = 0x000;

/// Each font glyph is 5 rows of 8 pixels
pub const FONT_GLYPH_SIZE: u16 = 5;

pub const REGISTER_COUNT: usize = 16;

/// Subroutine calls nest at most this deep
pub const STACK_DEPTH: usize = 16;

pub const KEY_COUNT: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Default instruction rate in Hz
pub const CLOCK_SPEED: u32 = 500;

/// Delay and sound timers always count down at 60Hz, independent of `CLOCK_SPEED`
pub const TIMER_SPEED: u32 = 60;

/// # Sprite Sheet
/// Hexadecimal digits 0..F, each 4 pixels wide and 5 pixels tall.
/// Only the high nibble of each byte is drawn.
/// ```text
/// 0xF0 ████
/// 0x90 █  █
/// 0x90 █  █
/// 0x90 █  █
/// 0xF0 ████
/// ```
#[rustfmt::skip]
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
