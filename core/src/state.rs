use crate::constants::{
    FONT_START, KEY_COUNT, LAST_INSTRUCTION, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START,
    REGISTER_COUNT, SPRITE_SHEET, STACK_DEPTH,
};
use crate::display::{FrameBuffer, BLANK_FRAME};
use crate::error::{LoadError, MachineFault};
use crate::quirks::AddressMode;

/// Pressed status of the keys 0..F, written by whatever handles input
pub type Keypad = [bool; KEY_COUNT];

/// Whether the CPU is executing opcodes or blocked on FX0A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// No opcodes are fetched until a key press is written into `register`
    AwaitingKey { register: u8 },
}

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///     - always even and at most 0xFFE, see `program_counter`
///
/// Pointer
/// - (sp) the number of return addresses on the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound)
/// - they are counted down by the host at 60Hz, never by instructions
///
/// ## Memory
/// - 16 entry stack
///     - stores return addresses when subroutines are called
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the hexadecimal font
///     - 0x200.. holds the program
/// - 32x64 frame buffer
///     - stores the contents of the next frame to be drawn
///     - `draw_flag` is raised whenever an instruction touches it
///
/// ## Input
/// - Emulation halts while `run_state` is awaiting a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub run_state: RunState,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font = usize::from(FONT_START);
        memory[font..font + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: BLANK_FRAME,
            draw_flag: false,
            run_state: RunState::Running,
        }
    }

    /// Copies a program into memory starting at `PROGRAM_START`.
    /// Programs that wouldn't fit are rejected and leave memory untouched.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MAX_ROM_SIZE {
            return Err(LoadError::TooLarge {
                size: program.len(),
                max_size: MAX_ROM_SIZE,
            });
        }
        let start = usize::from(PROGRAM_START);
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    pub fn read_byte(&self, address: usize, mode: AddressMode) -> Result<u8, MachineFault> {
        Ok(self.memory[resolve(address, mode)?])
    }

    pub fn write_byte(
        &mut self,
        address: usize,
        value: u8,
        mode: AddressMode,
    ) -> Result<(), MachineFault> {
        self.memory[resolve(address, mode)?] = value;
        Ok(())
    }

    /// Reads the register Vx; only the low nibble of `x` is significant
    pub fn register(&self, x: u8) -> u8 {
        self.v[usize::from(x & 0xF)]
    }

    /// Writes the register Vx; only the low nibble of `x` is significant
    pub fn set_register(&mut self, x: u8, value: u8) {
        self.v[usize::from(x & 0xF)] = value;
    }

    /// The return addresses currently on the stack, oldest first
    pub fn call_stack(&self) -> &[u16] {
        &self.stack[..usize::from(self.sp)]
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an address onto an index into memory
fn resolve(address: usize, mode: AddressMode) -> Result<usize, MachineFault> {
    match mode {
        AddressMode::Wrap => Ok(address % MEMORY_SIZE),
        AddressMode::Strict if address < MEMORY_SIZE => Ok(address),
        AddressMode::Strict => Err(MachineFault::AddressOutOfRange { address }),
    }
}

/// Maps a fetch, skip or jump target onto a program counter that is even and within memory.
/// Wrapping reduces the target modulo the memory size and rounds odd targets down.
pub fn program_counter(target: usize, mode: AddressMode) -> Result<u16, MachineFault> {
    match mode {
        AddressMode::Wrap => Ok((target % MEMORY_SIZE) as u16 & !0x1),
        AddressMode::Strict if target > usize::from(LAST_INSTRUCTION) => {
            Err(MachineFault::AddressOutOfRange { address: target })
        }
        AddressMode::Strict if (target & 0x1) == 0x1 => {
            Err(MachineFault::MisalignedProgramCounter { address: target })
        }
        AddressMode::Strict => Ok(target as u16),
    }
}
