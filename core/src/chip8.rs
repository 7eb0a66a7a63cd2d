use std::io::Read;

use log::{debug, error, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{KEY_COUNT, MAX_ROM_SIZE};
use crate::display::FrameBuffer;
use crate::error::{LoadError, MachineFault};
use crate::instruction::decode;
use crate::operations::Context;
use crate::quirks::Quirks;
use crate::state::{program_counter, Keypad, RunState, State};

/// What a call to `Chip8::execute_cycle` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// The opcode was executed
    Executed(u16),
    /// The opcode isn't part of the instruction set; only the program counter moved
    Unrecognized(u16),
    /// Execution is suspended until a key press is written into the register
    AwaitingKey(u8),
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - `keypad` with public interfaces for manipulating it
///  - `quirks` selecting which interpretation of ambiguous instructions to follow
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys, and resolving waits for a key press
/// - advancing the CPU by one instruction
/// - advancing its timers
/// - inspecting its frame buffer for rendering by some display
///
/// Nothing here reads the clock: the host decides how often to call `execute_cycle` and calls
/// `timer_tick` at 60Hz.
pub struct Chip8 {
    state: State,
    keypad: Keypad,
    quirks: Quirks,
    rng: StdRng,
    unrecognized: u64,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        Self::with_rng(quirks, StdRng::from_entropy())
    }

    /// A machine whose random numbers are reproducible across runs
    pub fn with_seed(quirks: Quirks, seed: u64) -> Self {
        Self::with_rng(quirks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(quirks: Quirks, rng: StdRng) -> Self {
        Chip8 {
            state: State::new(),
            keypad: [false; KEY_COUNT],
            quirks,
            rng,
            unrecognized: 0,
        }
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    ///
    /// Returns the size of the ROM in bytes.
    /// Reading stops one byte past the largest ROM that fits, so an oversized source is rejected
    /// without being read in full.
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<usize, LoadError> {
        let mut rom = Vec::new();
        reader.take(MAX_ROM_SIZE as u64 + 1).read_to_end(&mut rom)?;
        self.load_program(&rom)?;
        Ok(rom.len())
    }

    /// Copies a program into memory at 0x200
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.state.load_program(program)?;
        debug!("loaded {} byte program", program.len());
        Ok(())
    }

    /// Advances the CPU by a single cycle
    /// - does nothing while awaiting a keypress
    /// - fetches the opcode at pc and moves pc past it
    /// - executes the opcode, or skips it if it isn't part of the instruction set
    ///
    /// On a fault the state is left as it was before the fetch.
    pub fn execute_cycle(&mut self) -> Result<Cycle, MachineFault> {
        if let RunState::AwaitingKey { register } = self.state.run_state {
            return Ok(Cycle::AwaitingKey(register));
        }

        let pc = self.state.pc;
        let op = self.get_op()?;
        let next_pc = match program_counter(usize::from(pc) + 0x2, self.quirks.address_mode) {
            Ok(next_pc) => next_pc,
            Err(fault) => {
                error!("{} (fetching past {:04X})", fault, pc);
                return Err(fault);
            }
        };
        trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            op,
            self.state.v,
            self.state.i,
            pc
        );

        let operation = match decode(op) {
            Some(operation) => operation,
            None => {
                self.unrecognized += 1;
                warn!("unrecognized opcode {:04X} at {:04X}", op, pc);
                self.state.pc = next_pc;
                return Ok(Cycle::Unrecognized(op));
            }
        };

        let fetched = State {
            pc: next_pc,
            ..self.state
        };
        let mut ctx = Context {
            keypad: &self.keypad,
            quirks: &self.quirks,
            rng: &mut self.rng,
        };
        match operation(op, &fetched, &mut ctx) {
            Ok(next) => self.state = next,
            Err(fault) => {
                error!("{} (opcode {:04X} at {:04X})", fault, op, pc);
                return Err(fault);
            }
        }

        match self.state.run_state {
            RunState::AwaitingKey { register } => {
                debug!("awaiting key press for v{:X}", register);
                Ok(Cycle::AwaitingKey(register))
            }
            RunState::Running => Ok(Cycle::Executed(op)),
        }
    }

    /// Handles the 60Hz timers
    /// - decrements the delay timer if it is running
    /// - decrements the sound timer if it is running
    ///
    /// Returns true when this tick stopped the sound timer, which is when any tone should stop
    pub fn timer_tick(&mut self) -> bool {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);

        if self.state.sound_timer > 0 {
            self.state.sound_timer -= 1;
            self.state.sound_timer == 0
        } else {
            false
        }
    }

    /// Ends a wait started by FX0A if any key in `keypad` is down.
    /// The lowest numbered key wins and is written into the waiting register.
    ///
    /// Returns the key that ended the wait
    pub fn resolve_key_wait(&mut self, keypad: &Keypad) -> Option<u8> {
        let register = match self.state.run_state {
            RunState::AwaitingKey { register } => register,
            RunState::Running => return None,
        };
        let key = keypad.iter().position(|&down| down)? as u8;
        self.state.set_register(register, key);
        self.state.run_state = RunState::Running;
        debug!("key {:X} written to v{:X}", key, register);
        Some(key)
    }

    /// Replace the pressed status of every key
    pub fn set_keypad(&mut self, keypad: Keypad) {
        self.keypad = keypad;
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.keypad[usize::from(key & 0xF)] = true;
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        self.keypad[usize::from(key & 0xF)] = false;
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Returns the FrameBuffer if the display should be redrawn
    pub fn get_frame(&self) -> Option<&FrameBuffer> {
        if self.state.draw_flag {
            Some(&self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.state.draw_flag
    }

    /// Called by the display once it has drawn the current frame
    pub fn mark_clean(&mut self) {
        self.state.draw_flag = false;
    }

    /// Whether a tone should be playing
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state
    }

    pub fn read_byte(&self, address: u16) -> Result<u8, MachineFault> {
        self.state
            .read_byte(usize::from(address), self.quirks.address_mode)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MachineFault> {
        self.state
            .write_byte(usize::from(address), value, self.quirks.address_mode)
    }

    pub fn register(&self, x: u8) -> u8 {
        self.state.register(x)
    }

    pub fn set_register(&mut self, x: u8, value: u8) {
        self.state.set_register(x, value);
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }

    /// How many opcodes outside of the instruction set have been skipped so far
    pub fn unrecognized_opcodes(&self) -> u64 {
        self.unrecognized
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    fn get_op(&self) -> Result<u16, MachineFault> {
        let pc = usize::from(self.state.pc);
        let mode = self.quirks.address_mode;
        let left = u16::from(self.state.read_byte(pc, mode)?);
        let right = u16::from(self.state.read_byte(pc + 1, mode)?);
        Ok(left << 8 | right)
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
