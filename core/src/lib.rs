pub use chip8::{Chip8, Cycle};
pub use constants::{CLOCK_SPEED, TIMER_SPEED};
pub use display::FrameBuffer;
pub use error::{LoadError, MachineFault};
pub use quirks::{AddressMode, Quirks};
pub use state::{Keypad, RunState, State};

mod chip8;
pub mod constants;
mod display;
mod error;
mod instruction;
pub mod opcode;
mod operations;
mod quirks;
pub mod state;
