use std::io;

use thiserror::Error;

/// An unrecoverable condition raised while executing an instruction.
///
/// The instruction that raised it has no effect; the machine is left exactly as it was before the
/// faulting opcode was fetched, so the host may inspect it, reset it, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MachineFault {
    #[error("stack overflow: subroutine calls nested deeper than the call stack allows")]
    StackOverflow,

    #[error("stack underflow: returned from a subroutine with an empty call stack")]
    StackUnderflow,

    #[error("memory access out of range at {address:#06X}")]
    AddressOutOfRange { address: usize },

    #[error("program counter set to odd address {address:#06X}")]
    MisalignedProgramCounter { address: usize },
}

/// Failure to place a ROM in memory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read ROM: {0}")]
    Io(#[from] io::Error),

    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    TooLarge { size: usize, max_size: usize },
}
