use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomLoadError {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },
}

/// Execution faults.
///
/// A fault halts the machine. Every later `step()` returns the same value
/// until the machine is reset or a snapshot is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("invalid opcode {opcode:#06x} at {addr:#05x}")]
    InvalidOpcode { opcode: u16, addr: u16 },

    #[error("stack overflow: call at {addr:#05x} with all 16 return slots in use")]
    StackOverflow { addr: u16 },

    #[error("stack underflow: return at {addr:#05x} with an empty call stack")]
    StackUnderflow { addr: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("expected exactly 16 key states, got {len}")]
    WrongLength { len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptState {
    #[error("snapshot is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("snapshot layout version {version} is not supported")]
    UnsupportedVersion { version: u8 },
}
