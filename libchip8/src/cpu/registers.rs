use super::decoder::Register;
use crate::peripherals::PROGRAM_START;

pub const STACK_SIZE: usize = 16;

/// V0..VF, I and the program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
        }
    }

    pub fn read(&self, register: Register) -> u8 {
        self.v[register.index()]
    }

    pub fn write(&mut self, register: Register, value: u8) {
        self.v[register.index()] = value;
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.write(Register::VF, flag as u8);
    }

    pub fn add_to_index(&mut self, value: u8) {
        self.i = self.i.wrapping_add(value as u16);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Return-address stack. `sp` is the number of occupied slots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stack {
    pub slots: [u16; STACK_SIZE],
    pub sp: u8,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false without touching anything if all slots are in use.
    #[must_use]
    pub fn push(&mut self, addr: u16) -> bool {
        let Some(slot) = self.slots.get_mut(self.sp as usize) else {
            return false;
        };

        *slot = addr;
        self.sp += 1;
        true
    }

    pub fn pop(&mut self) -> Option<u16> {
        let sp = self.sp.checked_sub(1)?;
        let addr = *self.slots.get(sp as usize)?;
        self.sp = sp;
        Some(addr)
    }
}
