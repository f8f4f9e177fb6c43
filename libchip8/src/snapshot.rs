//! Fixed-layout machine snapshots.
//!
//! Layout version 2, all multi-byte values big-endian:
//!
//! | offset | size | field                                            |
//! |-------:|-----:|--------------------------------------------------|
//! |      0 |    1 | layout version                                   |
//! |      1 | 4096 | memory                                           |
//! |   4097 |   16 | V0..VF                                           |
//! |   4113 |    2 | I                                                |
//! |   4115 |    2 | PC                                               |
//! |   4117 |   32 | 16 return-stack slots                            |
//! |   4149 |    1 | SP                                               |
//! |   4150 |    1 | delay timer                                      |
//! |   4151 |    1 | sound timer                                      |
//! |   4152 |  256 | display, 8 pixels per byte, leftmost in bit 0    |
//! |   4408 |    2 | keypad latch, bit k = key k                      |
//! |   4410 |   32 | `CXNN` random stream key                         |
//! |   4442 |   16 | words drawn from the random stream               |

use crate::cpu::{Registers, RngState, Stack, STACK_SIZE};
use crate::error::CorruptState;
use crate::peripherals::{Keypad, Memory, Timers, Video, MEMORY_SIZE, PACKED_SIZE};

pub const SNAPSHOT_VERSION: u8 = 2;

pub const SNAPSHOT_SIZE: usize =
    1 + MEMORY_SIZE + 16 + 2 + 2 + STACK_SIZE * 2 + 1 + 1 + 1 + PACKED_SIZE + 2 + 32 + 16;

pub(crate) struct Snapshot {
    pub memory: Memory,
    pub registers: Registers,
    pub stack: Stack,
    pub timers: Timers,
    pub video: Video,
    pub keypad: Keypad,
    pub rng: RngState,
}

impl Snapshot {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SNAPSHOT_SIZE);

        out.push(SNAPSHOT_VERSION);
        out.extend_from_slice(self.memory.as_bytes());
        out.extend_from_slice(&self.registers.v);
        out.extend_from_slice(&self.registers.i.to_be_bytes());
        out.extend_from_slice(&self.registers.pc.to_be_bytes());
        for slot in self.stack.slots {
            out.extend_from_slice(&slot.to_be_bytes());
        }
        out.push(self.stack.sp);
        out.push(self.timers.delay());
        out.push(self.timers.sound());
        out.extend_from_slice(&self.video.to_packed());
        out.extend_from_slice(&self.keypad.to_bits().to_be_bytes());
        out.extend_from_slice(&self.rng.seed);
        out.extend_from_slice(&self.rng.word_pos.to_be_bytes());

        out
    }

    /// Parse a complete snapshot. Nothing is applied anywhere, so a rejected
    /// blob cannot leave a machine half restored.
    pub fn decode(bytes: &[u8]) -> Result<Self, CorruptState> {
        if bytes.len() != SNAPSHOT_SIZE {
            return Err(CorruptState::SizeMismatch {
                expected: SNAPSHOT_SIZE,
                actual: bytes.len(),
            });
        }

        let mut reader = Reader::new(bytes);

        let version = reader.read_u8();
        if version != SNAPSHOT_VERSION {
            return Err(CorruptState::UnsupportedVersion { version });
        }

        let memory = Memory::from_bytes(reader.read_array());
        let registers = Registers {
            v: reader.read_array(),
            i: reader.read_u16(),
            pc: reader.read_u16(),
        };
        let slots = std::array::from_fn(|_| reader.read_u16());
        let stack = Stack {
            slots,
            sp: reader.read_u8(),
        };
        let timers = Timers::from_raw(reader.read_u8(), reader.read_u8());
        let video = Video::from_packed(&reader.read_array());
        let keypad = Keypad::from_bits(reader.read_u16());
        let rng = RngState {
            seed: reader.read_array(),
            word_pos: u128::from_be_bytes(reader.read_array()),
        };

        Ok(Self {
            memory,
            registers,
            stack,
            timers,
            video,
            keypad,
            rng,
        })
    }
}

/// Sequential reader over a blob whose length has already been checked.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn read_u8(&mut self) -> u8 {
        let [val] = self.read_array();
        val
    }

    fn read_u16(&mut self) -> u16 {
        u16::from_be_bytes(self.read_array())
    }
}
