use crate::error::RomLoadError;

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
pub const FONT_START: u16 = 0x000;
pub const GLYPH_BYTES: u16 = 5;

/// Largest ROM that fits between `PROGRAM_START` and the end of memory.
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

const ADDR_MASK: u16 = (MEMORY_SIZE - 1) as u16;

const FONT: [u8; 16 * GLYPH_BYTES as usize] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Address of the 5-byte glyph for the low nibble of `digit`.
pub fn glyph_addr(digit: u8) -> u16 {
    FONT_START + (digit & 0x0f) as u16 * GLYPH_BYTES
}

/// The 4 KiB address space.
///
/// Addresses are 12 bit. Anything above 0xfff wraps around instead of
/// faulting, so an I register pushed past the end by `FX1E` reads from the
/// start of memory again.
#[derive(Clone)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = Box::new([0u8; MEMORY_SIZE]);

        let font_start = FONT_START as usize;
        bytes[font_start..font_start + FONT.len()].copy_from_slice(&FONT);

        Self { bytes }
    }

    pub fn load(&mut self, rom: &[u8]) -> Result<(), RomLoadError> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(RomLoadError::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.bytes[start..start + rom.len()].copy_from_slice(rom);

        Ok(())
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    pub fn read_u16(&self, addr: u16) -> u16 {
        let high = self.read(addr);
        let low = self.read(addr.wrapping_add(1));
        u16::from_be_bytes([high, low])
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = val;
    }

    pub(crate) fn as_bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.bytes
    }

    pub(crate) fn from_bytes(bytes: [u8; MEMORY_SIZE]) -> Self {
        Self {
            bytes: Box::new(bytes),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
