mod joypad;
mod memory;
mod timer;
mod video;

pub use joypad::{key_map, Keypad, KEY_COUNT, KEY_MAP};
pub use memory::{glyph_addr, Memory, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START};
pub use timer::Timers;
pub use video::{Frame, Video, PACKED_SIZE, PIXEL_OFF, PIXEL_ON, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Everything the CPU reads and writes besides its own registers.
#[derive(Clone, Default)]
pub struct Peripherals {
    pub(crate) memory: Memory,
    pub(crate) video: Video,
    pub(crate) timers: Timers,
    pub(crate) keypad: Keypad,
}

impl Peripherals {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    pub(crate) fn read_u16(&self, addr: u16) -> u16 {
        self.memory.read_u16(addr)
    }

    pub(crate) fn write(&mut self, addr: u16, val: u8) {
        self.memory.write(addr, val)
    }

    /// Draw `height` sprite rows starting at memory address `addr`.
    pub(crate) fn draw_sprite(&mut self, x: u8, y: u8, addr: u16, height: u8) -> bool {
        let mut rows = [0u8; 15];
        let rows = &mut rows[..height as usize];

        for (offset, row) in rows.iter_mut().enumerate() {
            *row = self.memory.read(addr.wrapping_add(offset as u16));
        }

        self.video.draw(x, y, rows)
    }
}
