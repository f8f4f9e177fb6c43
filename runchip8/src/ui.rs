use std::time::Duration;

use libchip8::{KEY_COUNT, SCREEN_HEIGHT, SCREEN_WIDTH};
pub(super) use minifb::Key;
use minifb::{Scale, ScaleMode, Window, WindowOptions};

const PALETTE: [u32; 2] = [0x00_10_10_10, 0x00_e8_e8_e8];

pub struct Ui {
    buffer: Box<[u32]>,
    window: Window,
}

impl Ui {
    pub fn new(title: &str) -> minifb::Result<Self> {
        let buffer = vec![0; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice();

        let options = WindowOptions {
            resize: true,
            scale: Scale::X16,
            scale_mode: ScaleMode::AspectRatioStretch,
            ..WindowOptions::default()
        };

        let title = format!("{title} - ESC to exit");
        let mut window = Window::new(&title, SCREEN_WIDTH, SCREEN_HEIGHT, options)?;

        // One CHIP-8 frame per host frame.
        window.limit_update_rate(Some(Duration::from_micros(16600)));

        Ok(Self { buffer, window })
    }

    pub fn update(&mut self, screen: &[u8]) -> minifb::Result<bool> {
        self.buffer
            .iter_mut()
            .zip(screen.iter())
            .for_each(|(dst, src)| *dst = PALETTE[(*src != 0) as usize]);

        self.window
            .update_with_buffer(&self.buffer, SCREEN_WIDTH, SCREEN_HEIGHT)?;

        Ok(self.window.is_open() && !self.window.is_key_down(Key::Escape))
    }

    pub fn keys(&self, map: &[(Key, u8)]) -> [bool; KEY_COUNT] {
        let mut keys = [false; KEY_COUNT];

        for (host, key) in map {
            if self.window.is_key_down(*host) {
                keys[*key as usize & 0x0f] = true;
            }
        }

        keys
    }
}
