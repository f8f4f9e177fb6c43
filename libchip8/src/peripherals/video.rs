use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const PIXEL_ON: u8 = 255;
pub const PIXEL_OFF: u8 = 0;

/// Bytes needed to hold the screen at one bit per pixel.
pub const PACKED_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT / 8;

/// A rendered 64x32 screen, row-major, each pixel `PIXEL_OFF` or `PIXEL_ON`.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Box<[u8; SCREEN_WIDTH * SCREEN_HEIGHT]>,
}

impl Frame {
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(SCREEN_WIDTH)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.pixels.as_slice()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for px in row {
                let c = if *px == PIXEL_OFF { '.' } else { '#' };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frame")?;
        fmt::Display::fmt(self, f)
    }
}

/// Monochrome screen with XOR sprite drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    screen: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
}

impl Video {
    pub fn new() -> Self {
        Self {
            screen: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.screen.fill(false);
    }

    /// XOR an 8-pixel-wide sprite onto the screen at (x, y), one byte per row,
    /// most significant bit leftmost. Every pixel wraps around both edges.
    ///
    /// Returns true if any lit pixel was switched off.
    pub fn draw(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;

        for (dy, row) in rows.iter().enumerate() {
            let py = (y as usize + dy) % SCREEN_HEIGHT;

            for dx in 0..8 {
                if row & (0b1000_0000 >> dx) == 0 {
                    continue;
                }

                let px = (x as usize + dx) % SCREEN_WIDTH;
                let pixel = &mut self.screen[py * SCREEN_WIDTH + px];

                collision |= *pixel;
                *pixel = !*pixel;
            }
        }

        collision
    }

    #[cfg(test)]
    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        self.screen[(y % SCREEN_HEIGHT) * SCREEN_WIDTH + (x % SCREEN_WIDTH)]
    }

    pub fn frame(&self) -> Frame {
        let mut pixels = Box::new([PIXEL_OFF; SCREEN_WIDTH * SCREEN_HEIGHT]);

        for (dst, lit) in pixels.iter_mut().zip(self.screen.iter()) {
            if *lit {
                *dst = PIXEL_ON;
            }
        }

        Frame { pixels }
    }

    /// Eight pixels per byte in row-major order, the leftmost pixel of each
    /// group in the least significant bit.
    pub(crate) fn to_packed(&self) -> [u8; PACKED_SIZE] {
        let mut packed = [0u8; PACKED_SIZE];

        for (byte, pixels) in packed.iter_mut().zip(self.screen.chunks_exact(8)) {
            *byte = pixels
                .iter()
                .enumerate()
                .fold(0, |acc, (bit, lit)| acc | (*lit as u8) << bit);
        }

        packed
    }

    pub(crate) fn from_packed(packed: &[u8; PACKED_SIZE]) -> Self {
        Self {
            screen: std::array::from_fn(|idx| packed[idx / 8] & (1 << (idx % 8)) != 0),
        }
    }
}

impl Default for Video {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_columns(video: &Video, y: usize) -> Vec<usize> {
        (0..SCREEN_WIDTH).filter(|x| video.is_lit(*x, y)).collect()
    }

    #[test]
    fn draw_sets_pixels_msb_first() {
        let mut video = Video::new();
        let collision = video.draw(0, 0, &[0b1010_0000]);

        assert!(!collision);
        assert_eq!(lit_columns(&video, 0), vec![0, 2]);
    }

    #[test]
    fn draw_wraps_horizontally() {
        let mut video = Video::new();
        video.draw(60, 0, &[0xff]);

        assert_eq!(lit_columns(&video, 0), vec![0, 1, 2, 3, 60, 61, 62, 63]);
    }

    #[test]
    fn draw_wraps_vertically() {
        let mut video = Video::new();
        video.draw(0, 30, &[0x80, 0x80, 0x80, 0x80]);

        assert!(video.is_lit(0, 30));
        assert!(video.is_lit(0, 31));
        assert!(video.is_lit(0, 0));
        assert!(video.is_lit(0, 1));
        assert!(!video.is_lit(0, 2));
    }

    #[test]
    fn start_coordinates_wrap() {
        let mut video = Video::new();
        video.draw(64 + 5, 32 + 2, &[0x80]);
        assert!(video.is_lit(5, 2));
    }

    #[test]
    fn redraw_erases_and_reports_collision() {
        let mut video = Video::new();
        let sprite = [0xf0, 0x90, 0xf0];

        assert!(!video.draw(10, 10, &sprite));
        assert!(video.draw(10, 10, &sprite));
        assert_eq!(video, Video::new());
    }

    #[test]
    fn collision_only_on_one_to_zero() {
        let mut video = Video::new();
        video.draw(0, 0, &[0b1000_0000]);

        // overlapping only unlit pixels
        assert!(!video.draw(1, 0, &[0b1000_0000]));
        // overlapping a lit pixel
        assert!(video.draw(0, 0, &[0b1100_0000]));
        assert!(!video.is_lit(0, 0));
        assert!(!video.is_lit(1, 0));
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut video = Video::new();
        video.draw(3, 4, &[0xff; 15]);
        video.clear();

        assert!(video.frame().as_ref().iter().all(|px| *px == PIXEL_OFF));
    }

    #[test]
    fn frame_uses_full_intensity() {
        let mut video = Video::new();
        video.draw(63, 31, &[0x80]);
        let frame = video.frame();

        assert_eq!(frame.pixel(63, 31), PIXEL_ON);
        assert_eq!(frame.pixel(0, 0), PIXEL_OFF);
        assert_eq!(frame.rows().count(), SCREEN_HEIGHT);
    }

    #[test]
    fn frame_renders_as_text() {
        let mut video = Video::new();
        video.draw(0, 0, &[0xc0]);
        let text = video.frame().to_string();
        let first = text.lines().next().unwrap();

        assert_eq!(text.lines().count(), SCREEN_HEIGHT);
        assert_eq!(first.len(), SCREEN_WIDTH);
        assert!(first.starts_with("##."));
    }

    #[test]
    fn packing_puts_leftmost_pixel_in_lsb() {
        let mut video = Video::new();
        video.draw(0, 0, &[0x80]);
        video.draw(9, 0, &[0x80]);
        let packed = video.to_packed();

        assert_eq!(packed[0], 0b0000_0001);
        assert_eq!(packed[1], 0b0000_0010);
        assert_eq!(Video::from_packed(&packed), video);
    }
}
