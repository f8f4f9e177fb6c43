/// Frames (and timer ticks) per emulated second.
pub const FRAME_RATE: u32 = 60;

const DEFAULT_CLOCK_RATE: u32 = 600;

/// Behaviour that differs between historical interpreters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// `8XY6`/`8XYE` shift VY into VX (COSMAC VIP) instead of shifting VX in place.
    pub shift_uses_vy: bool,
    /// `FX55`/`FX65` leave I pointing past the last transferred byte (COSMAC VIP)
    /// instead of leaving it untouched.
    pub load_store_advances_index: bool,
}

impl Quirks {
    pub fn cosmac_vip() -> Self {
        Self {
            shift_uses_vy: true,
            load_store_advances_index: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Instructions executed per emulated second.
    pub clock_rate: u32,
    pub quirks: Quirks,
    /// Seed for `CXNN`. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_rate: DEFAULT_CLOCK_RATE,
            quirks: Quirks::default(),
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn with_clock_rate(mut self, clock_rate: u32) -> Self {
        self.clock_rate = clock_rate;
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Number of `step()` calls per `run_frame()`. Never zero, so slow clocks
    /// still make progress.
    pub fn steps_per_frame(&self) -> u32 {
        (self.clock_rate / FRAME_RATE).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_ten_steps_per_frame() {
        assert_eq!(Config::default().steps_per_frame(), 10);
    }

    #[test]
    fn slow_clock_still_steps() {
        assert_eq!(Config::default().with_clock_rate(30).steps_per_frame(), 1);
        assert_eq!(Config::default().with_clock_rate(0).steps_per_frame(), 1);
    }

    #[test]
    fn steps_round_down() {
        assert_eq!(Config::default().with_clock_rate(700).steps_per_frame(), 11);
    }
}
