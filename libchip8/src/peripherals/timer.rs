/// Delay and sound counters, both counting down at 60 Hz.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    delay: u8,
    sound: u8,
}

impl Timers {
    pub(crate) fn from_raw(delay: u8, sound: u8) -> Self {
        Self { delay, sound }
    }

    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn sound(&self) -> u8 {
        self.sound
    }

    pub fn set_delay(&mut self, val: u8) {
        self.delay = val;
    }

    pub fn set_sound(&mut self, val: u8) {
        self.sound = val;
    }

    pub fn is_sound_active(&self) -> bool {
        self.sound > 0
    }
}
