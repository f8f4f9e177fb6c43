//! A CHIP-8 virtual machine that is driven one frame at a time.
//!
//! [`Chip8`] runs `clock_rate / 60` instructions per [`Emulator::run_frame`]
//! call, ticks the delay and sound timers once and hands back the screen.
//! The whole machine can be saved to and restored from a fixed-size
//! snapshot, see [`SNAPSHOT_SIZE`].

use log::{debug, error, info};

mod config;
mod cpu;
mod error;
mod peripherals;
mod snapshot;

pub use config::{Config, Quirks, FRAME_RATE};
pub use error::{CorruptState, Fault, InputError, RomLoadError};
pub use peripherals::{
    key_map, Frame, KEY_COUNT, KEY_MAP, MAX_ROM_SIZE, PIXEL_OFF, PIXEL_ON, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
pub use snapshot::{SNAPSHOT_SIZE, SNAPSHOT_VERSION};

use cpu::Cpu;
use peripherals::Peripherals;
use snapshot::Snapshot;

/// Something a driver can load, step, feed keys to and snapshot.
pub trait Emulator {
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), RomLoadError>;

    fn step(&mut self) -> Result<(), Fault>;

    /// Run one 60 Hz frame and return the screen it ends on.
    fn run_frame(&mut self) -> Result<Frame, Fault>;

    /// The current screen, without running anything.
    fn frame(&self) -> Frame;

    /// Replace the whole key latch. Exactly 16 entries are required.
    fn set_keys(&mut self, keys: &[bool]) -> Result<(), InputError>;

    fn state(&self) -> Vec<u8>;

    fn set_state(&mut self, state: &[u8]) -> Result<(), CorruptState>;
}

pub struct Chip8 {
    cpu: Cpu,
    peripherals: Peripherals,
    config: Config,
    rom: Option<Vec<u8>>,
}

impl Chip8 {
    pub fn new(config: Config) -> Self {
        Self {
            cpu: Cpu::new(&config),
            peripherals: Peripherals::new(),
            config,
            rom: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Power-cycle the machine and load the last ROM that loaded successfully.
    ///
    /// This is the only way out of a halt other than restoring a snapshot.
    pub fn reset(&mut self) {
        info!("reset");

        self.cpu = Cpu::new(&self.config);
        self.peripherals = Peripherals::new();

        if let Some(rom) = &self.rom {
            if let Err(err) = self.peripherals.memory.load(rom) {
                error!("failed to reload ROM after reset: {err}");
            }
        }
    }

    pub fn fault(&self) -> Option<Fault> {
        self.cpu.fault()
    }

    pub fn is_halted(&self) -> bool {
        self.fault().is_some()
    }

    pub fn sound_active(&self) -> bool {
        self.peripherals.timers.is_sound_active()
    }

    pub fn delay_timer(&self) -> u8 {
        self.peripherals.timers.delay()
    }

    pub fn keys(&self) -> [bool; KEY_COUNT] {
        self.peripherals.keypad.keys()
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Emulator for Chip8 {
    /// Start over from power-on state with `rom` at the program start. A ROM
    /// that does not fit leaves the machine as it was.
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), RomLoadError> {
        let mut peripherals = Peripherals::new();
        peripherals.memory.load(rom)?;

        self.cpu = Cpu::new(&self.config);
        self.peripherals = peripherals;
        self.rom = Some(rom.to_vec());

        info!("loaded {} byte ROM", rom.len());

        Ok(())
    }

    fn step(&mut self) -> Result<(), Fault> {
        self.cpu.step(&mut self.peripherals)
    }

    /// A fault ends the frame early. The timers are not ticked in that case.
    fn run_frame(&mut self) -> Result<Frame, Fault> {
        for _ in 0..self.config.steps_per_frame() {
            self.step()?;
        }

        self.peripherals.timers.tick();

        Ok(self.frame())
    }

    fn frame(&self) -> Frame {
        self.peripherals.video.frame()
    }

    fn set_keys(&mut self, keys: &[bool]) -> Result<(), InputError> {
        self.peripherals.keypad.set_keys(keys)
    }

    fn state(&self) -> Vec<u8> {
        let snapshot = Snapshot {
            memory: self.peripherals.memory.clone(),
            registers: self.cpu.registers().clone(),
            stack: self.cpu.stack().clone(),
            timers: self.peripherals.timers,
            video: self.peripherals.video.clone(),
            keypad: self.peripherals.keypad,
            rng: self.cpu.rng_state(),
        };

        snapshot.encode()
    }

    fn set_state(&mut self, state: &[u8]) -> Result<(), CorruptState> {
        let snapshot = Snapshot::decode(state)?;

        self.cpu.restore(snapshot.registers, snapshot.stack, snapshot.rng);
        self.peripherals = Peripherals {
            memory: snapshot.memory,
            video: snapshot.video,
            timers: snapshot.timers,
            keypad: snapshot.keypad,
        };

        debug!("restored snapshot, pc = {:03x}", self.cpu.registers().pc);

        Ok(())
    }
}
