use std::collections::BTreeMap;
use std::path::PathBuf;

use libchip8::{Chip8, Config, Emulator, Frame, Quirks, SCREEN_HEIGHT, SCREEN_WIDTH};
use numpy::{PyArray1, PyArray2};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

fn frame_to_array<'py>(py: Python<'py>, frame: &Frame) -> PyResult<&'py PyArray2<u8>> {
    PyArray1::from_slice(py, frame.as_ref()).reshape([SCREEN_HEIGHT, SCREEN_WIDTH])
}

/// A CHIP-8 machine stepped one frame at a time.
///
/// Frames are returned as `uint8` arrays of shape `(32, 64)` holding 0 or 255.
#[pyclass(name = "CHIP8Emulator")]
struct Chip8Emulator {
    vm: Chip8,
}

#[pymethods]
impl Chip8Emulator {
    #[new]
    #[pyo3(signature = (clock_rate = 600, shift_uses_vy = false, load_store_advances_index = false, seed = None))]
    fn new(
        clock_rate: u32,
        shift_uses_vy: bool,
        load_store_advances_index: bool,
        seed: Option<u64>,
    ) -> Self {
        let config = Config {
            clock_rate,
            quirks: Quirks {
                shift_uses_vy,
                load_store_advances_index,
            },
            rng_seed: seed,
        };

        Self {
            vm: Chip8::new(config),
        }
    }

    /// Load a ROM file. Returns False if it cannot be read or does not fit.
    fn load_rom(&mut self, path: PathBuf) -> bool {
        std::fs::read(path)
            .ok()
            .map_or(false, |rom| self.vm.load_rom(&rom).is_ok())
    }

    fn load_rom_bytes(&mut self, rom: &[u8]) -> bool {
        self.vm.load_rom(rom).is_ok()
    }

    /// Execute one instruction. Raises RuntimeError once the machine has halted.
    fn step(&mut self) -> PyResult<()> {
        self.vm
            .step()
            .map_err(|fault| PyRuntimeError::new_err(fault.to_string()))
    }

    fn run_frame<'py>(&mut self, py: Python<'py>) -> PyResult<&'py PyArray2<u8>> {
        let frame = self
            .vm
            .run_frame()
            .map_err(|fault| PyRuntimeError::new_err(fault.to_string()))?;

        frame_to_array(py, &frame)
    }

    fn get_frame<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray2<u8>> {
        frame_to_array(py, &self.vm.frame())
    }

    fn set_input(&mut self, keys: Vec<bool>) -> PyResult<()> {
        self.vm
            .set_keys(&keys)
            .map_err(|err| PyValueError::new_err(err.to_string()))
    }

    fn get_state<'py>(&self, py: Python<'py>) -> &'py PyBytes {
        PyBytes::new(py, &self.vm.state())
    }

    fn set_state(&mut self, state: &[u8]) -> PyResult<()> {
        self.vm
            .set_state(state)
            .map_err(|err| PyValueError::new_err(err.to_string()))
    }

    fn reset(&mut self) {
        self.vm.reset()
    }

    #[getter]
    fn sound_active(&self) -> bool {
        self.vm.sound_active()
    }

    #[getter]
    fn halted(&self) -> bool {
        self.vm.is_halted()
    }

    /// Conventional mapping from keyboard characters to key indices.
    #[staticmethod]
    fn get_key_map() -> BTreeMap<char, u8> {
        libchip8::key_map()
    }
}

#[pymodule]
fn pychip8(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<Chip8Emulator>()?;
    Ok(())
}
