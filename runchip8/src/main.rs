use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use libchip8::{Chip8, Config, Emulator, Quirks};
use log::info;

mod ui;

use ui::Key;

const KEYPAD_MAP: [(Key, u8); 16] = [
    (Key::Key1, 0x1),
    (Key::Key2, 0x2),
    (Key::Key3, 0x3),
    (Key::Key4, 0xc),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xd),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xe),
    (Key::Z, 0xa),
    (Key::X, 0x0),
    (Key::C, 0xb),
    (Key::V, 0xf),
];

#[derive(Parser)]
#[command(name = "runchip8", about = "Run a CHIP-8 program")]
struct Args {
    /// ROM file to load
    rom: PathBuf,

    /// Instructions per second
    #[arg(long, default_value_t = 600)]
    clock_rate: u32,

    /// Enable every COSMAC VIP quirk
    #[arg(long)]
    cosmac_vip: bool,

    /// 8XY6/8XYE shift VY instead of VX
    #[arg(long)]
    shift_uses_vy: bool,

    /// FX55/FX65 advance I past the transferred registers
    #[arg(long)]
    load_store_advances_index: bool,

    /// Seed for the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many frames without a window and print the final screen
    #[arg(long)]
    frames: Option<u64>,

    /// Restore a snapshot before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a snapshot after running
    #[arg(long)]
    save_state: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Config {
        let quirks = if self.cosmac_vip {
            Quirks::cosmac_vip()
        } else {
            Quirks {
                shift_uses_vy: self.shift_uses_vy,
                load_store_advances_index: self.load_store_advances_index,
            }
        };

        Config {
            clock_rate: self.clock_rate,
            quirks,
            rng_seed: self.seed,
        }
    }
}

fn run_headless<E: Emulator>(emu: &mut E, frames: u64) -> anyhow::Result<()> {
    for _ in 0..frames {
        emu.run_frame()?;
    }

    print!("{}", emu.frame());

    Ok(())
}

fn run_windowed<E: Emulator>(emu: &mut E, title: &str) -> anyhow::Result<()> {
    let mut window = ui::Ui::new(title)?;

    loop {
        emu.set_keys(&window.keys(&KEYPAD_MAP))?;

        let frame = emu.run_frame()?;

        if !window.update(frame.as_ref())? {
            break;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();

    let mut chip8 = Chip8::new(args.config());

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("failed to read ROM {}", args.rom.display()))?;
    chip8.load_rom(&rom)?;

    if let Some(path) = &args.load_state {
        let state = std::fs::read(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        chip8.set_state(&state)?;
        info!("restored {}", path.display());
    }

    match args.frames {
        Some(frames) => run_headless(&mut chip8, frames)?,
        None => {
            let title = args
                .rom
                .file_name()
                .map_or_else(|| "runchip8".into(), |name| name.to_string_lossy());
            run_windowed(&mut chip8, &title)?;
        }
    }

    if let Some(path) = &args.save_state {
        std::fs::write(path, chip8.state())
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        info!("saved {}", path.display());
    }

    Ok(())
}
