use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use chip8_vm::{AddressMode, Quirks, CLOCK_SPEED};

use crate::keymap::Keymap;
use crate::run::{run, Settings};

mod audio;
mod keymap;
mod run;

/// Which interpretation of the ambiguous instructions a ROM expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// Later interpreters; what most ROMs found today are written for
    Modern,
    /// The original RCA COSMAC VIP interpreter
    CosmacVip,
}

#[derive(Parser, Debug)]
#[command(version, about = "Runs a Chip-8 ROM", long_about = None)]
struct Args {
    /// Path to the ROM file to run
    rom: PathBuf,

    /// Instructions per second
    #[arg(long, default_value_t = CLOCK_SPEED)]
    speed: u32,

    /// Size of each Chip-8 pixel on screen
    #[arg(long, default_value_t = 10)]
    scale: u32,

    #[arg(long, value_enum, default_value_t = Profile::Modern)]
    quirks: Profile,

    /// Stop with an error on memory accesses past 0xFFF instead of wrapping around
    #[arg(long)]
    strict_memory: bool,

    /// Seed for the random number generator, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let quirks = Quirks {
        address_mode: if args.strict_memory {
            AddressMode::Strict
        } else {
            AddressMode::Wrap
        },
        ..match args.quirks {
            Profile::Modern => Quirks::MODERN,
            Profile::CosmacVip => Quirks::COSMAC_VIP,
        }
    };

    run(Settings {
        rom: args.rom,
        speed: args.speed,
        scale: args.scale,
        quirks,
        seed: args.seed,
        keymap: Keymap::default(),
    })
}
