use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Error};
use log::info;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chip8_vm::{Chip8, Cycle, Quirks, RunState, TIMER_SPEED};
use display::Display;

use crate::audio::Tone;
use crate::keymap::Keymap;

/// Everything the host needs to know to run a ROM
pub struct Settings {
    pub rom: PathBuf,
    pub speed: u32,
    pub scale: u32,
    pub quirks: Quirks,
    pub seed: Option<u64>,
    pub keymap: Keymap,
}

/// Never catch up on more than this much missed time at once, e.g. after the window was dragged
const MAX_CATCH_UP: Duration = Duration::from_millis(100);

pub fn run(settings: Settings) -> anyhow::Result<()> {
    let mut chip8 = match settings.seed {
        Some(seed) => Chip8::with_seed(settings.quirks, seed),
        None => Chip8::with_quirks(settings.quirks),
    };

    // Load ROM
    let file = File::open(&settings.rom)
        .with_context(|| format!("unable to open ROM {}", settings.rom.display()))?;
    let mut reader = BufReader::new(file);
    let size = chip8
        .load_rom(&mut reader)
        .with_context(|| format!("unable to load ROM {}", settings.rom.display()))?;
    info!("loaded {} ({} bytes)", settings.rom.display(), size);

    // Get SDL2 context
    let rom_name = settings
        .rom
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let sdl = sdl2::init().map_err(Error::msg)?;
    let title = format!("Chip-8 - {}", rom_name);
    let canvas = display::window(&sdl, &title, settings.scale).map_err(Error::msg)?;
    let textures = canvas.texture_creator();
    let mut display = Display::new(canvas, &textures).map_err(Error::msg)?;
    let mut tone = Tone::new(&sdl).map_err(Error::msg)?;
    let mut events = sdl.event_pump().map_err(Error::msg)?;

    // The two clocks: instructions at `speed` Hz and timers at 60Hz
    let cycle_time = Duration::from_secs(1) / settings.speed.max(1);
    let timer_time = Duration::from_secs(1) / TIMER_SPEED;
    let mut last_cycle = Instant::now();
    let mut last_tick = Instant::now();

    'event: loop {
        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = settings.keymap.keymap(key) {
                        chip8.key_press(kc);
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = settings.keymap.keymap(key) {
                        chip8.key_release(kc);
                    }
                }
                _ => continue,
            };
        }

        if let RunState::AwaitingKey { .. } = chip8.run_state() {
            let keypad = *chip8.keypad();
            chip8.resolve_key_wait(&keypad);
        }

        // Update state
        let now = Instant::now();
        if now - last_cycle > MAX_CATCH_UP {
            last_cycle = now - MAX_CATCH_UP;
        }
        if now - last_tick > MAX_CATCH_UP {
            last_tick = now - MAX_CATCH_UP;
        }

        while now - last_cycle >= cycle_time {
            last_cycle += cycle_time;
            match chip8.execute_cycle()? {
                Cycle::Executed(_) | Cycle::Unrecognized(_) => {}
                Cycle::AwaitingKey(_) => break,
            }
        }
        if let RunState::AwaitingKey { .. } = chip8.run_state() {
            last_cycle = now;
        }

        while now - last_tick >= timer_time {
            last_tick += timer_time;
            if chip8.timer_tick() {
                tone.stop();
            }
        }
        if chip8.sound_active() {
            tone.start();
        }

        // If the draw flag is set, render the current frame and unset it
        if let Some(frame) = chip8.get_frame() {
            display.render(frame).map_err(Error::msg)?;
        }
        chip8.mark_clean();

        std::thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}
