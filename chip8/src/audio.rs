use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

const PITCH: f32 = 440.0;
const VOLUME: f32 = 0.15;

struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for x in out.iter_mut() {
            *x = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// # Tone
/// The Chip-8 has a single buzzer that sounds while the sound timer is running.
/// It is started when the sound timer is set and stopped when the timer runs out.
pub struct Tone {
    device: AudioDevice<SquareWave>,
    playing: bool,
}

impl Tone {
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, String> {
        let audio_subsystem = sdl.audio()?;
        let desired = AudioSpecDesired {
            freq: Some(44_100),
            channels: Some(1),
            samples: None,
        };
        let device = audio_subsystem.open_playback(None, &desired, |spec| SquareWave {
            phase_inc: PITCH / spec.freq as f32,
            phase: 0.0,
            volume: VOLUME,
        })?;
        Ok(Tone {
            device,
            playing: false,
        })
    }

    pub fn start(&mut self) {
        if !self.playing {
            self.device.resume();
            self.playing = true;
        }
    }

    pub fn stop(&mut self) {
        if self.playing {
            self.device.pause();
            self.playing = false;
        }
    }
}
