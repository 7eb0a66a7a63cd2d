use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Texture, TextureCreator, WindowCanvas};
use sdl2::video::WindowContext;

use chip8_vm::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8_vm::FrameBuffer;

/// Bytes per RGB24 pixel
const BYTES_PER_PIXEL: usize = 3;

/// Opens a window sized to fit the Chip-8 display at `scale` and returns its canvas.
///
/// # Arguments
/// * `sdl` an sdl2 context with which to draw
/// * `title` the window title
/// * `scale` the size multiplier for each pixel
pub fn window(sdl: &sdl2::Sdl, title: &str, scale: u32) -> Result<WindowCanvas, String> {
    let video_subsystem = sdl.video()?;
    let window = video_subsystem
        .window(
            title,
            DISPLAY_WIDTH as u32 * scale,
            DISPLAY_HEIGHT as u32 * scale,
        )
        .position_centered()
        .opengl()
        .build()
        .map_err(|e| e.to_string())?;
    window.into_canvas().build().map_err(|e| e.to_string())
}

/// # Display
/// The Chip-8 display is composed of 64x32 pixels black/white pixels.
/// The on/off state of these pixels is encoded as 1/0 respectively in a 2d array of 64x32 bytes.
/// The display only gets a call to `render` when the Chip-8 FrameBuffer is updated.
///
/// The streaming texture is created once and refilled on every render; it borrows the
/// `TextureCreator` it came from, which the caller keeps alive alongside the display.
pub struct Display<'a> {
    canvas: WindowCanvas,
    texture: Texture<'a>,
}

impl<'a> Display<'a> {
    /// # Arguments
    /// * `canvas` the canvas returned by `window`
    /// * `textures` the texture creator of that same canvas
    pub fn new(
        canvas: WindowCanvas,
        textures: &'a TextureCreator<WindowContext>,
    ) -> Result<Self, String> {
        let texture = textures
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
            )
            .map_err(|e| e.to_string())?;

        Ok(Display { canvas, texture })
    }

    /// Copies the frame into the texture and presents it.
    pub fn render(&mut self, frame: &FrameBuffer) -> Result<(), String> {
        self.texture
            .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                write_pixels(frame, buffer, pitch)
            })?;

        self.canvas.copy(&self.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}

/// Writes a FrameBuffer into a locked RGB24 buffer whose rows are `pitch` bytes apart.
/// Lit pixels become white (255, 255, 255) and unlit ones black; padding past each row is left
/// untouched.
fn write_pixels(frame: &FrameBuffer, buffer: &mut [u8], pitch: usize) {
    for (y, row) in frame.iter().enumerate() {
        let line = &mut buffer[y * pitch..y * pitch + DISPLAY_WIDTH * BYTES_PER_PIXEL];
        for (pixel, rgb) in row.iter().zip(line.chunks_exact_mut(BYTES_PER_PIXEL)) {
            rgb.fill(pixel * 255);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_pixels() {
        let mut frame: FrameBuffer = [[0; 64]; 32];
        frame[0][0..2].copy_from_slice(&[0, 1]);
        frame[1][0..2].copy_from_slice(&[1, 0]);
        let mut buffer = vec![0; 6144];
        write_pixels(&frame, &mut buffer, 192);

        let mut expected: Vec<u8> = vec![0; 6144];
        expected[0..6].copy_from_slice(&[0, 0, 0, 255, 255, 255]);
        expected[192..198].copy_from_slice(&[255, 255, 255, 0, 0, 0]);

        assert_eq!(buffer, expected);
    }

    #[test]
    fn test_write_pixels_skips_row_padding() {
        let frame: FrameBuffer = [[1; 64]; 32];
        let pitch = 200;
        let mut buffer = vec![0x7; pitch * 32];
        write_pixels(&frame, &mut buffer, pitch);

        for row in buffer.chunks(pitch) {
            assert!(row[..192].iter().all(|&b| b == 255));
            assert!(row[192..].iter().all(|&b| b == 0x7));
        }
    }
}
