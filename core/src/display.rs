use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// The FrameBuffer is indexed as [y][x]; every pixel is either 0 (off) or 1 (on)
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// A FrameBuffer with every pixel turned off
pub const BLANK_FRAME: FrameBuffer = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// XORs a sprite onto the frame with its top left corner at (x, y).
///
/// Each byte of `sprite` is one 8 pixel row, most significant bit leftmost. The starting position
/// always wraps onto the screen; pixels that run past an edge either wrap around to the opposite
/// edge or are dropped when `clip` is set.
///
/// Returns whether any pixel that was on got turned off.
pub fn draw_sprite(frame: &mut FrameBuffer, x: u8, y: u8, sprite: &[u8], clip: bool) -> bool {
    let x0 = usize::from(x) % DISPLAY_WIDTH;
    let y0 = usize::from(y) % DISPLAY_HEIGHT;
    let mut collision = false;

    for (row, byte) in sprite.iter().enumerate() {
        if clip && y0 + row >= DISPLAY_HEIGHT {
            break;
        }
        let y = (y0 + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            if clip && x0 + bit >= DISPLAY_WIDTH {
                break;
            }
            let x = (x0 + bit) % DISPLAY_WIDTH;
            let pixel = (byte >> (7 - bit)) & 0x1;
            collision |= (pixel & frame[y][x]) == 0x1;
            frame[y][x] ^= pixel;
        }
    }

    collision
}
