use sdl2::keyboard::Keycode;

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// By default this original layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    bindings: [(Keycode, u8); 16],
}

impl Keymap {
    pub const fn new(bindings: [(Keycode, u8); 16]) -> Self {
        Keymap { bindings }
    }

    /// The keypad key bound to a physical key, if any
    pub fn keymap(&self, key: Keycode) -> Option<u8> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|&(_, pad)| pad)
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Keymap::new([
            (Keycode::X, 0x0),
            (Keycode::Num1, 0x1),
            (Keycode::Num2, 0x2),
            (Keycode::Num3, 0x3),
            (Keycode::Q, 0x4),
            (Keycode::W, 0x5),
            (Keycode::E, 0x6),
            (Keycode::A, 0x7),
            (Keycode::S, 0x8),
            (Keycode::D, 0x9),
            (Keycode::Z, 0xA),
            (Keycode::C, 0xB),
            (Keycode::Num4, 0xC),
            (Keycode::R, 0xD),
            (Keycode::F, 0xE),
            (Keycode::V, 0xF),
        ])
    }
}
