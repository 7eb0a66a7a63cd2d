use crate::error::MachineFault;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// An instruction handler: executes `op` against a state whose pc already points past it
pub type Operation = fn(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault>;

/// Selects the correct Operation for a given opcode.
/// Returns None for opcodes outside of the instruction set, including the 0NNN machine code calls.
pub fn decode(op: u16) -> Option<Operation> {
    let operation: Operation = match op.class() {
        0x0 => match op.nnn() {
            0x0E0 => clr,
            0x0EE => rts,
            _ => return None,
        },
        0x1 => jump,
        0x2 => call,
        0x3 => ske,
        0x4 => skne,
        0x5 => match op.n() {
            0x0 => skre,
            _ => return None,
        },
        0x6 => load,
        0x7 => add,
        0x8 => match op.n() {
            0x0 => mv,
            0x1 => or,
            0x2 => and,
            0x3 => xor,
            0x4 => addr,
            0x5 => sub,
            0x6 => shr,
            0x7 => subn,
            0xE => shl,
            _ => return None,
        },
        0x9 => match op.n() {
            0x0 => skrne,
            _ => return None,
        },
        0xA => loadi,
        0xB => jumpi,
        0xC => rand,
        0xD => draw,
        0xE => match op.nn() {
            0x9E => skpr,
            0xA1 => skup,
            _ => return None,
        },
        0xF => match op.nn() {
            0x07 => moved,
            0x0A => keyd,
            0x15 => loads,
            0x18 => ld,
            0x1E => addi,
            0x29 => ldspr,
            0x33 => bcd,
            0x55 => stor,
            0x65 => read,
            _ => return None,
        },
        // the class is a single nibble
        _ => return None,
    };
    Some(operation)
}

#[cfg(test)]
mod test_instruction {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use crate::quirks::{AddressMode, Quirks};
    use crate::state::{Keypad, RunState, State};

    /// Executes op the way the CPU would right after fetching it from state.pc
    fn execute_with(
        op: u16,
        state: &State,
        keypad: Keypad,
        quirks: Quirks,
    ) -> Result<State, MachineFault> {
        let mut rng = StdRng::seed_from_u64(0x8);
        let mut ctx = Context {
            keypad: &keypad,
            quirks: &quirks,
            rng: &mut rng,
        };
        let fetched = State {
            pc: state.pc + 0x2,
            ..*state
        };
        decode(op).expect("opcode should decode")(op, &fetched, &mut ctx)
    }

    fn execute(op: u16, state: &State) -> State {
        execute_with(op, state, [false; 16], Quirks::MODERN).unwrap()
    }

    #[test]
    fn test_decode_rejects_unknown_opcodes() {
        for op in [0x0000, 0x0123, 0x00E1, 0x5121, 0x8128, 0x812F, 0x9121, 0xE19F, 0xF100, 0xF1FF] {
            assert!(decode(op).is_none(), "{:04X} should not decode", op);
        }
    }

    #[test]
    fn test_00e0_cls() {
        let mut state = State::new();
        state.frame_buffer[0][0] = 1;
        let state = execute(0x00E0, &state);
        assert_eq!(state.frame_buffer[0][0], 0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_00ee_ret() {
        let mut state = State::new();
        state.sp = 0x1;
        state.stack[0] = 0x0ABC;
        let state = execute(0x00EE, &state);
        assert_eq!(state.sp, 0x0);
        assert_eq!(state.pc, 0x0ABC);
    }

    #[test]
    fn test_00ee_ret_underflows() {
        let state = State::new();
        let result = execute_with(0x00EE, &state, [false; 16], Quirks::MODERN);
        assert_eq!(result, Err(MachineFault::StackUnderflow));
    }

    #[test]
    fn test_1nnn_jp() {
        let state = State::new();
        let state = execute(0x1ABC, &state);
        assert_eq!(state.pc, 0x0ABC);
    }

    #[test]
    fn test_2nnn_call() {
        let mut state = State::new();
        state.pc = 0x0ABC;
        let state = execute(0x2124, &state);
        assert_eq!(state.sp, 0x1);
        assert_eq!(state.stack[0], 0x0ABE);
        assert_eq!(state.pc, 0x0124);
    }

    #[test]
    fn test_2nnn_call_overflows() {
        let mut state = State::new();
        state.sp = 16;
        let result = execute_with(0x2123, &state, [false; 16], Quirks::MODERN);
        assert_eq!(result, Err(MachineFault::StackOverflow));
    }

    #[test]
    fn test_3xnn_se_skips() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        let state = execute(0x3111, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_3xnn_se_doesntskip() {
        let state = State::new();
        let state = execute(0x3111, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_4xnn_sne_skips() {
        let state = State::new();
        let state = execute(0x4111, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_4xnn_sne_doesntskip() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        let state = execute(0x4111, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_5xy0_se_skips() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = execute(0x5120, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_5xy0_se_doesntskip() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        let state = execute(0x5120, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_6xnn_ld() {
        let state = State::new();
        let state = execute(0x6122, &state);
        assert_eq!(state.v[0x1], 0x22);
    }

    #[test]
    fn test_7xnn_add() {
        let mut state = State::new();
        state.v[0x1] = 0x1;
        let state = execute(0x7122, &state);
        assert_eq!(state.v[0x1], 0x23);
    }

    #[test]
    fn test_7xnn_add_wraps_without_carry() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        let state = execute(0x7102, &state);
        assert_eq!(state.v[0x1], 0x01);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy0_ld() {
        let mut state = State::new();
        state.v[0x2] = 0x1;
        let state = execute(0x8120, &state);
        assert_eq!(state.v[0x1], 0x1);
    }

    #[test]
    fn test_8xy1_or() {
        let mut state = State::new();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        let state = execute(0x8121, &state);
        assert_eq!(state.v[0x1], 0x7);
    }

    #[test]
    fn test_8xy2_and() {
        let mut state = State::new();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        let state = execute(0x8122, &state);
        assert_eq!(state.v[0x1], 0x2);
    }

    #[test]
    fn test_8xy3_xor() {
        let mut state = State::new();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        let state = execute(0x8123, &state);
        assert_eq!(state.v[0x1], 0x5);
    }

    #[test]
    fn test_8xy4_add_nocarry() {
        let mut state = State::new();
        state.v[0x1] = 0xEE;
        state.v[0x2] = 0x11;
        let state = execute(0x8124, &state);
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy4_add_carry() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        state.v[0x2] = 0x11;
        let state = execute(0x8124, &state);
        assert_eq!(state.v[0x1], 0x10);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy4_add_all_operands() {
        for v1 in 0..=255u8 {
            for v2 in 0..=255u8 {
                let mut state = State::new();
                state.v[0x1] = v1;
                state.v[0x2] = v2;
                let state = execute(0x8124, &state);
                let sum = u16::from(v1) + u16::from(v2);
                assert_eq!(u16::from(state.v[0x1]), sum % 256);
                assert_eq!(state.v[0xF], u8::from(sum > 255));
            }
        }
    }

    #[test]
    fn test_8fy4_add_flag_overwrites_result() {
        let mut state = State::new();
        state.v[0xF] = 0x01;
        state.v[0x2] = 0x02;
        let state = execute(0x8F24, &state);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy5_sub_noborrow() {
        let mut state = State::new();
        state.v[0x1] = 0x33;
        state.v[0x2] = 0x11;
        let state = execute(0x8125, &state);
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy5_sub_borrow() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x12;
        let state = execute(0x8125, &state);
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy5_sub_equal_clears_flag() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        state.v[0xF] = 0x1;
        let state = execute(0x8125, &state);
        assert_eq!(state.v[0x1], 0x00);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy6_shr_lsb() {
        let mut state = State::new();
        state.v[0x1] = 0x5;
        let state = execute(0x8106, &state);
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy6_shr_nolsb() {
        let mut state = State::new();
        state.v[0x1] = 0x4;
        let state = execute(0x8106, &state);
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy6_shr_all_operands() {
        for value in 0..=255u8 {
            let mut state = State::new();
            state.v[0x1] = value;
            let state = execute(0x8126, &state);
            assert_eq!(state.v[0x1], value >> 1);
            assert_eq!(state.v[0xF], value & 0x1);
        }
    }

    #[test]
    fn test_8xy6_shr_reads_vy_under_quirk() {
        let mut state = State::new();
        state.v[0x1] = 0xF0;
        state.v[0x2] = 0x03;
        let quirks = Quirks {
            shift_reads_vy: true,
            ..Quirks::MODERN
        };
        let state = execute_with(0x8126, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.v[0x1], 0x01);
        assert_eq!(state.v[0x2], 0x03);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_noborrow() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x33;
        let state = execute(0x8127, &state);
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_borrow() {
        let mut state = State::new();
        state.v[0x1] = 0x12;
        state.v[0x2] = 0x11;
        let state = execute(0x8127, &state);
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_msb() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        let state = execute(0x810E, &state);
        // 0xFF * 2 = 0x01FE
        assert_eq!(state.v[0x1], 0xFE);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xye_shl_nomsb() {
        let mut state = State::new();
        state.v[0x1] = 0x4;
        let state = execute(0x810E, &state);
        assert_eq!(state.v[0x1], 0x8);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_reads_vy_under_quirk() {
        let mut state = State::new();
        state.v[0x2] = 0x81;
        let quirks = Quirks {
            shift_reads_vy: true,
            ..Quirks::MODERN
        };
        let state = execute_with(0x812E, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.v[0x1], 0x02);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_9xy0_sne_skips() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        let state = execute(0x9120, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_9xy0_sne_doesntskip() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = execute(0x9120, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_annn_ld() {
        let state = State::new();
        let state = execute(0xAABC, &state);
        assert_eq!(state.i, 0xABC);
    }

    #[test]
    fn test_bnnn_jp() {
        let mut state = State::new();
        state.v[0x0] = 0x2;
        let state = execute(0xBABC, &state);
        assert_eq!(state.pc, 0xABE);
    }

    #[test]
    fn test_3xnn_se_skip_wraps_pc() {
        let mut state = State::new();
        state.pc = 0xFFC;
        let state = execute(0x3000, &state);
        assert_eq!(state.pc, 0x000);
    }

    #[test]
    fn test_bnnn_jp_wraps_pc() {
        let mut state = State::new();
        state.v[0x0] = 0xFF;
        let state = execute(0xBFFF, &state);
        assert_eq!(state.pc, 0x0FE);
    }

    #[test]
    fn test_bnnn_jp_strict_faults_past_memory() {
        let mut state = State::new();
        state.v[0x0] = 0xFF;
        let quirks = Quirks {
            address_mode: AddressMode::Strict,
            ..Quirks::MODERN
        };
        let result = execute_with(0xBFFF, &state, [false; 16], quirks);
        assert_eq!(
            result,
            Err(MachineFault::AddressOutOfRange { address: 0x10FE })
        );
    }

    #[test]
    fn test_bnnn_jp_uses_vx_under_quirk() {
        let mut state = State::new();
        state.v[0x0] = 0x2;
        state.v[0xA] = 0x4;
        let quirks = Quirks {
            jump_offset_uses_vx: true,
            ..Quirks::MODERN
        };
        let state = execute_with(0xBABC, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.pc, 0xAC0);
    }

    #[test]
    fn test_cxnn_rnd_masks() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        let masked = execute(0xC100, &state);
        assert_eq!(masked.v[0x1], 0x00);
        let nibble = execute(0xC10F, &state);
        assert_eq!(nibble.v[0x1] & 0xF0, 0x00);
    }

    #[test]
    fn test_dxyn_drw_draws() {
        let mut state = State::new();
        state.v[0x0] = 0x1;
        // Draw the 0x0 sprite with a 1x 1y offset
        let state = execute(0xD005, &state);
        let mut expected = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        expected[1][1..5].copy_from_slice(&[1, 1, 1, 1]);
        expected[2][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[3][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[4][1..5].copy_from_slice(&[1, 0, 0, 1]);
        expected[5][1..5].copy_from_slice(&[1, 1, 1, 1]);
        assert_eq!(state.frame_buffer, expected);
        assert_eq!(state.v[0xF], 0x0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_dxyn_drw_blank_sprite_leaves_frame_clean() {
        let mut state = State::new();
        state.i = 0x300;
        let state = execute(0xD003, &state);
        assert!(!state.draw_flag);
        let state = execute(0xD000, &state);
        assert!(!state.draw_flag);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_dxyn_drw_keeps_pending_redraw() {
        let mut state = State::new();
        state.i = 0x300;
        state.draw_flag = true;
        let state = execute(0xD003, &state);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_dxyn_drw_collides() {
        let mut state = State::new();
        state.frame_buffer[0][0] = 1;
        let state = execute(0xD001, &state);
        assert_eq!(state.v[0xF], 0x1)
    }

    #[test]
    fn test_dxyn_drw_xors() {
        let mut state = State::new();
        // 0 1 0 1 -> Set
        state.frame_buffer[0][2..6].copy_from_slice(&[0, 1, 0, 1]);
        // 1 1 0 0 -> Draw xor
        let state = execute(0xD005, &state);
        assert_eq!(state.frame_buffer[0][2..6], [1, 0, 0, 1])
    }

    #[test]
    fn test_dxyn_drw_wraps_sprite_memory() {
        let mut state = State::new();
        state.i = 0xFFF;
        state.memory[0xFFF] = 0x80;
        state.memory[0x000] = 0x80;
        let state = execute(0xD002, &state);
        assert_eq!(state.frame_buffer[0][0], 1);
        assert_eq!(state.frame_buffer[1][0], 1);
    }

    #[test]
    fn test_dxyn_drw_strict_faults_without_drawing() {
        let mut state = State::new();
        state.i = 0xFFF;
        let quirks = Quirks {
            address_mode: AddressMode::Strict,
            ..Quirks::MODERN
        };
        let result = execute_with(0xD002, &state, [false; 16], quirks);
        assert_eq!(
            result,
            Err(MachineFault::AddressOutOfRange { address: 0x1000 })
        );
    }

    #[test]
    fn test_ex9e_skp_skips() {
        let mut state = State::new();
        let mut pressed_keys = [false; 16];
        pressed_keys[0xE] = true;
        state.v[0x1] = 0xE;
        let state = execute_with(0xE19E, &state, pressed_keys, Quirks::MODERN).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_ex9e_skp_doesntskip() {
        let state = State::new();
        let state = execute(0xE19E, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_exa1_sknp_skips() {
        let state = State::new();
        let state = execute(0xE1A1, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_exa1_sknp_doesntskip() {
        let mut state = State::new();
        let mut pressed_keys = [false; 16];
        pressed_keys[0xE] = true;
        state.v[0x1] = 0xE;
        let state = execute_with(0xE1A1, &state, pressed_keys, Quirks::MODERN).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx07_ld() {
        let mut state = State::new();
        state.delay_timer = 0xF;
        let state = execute(0xF107, &state);
        assert_eq!(state.v[0x1], 0xF);
    }

    #[test]
    fn test_fx0a_ld_awaits_key() {
        let state = State::new();
        let state = execute(0xF10A, &state);
        assert_eq!(state.run_state, RunState::AwaitingKey { register: 0x1 });
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx15_ld() {
        let mut state = State::new();
        state.v[0x1] = 0xF;
        let state = execute(0xF115, &state);
        assert_eq!(state.delay_timer, 0xF);
    }

    #[test]
    fn test_fx18_ld() {
        let mut state = State::new();
        state.v[0x1] = 0xF;
        let state = execute(0xF118, &state);
        assert_eq!(state.sound_timer, 0xF);
    }

    #[test]
    fn test_fx1e_add() {
        let mut state = State::new();
        state.i = 0x1;
        state.v[0x1] = 0x1;
        let state = execute(0xF11E, &state);
        assert_eq!(state.i, 0x2);
    }

    #[test]
    fn test_fx1e_add_wraps_16_bits() {
        let mut state = State::new();
        state.i = 0xFFFF;
        state.v[0x1] = 0x2;
        let state = execute(0xF11E, &state);
        assert_eq!(state.i, 0x1);
    }

    #[test]
    fn test_fx29_ld() {
        let mut state = State::new();
        state.v[0x1] = 0x2;
        let state = execute(0xF129, &state);
        assert_eq!(state.i, 0xA);
    }

    #[test]
    fn test_fx33_ld() {
        let mut state = State::new();
        // 0x7B -> 123
        state.v[0x1] = 0x7B;
        state.i = 0x200;
        let state = execute(0xF133, &state);
        assert_eq!(state.memory[0x200..0x203], [0x1, 0x2, 0x3]);
    }

    #[test]
    fn test_fx_55_ld() {
        let mut state = State::new();
        state.i = 0x200;
        state.v[0x0..0x5].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5]);
        let state = execute(0xF455, &state);
        assert_eq!(state.memory[0x200..0x205], [0x1, 0x2, 0x3, 0x4, 0x5]);
        assert_eq!(state.memory[0x205], 0x0);
        assert_eq!(state.i, 0x200);
    }

    #[test]
    fn test_fx_65_ld() {
        let mut state = State::new();
        state.i = 0x200;
        state.memory[0x200..0x206].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5, 0x6]);
        let state = execute(0xF465, &state);
        assert_eq!(state.v[0x0..0x6], [0x1, 0x2, 0x3, 0x4, 0x5, 0x0]);
        assert_eq!(state.i, 0x200);
    }

    #[test]
    fn test_fx_65_ld_advances_index_under_quirk() {
        let mut state = State::new();
        state.i = 0x200;
        let quirks = Quirks {
            load_store_advances_index: true,
            ..Quirks::MODERN
        };
        let state = execute_with(0xF465, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.i, 0x205);
    }

    #[test]
    fn test_fx_55_ld_strict_commits_nothing() {
        let mut state = State::new();
        state.i = 0xFFE;
        state.v[0x0..0x3].copy_from_slice(&[0x1, 0x2, 0x3]);
        let quirks = Quirks {
            address_mode: AddressMode::Strict,
            ..Quirks::MODERN
        };
        let result = execute_with(0xF255, &state, [false; 16], quirks);
        assert_eq!(
            result,
            Err(MachineFault::AddressOutOfRange { address: 0x1000 })
        );
        assert_eq!(state.memory[0xFFE..], [0x0, 0x0]);
    }
}
