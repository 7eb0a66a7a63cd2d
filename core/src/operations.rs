use rand::RngCore;

use crate::constants::{FONT_GLYPH_SIZE, FONT_START, STACK_DEPTH};
use crate::display::{self, BLANK_FRAME};
use crate::error::MachineFault;
use crate::opcode::Opcode;
use crate::quirks::Quirks;
use crate::state::{program_counter, Keypad, RunState, State};

/// Everything an instruction may read besides the machine state itself
pub struct Context<'a> {
    pub keypad: &'a Keypad,
    pub quirks: &'a Quirks,
    pub rng: &'a mut dyn RngCore,
}

// Every operation receives a state whose pc already points past the opcode being executed and
// returns the state that results from executing it. A fault returns before anything is committed.

/// clear
pub fn clr(_op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        frame_buffer: BLANK_FRAME,
        draw_flag: true,
        ..*state
    })
}

/// PC = STACK.pop()
pub fn rts(_op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let sp = state
        .sp
        .checked_sub(0x1)
        .ok_or(MachineFault::StackUnderflow)?;
    Ok(State {
        pc: state.stack[usize::from(sp)],
        sp,
        ..*state
    })
}

/// PC = addr
pub fn jump(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        pc: program_counter(usize::from(op.nnn()), ctx.quirks.address_mode)?,
        ..*state
    })
}

/// STACK.push(PC); PC = addr
pub fn call(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    if usize::from(state.sp) == STACK_DEPTH {
        return Err(MachineFault::StackOverflow);
    }
    let pc = program_counter(usize::from(op.nnn()), ctx.quirks.address_mode)?;
    let mut stack = state.stack;
    stack[usize::from(state.sp)] = state.pc;
    Ok(State {
        pc,
        sp: state.sp + 0x1,
        stack,
        ..*state
    })
}

/// Skips the next instruction when `condition` holds
fn skip_if(state: &State, condition: bool, quirks: &Quirks) -> Result<State, MachineFault> {
    if !condition {
        return Ok(*state);
    }
    Ok(State {
        pc: program_counter(usize::from(state.pc) + 0x2, quirks.address_mode)?,
        ..*state
    })
}

/// if Vx == nn then pc += 2
pub fn ske(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    skip_if(state, state.register(op.x()) == op.nn(), ctx.quirks)
}

/// if Vx != nn then pc += 2
pub fn skne(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    skip_if(state, state.register(op.x()) != op.nn(), ctx.quirks)
}

/// if Vx == Vy then pc += 2
pub fn skre(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    skip_if(state, state.register(op.x()) == state.register(op.y()), ctx.quirks)
}

/// Vx = nn
pub fn load(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] = op.nn();
    Ok(State { v, ..*state })
}

/// Vx += nn
/// Add nn to Vx; allow for overflow but implicitly drop it
pub fn add(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] = state.register(op.x()).wrapping_add(op.nn());
    Ok(State { v, ..*state })
}

/// Writes `result` to Vx then `flag` to VF, so the flag wins when x is F
fn set_with_flag(state: &State, x: u8, result: u8, flag: bool) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(x)] = result;
    v[0xF] = u8::from(flag);
    Ok(State { v, ..*state })
}

/// Vx = Vy
pub fn mv(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] = v[usize::from(op.y())];
    Ok(State { v, ..*state })
}

/// Vx |= Vy
pub fn or(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] |= v[usize::from(op.y())];
    Ok(State { v, ..*state })
}

/// Vx &= Vy
pub fn and(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] &= v[usize::from(op.y())];
    Ok(State { v, ..*state })
}

/// Vx ^= Vy
pub fn xor(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] ^= v[usize::from(op.y())];
    Ok(State { v, ..*state })
}

/// Vx += Vy; VF = overflow
pub fn addr(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let (res, over) = state.register(op.x()).overflowing_add(state.register(op.y()));
    set_with_flag(state, op.x(), res, over)
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let (vx, vy) = (state.register(op.x()), state.register(op.y()));
    set_with_flag(state, op.x(), vx.wrapping_sub(vy), vx > vy)
}

/// The operand of a shift: Vy under the COSMAC VIP quirk, otherwise Vx
fn shift_source(op: u16, state: &State, quirks: &Quirks) -> u8 {
    if quirks.shift_reads_vy {
        state.register(op.y())
    } else {
        state.register(op.x())
    }
}

/// Vx >>= 1; VF = the bit shifted out
pub fn shr(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let source = shift_source(op, state, ctx.quirks);
    set_with_flag(state, op.x(), source >> 1, (source & 0x1) == 0x1)
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub fn subn(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let (vx, vy) = (state.register(op.x()), state.register(op.y()));
    set_with_flag(state, op.x(), vy.wrapping_sub(vx), vy > vx)
}

/// Vx <<= 1; VF = the bit shifted out
pub fn shl(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let source = shift_source(op, state, ctx.quirks);
    set_with_flag(state, op.x(), source << 1, ((source >> 7) & 0x1) == 0x1)
}

/// if Vx != Vy then pc +=2
pub fn skrne(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    skip_if(state, state.register(op.x()) != state.register(op.y()), ctx.quirks)
}

/// I = addr
pub fn loadi(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        i: op.nnn(),
        ..*state
    })
}

/// PC = V0 + addr
/// Under the jump quirk the offset comes from Vx instead, where x is the top nibble of addr
pub fn jumpi(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let offset = if ctx.quirks.jump_offset_uses_vx {
        state.register(op.x())
    } else {
        state.v[0x0]
    };
    let target = usize::from(op.nnn()) + usize::from(offset);
    Ok(State {
        pc: program_counter(target, ctx.quirks.address_mode)?,
        ..*state
    })
}

/// Vx = rand_byte & nn
pub fn rand(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let rand_byte = (ctx.rng.next_u32() & 0xFF) as u8;
    let mut v = state.v;
    v[usize::from(op.x())] = rand_byte & op.nn();
    Ok(State { v, ..*state })
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the FrameBuffer.
/// Sets VF if any pixels would be erased.
/// The frame is only marked for redraw when at least one pixel flipped.
pub fn draw(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let mode = ctx.quirks.address_mode;
    let sprite = (0..usize::from(op.n()))
        .map(|row| state.read_byte(usize::from(state.i) + row, mode))
        .collect::<Result<Vec<u8>, _>>()?;

    let mut frame_buffer = state.frame_buffer;
    let collision = display::draw_sprite(
        &mut frame_buffer,
        state.register(op.x()),
        state.register(op.y()),
        &sprite,
        ctx.quirks.clip_sprites,
    );

    let mut v = state.v;
    v[0xF] = u8::from(collision);
    Ok(State {
        draw_flag: state.draw_flag || frame_buffer != state.frame_buffer,
        v,
        frame_buffer,
        ..*state
    })
}

/// Whether the key named by Vx is down; only its low nibble names a key
fn key_down(op: u16, state: &State, keypad: &Keypad) -> bool {
    keypad[usize::from(state.register(op.x()) & 0xF)]
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    skip_if(state, key_down(op, state, ctx.keypad), ctx.quirks)
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    skip_if(state, !key_down(op, state, ctx.keypad), ctx.quirks)
}

/// Vx = DT
pub fn moved(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    let mut v = state.v;
    v[usize::from(op.x())] = state.delay_timer;
    Ok(State { v, ..*state })
}

/// await keypress for Vx
pub fn keyd(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        run_state: RunState::AwaitingKey { register: op.x() },
        ..*state
    })
}

/// DT = Vx
pub fn loads(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        delay_timer: state.register(op.x()),
        ..*state
    })
}

/// ST = Vx
pub fn ld(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        sound_timer: state.register(op.x()),
        ..*state
    })
}

/// I += Vx
pub fn addi(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        i: state.i.wrapping_add(u16::from(state.register(op.x()))),
        ..*state
    })
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: u16, state: &State, _ctx: &mut Context) -> Result<State, MachineFault> {
    Ok(State {
        i: FONT_START + u16::from(state.register(op.x())) * FONT_GLYPH_SIZE,
        ..*state
    })
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let vx = state.register(op.x());
    let digits = [vx / 100 % 10, vx / 10 % 10, vx % 10];
    let mut next = *state;
    for (offset, digit) in digits.iter().enumerate() {
        next.write_byte(usize::from(state.i) + offset, *digit, ctx.quirks.address_mode)?;
    }
    Ok(next)
}

/// I after a bulk load or store of V0..=Vx
fn index_after_transfer(op: u16, state: &State, quirks: &Quirks) -> u16 {
    if quirks.load_store_advances_index {
        state.i.wrapping_add(u16::from(op.x()) + 1)
    } else {
        state.i
    }
}

/// mem[I..=I+x] = V0..=Vx
/// Fill memory starting at address i with V0..=Vx
pub fn stor(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let mut next = *state;
    for x in 0..=usize::from(op.x()) {
        next.write_byte(usize::from(state.i) + x, state.v[x], ctx.quirks.address_mode)?;
    }
    next.i = index_after_transfer(op, state, ctx.quirks);
    Ok(next)
}

/// V0..=Vx = mem[I..=I+x]
/// Fill V0..=Vx with memory starting at address i
pub fn read(op: u16, state: &State, ctx: &mut Context) -> Result<State, MachineFault> {
    let mut next = *state;
    for x in 0..=usize::from(op.x()) {
        next.v[x] = state.read_byte(usize::from(state.i) + x, ctx.quirks.address_mode)?;
    }
    next.i = index_after_transfer(op, state, ctx.quirks);
    Ok(next)
}
