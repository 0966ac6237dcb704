//! The instruction decoder.
//!
//! [`decode`] is a pure function of the 16-bit opcode: no memory access,
//! no side effects. Extension words are consumed later, by the effective
//! address resolver, but the descriptor already knows how many there are,
//! so the encoded length comes out of the decoder together with the
//! descriptor.
//!
//! Group ordering matters: where instruction families share a prefix the
//! narrower pattern is matched first (MOVEA inside MOVE, CMPM inside the
//! CMP/EOR group, ABCD/EXG/MULU carved out of the AND group, and so on).
//! Anything that survives no pattern decodes to `Illegal`, which the
//! executor converts to an exception rather than a crash.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::instruction::{Instruction, Operation, TimingInfo};

/// Decode the standard EA field (mode bits 3-5, register bits 0-2).
fn ea_field(opcode: u16) -> Option<AddrMode> {
    AddrMode::decode(((opcode >> 3) & 7) as u8, (opcode & 7) as u8)
}

/// Decode one opcode into an instruction descriptor.
#[must_use]
pub fn decode(opcode: u16) -> Instruction {
    let mut i = Instruction::illegal(opcode);

    match opcode >> 12 {
        0x0 => decode_group_0(opcode, &mut i),
        0x1 | 0x2 | 0x3 => decode_move(opcode, &mut i),
        0x4 => decode_group_4(opcode, &mut i),
        0x5 => decode_group_5(opcode, &mut i),
        0x6 => {
            i.condition = ((opcode >> 8) & 0x0F) as u8;
            i.quick = (opcode & 0xFF) as u8;
            i.op = match i.condition {
                0 => Operation::Bra,
                1 => Operation::Bsr,
                _ => Operation::Bcc,
            };
        }
        0x7 => {
            if opcode & 0x0100 == 0 {
                i.op = Operation::Moveq;
                i.size = Size::Long;
                i.quick = (opcode & 0xFF) as u8;
            }
        }
        0x8 => decode_group_8(opcode, &mut i),
        0x9 | 0xD => decode_add_sub(opcode, &mut i),
        0xB => decode_group_b(opcode, &mut i),
        0xC => decode_group_c(opcode, &mut i),
        0xE => decode_shifts(opcode, &mut i),
        // 0xA and 0xF: unimplemented line A / line F patterns. The
        // executor raises the matching vector based on the top nibble.
        _ => {}
    }

    finish(i)
}

/// Bit manipulation, MOVEP and the immediate family.
fn decode_group_0(opcode: u16, i: &mut Instruction) {
    // MOVEP: data register <-> alternating bytes at d16(An).
    if opcode & 0x0138 == 0x0108 {
        i.op = Operation::Movep;
        i.size = if opcode & 0x0040 != 0 { Size::Long } else { Size::Word };
        i.quick = ((opcode >> 7) & 1) as u8; // 1 = register to memory
        return;
    }

    // Dynamic bit operations: bit number in a data register.
    if opcode & 0x0100 != 0 {
        let Some(dst) = ea_field(opcode) else { return };
        let op = bit_operation(opcode);
        // BTST only reads, so it also takes the non-alterable modes.
        let valid = if op == Operation::Btst {
            !matches!(dst, AddrMode::AddrReg(_))
        } else {
            dst.is_data_alterable()
        };
        if !valid {
            return;
        }
        i.op = op;
        i.from_reg = true;
        i.dst = Some(dst);
        i.size = bit_op_size(dst);
        return;
    }

    // Static bit operations: bit number in an extension word.
    if opcode & 0xFF00 == 0x0800 {
        let Some(dst) = ea_field(opcode) else { return };
        let op = bit_operation(opcode);
        let valid = if op == Operation::Btst {
            !matches!(dst, AddrMode::AddrReg(_) | AddrMode::Immediate)
        } else {
            dst.is_data_alterable()
        };
        if !valid {
            return;
        }
        i.op = op;
        i.from_reg = false;
        i.dst = Some(dst);
        i.size = bit_op_size(dst);
        return;
    }

    // Immediate to CCR/SR special forms hide under the immediate group.
    match opcode {
        0x003C => {
            i.op = Operation::OriToCcr;
            i.size = Size::Byte;
            return;
        }
        0x007C => {
            i.op = Operation::OriToSr;
            return;
        }
        0x023C => {
            i.op = Operation::AndiToCcr;
            i.size = Size::Byte;
            return;
        }
        0x027C => {
            i.op = Operation::AndiToSr;
            return;
        }
        0x0A3C => {
            i.op = Operation::EoriToCcr;
            i.size = Size::Byte;
            return;
        }
        0x0A7C => {
            i.op = Operation::EoriToSr;
            return;
        }
        _ => {}
    }

    let op = match opcode & 0xFF00 {
        0x0000 => Operation::Ori,
        0x0200 => Operation::Andi,
        0x0400 => Operation::Subi,
        0x0600 => Operation::Addi,
        0x0A00 => Operation::Eori,
        0x0C00 => Operation::Cmpi,
        _ => return,
    };
    let Some(size) = Size::from_bits(((opcode >> 6) & 3) as u8) else {
        return;
    };
    let Some(dst) = ea_field(opcode) else { return };
    if !dst.is_data_alterable() {
        return;
    }
    i.op = op;
    i.size = size;
    i.src = Some(AddrMode::Immediate);
    i.dst = Some(dst);
}

/// MOVE and MOVEA share the three move nibbles; destination mode 1 is the
/// narrower MOVEA pattern and wins.
fn decode_move(opcode: u16, i: &mut Instruction) {
    let Some(size) = Size::from_move_bits((opcode >> 12) as u8) else {
        return;
    };
    let Some(src) = ea_field(opcode) else { return };
    let Some(dst) = AddrMode::decode(((opcode >> 6) & 7) as u8, ((opcode >> 9) & 7) as u8) else {
        return;
    };
    if matches!(src, AddrMode::AddrReg(_)) && size == Size::Byte {
        return;
    }
    if let AddrMode::AddrReg(_) = dst {
        if size == Size::Byte {
            return;
        }
        i.op = Operation::Movea;
    } else {
        if !dst.is_data_alterable() {
            return;
        }
        i.op = Operation::Move;
    }
    i.size = size;
    i.src = Some(src);
    i.dst = Some(dst);
}

/// The miscellaneous group: single-operand ALU ops, MOVE SR/CCR/USP,
/// MOVEM, stack frame ops and the 0x4E system block.
fn decode_group_4(opcode: u16, i: &mut Instruction) {
    // CHK and LEA claim the 1x0/111 opmode slots of every register row.
    if opcode & 0xF1C0 == 0x4180 {
        if let Some(src) = ea_field(opcode)
            && !matches!(src, AddrMode::AddrReg(_))
        {
            i.op = Operation::Chk;
            i.src = Some(src);
        }
        return;
    }
    if opcode & 0xF1C0 == 0x41C0 {
        if let Some(src) = ea_field(opcode)
            && src.is_control()
        {
            i.op = Operation::Lea;
            i.size = Size::Long;
            i.src = Some(src);
        }
        return;
    }

    match opcode & 0xFF00 {
        0x4000 | 0x4200 | 0x4400 | 0x4600 => {
            let size_bits = ((opcode >> 6) & 3) as u8;
            if size_bits == 3 {
                // MOVE from SR / to CCR / to SR occupy the size-11 slot.
                let Some(ea) = ea_field(opcode) else { return };
                match opcode & 0xFF00 {
                    0x4000 => {
                        if ea.is_data_alterable() {
                            i.op = Operation::MoveFromSr;
                            i.dst = Some(ea);
                        }
                    }
                    0x4400 => {
                        if !matches!(ea, AddrMode::AddrReg(_)) {
                            i.op = Operation::MoveToCcr;
                            i.src = Some(ea);
                        }
                    }
                    0x4600 => {
                        if !matches!(ea, AddrMode::AddrReg(_)) {
                            i.op = Operation::MoveToSr;
                            i.src = Some(ea);
                        }
                    }
                    // 0x42C0 (MOVE from CCR) arrived with the 68010.
                    _ => {}
                }
                return;
            }
            let Some(size) = Size::from_bits(size_bits) else { return };
            let Some(dst) = ea_field(opcode) else { return };
            if !dst.is_data_alterable() {
                return;
            }
            i.op = match opcode & 0xFF00 {
                0x4000 => Operation::Negx,
                0x4200 => Operation::Clr,
                0x4400 => Operation::Neg,
                _ => Operation::Not,
            };
            i.size = size;
            i.dst = Some(dst);
        }
        0x4800 => decode_group_48(opcode, i),
        0x4A00 => {
            let size_bits = ((opcode >> 6) & 3) as u8;
            if size_bits == 3 {
                // TAS, except 0x4AFC which is the dedicated ILLEGAL opcode.
                if opcode != 0x4AFC
                    && let Some(dst) = ea_field(opcode)
                    && dst.is_data_alterable()
                {
                    i.op = Operation::Tas;
                    i.size = Size::Byte;
                    i.dst = Some(dst);
                }
                return;
            }
            let Some(size) = Size::from_bits(size_bits) else { return };
            let Some(dst) = ea_field(opcode) else { return };
            if matches!(dst, AddrMode::AddrReg(_) | AddrMode::Immediate) {
                return;
            }
            i.op = Operation::Tst;
            i.size = size;
            i.dst = Some(dst);
        }
        0x4C00 => {
            // MOVEM memory to registers.
            let size = match opcode & 0xFFC0 {
                o if o == 0x4C80 => Size::Word,
                o if o == 0x4CC0 => Size::Long,
                _ => return,
            };
            let Some(src) = ea_field(opcode) else { return };
            if !matches!(
                src,
                AddrMode::AddrInd(_)
                    | AddrMode::PostInc(_)
                    | AddrMode::Disp(_)
                    | AddrMode::Index(_)
                    | AddrMode::AbsShort
                    | AddrMode::AbsLong
                    | AddrMode::PcDisp
                    | AddrMode::PcIndex
            ) {
                return;
            }
            i.op = Operation::Movem;
            i.size = size;
            i.quick = 1; // memory to registers
            i.src = Some(src);
        }
        0x4E00 => decode_group_4e(opcode, i),
        _ => {}
    }
}

/// NBCD, SWAP, PEA, EXT and MOVEM register-to-memory.
fn decode_group_48(opcode: u16, i: &mut Instruction) {
    match opcode & 0xFFF8 {
        0x4840 => {
            i.op = Operation::Swap;
            i.size = Size::Long;
            return;
        }
        0x4880 => {
            i.op = Operation::Ext;
            i.size = Size::Word;
            return;
        }
        0x48C0 => {
            i.op = Operation::Ext;
            i.size = Size::Long;
            return;
        }
        _ => {}
    }
    match opcode & 0xFFC0 {
        0x4800 => {
            if let Some(dst) = ea_field(opcode)
                && dst.is_data_alterable()
            {
                i.op = Operation::Nbcd;
                i.size = Size::Byte;
                i.dst = Some(dst);
            }
        }
        0x4840 => {
            if let Some(src) = ea_field(opcode)
                && src.is_control()
            {
                i.op = Operation::Pea;
                i.size = Size::Long;
                i.src = Some(src);
            }
        }
        0x4880 | 0x48C0 => {
            // MOVEM registers to memory: control alterable or predecrement.
            let Some(dst) = ea_field(opcode) else { return };
            if !matches!(
                dst,
                AddrMode::AddrInd(_)
                    | AddrMode::PreDec(_)
                    | AddrMode::Disp(_)
                    | AddrMode::Index(_)
                    | AddrMode::AbsShort
                    | AddrMode::AbsLong
            ) {
                return;
            }
            i.op = Operation::Movem;
            i.size = if opcode & 0x0040 != 0 { Size::Long } else { Size::Word };
            i.quick = 0; // registers to memory
            i.dst = Some(dst);
        }
        _ => {}
    }
}

/// The 0x4E system block: TRAP, LINK/UNLK, MOVE USP, RESET/NOP/STOP,
/// RTE/RTS/TRAPV/RTR, JSR/JMP.
fn decode_group_4e(opcode: u16, i: &mut Instruction) {
    match opcode {
        0x4E70 => {
            i.op = Operation::Reset;
            return;
        }
        0x4E71 => {
            i.op = Operation::Nop;
            return;
        }
        0x4E72 => {
            i.op = Operation::Stop;
            return;
        }
        0x4E73 => {
            i.op = Operation::Rte;
            return;
        }
        0x4E75 => {
            i.op = Operation::Rts;
            return;
        }
        0x4E76 => {
            i.op = Operation::Trapv;
            return;
        }
        0x4E77 => {
            i.op = Operation::Rtr;
            return;
        }
        _ => {}
    }
    if opcode & 0xFFF0 == 0x4E40 {
        i.op = Operation::Trap;
        i.quick = (opcode & 0x0F) as u8;
        return;
    }
    match opcode & 0xFFF8 {
        0x4E50 => {
            i.op = Operation::Link;
            return;
        }
        0x4E58 => {
            i.op = Operation::Unlk;
            return;
        }
        0x4E60 => {
            i.op = Operation::MoveUsp;
            i.quick = 0; // An to USP
            i.size = Size::Long;
            return;
        }
        0x4E68 => {
            i.op = Operation::MoveUsp;
            i.quick = 1; // USP to An
            i.size = Size::Long;
            return;
        }
        _ => {}
    }
    match opcode & 0xFFC0 {
        0x4E80 | 0x4EC0 => {
            if let Some(src) = ea_field(opcode)
                && src.is_control()
            {
                i.op = if opcode & 0x0040 != 0 { Operation::Jmp } else { Operation::Jsr };
                i.src = Some(src);
            }
        }
        _ => {}
    }
}

/// ADDQ, SUBQ, Scc and DBcc.
fn decode_group_5(opcode: u16, i: &mut Instruction) {
    let size_bits = ((opcode >> 6) & 3) as u8;
    if size_bits == 3 {
        i.condition = ((opcode >> 8) & 0x0F) as u8;
        if opcode & 0x0038 == 0x0008 {
            i.op = Operation::Dbcc;
        } else if let Some(dst) = ea_field(opcode)
            && dst.is_data_alterable()
        {
            i.op = Operation::Scc;
            i.size = Size::Byte;
            i.dst = Some(dst);
        }
        return;
    }
    let Some(size) = Size::from_bits(size_bits) else { return };
    let Some(dst) = ea_field(opcode) else { return };
    if matches!(dst, AddrMode::PcDisp | AddrMode::PcIndex | AddrMode::Immediate) {
        return;
    }
    if matches!(dst, AddrMode::AddrReg(_)) && size == Size::Byte {
        return;
    }
    i.op = if opcode & 0x0100 != 0 { Operation::Subq } else { Operation::Addq };
    i.size = size;
    i.dst = Some(dst);
    let count = ((opcode >> 9) & 7) as u8;
    i.quick = if count == 0 { 8 } else { count };
}

/// OR, DIVU/DIVS and SBCD.
fn decode_group_8(opcode: u16, i: &mut Instruction) {
    if opcode & 0x01F0 == 0x0100 {
        i.op = Operation::Sbcd;
        i.size = Size::Byte;
        i.quick = ((opcode >> 3) & 1) as u8; // 1 = -(Ay),-(Ax)
        return;
    }
    let opmode = ((opcode >> 6) & 7) as u8;
    if opmode == 3 || opmode == 7 {
        if let Some(src) = ea_field(opcode)
            && !matches!(src, AddrMode::AddrReg(_))
        {
            i.op = if opmode == 3 { Operation::Divu } else { Operation::Divs };
            i.src = Some(src);
        }
        return;
    }
    decode_dn_ea_alu(opcode, i, Operation::Or);
}

/// ADD/SUB with their ADDA/SUBA and ADDX/SUBX carve-outs.
fn decode_add_sub(opcode: u16, i: &mut Instruction) {
    let is_add = opcode >> 12 == 0xD;
    let opmode = ((opcode >> 6) & 7) as u8;

    if opmode == 3 || opmode == 7 {
        let Some(src) = ea_field(opcode) else { return };
        i.op = if is_add { Operation::Adda } else { Operation::Suba };
        i.size = if opmode == 3 { Size::Word } else { Size::Long };
        i.src = Some(src);
        i.dst = Some(AddrMode::AddrReg(i.reg));
        return;
    }

    // Opmodes 4-6 with EA mode 0/1 are ADDX/SUBX, the narrower pattern.
    if opmode >= 4 && (opcode & 0x0030) == 0 {
        let Some(size) = Size::from_bits(opmode & 3) else { return };
        i.op = if is_add { Operation::Addx } else { Operation::Subx };
        i.size = size;
        i.quick = ((opcode >> 3) & 1) as u8;
        return;
    }

    decode_dn_ea_alu(opcode, i, if is_add { Operation::Add } else { Operation::Sub });
}

/// CMP, CMPA, CMPM and EOR share the 0xB nibble.
fn decode_group_b(opcode: u16, i: &mut Instruction) {
    let opmode = ((opcode >> 6) & 7) as u8;

    if opmode == 3 || opmode == 7 {
        let Some(src) = ea_field(opcode) else { return };
        i.op = Operation::Cmpa;
        i.size = if opmode == 3 { Size::Word } else { Size::Long };
        i.src = Some(src);
        i.dst = Some(AddrMode::AddrReg(i.reg));
        return;
    }

    if opmode >= 4 {
        // CMPM before the wider EOR pattern.
        if opcode & 0x0038 == 0x0008 {
            let Some(size) = Size::from_bits(opmode & 3) else { return };
            i.op = Operation::Cmpm;
            i.size = size;
            i.src = Some(AddrMode::PostInc(i.reg2));
            i.dst = Some(AddrMode::PostInc(i.reg));
            return;
        }
        let Some(size) = Size::from_bits(opmode & 3) else { return };
        let Some(dst) = ea_field(opcode) else { return };
        if !dst.is_data_alterable() {
            return;
        }
        i.op = Operation::Eor;
        i.size = size;
        i.src = Some(AddrMode::DataReg(i.reg));
        i.dst = Some(dst);
        return;
    }

    let Some(size) = Size::from_bits(opmode) else { return };
    let Some(src) = ea_field(opcode) else { return };
    if matches!(src, AddrMode::AddrReg(_)) && size == Size::Byte {
        return;
    }
    i.op = Operation::Cmp;
    i.size = size;
    i.src = Some(src);
    i.dst = Some(AddrMode::DataReg(i.reg));
}

/// AND, MULU/MULS, ABCD and EXG share the 0xC nibble.
fn decode_group_c(opcode: u16, i: &mut Instruction) {
    if opcode & 0x01F0 == 0x0100 {
        i.op = Operation::Abcd;
        i.size = Size::Byte;
        i.quick = ((opcode >> 3) & 1) as u8;
        return;
    }
    match opcode & 0x01F8 {
        0x0140 | 0x0148 | 0x0188 => {
            i.op = Operation::Exg;
            i.size = Size::Long;
            i.quick = ((opcode >> 3) & 0x1F) as u8; // opmode distinguishes the pairing
            return;
        }
        _ => {}
    }
    let opmode = ((opcode >> 6) & 7) as u8;
    if opmode == 3 || opmode == 7 {
        if let Some(src) = ea_field(opcode)
            && !matches!(src, AddrMode::AddrReg(_))
        {
            i.op = if opmode == 3 { Operation::Mulu } else { Operation::Muls };
            i.src = Some(src);
        }
        return;
    }
    decode_dn_ea_alu(opcode, i, Operation::And);
}

/// The shared Dn-and-EA ALU shape: opmodes 0-2 are `ea op Dn -> Dn`,
/// opmodes 4-6 are `Dn op ea -> ea`.
fn decode_dn_ea_alu(opcode: u16, i: &mut Instruction, op: Operation) {
    let opmode = ((opcode >> 6) & 7) as u8;
    let Some(size) = Size::from_bits(opmode & 3) else { return };
    let Some(ea) = ea_field(opcode) else { return };

    let to_register = opmode < 4;
    if to_register {
        // Address register sources only make sense for ADD/SUB/CMP words
        // and longs; the logical ops never take An.
        if matches!(ea, AddrMode::AddrReg(_))
            && (size == Size::Byte || !matches!(op, Operation::Add | Operation::Sub))
        {
            return;
        }
        i.src = Some(ea);
        i.dst = Some(AddrMode::DataReg(i.reg));
    } else {
        if !ea.is_memory_alterable() {
            return;
        }
        i.src = Some(AddrMode::DataReg(i.reg));
        i.dst = Some(ea);
    }
    i.op = op;
    i.size = size;
}

/// Shift and rotate family: register form with a count, or a one-bit
/// memory form.
fn decode_shifts(opcode: u16, i: &mut Instruction) {
    let direction_left = opcode & 0x0100 != 0;
    if opcode & 0x00C0 == 0x00C0 {
        // Bit 11 set here is the 68020 bitfield block, not a shift.
        if opcode & 0x0800 != 0 {
            return;
        }
        // Memory form: one shift of a word.
        let kind = ((opcode >> 9) & 3) as u8;
        let Some(dst) = ea_field(opcode) else { return };
        if !dst.is_memory_alterable() {
            return;
        }
        i.op = shift_operation(kind, direction_left);
        i.size = Size::Word;
        i.dst = Some(dst);
        i.quick = 1;
        return;
    }
    let Some(size) = Size::from_bits(((opcode >> 6) & 3) as u8) else {
        return;
    };
    let kind = ((opcode >> 3) & 3) as u8;
    i.op = shift_operation(kind, direction_left);
    i.size = size;
    i.dst = Some(AddrMode::DataReg(i.reg2));
    i.from_reg = opcode & 0x0020 != 0;
    if !i.from_reg {
        let count = i.reg;
        i.quick = if count == 0 { 8 } else { count };
    }
}

fn shift_operation(kind: u8, left: bool) -> Operation {
    match (kind, left) {
        (0, false) => Operation::Asr,
        (0, true) => Operation::Asl,
        (1, false) => Operation::Lsr,
        (1, true) => Operation::Lsl,
        (2, false) => Operation::Roxr,
        (2, true) => Operation::Roxl,
        (3, false) => Operation::Ror,
        _ => Operation::Rol,
    }
}

fn bit_operation(opcode: u16) -> Operation {
    match (opcode >> 6) & 3 {
        0 => Operation::Btst,
        1 => Operation::Bchg,
        2 => Operation::Bclr,
        _ => Operation::Bset,
    }
}

/// Bit operations are long on a data register, byte anywhere else.
fn bit_op_size(dst: AddrMode) -> Size {
    if matches!(dst, AddrMode::DataReg(_)) { Size::Long } else { Size::Byte }
}

/// Fill in length and the timing annotation once the fields are settled.
fn finish(mut i: Instruction) -> Instruction {
    let mut words = 1u32;
    if let Some(src) = i.src {
        words += src.ext_words(i.size);
    }
    if let Some(dst) = i.dst {
        words += dst.ext_words(i.size);
    }
    words += match i.op {
        Operation::Dbcc | Operation::Link | Operation::Stop | Operation::Movem | Operation::Movep => 1,
        Operation::Bra | Operation::Bsr | Operation::Bcc => u32::from(i.quick == 0),
        Operation::Btst | Operation::Bchg | Operation::Bclr | Operation::Bset => {
            u32::from(!i.from_reg)
        }
        Operation::AndiToCcr
        | Operation::AndiToSr
        | Operation::OriToCcr
        | Operation::OriToSr
        | Operation::EoriToCcr
        | Operation::EoriToSr => 1,
        _ => 0,
    };
    i.length = (words * 2) as u8;

    i.timing = TimingInfo {
        base_cycles: base_cycles(&i),
        is_branch: matches!(
            i.op,
            Operation::Bra
                | Operation::Bsr
                | Operation::Bcc
                | Operation::Dbcc
                | Operation::Jmp
                | Operation::Jsr
                | Operation::Rts
                | Operation::Rte
                | Operation::Rtr
        ),
        privileged: matches!(
            i.op,
            Operation::MoveToSr
                | Operation::MoveUsp
                | Operation::AndiToSr
                | Operation::OriToSr
                | Operation::EoriToSr
                | Operation::Stop
                | Operation::Reset
                | Operation::Rte
        ),
    };
    i
}

/// Base cycle cost per instruction class, before effective-address and
/// memory charges.
fn base_cycles(i: &Instruction) -> u32 {
    let memory_dst = i.dst.is_some_and(AddrMode::is_memory_alterable);
    match i.op {
        Operation::Move | Operation::Movea => {
            if i.size == Size::Long { 8 } else { 4 }
        }
        Operation::Add
        | Operation::Adda
        | Operation::Sub
        | Operation::Suba
        | Operation::And
        | Operation::Or
        | Operation::Eor
        | Operation::Cmp
        | Operation::Cmpa
        | Operation::Cmpm => {
            if memory_dst { 6 } else { 2 }
        }
        Operation::Addi
        | Operation::Subi
        | Operation::Cmpi
        | Operation::Andi
        | Operation::Ori
        | Operation::Eori => 8,
        Operation::AndiToCcr
        | Operation::OriToCcr
        | Operation::EoriToCcr
        | Operation::AndiToSr
        | Operation::OriToSr
        | Operation::EoriToSr => 20,
        Operation::Addq | Operation::Subq | Operation::Addx | Operation::Subx => {
            if memory_dst { 6 } else { 4 }
        }
        Operation::Neg | Operation::Negx | Operation::Not | Operation::Clr | Operation::Tst => {
            if memory_dst { 6 } else { 4 }
        }
        Operation::Mulu => 70,
        Operation::Muls => 74,
        Operation::Divu => 140,
        Operation::Divs => 158,
        Operation::Asl
        | Operation::Asr
        | Operation::Lsl
        | Operation::Lsr
        | Operation::Rol
        | Operation::Ror
        | Operation::Roxl
        | Operation::Roxr => {
            if memory_dst { 8 } else { 6 }
        }
        Operation::Bra | Operation::Bsr | Operation::Bcc => 8,
        Operation::Dbcc => 10,
        Operation::Scc => if memory_dst { 8 } else { 4 },
        Operation::Jmp => 8,
        Operation::Jsr => 16,
        Operation::Rts => 16,
        Operation::Rte | Operation::Rtr => 20,
        Operation::Trap => 34,
        Operation::Trapv => 4,
        Operation::Reset => 132,
        Operation::Link => 16,
        Operation::Unlk => 12,
        Operation::Pea => 12,
        Operation::Lea => 4,
        Operation::Chk => 10,
        Operation::Btst => 4,
        Operation::Bchg | Operation::Bclr | Operation::Bset => 8,
        Operation::Tas => if memory_dst { 10 } else { 4 },
        Operation::Abcd | Operation::Sbcd | Operation::Nbcd => 6,
        Operation::Movem => 12,
        Operation::Movep => {
            if i.size == Size::Long { 24 } else { 16 }
        }
        Operation::MoveToSr | Operation::MoveFromSr | Operation::MoveToCcr => 12,
        Operation::Exg => 6,
        Operation::Moveq
        | Operation::MoveUsp
        | Operation::Swap
        | Operation::Ext
        | Operation::Stop
        | Operation::Nop
        | Operation::Illegal => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::decode;
    use crate::addressing::AddrMode;
    use crate::alu::Size;
    use crate::instruction::Operation;

    #[test]
    fn moveq_zero_to_d0() {
        let i = decode(0x7000);
        assert_eq!(i.op, Operation::Moveq);
        assert_eq!(i.reg, 0);
        assert_eq!(i.quick, 0);
        assert_eq!(i.length, 2);
    }

    #[test]
    fn movea_wins_over_move_on_address_destination() {
        // MOVE.W D1,A2 encodes destination mode 001: MOVEA, not MOVE.
        let i = decode(0x3441);
        assert_eq!(i.op, Operation::Movea);
        assert_eq!(i.dst, Some(AddrMode::AddrReg(2)));
        // Byte-sized MOVEA does not exist.
        assert_eq!(decode(0x1441).op, Operation::Illegal);
    }

    #[test]
    fn add_long_address_source() {
        // ADD.L A1,D0 (0xD089... actually 0xD081 is D1; A1 source is 0xD089).
        let i = decode(0xD089);
        assert_eq!(i.op, Operation::Add);
        assert_eq!(i.size, Size::Long);
        assert_eq!(i.src, Some(AddrMode::AddrReg(1)));
        assert_eq!(i.dst, Some(AddrMode::DataReg(0)));
    }

    #[test]
    fn cmpm_wins_over_eor() {
        // CMPM.B (A1)+,(A2)+ = 0xB509; EOR.B D2,(A1) = 0xB511.
        let i = decode(0xB509);
        assert_eq!(i.op, Operation::Cmpm);
        assert_eq!(i.src, Some(AddrMode::PostInc(1)));
        assert_eq!(i.dst, Some(AddrMode::PostInc(2)));
        assert_eq!(decode(0xB511).op, Operation::Eor);
    }

    #[test]
    fn exg_and_abcd_carved_out_of_and_group() {
        assert_eq!(decode(0xC141).op, Operation::Exg); // EXG D0,D1
        assert_eq!(decode(0xC149).op, Operation::Exg); // EXG A0,A1
        assert_eq!(decode(0xC189).op, Operation::Exg); // EXG D0,A1
        assert_eq!(decode(0xC100).op, Operation::Abcd); // ABCD D0,D0
        assert_eq!(decode(0xC0C0).op, Operation::Mulu); // MULU D0,D0
        assert_eq!(decode(0xC040).op, Operation::And); // AND.W D0,D0
    }

    #[test]
    fn the_dedicated_illegal_opcode_stays_illegal() {
        assert_eq!(decode(0x4AFC).op, Operation::Illegal);
        // Line A and line F patterns decode to Illegal too.
        assert_eq!(decode(0xA000).op, Operation::Illegal);
        assert_eq!(decode(0xFFFF).op, Operation::Illegal);
    }

    #[test]
    fn branch_lengths_follow_displacement_form() {
        assert_eq!(decode(0x6004).length, 2, "8-bit displacement inline");
        assert_eq!(decode(0x6000).length, 4, "word displacement follows");
        assert_eq!(decode(0x6100).op, Operation::Bsr);
        assert_eq!(decode(0x6704).op, Operation::Bcc);
        assert_eq!(decode(0x6704).condition, 7);
    }

    #[test]
    fn immediate_lengths_scale_with_size() {
        // ADDI.W #imm,D3 = 2 opcode + 2 immediate.
        assert_eq!(decode(0x0643).length, 4);
        // ADDI.L #imm,D3.
        assert_eq!(decode(0x0683).length, 6);
        // ADDI.L #imm,(xxx).L.
        assert_eq!(decode(0x06B9).length, 10);
    }

    #[test]
    fn shift_register_and_memory_forms() {
        // LSL.W #3,D1 = 1110 011 1 01 001 001.
        let i = decode(0xE749);
        assert_eq!(i.op, Operation::Lsl);
        assert_eq!(i.quick, 3);
        assert!(!i.from_reg);
        // LSR.W D2,D1: count from register.
        let i = decode(0xE469);
        assert_eq!(i.op, Operation::Lsr);
        assert!(i.from_reg);
        assert_eq!(i.reg, 2);
        // Memory form: LSR.W (A0) = 1110 001 0 11 010 000.
        let i = decode(0xE2D0);
        assert_eq!(i.op, Operation::Lsr);
        assert_eq!(i.dst, Some(AddrMode::AddrInd(0)));
        assert_eq!(i.quick, 1);
    }

    #[test]
    fn group_4e_system_block() {
        assert_eq!(decode(0x4E71).op, Operation::Nop);
        assert_eq!(decode(0x4E75).op, Operation::Rts);
        assert_eq!(decode(0x4E73).op, Operation::Rte);
        assert!(decode(0x4E73).timing.privileged);
        assert_eq!(decode(0x4E41).op, Operation::Trap);
        assert_eq!(decode(0x4E41).quick, 1);
        assert_eq!(decode(0x4E56).op, Operation::Link);
        assert_eq!(decode(0x4E5E).op, Operation::Unlk);
        assert_eq!(decode(0x4ED0).op, Operation::Jmp);
        assert_eq!(decode(0x4E90).op, Operation::Jsr);
    }

    #[test]
    fn bit_ops_decode_both_forms() {
        // BTST D1,(A0) dynamic.
        let i = decode(0x0310);
        assert_eq!(i.op, Operation::Btst);
        assert!(i.from_reg);
        assert_eq!(i.size, Size::Byte);
        // BSET #n,D3 static: long on a data register, +2 bytes for the
        // bit-number word.
        let i = decode(0x08C3);
        assert_eq!(i.op, Operation::Bset);
        assert!(!i.from_reg);
        assert_eq!(i.size, Size::Long);
        assert_eq!(i.length, 4);
    }

    #[test]
    fn movem_directions() {
        // MOVEM.W regs,-(A0) = 0x48A0; MOVEM.L (A0)+,regs = 0x4CD8.
        let i = decode(0x48A0);
        assert_eq!(i.op, Operation::Movem);
        assert_eq!(i.quick, 0);
        assert_eq!(i.dst, Some(AddrMode::PreDec(0)));
        let i = decode(0x4CD8);
        assert_eq!(i.op, Operation::Movem);
        assert_eq!(i.quick, 1);
        assert_eq!(i.src, Some(AddrMode::PostInc(0)));
        assert_eq!(i.size, Size::Long);
    }

    #[test]
    fn status_register_moves() {
        assert_eq!(decode(0x40C0).op, Operation::MoveFromSr);
        assert_eq!(decode(0x44C0).op, Operation::MoveToCcr);
        assert_eq!(decode(0x46C0).op, Operation::MoveToSr);
        assert!(decode(0x46C0).timing.privileged);
        assert!(!decode(0x44C0).timing.privileged);
        assert_eq!(decode(0x027C).op, Operation::AndiToSr);
        assert_eq!(decode(0x023C).op, Operation::AndiToCcr);
    }

    #[test]
    fn addq_count_of_zero_means_eight() {
        let i = decode(0x5040); // ADDQ.W #8,D0
        assert_eq!(i.op, Operation::Addq);
        assert_eq!(i.quick, 8);
        let i = decode(0x5240); // ADDQ.W #1,D0
        assert_eq!(i.quick, 1);
    }

    #[test]
    fn dbcc_and_scc_split_the_size_11_slot() {
        let i = decode(0x51C8); // DBRA D0 (condition F)
        assert_eq!(i.op, Operation::Dbcc);
        assert_eq!(i.condition, 1);
        assert_eq!(i.length, 4);
        let i = decode(0x50C0); // ST D0
        assert_eq!(i.op, Operation::Scc);
        assert_eq!(i.condition, 0);
    }
}
