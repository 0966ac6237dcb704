//! Shift and rotate family: ASL/ASR, LSL/LSR, ROL/ROR, ROXL/ROXR.
//!
//! The count comes from a data register (masked to 6 bits, so up to 63)
//! or an immediate 1-8; the memory form shifts a word by exactly one.
//! Shifting is done one step at a time: it keeps the flag semantics
//! honest (ASL's V watches the sign bit on every step, ROX rotates
//! through a 9/17/33-bit ring) and it matches the 2-cycles-per-step cost
//! the hardware charges.

use crate::alu::Size;
use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::flags::{C, Status, V, X};
use crate::instruction::{Instruction, Operation};

impl Cpu68000 {
    pub(crate) fn exec_shift<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let count = if i.from_reg {
            (self.regs.d[i.reg as usize] & 0x3F) as u32
        } else {
            u32::from(i.quick)
        };
        let (dst_op, value) = self.load_ea(bus, dst, i.size)?;
        self.timing.add_cycles(2 * count);
        let (result, st) = shift(i.op, value, count, i.size, self.regs.sr);
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }
}

/// Apply one shift/rotate operation, one step at a time.
///
/// Flag rules: N/Z always follow the result; C takes the last bit shifted
/// out (cleared for zero counts, except ROXL/ROXR where it mirrors X);
/// X follows C for shifts and ROX rotates but is untouched by ROL/ROR;
/// ASL sets V if the sign bit changed at any point.
fn shift(op: Operation, value: u32, count: u32, size: Size, status: Status) -> (u32, Status) {
    let mask = size.mask();
    let sign = size.sign_bit();
    let mut st = status;
    let mut v = value & mask;

    if count == 0 {
        st.update_nz(v, size);
        st.set(V, false);
        match op {
            // Zero-count ROX still copies X into C.
            Operation::Roxl | Operation::Roxr => {
                let x = st.contains(X);
                st.set(C, x);
            }
            _ => st.set(C, false),
        }
        return (v, st);
    }

    let mut carry = false;
    let mut overflow = false;
    for _ in 0..count {
        match op {
            Operation::Asl | Operation::Lsl => {
                carry = v & sign != 0;
                let shifted = (v << 1) & mask;
                if op == Operation::Asl && (v ^ shifted) & sign != 0 {
                    overflow = true;
                }
                v = shifted;
            }
            Operation::Lsr => {
                carry = v & 1 != 0;
                v >>= 1;
            }
            Operation::Asr => {
                carry = v & 1 != 0;
                v = (v >> 1 | (v & sign)) & mask;
            }
            Operation::Rol => {
                carry = v & sign != 0;
                v = ((v << 1) | u32::from(carry)) & mask;
            }
            Operation::Ror => {
                carry = v & 1 != 0;
                v = (v >> 1) | if carry { sign } else { 0 };
            }
            Operation::Roxl => {
                carry = v & sign != 0;
                v = ((v << 1) | u32::from(st.contains(X))) & mask;
                st.set(X, carry);
            }
            Operation::Roxr => {
                carry = v & 1 != 0;
                v = (v >> 1) | if st.contains(X) { sign } else { 0 };
                st.set(X, carry);
            }
            _ => unreachable!("non-shift operation in shift dispatch"),
        }
    }

    st.update_nz(v, size);
    st.set(C, carry);
    match op {
        // Plain rotates leave X alone; ROX already tracked it per step.
        Operation::Rol | Operation::Ror | Operation::Roxl | Operation::Roxr => {}
        _ => st.set(X, carry),
    }
    st.set(V, op == Operation::Asl && overflow);
    (v, st)
}

#[cfg(test)]
mod tests {
    use super::shift;
    use crate::alu::Size;
    use crate::flags::{C, N, Status, V, X, Z};
    use crate::instruction::Operation;

    #[test]
    fn lsl_shifts_out_through_carry_and_extend() {
        let (result, st) = shift(Operation::Lsl, 0x8001, 1, Size::Word, Status::default());
        assert_eq!(result, 0x0002);
        assert!(st.contains(C) && st.contains(X));
        assert!(!st.contains(V));
    }

    #[test]
    fn asl_sets_v_on_any_sign_change() {
        // 0b0100_0000 << 2: the sign bit flips on the second step.
        let (result, st) = shift(Operation::Asl, 0x40, 2, Size::Byte, Status::default());
        assert_eq!(result, 0x00);
        assert!(st.contains(V));
        assert!(st.contains(Z));
        // A shift that never crosses the sign bit keeps V clear.
        let (_, st) = shift(Operation::Asl, 0x01, 2, Size::Byte, Status::default());
        assert!(!st.contains(V));
    }

    #[test]
    fn asr_preserves_the_sign() {
        let (result, st) = shift(Operation::Asr, 0x80, 2, Size::Byte, Status::default());
        assert_eq!(result, 0xE0);
        assert!(st.contains(N));
        assert!(!st.contains(C));
    }

    #[test]
    fn rotates_wrap_without_touching_extend() {
        let mut st0 = Status::default();
        st0.set(X, true);
        let (result, st) = shift(Operation::Ror, 0x01, 1, Size::Byte, st0);
        assert_eq!(result, 0x80);
        assert!(st.contains(C));
        assert!(st.contains(X), "ROR must not touch X");
    }

    #[test]
    fn rox_rotates_through_extend() {
        let mut st0 = Status::default();
        st0.set(X, true);
        // ROXL.B: 9-bit ring (X:value). 0x00 with X=1 -> value 0x01, X=0.
        let (result, st) = shift(Operation::Roxl, 0x00, 1, Size::Byte, st0);
        assert_eq!(result, 0x01);
        assert!(!st.contains(X));
        assert!(!st.contains(C));
    }

    #[test]
    fn zero_count_clears_carry_but_keeps_value() {
        let mut st0 = Status::default();
        st0.set(C, true);
        let (result, st) = shift(Operation::Lsr, 0xAB, 0, Size::Byte, st0);
        assert_eq!(result, 0xAB);
        assert!(!st.contains(C));
        // ROX with zero count copies X into C instead.
        let mut st0 = Status::default();
        st0.set(X, true);
        let (_, st) = shift(Operation::Roxr, 0xAB, 0, Size::Byte, st0);
        assert!(st.contains(C));
    }

    #[test]
    fn counts_beyond_the_width_drain_the_value() {
        let (result, st) = shift(Operation::Lsl, 0xFF, 9, Size::Byte, Status::default());
        assert_eq!(result, 0);
        assert!(!st.contains(C), "the last bit out of an empty value is 0");
        assert!(st.contains(Z));
    }
}
