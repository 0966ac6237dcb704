//! Single-bit operations: BTST, BCHG, BCLR, BSET.
//!
//! The bit number comes from a data register (masked to 0-31) or from an
//! extension word (masked to 0-7 for memory operands). Z always reflects
//! the bit's state before any mutation; the other flags are untouched.

use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::flags::Z;
use crate::instruction::{Instruction, Operation};

impl Cpu68000 {
    pub(crate) fn exec_bit_op<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        // The bit number is consumed before the EA extension words.
        let number = if i.from_reg {
            self.regs.d[i.reg as usize]
        } else {
            u32::from(self.fetch_ext_word(bus))
        };
        // Long on a data register (bit 0-31), byte in memory (bit 0-7).
        let bit = number % i.size.bits();
        let bit_mask = 1u32 << bit;

        let (dst_op, value) = self.load_ea(bus, dst, i.size)?;
        self.regs.sr.set(Z, value & bit_mask == 0);

        let result = match i.op {
            Operation::Btst => return Ok(()),
            Operation::Bchg => value ^ bit_mask,
            Operation::Bclr => value & !bit_mask,
            _ => value | bit_mask,
        };
        self.write_operand(bus, dst_op, i.size, result)
    }
}
