//! Logical operations: AND/OR/EOR with their immediate forms, the
//! CCR/SR immediate forms, NOT, CLR, TST and TAS.
//!
//! All of these clear V and C and update N/Z from the result; none touch
//! X. The CCR/SR forms bypass the flag rule and rewrite the register
//! bits directly.

use crate::alu::Size;
use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::flags::Status;
use crate::instruction::{Instruction, Operation};

impl Cpu68000 {
    /// AND/OR/EOR and their immediate forms share one shape: fetch both
    /// operands, combine, write back through the destination.
    pub(crate) fn exec_logical<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let (Some(src), Some(dst)) = (i.src, i.dst) else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, s) = self.load_ea(bus, src, i.size)?;
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let result = match i.op {
            Operation::And | Operation::Andi => d & s,
            Operation::Or | Operation::Ori => d | s,
            _ => d ^ s,
        };
        self.regs.sr.update_nz(result, i.size);
        self.regs.sr.clear_vc();
        self.write_operand(bus, dst_op, i.size, result)
    }

    /// ANDI/ORI/EORI to CCR: combine the immediate with the flag byte.
    pub(crate) fn exec_imm_to_ccr<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let imm = (self.fetch_ext_word(bus) & 0xFF) as u8;
        let ccr = self.regs.sr.ccr();
        let result = match i.op {
            Operation::AndiToCcr => ccr & imm,
            Operation::OriToCcr => ccr | imm,
            _ => ccr ^ imm,
        };
        self.regs.sr.set_ccr(result);
        Ok(())
    }

    /// ANDI/ORI/EORI to SR: privileged, rewrites the whole register.
    pub(crate) fn exec_imm_to_sr<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let imm = self.fetch_ext_word(bus);
        let sr = self.regs.sr.bits();
        let result = match i.op {
            Operation::AndiToSr => sr & imm,
            Operation::OriToSr => sr | imm,
            _ => sr ^ imm,
        };
        self.regs.sr = Status::from_bits(result);
        Ok(())
    }

    pub(crate) fn exec_not<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let result = !d & i.size.mask();
        self.regs.sr.update_nz(result, i.size);
        self.regs.sr.clear_vc();
        self.write_operand(bus, dst_op, i.size, result)
    }

    /// CLR always leaves Z set, N/V/C clear.
    pub(crate) fn exec_clr<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let dst_op = self.resolve_ea(bus, dst, i.size)?;
        self.regs.sr.update_nz(0, i.size);
        self.regs.sr.clear_vc();
        self.write_operand(bus, dst_op, i.size, 0)
    }

    pub(crate) fn exec_tst<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, d) = self.load_ea(bus, dst, i.size)?;
        self.regs.sr.update_nz(d, i.size);
        self.regs.sr.clear_vc();
        Ok(())
    }

    /// TAS: test the byte, then set its top bit in one indivisible
    /// read-modify-write.
    pub(crate) fn exec_tas<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (dst_op, d) = self.load_ea(bus, dst, Size::Byte)?;
        self.regs.sr.update_nz(d, Size::Byte);
        self.regs.sr.clear_vc();
        self.write_operand(bus, dst_op, Size::Byte, d | 0x80)
    }
}
