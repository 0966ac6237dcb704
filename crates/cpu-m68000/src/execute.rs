//! Executor dispatch.
//!
//! One exhaustive match over the operation enum routes each decoded
//! instruction to its family module. The compiler checks that every
//! operation has an arm; adding a variant without an implementation is a
//! build error, not a runtime hole.

use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::instruction::{Instruction, Operation};

impl Cpu68000 {
    /// Execute one decoded instruction. Returns `Err` for every
    /// condition that must dispatch as an exception.
    pub(crate) fn execute<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        match i.op {
            // Data movement
            Operation::Move => self.exec_move(bus, i),
            Operation::Movea => self.exec_movea(bus, i),
            Operation::Moveq => self.exec_moveq(i),
            Operation::MoveToCcr => self.exec_move_to_ccr(bus, i),
            Operation::MoveToSr => self.exec_move_to_sr(bus, i),
            Operation::MoveFromSr => self.exec_move_from_sr(bus, i),
            Operation::MoveUsp => self.exec_move_usp(i),
            Operation::Movem => self.exec_movem(bus, i),
            Operation::Movep => self.exec_movep(bus, i),
            Operation::Lea => self.exec_lea(bus, i),
            Operation::Pea => self.exec_pea(bus, i),
            Operation::Exg => self.exec_exg(i),
            Operation::Swap => self.exec_swap(i),
            Operation::Ext => self.exec_ext(i),
            Operation::Link => self.exec_link(bus, i),
            Operation::Unlk => self.exec_unlk(bus, i),

            // Integer arithmetic
            Operation::Add | Operation::Addi => self.exec_add(bus, i),
            Operation::Adda => self.exec_adda(bus, i),
            Operation::Addq => self.exec_addq(bus, i),
            Operation::Addx => self.exec_addx(bus, i),
            Operation::Sub | Operation::Subi => self.exec_sub(bus, i),
            Operation::Suba => self.exec_suba(bus, i),
            Operation::Subq => self.exec_subq(bus, i),
            Operation::Subx => self.exec_subx(bus, i),
            Operation::Cmp | Operation::Cmpi | Operation::Cmpm => self.exec_cmp(bus, i),
            Operation::Cmpa => self.exec_cmpa(bus, i),
            Operation::Neg => self.exec_neg(bus, i),
            Operation::Negx => self.exec_negx(bus, i),
            Operation::Mulu | Operation::Muls => self.exec_mul(bus, i),
            Operation::Divu | Operation::Divs => self.exec_div(bus, i),
            Operation::Abcd | Operation::Sbcd => self.exec_bcd(bus, i),
            Operation::Nbcd => self.exec_nbcd(bus, i),

            // Logic
            Operation::And | Operation::Andi => self.exec_logical(bus, i),
            Operation::Or | Operation::Ori => self.exec_logical(bus, i),
            Operation::Eor | Operation::Eori => self.exec_logical(bus, i),
            Operation::AndiToCcr | Operation::OriToCcr | Operation::EoriToCcr => {
                self.exec_imm_to_ccr(bus, i)
            }
            Operation::AndiToSr | Operation::OriToSr | Operation::EoriToSr => {
                self.exec_imm_to_sr(bus, i)
            }
            Operation::Not => self.exec_not(bus, i),
            Operation::Clr => self.exec_clr(bus, i),
            Operation::Tst => self.exec_tst(bus, i),
            Operation::Tas => self.exec_tas(bus, i),

            // Bit manipulation
            Operation::Btst | Operation::Bchg | Operation::Bclr | Operation::Bset => {
                self.exec_bit_op(bus, i)
            }

            // Shifts and rotates
            Operation::Asl
            | Operation::Asr
            | Operation::Lsl
            | Operation::Lsr
            | Operation::Rol
            | Operation::Ror
            | Operation::Roxl
            | Operation::Roxr => self.exec_shift(bus, i),

            // Control flow
            Operation::Jmp => self.exec_jmp(bus, i),
            Operation::Jsr => self.exec_jsr(bus, i),
            Operation::Rts => self.exec_rts(bus),
            Operation::Rtr => self.exec_rtr(bus),
            Operation::Rte => self.exec_rte(bus),
            Operation::Bra | Operation::Bsr | Operation::Bcc => self.exec_branch(bus, i),
            Operation::Dbcc => self.exec_dbcc(bus, i),
            Operation::Scc => self.exec_scc(bus, i),

            // System
            Operation::Chk => self.exec_chk(bus, i),
            Operation::Stop => self.exec_stop(bus),
            Operation::Reset => {
                bus.reset();
                Ok(())
            }
            Operation::Trap => Err(Fault::Trap(i.quick)),
            Operation::Trapv => {
                if self.regs.sr.is_overflow() {
                    Err(Fault::Overflow)
                } else {
                    Ok(())
                }
            }
            Operation::Nop => Ok(()),
            Operation::Illegal => Err(Fault::Illegal(i.opcode)),
        }
    }
}
