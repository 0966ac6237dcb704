//! Control transfer: jumps, subroutine calls, returns, conditional
//! branches, DBcc loops and Scc, plus the stack helpers they share.
//!
//! Every transfer to an odd address surfaces as an address error before
//! PC moves, matching the failure policy of the memory path.

use crate::alu::Size;
use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::flags::Status;
use crate::instruction::{Instruction, Operation};

impl Cpu68000 {
    /// Push a long onto the active stack.
    pub(crate) fn push_long<B: MemoryBus>(&mut self, bus: &mut B, value: u32) -> ExecResult<()> {
        let sp = self.regs.push_long();
        self.write_mem(bus, sp, Size::Long, value)
    }

    /// Pop a long from the active stack.
    pub(crate) fn pop_long<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<u32> {
        let sp = self.regs.pop_long();
        self.read_mem(bus, sp, Size::Long)
    }

    /// Pop a word from the active stack.
    pub(crate) fn pop_word<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<u32> {
        let sp = self.regs.pop_word();
        self.read_mem(bus, sp, Size::Word)
    }

    /// Redirect PC, faulting on odd targets before anything moves.
    fn set_pc_checked(&mut self, target: u32) -> ExecResult<()> {
        if target & 1 != 0 {
            return Err(Fault::AddressError { address: target, read: true });
        }
        self.regs.pc = target;
        Ok(())
    }

    /// BRA, BSR and Bcc. The displacement base is the word after the
    /// opcode; an inline displacement of zero means a 16-bit displacement
    /// word follows.
    pub(crate) fn exec_branch<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let base = self.regs.pc;
        let disp = if i.quick == 0 {
            self.fetch_ext_word(bus) as i16 as i32
        } else {
            i.quick as i8 as i32
        };
        let target = base.wrapping_add(disp as u32);

        let taken = match i.op {
            Operation::Bra => true,
            Operation::Bsr => {
                let return_addr = self.regs.pc;
                self.push_long(bus, return_addr)?;
                true
            }
            _ => self.regs.sr.condition(i.condition),
        };
        if taken {
            self.timing.add_cycles(2);
            self.set_pc_checked(target)?;
        }
        Ok(())
    }

    /// DBcc: condition true falls through; otherwise decrement the
    /// counter word and loop until it expires at -1.
    pub(crate) fn exec_dbcc<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let base = self.regs.pc;
        let disp = self.fetch_ext_word(bus) as i16 as i32;
        if self.regs.sr.condition(i.condition) {
            return Ok(());
        }
        let n = i.reg2 as usize;
        let counter = (self.regs.d_sized(n, Size::Word) as u16).wrapping_sub(1);
        self.regs.set_d_sized(n, u32::from(counter), Size::Word);
        if counter != 0xFFFF {
            self.set_pc_checked(base.wrapping_add(disp as u32))?;
        } else {
            self.timing.add_cycles(4);
        }
        Ok(())
    }

    /// Scc: all ones or all zeros into a byte destination.
    pub(crate) fn exec_scc<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let dst_op = self.resolve_ea(bus, dst, Size::Byte)?;
        let value = if self.regs.sr.condition(i.condition) {
            self.timing.add_cycles(2);
            0xFF
        } else {
            0x00
        };
        self.write_operand(bus, dst_op, Size::Byte, value)
    }

    pub(crate) fn exec_jmp<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let target = self.resolve_control(bus, src)?;
        self.set_pc_checked(target)
    }

    pub(crate) fn exec_jsr<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let target = self.resolve_control(bus, src)?;
        let return_addr = self.regs.pc;
        self.push_long(bus, return_addr)?;
        self.set_pc_checked(target)
    }

    pub(crate) fn exec_rts<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<()> {
        let target = self.pop_long(bus)?;
        self.set_pc_checked(target)
    }

    /// RTR: restore CCR (word popped, low byte taken), then PC.
    pub(crate) fn exec_rtr<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<()> {
        let ccr = self.pop_word(bus)?;
        self.regs.sr.set_ccr(ccr as u8);
        let target = self.pop_long(bus)?;
        self.set_pc_checked(target)
    }

    /// RTE: pop SR then PC, the exact inverse of the dispatch frame.
    /// Both words come off the supervisor stack before the popped SR is
    /// installed, because installing it may drop to user mode and switch
    /// the active stack pointer.
    pub(crate) fn exec_rte<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<()> {
        let sr = self.pop_word(bus)?;
        let target = self.pop_long(bus)?;
        self.regs.sr = Status::from_bits(sr as u16);
        self.exceptions.complete_highest();
        self.set_pc_checked(target)
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::MemoryBus;
    use crate::cpu::Cpu68000;

    struct FlatBus {
        mem: Vec<u8>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self { mem: vec![0; 0x1_0000] }
        }

        fn load_words(&mut self, address: u32, words: &[u16]) {
            for (n, word) in words.iter().enumerate() {
                let at = address as usize + n * 2;
                self.mem[at] = (word >> 8) as u8;
                self.mem[at + 1] = *word as u8;
            }
        }
    }

    impl MemoryBus for FlatBus {
        fn read_byte(&mut self, address: u32) -> u8 {
            self.mem.get(address as usize).copied().unwrap_or(0xFF)
        }

        fn write_byte(&mut self, address: u32, value: u8) {
            if let Some(slot) = self.mem.get_mut(address as usize) {
                *slot = value;
            }
        }
    }

    fn cpu_at(pc: u32) -> Cpu68000 {
        let mut cpu = Cpu68000::new();
        cpu.regs.pc = pc;
        cpu.regs.ssp = 0x8000;
        cpu
    }

    #[test]
    fn bsr_then_rts_round_trips() {
        let mut bus = FlatBus::new();
        // 0x1000: BSR.B +4 (to 0x1006); 0x1006: RTS.
        bus.load_words(0x1000, &[0x6104]);
        bus.load_words(0x1006, &[0x4E75]);
        let mut cpu = cpu_at(0x1000);
        let sp_before = cpu.regs.active_sp();

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1006);
        assert_eq!(cpu.regs.active_sp(), sp_before - 4);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1002, "RTS returns to after the BSR");
        assert_eq!(cpu.regs.active_sp(), sp_before, "push/pop symmetry");
    }

    #[test]
    fn bcc_word_displacement_form() {
        let mut bus = FlatBus::new();
        // BEQ.W +0x100 with Z clear: falls through to 0x1004.
        bus.load_words(0x1000, &[0x6700, 0x0100]);
        let mut cpu = cpu_at(0x1000);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1004);

        // With Z set: branches to 0x1002 + 0x100.
        let mut cpu = cpu_at(0x1000);
        cpu.regs.sr.set(crate::flags::Z, true);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1102);
    }

    #[test]
    fn dbcc_loops_until_minus_one() {
        let mut bus = FlatBus::new();
        // 0x1000: DBRA D0,-2 (back to 0x1000). Condition F never passes.
        bus.load_words(0x1000, &[0x51C8, 0xFFFE]);
        let mut cpu = cpu_at(0x1000);
        cpu.regs.d[0] = 2;

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1000, "counter 2 -> 1, loops");
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1000, "counter 1 -> 0, loops");
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1004, "counter expires at -1");
        assert_eq!(cpu.regs.d[0] & 0xFFFF, 0xFFFF);
    }

    #[test]
    fn jmp_to_odd_address_raises_address_error() {
        let mut bus = FlatBus::new();
        // Vector 3 (address error) -> handler at 0x4000.
        bus.load_words(0x000C, &[0x0000, 0x4000]);
        // JMP 0x2001 (absolute long, odd).
        bus.load_words(0x1000, &[0x4EF9, 0x0000, 0x2001]);
        let mut cpu = cpu_at(0x1000);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x4000, "dispatched to the handler");
        assert_eq!(cpu.exceptions().stats().raised, 1);
    }
}
