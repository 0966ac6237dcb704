//! Effective address resolution.
//!
//! Resolving a mode yields an [`Operand`]: a register, a computed memory
//! address, or an immediate value pulled from the instruction stream.
//! Post-increment and pre-decrement mutate their address register as a
//! side effect (byte operations on A7 move it by 2 to keep the stack
//! word-aligned). Every resolution charges the mode's fixed cycle cost
//! into the timing model; register-direct modes are free.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::ExecResult;

/// A resolved operand location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    /// Data register direct.
    DataReg(u8),
    /// Address register direct.
    AddrReg(u8),
    /// A computed memory address.
    Memory(u32),
    /// An immediate value, already consumed from the stream.
    Immediate(u32),
}

/// Post-increment/pre-decrement step: operand size, except byte on A7.
fn step_for(reg: u8, size: Size) -> u32 {
    if reg == 7 && size == Size::Byte { 2 } else { size.bytes() }
}

impl Cpu68000 {
    /// Resolve an addressing mode to an operand location, consuming any
    /// extension words and charging the mode's fixed cost.
    pub(crate) fn resolve_ea<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        mode: AddrMode,
        size: Size,
    ) -> ExecResult<Operand> {
        self.timing.add_cycles(mode.extra_cycles());
        Ok(match mode {
            AddrMode::DataReg(r) => Operand::DataReg(r),
            AddrMode::AddrReg(r) => Operand::AddrReg(r),
            AddrMode::AddrInd(r) => Operand::Memory(self.regs.a(r as usize)),
            AddrMode::PostInc(r) => {
                let address = self.regs.a(r as usize);
                self.regs
                    .set_a(r as usize, address.wrapping_add(step_for(r, size)));
                Operand::Memory(address)
            }
            AddrMode::PreDec(r) => {
                let address = self.regs.a(r as usize).wrapping_sub(step_for(r, size));
                self.regs.set_a(r as usize, address);
                Operand::Memory(address)
            }
            AddrMode::Disp(r) => {
                let disp = self.fetch_ext_word(bus) as i16 as i32;
                Operand::Memory(self.regs.a(r as usize).wrapping_add(disp as u32))
            }
            AddrMode::Index(r) => {
                let ext = self.fetch_ext_word(bus);
                let base = self.regs.a(r as usize);
                Operand::Memory(base.wrapping_add(self.index_offset(ext)))
            }
            AddrMode::AbsShort => {
                let address = self.fetch_ext_word(bus) as i16 as i32 as u32;
                Operand::Memory(address)
            }
            AddrMode::AbsLong => Operand::Memory(self.fetch_ext_long(bus)),
            AddrMode::PcDisp => {
                // Base is the address of the extension word itself.
                let base = self.regs.pc;
                let disp = self.fetch_ext_word(bus) as i16 as i32;
                Operand::Memory(base.wrapping_add(disp as u32))
            }
            AddrMode::PcIndex => {
                let base = self.regs.pc;
                let ext = self.fetch_ext_word(bus);
                Operand::Memory(base.wrapping_add(self.index_offset(ext)))
            }
            AddrMode::Immediate => {
                let value = match size {
                    Size::Byte => u32::from(self.fetch_ext_word(bus)) & 0xFF,
                    Size::Word => u32::from(self.fetch_ext_word(bus)),
                    Size::Long => self.fetch_ext_long(bus),
                };
                Operand::Immediate(value)
            }
        })
    }

    /// Index offset from a brief extension word: sign-extended 8-bit
    /// displacement plus an index register, word- or long-sized.
    fn index_offset(&self, ext: u16) -> u32 {
        let disp = (ext & 0xFF) as i8 as i32 as u32;
        let idx_reg = ((ext >> 12) & 7) as usize;
        let idx = if ext & 0x8000 != 0 {
            self.regs.a(idx_reg)
        } else {
            self.regs.d[idx_reg]
        };
        let idx = if ext & 0x0800 != 0 {
            idx
        } else {
            Size::Word.sign_extend(idx)
        };
        disp.wrapping_add(idx)
    }

    /// Read an operand's value at `size`.
    pub(crate) fn read_operand<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        operand: Operand,
        size: Size,
    ) -> ExecResult<u32> {
        match operand {
            Operand::DataReg(r) => Ok(self.regs.d_sized(r as usize, size)),
            Operand::AddrReg(r) => Ok(self.regs.a(r as usize) & size.mask()),
            Operand::Memory(address) => self.read_mem(bus, address, size),
            Operand::Immediate(value) => Ok(value & size.mask()),
        }
    }

    /// Write an operand's location at `size`. Data registers keep their
    /// upper bits; address registers sign-extend word writes.
    pub(crate) fn write_operand<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        operand: Operand,
        size: Size,
        value: u32,
    ) -> ExecResult<()> {
        match operand {
            Operand::DataReg(r) => {
                self.regs.set_d_sized(r as usize, value, size);
                Ok(())
            }
            Operand::AddrReg(r) => {
                self.regs.set_a_sized(r as usize, value, size);
                Ok(())
            }
            Operand::Memory(address) => self.write_mem(bus, address, size, value),
            Operand::Immediate(_) => {
                debug_assert!(false, "immediate operands are never written");
                Ok(())
            }
        }
    }

    /// Resolve and read in one go; returns the location for writeback.
    pub(crate) fn load_ea<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        mode: AddrMode,
        size: Size,
    ) -> ExecResult<(Operand, u32)> {
        let operand = self.resolve_ea(bus, mode, size)?;
        let value = self.read_operand(bus, operand, size)?;
        Ok((operand, value))
    }

    /// The address a control-flow mode resolves to (JMP/JSR/LEA/PEA).
    pub(crate) fn resolve_control<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        mode: AddrMode,
    ) -> ExecResult<u32> {
        match self.resolve_ea(bus, mode, Size::Long)? {
            Operand::Memory(address) => Ok(address),
            // The decoder only admits control modes here.
            _ => {
                debug_assert!(false, "non-control mode in control position");
                Ok(0)
            }
        }
    }
}
