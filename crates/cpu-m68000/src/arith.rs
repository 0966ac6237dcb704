//! Integer arithmetic: ADD/SUB families, compares, negation, multiply,
//! divide and the packed-BCD operations.

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::flags::{C, N, V, X, Z};
use crate::instruction::{Instruction, Operation};

impl Cpu68000 {
    fn operands(i: &Instruction) -> ExecResult<(AddrMode, AddrMode)> {
        match (i.src, i.dst) {
            (Some(src), Some(dst)) => Ok((src, dst)),
            _ => Err(Fault::Illegal(i.opcode)),
        }
    }

    pub(crate) fn exec_add<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let (src, dst) = Self::operands(i)?;
        let (_, s) = self.load_ea(bus, src, i.size)?;
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let (result, st) = alu::add(s, d, i.size, self.regs.sr);
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }

    pub(crate) fn exec_sub<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let (src, dst) = Self::operands(i)?;
        let (_, s) = self.load_ea(bus, src, i.size)?;
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let (result, st) = alu::sub(s, d, i.size, self.regs.sr);
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }

    pub(crate) fn exec_cmp<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let (src, dst) = Self::operands(i)?;
        let (_, s) = self.load_ea(bus, src, i.size)?;
        let (_, d) = self.load_ea(bus, dst, i.size)?;
        self.regs.sr = alu::cmp(s, d, i.size, self.regs.sr);
        Ok(())
    }

    /// ADDA/SUBA/CMPA source helper: the EA operand sign-extended to the
    /// full register width.
    fn address_source<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<u32> {
        let (src, _) = Self::operands(i)?;
        let (_, s) = self.load_ea(bus, src, i.size)?;
        Ok(i.size.sign_extend(s))
    }

    pub(crate) fn exec_adda<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let s = self.address_source(bus, i)?;
        let n = i.reg as usize;
        self.regs.set_a(n, self.regs.a(n).wrapping_add(s));
        Ok(())
    }

    pub(crate) fn exec_suba<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let s = self.address_source(bus, i)?;
        let n = i.reg as usize;
        self.regs.set_a(n, self.regs.a(n).wrapping_sub(s));
        Ok(())
    }

    pub(crate) fn exec_cmpa<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let s = self.address_source(bus, i)?;
        let d = self.regs.a(i.reg as usize);
        self.regs.sr = alu::cmp(s, d, Size::Long, self.regs.sr);
        Ok(())
    }

    /// ADDQ/SUBQ share a quick-constant path. Address register
    /// destinations take the whole register and leave the flags alone.
    fn exec_quick<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
        is_add: bool,
    ) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let value = u32::from(i.quick);
        if let AddrMode::AddrReg(r) = dst {
            let n = r as usize;
            let result = if is_add {
                self.regs.a(n).wrapping_add(value)
            } else {
                self.regs.a(n).wrapping_sub(value)
            };
            self.regs.set_a(n, result);
            return Ok(());
        }
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let (result, st) = if is_add {
            alu::add(value, d, i.size, self.regs.sr)
        } else {
            alu::sub(value, d, i.size, self.regs.sr)
        };
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }

    pub(crate) fn exec_addq<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        self.exec_quick(bus, i, true)
    }

    pub(crate) fn exec_subq<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        self.exec_quick(bus, i, false)
    }

    /// ADDX/SUBX: register pairs, or the memory form walking two
    /// predecremented addresses.
    fn exec_extended<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
        is_add: bool,
    ) -> ExecResult<()> {
        let rx = i.reg as usize;
        let ry = i.reg2 as usize;
        if i.quick == 0 {
            let s = self.regs.d_sized(ry, i.size);
            let d = self.regs.d_sized(rx, i.size);
            let (result, st) = if is_add {
                alu::addx(s, d, i.size, self.regs.sr)
            } else {
                alu::subx(s, d, i.size, self.regs.sr)
            };
            self.regs.sr = st;
            self.regs.set_d_sized(rx, result, i.size);
            return Ok(());
        }
        // -(Ay),-(Ax): source first, then destination.
        let (_, s) = self.load_ea(bus, AddrMode::PreDec(i.reg2), i.size)?;
        let (dst_op, d) = self.load_ea(bus, AddrMode::PreDec(i.reg), i.size)?;
        let (result, st) = if is_add {
            alu::addx(s, d, i.size, self.regs.sr)
        } else {
            alu::subx(s, d, i.size, self.regs.sr)
        };
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }

    pub(crate) fn exec_addx<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        self.exec_extended(bus, i, true)
    }

    pub(crate) fn exec_subx<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        self.exec_extended(bus, i, false)
    }

    pub(crate) fn exec_neg<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let (result, st) = alu::sub(d, 0, i.size, self.regs.sr);
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }

    pub(crate) fn exec_negx<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (dst_op, d) = self.load_ea(bus, dst, i.size)?;
        let (result, st) = alu::subx(d, 0, i.size, self.regs.sr);
        self.regs.sr = st;
        self.write_operand(bus, dst_op, i.size, result)
    }

    /// MULU/MULS: 16x16 -> 32, result replaces the whole data register.
    pub(crate) fn exec_mul<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, s) = self.load_ea(bus, src, Size::Word)?;
        let d = self.regs.d_sized(i.reg as usize, Size::Word);
        let result = if i.op == Operation::Muls {
            ((s as u16 as i16 as i32) * (d as u16 as i16 as i32)) as u32
        } else {
            s.wrapping_mul(d)
        };
        self.regs.d[i.reg as usize] = result;
        self.regs.sr.update_nz(result, Size::Long);
        self.regs.sr.clear_vc();
        Ok(())
    }

    /// DIVU/DIVS: 32/16 -> 16q,16r packed into the data register.
    ///
    /// A zero divisor sets V, leaves the destination untouched and
    /// dispatches the zero-divide exception. Quotient overflow sets V and
    /// leaves the destination untouched without trapping; the division
    /// is never performed halfway.
    pub(crate) fn exec_div<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, s) = self.load_ea(bus, src, Size::Word)?;
        let dividend = self.regs.d[i.reg as usize];

        if s & 0xFFFF == 0 {
            self.regs.sr.set(V, true);
            self.regs.sr.set(C, false);
            return Err(Fault::ZeroDivide);
        }

        if i.op == Operation::Divs {
            let divisor = s as u16 as i16 as i32;
            let dividend = dividend as i32;
            // i32::MIN / -1 overflows the quotient before it overflows i16.
            if dividend == i32::MIN && divisor == -1 {
                self.regs.sr.set(V, true);
                self.regs.sr.set(C, false);
                return Ok(());
            }
            let quotient = dividend / divisor;
            let remainder = dividend % divisor;
            if quotient > i32::from(i16::MAX) || quotient < i32::from(i16::MIN) {
                self.regs.sr.set(V, true);
                self.regs.sr.set(C, false);
                return Ok(());
            }
            self.regs.d[i.reg as usize] =
                ((remainder as u32) << 16) | (quotient as u32 & 0xFFFF);
            self.regs.sr.update_nz(quotient as u32, Size::Word);
            self.regs.sr.clear_vc();
        } else {
            let divisor = s & 0xFFFF;
            let quotient = dividend / divisor;
            let remainder = dividend % divisor;
            if quotient > 0xFFFF {
                self.regs.sr.set(V, true);
                self.regs.sr.set(C, false);
                return Ok(());
            }
            self.regs.d[i.reg as usize] = (remainder << 16) | quotient;
            self.regs.sr.update_nz(quotient, Size::Word);
            self.regs.sr.clear_vc();
        }
        Ok(())
    }

    /// ABCD/SBCD: register pairs or the -(Ay),-(Ax) memory form.
    pub(crate) fn exec_bcd<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let is_add = i.op == Operation::Abcd;
        let x = u8::from(self.regs.sr.is_extend());
        if i.quick == 0 {
            let s = (self.regs.d[i.reg2 as usize] & 0xFF) as u8;
            let d = (self.regs.d[i.reg as usize] & 0xFF) as u8;
            let (result, carry, overflow) = if is_add {
                alu::bcd_add(s, d, x)
            } else {
                alu::bcd_sub(s, d, x)
            };
            self.regs.set_d_sized(i.reg as usize, u32::from(result), Size::Byte);
            self.set_bcd_flags(result, carry, overflow);
            return Ok(());
        }
        let (_, s) = self.load_ea(bus, AddrMode::PreDec(i.reg2), Size::Byte)?;
        let (dst_op, d) = self.load_ea(bus, AddrMode::PreDec(i.reg), Size::Byte)?;
        let (result, carry, overflow) = if is_add {
            alu::bcd_add(s as u8, d as u8, x)
        } else {
            alu::bcd_sub(s as u8, d as u8, x)
        };
        self.set_bcd_flags(result, carry, overflow);
        self.write_operand(bus, dst_op, Size::Byte, u32::from(result))
    }

    /// NBCD: decimal negate (0 - dst - X).
    pub(crate) fn exec_nbcd<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let x = u8::from(self.regs.sr.is_extend());
        let (dst_op, d) = self.load_ea(bus, dst, Size::Byte)?;
        let (result, borrow, overflow) = alu::bcd_sub(d as u8, 0, x);
        self.set_bcd_flags(result, borrow, overflow);
        self.write_operand(bus, dst_op, Size::Byte, u32::from(result))
    }

    /// BCD flag rule: Z only clears (multi-digit chains), C/X carry the
    /// decimal borrow, N follows bit 7.
    fn set_bcd_flags(&mut self, result: u8, carry: bool, overflow: bool) {
        if result != 0 {
            self.regs.sr.set(Z, false);
        }
        self.regs.sr.set(N, result & 0x80 != 0);
        self.regs.sr.set(C, carry);
        self.regs.sr.set(X, carry);
        self.regs.sr.set(V, overflow);
    }
}
