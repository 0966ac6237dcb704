//! Data movement and system instructions: the MOVE family, MOVEM/MOVEP,
//! LEA/PEA, register exchange and extension, LINK/UNLK, CHK and STOP.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::bus::MemoryBus;
use crate::cpu::Cpu68000;
use crate::exceptions::{ExecResult, Fault};
use crate::flags::{N, Status};
use crate::instruction::Instruction;

impl Cpu68000 {
    pub(crate) fn exec_move<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let (Some(src), Some(dst)) = (i.src, i.dst) else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, value) = self.load_ea(bus, src, i.size)?;
        let dst_op = self.resolve_ea(bus, dst, i.size)?;
        self.regs.sr.update_nz(value, i.size);
        self.regs.sr.clear_vc();
        self.write_operand(bus, dst_op, i.size, value)
    }

    /// MOVEA: like MOVE to An, but sign-extends and touches no flags.
    pub(crate) fn exec_movea<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, value) = self.load_ea(bus, src, i.size)?;
        self.regs.set_a(i.reg as usize, i.size.sign_extend(value));
        Ok(())
    }

    pub(crate) fn exec_moveq(&mut self, i: &Instruction) -> ExecResult<()> {
        let value = Size::Byte.sign_extend(u32::from(i.quick));
        self.regs.d[i.reg as usize] = value;
        self.regs.sr.update_nz(value, Size::Long);
        self.regs.sr.clear_vc();
        Ok(())
    }

    pub(crate) fn exec_move_to_ccr<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, value) = self.load_ea(bus, src, Size::Word)?;
        self.regs.sr.set_ccr(value as u8);
        Ok(())
    }

    pub(crate) fn exec_move_to_sr<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, value) = self.load_ea(bus, src, Size::Word)?;
        self.regs.sr = Status::from_bits(value as u16);
        Ok(())
    }

    pub(crate) fn exec_move_from_sr<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        i: &Instruction,
    ) -> ExecResult<()> {
        let Some(dst) = i.dst else {
            return Err(Fault::Illegal(i.opcode));
        };
        let dst_op = self.resolve_ea(bus, dst, Size::Word)?;
        let sr = u32::from(self.regs.sr.bits());
        self.write_operand(bus, dst_op, Size::Word, sr)
    }

    /// MOVE An,USP / MOVE USP,An: the supervisor's window into the user
    /// stack pointer.
    pub(crate) fn exec_move_usp(&mut self, i: &Instruction) -> ExecResult<()> {
        let n = i.reg2 as usize;
        if i.quick == 0 {
            self.regs.usp = self.regs.a(n);
        } else {
            let usp = self.regs.usp;
            self.regs.set_a(n, usp);
        }
        Ok(())
    }

    /// MOVEM: the register mask is the first extension word. With a
    /// predecrement destination the mask is bit-reversed (bit 0 = A7) and
    /// registers are stored high to low; every other form walks D0 up to
    /// A7 at ascending addresses. Word-sized loads sign-extend.
    pub(crate) fn exec_movem<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let mask = self.fetch_ext_word(bus);
        let size = i.size;
        let step = size.bytes();

        if i.quick == 0 {
            // Registers to memory.
            let Some(dst) = i.dst else {
                return Err(Fault::Illegal(i.opcode));
            };
            if let AddrMode::PreDec(r) = dst {
                self.timing.add_cycles(dst.extra_cycles());
                let mut address = self.regs.a(r as usize);
                for bit in 0..16 {
                    if mask & (1 << bit) != 0 {
                        address = address.wrapping_sub(step);
                        let value = self.register_by_index(15 - bit);
                        self.write_mem(bus, address, size, value)?;
                        self.timing.add_cycles(2);
                    }
                }
                self.regs.set_a(r as usize, address);
            } else {
                let mut address = self.resolve_control(bus, dst)?;
                for bit in 0..16 {
                    if mask & (1 << bit) != 0 {
                        let value = self.register_by_index(bit);
                        self.write_mem(bus, address, size, value)?;
                        address = address.wrapping_add(step);
                        self.timing.add_cycles(2);
                    }
                }
            }
            return Ok(());
        }

        // Memory to registers.
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        if let AddrMode::PostInc(r) = src {
            self.timing.add_cycles(src.extra_cycles());
            let mut address = self.regs.a(r as usize);
            for bit in 0..16 {
                if mask & (1 << bit) != 0 {
                    let value = self.read_mem(bus, address, size)?;
                    self.set_register_by_index(bit, size.sign_extend(value));
                    address = address.wrapping_add(step);
                    self.timing.add_cycles(2);
                }
            }
            self.regs.set_a(r as usize, address);
        } else {
            let mut address = self.resolve_control(bus, src)?;
            for bit in 0..16 {
                if mask & (1 << bit) != 0 {
                    let value = self.read_mem(bus, address, size)?;
                    self.set_register_by_index(bit, size.sign_extend(value));
                    address = address.wrapping_add(step);
                    self.timing.add_cycles(2);
                }
            }
        }
        Ok(())
    }

    /// MOVEM register numbering: 0-7 = D0-D7, 8-15 = A0-A7.
    fn register_by_index(&self, index: u16) -> u32 {
        if index < 8 {
            self.regs.d[index as usize]
        } else {
            self.regs.a(index as usize - 8)
        }
    }

    fn set_register_by_index(&mut self, index: u16, value: u32) {
        if index < 8 {
            self.regs.d[index as usize] = value;
        } else {
            self.regs.set_a(index as usize - 8, value);
        }
    }

    /// MOVEP: alternating-byte transfers between a data register and
    /// d16(An), big-endian, every other byte.
    pub(crate) fn exec_movep<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let disp = self.fetch_ext_word(bus) as i16 as i32;
        let base = self.regs.a(i.reg2 as usize).wrapping_add(disp as u32);
        let count = i.size.bytes();
        if i.quick == 1 {
            // Register to memory, most significant byte first.
            let value = self.regs.d[i.reg as usize];
            for n in 0..count {
                let shift = (count - 1 - n) * 8;
                let byte = (value >> shift) & 0xFF;
                self.write_mem(bus, base.wrapping_add(n * 2), Size::Byte, byte)?;
            }
        } else {
            let mut value = 0u32;
            for n in 0..count {
                value = value << 8 | self.read_mem(bus, base.wrapping_add(n * 2), Size::Byte)?;
            }
            self.regs.set_d_sized(i.reg as usize, value, i.size);
        }
        Ok(())
    }

    pub(crate) fn exec_lea<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let address = self.resolve_control(bus, src)?;
        self.regs.set_a(i.reg as usize, address);
        Ok(())
    }

    pub(crate) fn exec_pea<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let address = self.resolve_control(bus, src)?;
        self.push_long(bus, address)
    }

    pub(crate) fn exec_exg(&mut self, i: &Instruction) -> ExecResult<()> {
        let rx = i.reg as usize;
        let ry = i.reg2 as usize;
        match i.quick {
            0x08 => self.regs.d.swap(rx, ry),
            0x09 => {
                let tmp = self.regs.a(rx);
                let other = self.regs.a(ry);
                self.regs.set_a(rx, other);
                self.regs.set_a(ry, tmp);
            }
            _ => {
                let tmp = self.regs.d[rx];
                self.regs.d[rx] = self.regs.a(ry);
                self.regs.set_a(ry, tmp);
            }
        }
        Ok(())
    }

    pub(crate) fn exec_swap(&mut self, i: &Instruction) -> ExecResult<()> {
        let n = i.reg2 as usize;
        let value = self.regs.d[n].rotate_left(16);
        self.regs.d[n] = value;
        self.regs.sr.update_nz(value, Size::Long);
        self.regs.sr.clear_vc();
        Ok(())
    }

    /// EXT: widen byte to word, or word to long, in place.
    pub(crate) fn exec_ext(&mut self, i: &Instruction) -> ExecResult<()> {
        let n = i.reg2 as usize;
        match i.size {
            Size::Word => {
                let value = Size::Byte.sign_extend(self.regs.d[n]);
                self.regs.set_d_sized(n, value, Size::Word);
                self.regs.sr.update_nz(value, Size::Word);
            }
            _ => {
                let value = Size::Word.sign_extend(self.regs.d[n]);
                self.regs.d[n] = value;
                self.regs.sr.update_nz(value, Size::Long);
            }
        }
        self.regs.sr.clear_vc();
        Ok(())
    }

    /// LINK: push An, point it at the frame, then move SP by the
    /// displacement.
    pub(crate) fn exec_link<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let disp = self.fetch_ext_word(bus) as i16 as i32;
        let n = i.reg2 as usize;
        let value = self.regs.a(n);
        self.push_long(bus, value)?;
        let sp = self.regs.active_sp();
        self.regs.set_a(n, sp);
        self.regs.set_active_sp(sp.wrapping_add(disp as u32));
        Ok(())
    }

    /// UNLK: the exact inverse of LINK.
    pub(crate) fn exec_unlk<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let n = i.reg2 as usize;
        self.regs.set_active_sp(self.regs.a(n));
        let value = self.pop_long(bus)?;
        self.regs.set_a(n, value);
        Ok(())
    }

    /// CHK: bounds-check a data register word against the EA operand;
    /// out of bounds dispatches the CHK exception with N telling the
    /// handler which side failed.
    pub(crate) fn exec_chk<B: MemoryBus>(&mut self, bus: &mut B, i: &Instruction) -> ExecResult<()> {
        let Some(src) = i.src else {
            return Err(Fault::Illegal(i.opcode));
        };
        let (_, bound) = self.load_ea(bus, src, Size::Word)?;
        let bound = bound as u16 as i16;
        let value = self.regs.d_sized(i.reg as usize, Size::Word) as u16 as i16;
        if value < 0 {
            self.regs.sr.set(N, true);
            return Err(Fault::CheckBounds);
        }
        if value > bound {
            self.regs.sr.set(N, false);
            return Err(Fault::CheckBounds);
        }
        Ok(())
    }

    /// STOP: load SR from the immediate and wait for an interrupt.
    pub(crate) fn exec_stop<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<()> {
        let value = self.fetch_ext_word(bus);
        self.regs.sr = Status::from_bits(value);
        self.stop();
        Ok(())
    }
}
