//! State snapshots for the save-state subsystem.
//!
//! The whole mutable state of a core (register file, timing counters,
//! exception counters) packs into one fixed-size big-endian blob with
//! no padding and no internal pointers, so a byte copy of the blob is
//! always a valid snapshot and loading one is atomic by construction.
//! Handler callbacks and bus wiring are deliberately outside the blob;
//! they are configuration, not state.

use crate::cpu::{Cpu68000, State};
use crate::exceptions::ExceptionStats;
use crate::flags::Status;
use crate::timing::TimingStats;
use emu_core::Ticks;

/// Size of a state snapshot in bytes.
pub const STATE_LEN: usize = 135;

struct Writer<'a> {
    buf: &'a mut [u8; STATE_LEN],
    at: usize,
}

impl Writer<'_> {
    fn u8(&mut self, v: u8) {
        self.buf[self.at] = v;
        self.at += 1;
    }

    fn u16(&mut self, v: u16) {
        self.buf[self.at..self.at + 2].copy_from_slice(&v.to_be_bytes());
        self.at += 2;
    }

    fn u32(&mut self, v: u32) {
        self.buf[self.at..self.at + 4].copy_from_slice(&v.to_be_bytes());
        self.at += 4;
    }

    fn u64(&mut self, v: u64) {
        self.buf[self.at..self.at + 8].copy_from_slice(&v.to_be_bytes());
        self.at += 8;
    }
}

struct Reader<'a> {
    buf: &'a [u8; STATE_LEN],
    at: usize,
}

impl Reader<'_> {
    fn u8(&mut self) -> u8 {
        let v = self.buf[self.at];
        self.at += 1;
        v
    }

    fn u16(&mut self) -> u16 {
        let v = u16::from_be_bytes([self.buf[self.at], self.buf[self.at + 1]]);
        self.at += 2;
        v
    }

    fn u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buf[self.at..self.at + 4]);
        self.at += 4;
        u32::from_be_bytes(bytes)
    }

    fn u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.buf[self.at..self.at + 8]);
        self.at += 8;
        u64::from_be_bytes(bytes)
    }
}

impl Cpu68000 {
    /// Capture the complete mutable state as an opaque blob.
    #[must_use]
    pub fn save_state(&self) -> [u8; STATE_LEN] {
        let mut buf = [0u8; STATE_LEN];
        let mut w = Writer { buf: &mut buf, at: 0 };

        for value in self.regs.d {
            w.u32(value);
        }
        for value in self.regs.a {
            w.u32(value);
        }
        w.u32(self.regs.usp);
        w.u32(self.regs.ssp);
        w.u32(self.regs.pc);
        w.u16(self.regs.sr.bits());

        let timing = &self.timing;
        w.u32(timing.current_cycles());
        w.u32(timing.target_cycles());
        w.u8(timing.wait_states());
        w.u8(timing.prefetch_queue());
        let stats = timing.stats();
        w.u32(stats.instruction_cycles);
        w.u32(stats.memory_cycles);
        w.u32(stats.wait_cycles);
        w.u32(stats.instructions);
        w.u32(timing.last_sync_cycle());
        w.u8(u8::from(timing.z80_sync_pending()));
        w.u8(u8::from(timing.vdp_sync_pending()));

        let exceptions = &self.exceptions;
        w.u32(exceptions.vector_base());
        w.u8(exceptions.pending_bits());
        w.u8(exceptions.in_service());
        let estats = exceptions.stats();
        w.u32(estats.raised);
        w.u32(estats.cycles);

        w.u8(match self.state {
            State::Running => 0,
            State::Stopped => 1,
            State::Halted => 2,
        });
        w.u64(self.total_cycles.get());
        w.u32(self.instr_pc);
        w.u16(self.cur_opcode);

        debug_assert_eq!(w.at, STATE_LEN);
        buf
    }

    /// Overwrite the complete mutable state from a blob previously
    /// produced by [`save_state`](Self::save_state). The fixed-size
    /// signature makes a partial load unrepresentable.
    pub fn load_state(&mut self, blob: &[u8; STATE_LEN]) {
        let mut r = Reader { buf: blob, at: 0 };

        for value in &mut self.regs.d {
            *value = r.u32();
        }
        for value in &mut self.regs.a {
            *value = r.u32();
        }
        self.regs.usp = r.u32();
        self.regs.ssp = r.u32();
        self.regs.pc = r.u32();
        self.regs.sr = Status::from_bits(r.u16());

        let current = r.u32();
        let target = r.u32();
        let wait_states = r.u8();
        let prefetch = r.u8();
        let stats = TimingStats {
            instruction_cycles: r.u32(),
            memory_cycles: r.u32(),
            wait_cycles: r.u32(),
            instructions: r.u32(),
        };
        let last_sync = r.u32();
        let z80_pending = r.u8() != 0;
        let vdp_pending = r.u8() != 0;
        self.timing.restore(
            current,
            target,
            wait_states,
            prefetch,
            stats,
            last_sync,
            z80_pending,
            vdp_pending,
        );

        let vector_base = r.u32();
        let pending = r.u8();
        let in_service = r.u8();
        let estats = ExceptionStats {
            raised: r.u32(),
            cycles: r.u32(),
        };
        self.exceptions.set_vector_base(vector_base);
        self.exceptions.restore(pending, in_service, estats);

        self.state = match r.u8() {
            1 => State::Stopped,
            2 => State::Halted,
            _ => State::Running,
        };
        self.total_cycles = Ticks::new(r.u64());
        self.instr_pc = r.u32();
        self.cur_opcode = r.u16();

        debug_assert_eq!(r.at, STATE_LEN);
    }
}
