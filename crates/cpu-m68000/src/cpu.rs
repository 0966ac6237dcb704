//! The CPU core: fetch/decode/execute driver and exception dispatch.
//!
//! An external driver repeatedly calls [`Cpu68000::step`] (one whole
//! instruction or one whole exception dispatch per call) or
//! [`Cpu68000::run`] (step until the cycle budget is spent). The core
//! never suspends mid-instruction and never blocks; cross-chip
//! coordination happens purely through the timing model's budget and
//! sync flags.

use emu_core::{Observable, Ticks, Value};

use crate::alu::Size;
use crate::bus::MemoryBus;
use crate::decode::decode;
use crate::exceptions::{
    ExecResult, Exception, ExceptionController, ExceptionInfo, Fault,
};
use crate::flags::{C, N, Status, T, V, X, Z};
use crate::registers::Registers;
use crate::timing::TimingState;

/// Execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Normal execution.
    Running,
    /// STOP instruction: waiting for an interrupt.
    Stopped,
    /// Double fault during exception stacking; only a reset helps.
    Halted,
}

/// Motorola 68000 CPU core.
///
/// Owns its register file, timing state and exception controller
/// exclusively; the memory bus is borrowed per call and never stored.
#[derive(Debug)]
pub struct Cpu68000 {
    /// Register file.
    pub regs: Registers,
    pub(crate) timing: TimingState,
    pub(crate) exceptions: ExceptionController,
    pub(crate) state: State,
    /// PC of the instruction currently executing.
    pub(crate) instr_pc: u32,
    /// Opcode of the instruction currently executing.
    pub(crate) cur_opcode: u16,
    pub(crate) total_cycles: Ticks,
}

impl Default for Cpu68000 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu68000 {
    /// A core in the post-reset state (supervisor mode, interrupts
    /// masked, all counters zero). Call [`reset`](Self::reset) to load
    /// SSP and PC from the vector table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            timing: TimingState::new(),
            exceptions: ExceptionController::new(),
            state: State::Running,
            instr_pc: 0,
            cur_opcode: 0,
            total_cycles: Ticks::ZERO,
        }
    }

    /// Reset: reinitialize the registers and load SSP and PC from the
    /// first two vector table entries.
    pub fn reset<B: MemoryBus>(&mut self, bus: &mut B) {
        let base = self.exceptions.vector_base();
        self.regs = Registers::new();
        self.regs.ssp = bus.read_long(base);
        self.regs.pc = bus.read_long(base.wrapping_add(4));
        self.state = State::Running;
        let timing = self.exceptions.timing(Exception::Reset);
        self.timing.add_cycles(timing.total());
        self.exceptions.record(timing);
    }

    /// The timing model, read-only.
    #[must_use]
    pub const fn timing(&self) -> &TimingState {
        &self.timing
    }

    /// The timing model, for driver configuration (budgets, wait states,
    /// sync requests, explicit resets).
    pub fn timing_mut(&mut self) -> &mut TimingState {
        &mut self.timing
    }

    /// The exception controller, read-only.
    #[must_use]
    pub const fn exceptions(&self) -> &ExceptionController {
        &self.exceptions
    }

    /// The exception controller, for configuration (vector base, timing
    /// overrides, handler callbacks).
    pub fn exceptions_mut(&mut self) -> &mut ExceptionController {
        &mut self.exceptions
    }

    /// Total cycles consumed over the core's lifetime.
    #[must_use]
    pub const fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    /// True while stopped by the STOP instruction.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == State::Stopped
    }

    /// True after a double fault.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    /// Enter the STOP state (STOP instruction); an interrupt wakes it.
    pub(crate) fn stop(&mut self) {
        self.state = State::Stopped;
    }

    /// Drive the interrupt priority lines. Out-of-range levels clamp to
    /// 7; a non-zero level records the request (and wakes a STOPped
    /// core), zero releases the lines and withdraws unacknowledged
    /// requests.
    pub fn set_irq(&mut self, level: u8) {
        let level = level.min(7);
        if level == 0 {
            for l in 1..=7 {
                self.exceptions.clear_pending(l);
            }
            return;
        }
        self.exceptions.set_pending(level);
        if self.state == State::Stopped {
            self.state = State::Running;
        }
    }

    /// Execute one instruction or one exception dispatch. Returns the
    /// cycles consumed.
    pub fn step<B: MemoryBus>(&mut self, bus: &mut B) -> u32 {
        let begin = self.timing.current_cycles();

        // The controller is consulted before any fetch: a pending
        // unmasked interrupt preempts normal execution. A halted core is
        // dead to the world until reset.
        let mask = self.regs.sr.interrupt_mask();
        if self.state != State::Halted
            && let Some(level) = self.exceptions.pending_interrupt(mask)
        {
            self.exceptions.acknowledge(level);
            self.state = State::Running;
            self.dispatch(bus, Exception::Autovector(level), self.regs.pc);
        } else {
            match self.state {
                State::Halted | State::Stopped => {
                    // Idle: burn a minimal slice so run() still converges
                    // on its budget.
                    self.timing.add_cycles(4);
                }
                State::Running => {
                    let trace_armed = self.regs.sr.is_trace();
                    match self.execute_one(bus) {
                        Ok(()) => {
                            self.timing.note_instruction();
                            if trace_armed && self.state == State::Running {
                                self.dispatch(bus, Exception::Trace, self.instr_pc);
                            }
                        }
                        Err(fault) => self.handle_fault(bus, fault),
                    }
                }
            }
        }

        let consumed = self.timing.current_cycles().wrapping_sub(begin);
        self.total_cycles += Ticks::new(u64::from(consumed));
        consumed
    }

    /// Run until the cycle budget is spent or a co-processor sync is
    /// requested. Returns the cycles consumed.
    pub fn run<B: MemoryBus>(&mut self, bus: &mut B, budget: u32) -> u32 {
        self.timing.set_target_cycles(budget);
        let begin = self.timing.current_cycles();
        while !self.timing.should_sync() {
            self.step(bus);
        }
        self.timing.current_cycles().wrapping_sub(begin)
    }

    /// Fetch, decode and execute the instruction at PC.
    fn execute_one<B: MemoryBus>(&mut self, bus: &mut B) -> ExecResult<()> {
        let pc = self.regs.pc;
        if pc & 1 != 0 {
            return Err(Fault::AddressError { address: pc, read: true });
        }
        self.timing.add_memory_cycles(pc, false);
        let opcode = bus.read_word(pc);
        self.regs.pc = pc.wrapping_add(2);
        self.instr_pc = pc;
        self.cur_opcode = opcode;

        let instr = decode(opcode);
        if instr.timing.privileged && !self.regs.sr.is_supervisor() {
            return Err(Fault::Privilege(opcode));
        }
        self.timing.add_cycles(instr.timing.base_cycles);
        self.execute(bus, &instr)
    }

    /// Convert a synchronous fault into its exception dispatch.
    fn handle_fault<B: MemoryBus>(&mut self, bus: &mut B, fault: Fault) {
        let address = match fault {
            Fault::AddressError { address, .. } => address,
            _ => self.instr_pc,
        };
        self.dispatch(bus, fault.exception(), address);
    }

    /// Full exception dispatch: stack frame, supervisor entry, mask
    /// update, vector fetch, handler notification.
    pub(crate) fn dispatch<B: MemoryBus>(&mut self, bus: &mut B, kind: Exception, address: u32) {
        let timing = self.exceptions.timing(kind);
        self.timing.add_cycles(timing.acknowledge);

        let old_sr = self.regs.sr.bits();
        let old_pc = self.regs.pc;

        self.regs.sr.set_supervisor(true);
        self.regs.sr.set_trace(false);

        if kind != Exception::Reset {
            // Push PC (long) then SR (word): A7 drops by 6 and the saved
            // SR ends up on top so RTE pops SR first.
            let sp = self.regs.push_long();
            if sp & 1 != 0 {
                // Double fault: a misaligned supervisor stack cannot take
                // a frame. The real chip halts; so do we.
                self.state = State::Halted;
                return;
            }
            bus.write_long(sp, old_pc);
            self.timing.add_memory_cycles(sp, true);
            self.timing.add_memory_cycles(sp.wrapping_add(2), true);
            let sp = self.regs.push_word();
            bus.write_word(sp, old_sr);
            self.timing.add_memory_cycles(sp, true);
        }
        self.timing.add_cycles(timing.stack_push);

        if kind.priority() > 1 {
            self.regs.sr.set_interrupt_mask(kind.priority());
        }

        let vector_addr = self.exceptions.vector_address(kind);
        self.regs.pc = bus.read_long(vector_addr);
        self.timing.add_memory_cycles(vector_addr, false);
        self.timing.add_memory_cycles(vector_addr.wrapping_add(2), false);
        self.timing.add_cycles(timing.vector_fetch);
        self.timing.add_cycles(timing.process);

        self.state = State::Running;
        self.exceptions.record(timing);

        let info = ExceptionInfo {
            kind,
            vector: kind.vector(),
            priority: kind.priority(),
            group_priority: kind.group_priority(),
            address,
            status: old_sr,
            pc: old_pc,
            opcode: self.cur_opcode,
            timing,
        };
        self.exceptions.notify(&info);
    }

    // === Memory access with alignment checking and cycle charging ===

    /// Read `size` from memory. Word and long reads of odd addresses
    /// surface an address error instead of being silently masked.
    pub(crate) fn read_mem<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        address: u32,
        size: Size,
    ) -> ExecResult<u32> {
        if size != Size::Byte && address & 1 != 0 {
            return Err(Fault::AddressError { address, read: true });
        }
        Ok(match size {
            Size::Byte => {
                self.timing.add_memory_cycles(address, false);
                u32::from(bus.read_byte(address))
            }
            Size::Word => {
                self.timing.add_memory_cycles(address, false);
                u32::from(bus.read_word(address))
            }
            Size::Long => {
                self.timing.add_memory_cycles(address, false);
                self.timing.add_memory_cycles(address.wrapping_add(2), false);
                bus.read_long(address)
            }
        })
    }

    /// Write `size` to memory with the same alignment contract as
    /// [`read_mem`](Self::read_mem).
    pub(crate) fn write_mem<B: MemoryBus>(
        &mut self,
        bus: &mut B,
        address: u32,
        size: Size,
        value: u32,
    ) -> ExecResult<()> {
        if size != Size::Byte && address & 1 != 0 {
            return Err(Fault::AddressError { address, read: false });
        }
        match size {
            Size::Byte => {
                self.timing.add_memory_cycles(address, true);
                bus.write_byte(address, value as u8);
            }
            Size::Word => {
                self.timing.add_memory_cycles(address, true);
                bus.write_word(address, value as u16);
            }
            Size::Long => {
                self.timing.add_memory_cycles(address, true);
                self.timing.add_memory_cycles(address.wrapping_add(2), true);
                bus.write_long(address, value);
            }
        }
        Ok(())
    }

    /// Consume one extension word from the instruction stream. The cycle
    /// cost of extension words is part of the addressing mode's fixed
    /// cost, so none is charged here.
    pub(crate) fn fetch_ext_word<B: MemoryBus>(&mut self, bus: &mut B) -> u16 {
        let word = bus.read_word(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(2);
        word
    }

    /// Consume a long extension operand (two words).
    pub(crate) fn fetch_ext_long<B: MemoryBus>(&mut self, bus: &mut B) -> u32 {
        let hi = self.fetch_ext_word(bus);
        let lo = self.fetch_ext_word(bus);
        u32::from(hi) << 16 | u32::from(lo)
    }

    // === Debug register API ===

    /// Register index for the debug API: 0-7 = D0-D7, 8-15 = A0-A7,
    /// 16 = PC, 17 = SR. Out-of-range indices read the documented
    /// sentinel and write nothing: never a panic, never corruption.
    #[must_use]
    pub fn get_register(&self, index: u8) -> u32 {
        match index {
            0..=7 => self.regs.d[index as usize],
            8..=15 => self.regs.a(index as usize - 8),
            16 => self.regs.pc,
            17 => u32::from(self.regs.sr.bits()),
            _ => 0xFFFF_FFFF,
        }
    }

    /// Counterpart of [`get_register`](Self::get_register). SR writes
    /// are masked to the implemented 16 bits.
    pub fn set_register(&mut self, index: u8, value: u32) {
        match index {
            0..=7 => self.regs.d[index as usize] = value,
            8..=15 => self.regs.set_a(index as usize - 8, value),
            16 => self.regs.pc = value,
            17 => self.regs.sr = Status::from_bits(value as u16),
            _ => {}
        }
    }
}

// === Observable implementation ===

const M68000_QUERY_PATHS: &[&str] = &[
    "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7",
    "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7",
    "usp", "ssp",
    "pc", "sr", "ccr",
    "flags.x", "flags.n", "flags.z", "flags.v", "flags.c",
    "flags.s", "flags.t",
    "int_mask",
    "stopped", "halted",
    "cycles", "instructions",
    "opcode",
];

impl Observable for Cpu68000 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix('d')
            && let Ok(n) = rest.parse::<usize>()
            && n < 8
        {
            return Some(self.regs.d[n].into());
        }
        if let Some(rest) = path.strip_prefix('a')
            && let Ok(n) = rest.parse::<usize>()
            && n < 8
        {
            return Some(self.regs.a(n).into());
        }
        match path {
            "usp" => Some(self.regs.usp.into()),
            "ssp" => Some(self.regs.ssp.into()),
            "pc" => Some(self.regs.pc.into()),
            "sr" => Some(self.regs.sr.bits().into()),
            "ccr" => Some(self.regs.sr.ccr().into()),
            "flags.x" => Some(self.regs.sr.contains(X).into()),
            "flags.n" => Some(self.regs.sr.contains(N).into()),
            "flags.z" => Some(self.regs.sr.contains(Z).into()),
            "flags.v" => Some(self.regs.sr.contains(V).into()),
            "flags.c" => Some(self.regs.sr.contains(C).into()),
            "flags.s" => Some(self.regs.sr.is_supervisor().into()),
            "flags.t" => Some(self.regs.sr.contains(T).into()),
            "int_mask" => Some(self.regs.sr.interrupt_mask().into()),
            "stopped" => Some(self.is_stopped().into()),
            "halted" => Some(self.is_halted().into()),
            "cycles" => Some(self.total_cycles.get().into()),
            "instructions" => Some(self.timing.stats().instructions.into()),
            "opcode" => Some(self.cur_opcode.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        M68000_QUERY_PATHS
    }
}
