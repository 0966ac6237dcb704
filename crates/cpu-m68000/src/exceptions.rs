//! The exception and interrupt controller.
//!
//! Exceptions fall into two camps. Synchronous ones (address errors,
//! illegal instructions, privilege violations, traps, divide by zero)
//! abort the current instruction: the executor threads them out as a
//! [`Fault`] and the step loop dispatches them immediately; they never
//! wait on the interrupt mask. Autovectored interrupts (levels 1-7) are
//! asynchronous: a level at or below the current mask is recorded as
//! pending and re-evaluated whenever the mask drops.
//!
//! Dispatch sequence: push PC (long) then SR (word) onto the supervisor
//! stack, enter supervisor mode, raise the mask for exceptions above
//! group 1, fetch the new PC from `vector_base + 4 * vector`, then invoke
//! the registered per-type handler with the full [`ExceptionInfo`].
//! RTE performs the exact inverse.

use core::fmt;

/// Every exception the controller can dispatch, with its vector number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// Vector 0/1: reset (initial SSP and PC).
    Reset,
    /// Vector 2: bus error.
    BusError,
    /// Vector 3: odd address on a word or long access.
    AddressError,
    /// Vector 4: unrecognized opcode.
    IllegalInstruction,
    /// Vector 5: DIVU/DIVS with a zero divisor.
    ZeroDivide,
    /// Vector 6: CHK bounds failure.
    Chk,
    /// Vector 7: TRAPV with V set.
    Trapv,
    /// Vector 8: privileged instruction in user mode.
    PrivilegeViolation,
    /// Vector 9: trace, after each instruction with T set.
    Trace,
    /// Vector 10: line 1010 emulator patterns.
    Line1010,
    /// Vector 11: line 1111 emulator patterns.
    Line1111,
    /// Vector 14: stack frame format error.
    FormatError,
    /// Vector 15: interrupt with no configured vector.
    UninitializedInterrupt,
    /// Vector 24: interrupt acknowledged with no requester.
    SpuriousInterrupt,
    /// Vectors 25-31: autovectored interrupt, level 1-7.
    Autovector(u8),
    /// Vectors 32-47: TRAP #0-#15.
    Trap(u8),
}

impl Exception {
    /// The vector table index.
    #[must_use]
    pub const fn vector(self) -> u8 {
        match self {
            Self::Reset => 0,
            Self::BusError => 2,
            Self::AddressError => 3,
            Self::IllegalInstruction => 4,
            Self::ZeroDivide => 5,
            Self::Chk => 6,
            Self::Trapv => 7,
            Self::PrivilegeViolation => 8,
            Self::Trace => 9,
            Self::Line1010 => 10,
            Self::Line1111 => 11,
            Self::FormatError => 14,
            Self::UninitializedInterrupt => 15,
            Self::SpuriousInterrupt => 24,
            Self::Autovector(level) => 24 + (level & 7),
            Self::Trap(n) => 32 + (n & 15),
        }
    }

    /// Numeric priority. Higher wins when several exceptions are pending
    /// at once: reset above the error family, the error family above any
    /// interrupt level, traps ordered with the error family.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Reset => 7,
            Self::BusError
            | Self::AddressError
            | Self::IllegalInstruction
            | Self::ZeroDivide
            | Self::Chk
            | Self::Trapv
            | Self::PrivilegeViolation
            | Self::Trace
            | Self::Line1010
            | Self::Line1111
            | Self::FormatError
            | Self::UninitializedInterrupt
            | Self::Trap(_) => 6,
            Self::SpuriousInterrupt => 5,
            Self::Autovector(level) => level & 7,
        }
    }

    /// Priority within the dispatch group (mirrors `priority` except for
    /// the fixed trap slot).
    #[must_use]
    pub const fn group_priority(self) -> u8 {
        match self {
            Self::Autovector(level) => level & 7,
            Self::Reset => 7,
            _ => 6,
        }
    }

    /// Maskable exceptions compare against the interrupt mask; everything
    /// else dispatches unconditionally.
    #[must_use]
    pub const fn is_maskable(self) -> bool {
        matches!(self, Self::Autovector(_))
    }

    /// Default per-phase timing for this exception's group.
    #[must_use]
    pub const fn default_timing(self) -> ExceptionTiming {
        match self {
            Self::Reset => ExceptionTiming::new(4, 6, 4, 4),
            Self::BusError | Self::AddressError => ExceptionTiming::new(6, 8, 6, 4),
            Self::Autovector(_) | Self::SpuriousInterrupt | Self::UninitializedInterrupt => {
                ExceptionTiming::new(6, 6, 4, 4)
            }
            Self::Trap(_) => ExceptionTiming::new(4, 4, 4, 4),
            _ => ExceptionTiming::new(4, 6, 4, 4),
        }
    }

    /// Map a vector number back to the exception kind, where one exists.
    #[must_use]
    pub const fn from_vector(vector: u8) -> Option<Self> {
        match vector {
            0 | 1 => Some(Self::Reset),
            2 => Some(Self::BusError),
            3 => Some(Self::AddressError),
            4 => Some(Self::IllegalInstruction),
            5 => Some(Self::ZeroDivide),
            6 => Some(Self::Chk),
            7 => Some(Self::Trapv),
            8 => Some(Self::PrivilegeViolation),
            9 => Some(Self::Trace),
            10 => Some(Self::Line1010),
            11 => Some(Self::Line1111),
            14 => Some(Self::FormatError),
            15 => Some(Self::UninitializedInterrupt),
            24 => Some(Self::SpuriousInterrupt),
            25..=31 => Some(Self::Autovector(vector - 24)),
            32..=47 => Some(Self::Trap(vector - 32)),
            _ => None,
        }
    }
}

/// Cycle cost of each dispatch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTiming {
    /// Cycles to acknowledge the exception.
    pub acknowledge: u32,
    /// Cycles of internal processing.
    pub process: u32,
    /// Cycles to push the PC/SR frame.
    pub stack_push: u32,
    /// Cycles to fetch the vector.
    pub vector_fetch: u32,
}

impl ExceptionTiming {
    #[must_use]
    pub const fn new(acknowledge: u32, process: u32, stack_push: u32, vector_fetch: u32) -> Self {
        Self {
            acknowledge,
            process,
            stack_push,
            vector_fetch,
        }
    }

    /// Total dispatch cost.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.acknowledge + self.process + self.stack_push + self.vector_fetch
    }
}

/// Everything a handler learns about one dispatched exception.
///
/// Created transiently at dispatch; only the aggregate statistics
/// persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// The exception kind.
    pub kind: Exception,
    /// Vector table index.
    pub vector: u8,
    /// Numeric priority.
    pub priority: u8,
    /// Priority within the dispatch group.
    pub group_priority: u8,
    /// Faulting address (address errors) or dispatch-time PC.
    pub address: u32,
    /// Status register as saved in the frame.
    pub status: u16,
    /// PC pushed in the frame.
    pub pc: u32,
    /// Opcode of the faulting instruction.
    pub opcode: u16,
    /// The timing breakdown charged for this dispatch.
    pub timing: ExceptionTiming,
}

/// Synchronous error conditions that abort the current instruction.
///
/// The executor returns these through `Result` and the step loop converts
/// them into the architecturally-correct exception dispatch. No error is
/// ever dropped or turned into a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Odd address on a word or long access.
    AddressError {
        /// The misaligned address.
        address: u32,
        /// True for a read access.
        read: bool,
    },
    /// Unrecognized opcode (including line A / line F patterns).
    Illegal(u16),
    /// Privileged instruction in user mode.
    Privilege(u16),
    /// DIVU/DIVS with a zero divisor.
    ZeroDivide,
    /// CHK bounds failure.
    CheckBounds,
    /// TRAPV with the overflow flag set.
    Overflow,
    /// TRAP #n.
    Trap(u8),
}

impl Fault {
    /// The exception this fault dispatches as.
    #[must_use]
    pub const fn exception(self) -> Exception {
        match self {
            Self::AddressError { .. } => Exception::AddressError,
            Self::Illegal(opcode) => match opcode >> 12 {
                0xA => Exception::Line1010,
                0xF => Exception::Line1111,
                _ => Exception::IllegalInstruction,
            },
            Self::Privilege(_) => Exception::PrivilegeViolation,
            Self::ZeroDivide => Exception::ZeroDivide,
            Self::CheckBounds => Exception::Chk,
            Self::Overflow => Exception::Trapv,
            Self::Trap(n) => Exception::Trap(n),
        }
    }
}

/// Result type threaded through the executor.
pub type ExecResult<T> = Result<T, Fault>;

/// Aggregate exception statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExceptionStats {
    /// Exceptions dispatched since the last reset.
    pub raised: u32,
    /// Cycles spent in dispatch overhead.
    pub cycles: u32,
}

/// Per-exception-type handler callback.
pub type ExceptionHandler = Box<dyn FnMut(&ExceptionInfo)>;

const VECTOR_SLOTS: usize = 48;

/// Tracks pending interrupt levels, in-service state, the vector base,
/// per-type timing overrides and handler callbacks.
pub struct ExceptionController {
    /// Pending autovector levels, bit `level - 1`.
    pending: u8,
    /// Levels currently in service, bit `level - 1`.
    in_service: u8,
    vector_base: u32,
    timing: [ExceptionTiming; VECTOR_SLOTS],
    handlers: [Option<ExceptionHandler>; VECTOR_SLOTS],
    stats: ExceptionStats,
}

impl fmt::Debug for ExceptionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionController")
            .field("pending", &self.pending)
            .field("in_service", &self.in_service)
            .field("vector_base", &self.vector_base)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for ExceptionController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionController {
    #[must_use]
    pub fn new() -> Self {
        let mut timing = [ExceptionTiming::new(4, 6, 4, 4); VECTOR_SLOTS];
        for (vector, slot) in timing.iter_mut().enumerate() {
            if let Some(kind) = Exception::from_vector(vector as u8) {
                *slot = kind.default_timing();
            }
        }
        Self {
            pending: 0,
            in_service: 0,
            vector_base: 0,
            timing,
            handlers: core::array::from_fn(|_| None),
            stats: ExceptionStats::default(),
        }
    }

    /// Base address of the vector table.
    #[must_use]
    pub const fn vector_base(&self) -> u32 {
        self.vector_base
    }

    /// Relocate the vector table. A base of zero is valid on a system
    /// whose table actually lives at zero; pointing it elsewhere on such
    /// a system is a caller configuration error the controller does not
    /// second-guess.
    pub fn set_vector_base(&mut self, base: u32) {
        self.vector_base = base;
    }

    /// Address of the vector for `kind`.
    #[must_use]
    pub const fn vector_address(&self, kind: Exception) -> u32 {
        self.vector_base.wrapping_add(kind.vector() as u32 * 4)
    }

    /// Override the timing breakdown for one exception type.
    pub fn set_timing(&mut self, kind: Exception, timing: ExceptionTiming) {
        self.timing[kind.vector() as usize] = timing;
    }

    /// The timing breakdown charged for `kind`.
    #[must_use]
    pub const fn timing(&self, kind: Exception) -> ExceptionTiming {
        self.timing[kind.vector() as usize]
    }

    /// Register a handler invoked after each dispatch of `kind`.
    pub fn set_handler(&mut self, kind: Exception, handler: ExceptionHandler) {
        self.handlers[kind.vector() as usize] = Some(handler);
    }

    /// Remove the handler for `kind`.
    pub fn clear_handler(&mut self, kind: Exception) {
        self.handlers[kind.vector() as usize] = None;
    }

    /// Invoke the handler for `info.kind`, if one is registered.
    pub(crate) fn notify(&mut self, info: &ExceptionInfo) {
        if let Some(handler) = &mut self.handlers[info.vector as usize] {
            handler(info);
        }
    }

    /// Record an autovector interrupt request at `level` (1-7).
    pub fn set_pending(&mut self, level: u8) {
        if (1..=7).contains(&level) {
            self.pending |= 1 << (level - 1);
        }
    }

    /// Drop a pending request that was withdrawn before acknowledge.
    pub fn clear_pending(&mut self, level: u8) {
        if (1..=7).contains(&level) {
            self.pending &= !(1 << (level - 1));
        }
    }

    /// True if any interrupt request is recorded.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending != 0
    }

    /// Highest pending level that beats `mask`, if any. Level 7 is the
    /// non-maskable edge and always qualifies.
    #[must_use]
    pub fn pending_interrupt(&self, mask: u8) -> Option<u8> {
        for level in (1..=7u8).rev() {
            if self.pending & (1 << (level - 1)) != 0 && (level > mask || level == 7) {
                return Some(level);
            }
        }
        None
    }

    /// Acknowledge `level`: clear its pending bit and mark it in service.
    pub fn acknowledge(&mut self, level: u8) {
        if (1..=7).contains(&level) {
            self.pending &= !(1 << (level - 1));
            self.in_service |= 1 << (level - 1);
        }
    }

    /// Mark `level` serviced (RTE from its handler).
    pub fn complete(&mut self, level: u8) {
        if (1..=7).contains(&level) {
            self.in_service &= !(1 << (level - 1));
        }
    }

    /// Mark the highest in-service level as done; RTE calls this when the
    /// platform does not acknowledge levels explicitly.
    pub fn complete_highest(&mut self) -> Option<u8> {
        for level in (1..=7u8).rev() {
            if self.in_service & (1 << (level - 1)) != 0 {
                self.in_service &= !(1 << (level - 1));
                return Some(level);
            }
        }
        None
    }

    /// Levels currently in service, bit `level - 1`.
    #[must_use]
    pub const fn in_service(&self) -> u8 {
        self.in_service
    }

    pub(crate) fn record(&mut self, timing: ExceptionTiming) {
        self.stats.raised = self.stats.raised.wrapping_add(1);
        self.stats.cycles = self.stats.cycles.wrapping_add(timing.total());
    }

    /// Aggregate statistics, read-only.
    #[must_use]
    pub const fn stats(&self) -> ExceptionStats {
        self.stats
    }

    /// Clear the aggregate statistics.
    pub fn reset_stats(&mut self) {
        self.stats = ExceptionStats::default();
    }

    /// Raw pending bitmask (snapshot support).
    #[must_use]
    pub(crate) const fn pending_bits(&self) -> u8 {
        self.pending
    }

    pub(crate) fn restore(&mut self, pending: u8, in_service: u8, stats: ExceptionStats) {
        self.pending = pending & 0x7F;
        self.in_service = in_service & 0x7F;
        self.stats = stats;
    }
}
