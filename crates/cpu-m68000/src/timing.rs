//! The cycle accounting model.
//!
//! The engine never sleeps or blocks; it accumulates cycles into this
//! state and the external driver interleaves it with the co-processors by
//! checking [`TimingState::should_sync`] between slices. Memory accesses
//! are charged a region-dependent base cost plus a fixed write penalty;
//! everything else is charged explicitly by the executor.

/// Extra cycles a write pays over a read of the same region.
const WRITE_PENALTY: u32 = 2;

/// Memory map region, for bus-cost lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Cartridge ROM, 0x000000-0x3FFFFF.
    Rom,
    /// Cartridge expansion, 0x400000-0x7FFFFF.
    Expansion,
    /// Z80 address window, 0xA00000-0xA0FFFF.
    Z80,
    /// I/O and control ports, 0xA10000-0xBFFFFF.
    Io,
    /// VDP ports, 0xC00000-0xC0001F.
    Vdp,
    /// Work RAM, 0xFF0000-0xFFFFFF.
    Ram,
    /// Everything unassigned.
    Reserved,
}

impl MemoryRegion {
    /// Classify a 24-bit bus address.
    #[must_use]
    pub const fn of(address: u32) -> Self {
        match address & 0x00FF_FFFF {
            0x0000_0000..=0x003F_FFFF => Self::Rom,
            0x0040_0000..=0x007F_FFFF => Self::Expansion,
            0x00A0_0000..=0x00A0_FFFF => Self::Z80,
            0x00A1_0000..=0x00BF_FFFF => Self::Io,
            0x00C0_0000..=0x00C0_001F => Self::Vdp,
            0x00FF_0000..=0x00FF_FFFF => Self::Ram,
            _ => Self::Reserved,
        }
    }

    /// Base read cost in cycles. Work RAM is the fastest thing on the
    /// bus; the VDP and I/O ports are the slowest.
    #[must_use]
    pub const fn base_cost(self) -> u32 {
        match self {
            Self::Ram => 2,
            Self::Z80 => 3,
            Self::Rom | Self::Expansion | Self::Reserved => 4,
            Self::Vdp | Self::Io => 5,
        }
    }
}

/// Read-only profiling counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingStats {
    /// Cycles charged by instruction execution (base + effective address).
    pub instruction_cycles: u32,
    /// Cycles charged by memory accesses.
    pub memory_cycles: u32,
    /// Cycles spent in wait states and co-processor synchronization.
    pub wait_cycles: u32,
    /// Instructions retired.
    pub instructions: u32,
}

/// Pending synchronization state toward the co-processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct SyncState {
    last_sync_cycle: u32,
    z80_pending: bool,
    vdp_pending: bool,
}

/// Cycle counters, budget and sync flags for one CPU instance.
///
/// Mutated on every memory access and instruction; reset only on explicit
/// request from the driver, never implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingState {
    current_cycles: u32,
    target_cycles: u32,
    wait_states: u8,
    prefetch_queue: u8,
    stats: TimingStats,
    sync: SyncState,
}

impl TimingState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every counter, the budget and the sync flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Cycles accumulated since the last reset or sync completion.
    #[must_use]
    pub const fn current_cycles(&self) -> u32 {
        self.current_cycles
    }

    /// The budget the driver asked for.
    #[must_use]
    pub const fn target_cycles(&self) -> u32 {
        self.target_cycles
    }

    /// Set the cycle budget for the current run request.
    pub fn set_target_cycles(&mut self, cycles: u32) {
        self.target_cycles = cycles;
    }

    /// Charge execution cycles.
    pub fn add_cycles(&mut self, cycles: u32) {
        self.current_cycles = self.current_cycles.wrapping_add(cycles);
        self.stats.instruction_cycles = self.stats.instruction_cycles.wrapping_add(cycles);
    }

    /// The bus cost of one access to `address`, before wait states.
    #[must_use]
    pub const fn memory_access_cost(address: u32, is_write: bool) -> u32 {
        MemoryRegion::of(address).base_cost() + if is_write { WRITE_PENALTY } else { 0 }
    }

    /// Charge one memory access: region base cost, write penalty and any
    /// configured wait states.
    pub fn add_memory_cycles(&mut self, address: u32, is_write: bool) {
        let cycles = Self::memory_access_cost(address, is_write);
        self.current_cycles = self.current_cycles.wrapping_add(cycles);
        self.stats.memory_cycles = self.stats.memory_cycles.wrapping_add(cycles);
        if self.wait_states > 0 {
            let waits = u32::from(self.wait_states);
            self.current_cycles = self.current_cycles.wrapping_add(waits);
            self.stats.wait_cycles = self.stats.wait_cycles.wrapping_add(waits);
        }
    }

    /// Count one retired instruction.
    pub fn note_instruction(&mut self) {
        self.stats.instructions = self.stats.instructions.wrapping_add(1);
    }

    /// Configure extra wait states per memory access (slow cartridges,
    /// DMA contention).
    pub fn set_wait_states(&mut self, states: u8) {
        self.wait_states = states;
    }

    /// Current prefetch queue occupancy in words.
    #[must_use]
    pub const fn prefetch_queue(&self) -> u8 {
        self.prefetch_queue
    }

    /// Record the prefetch queue occupancy (timing only; results never
    /// depend on it).
    pub fn set_prefetch_queue(&mut self, words: u8) {
        self.prefetch_queue = words;
    }

    /// Mark that the Z80 needs servicing before more work happens here.
    pub fn request_z80_sync(&mut self) {
        self.sync.z80_pending = true;
    }

    /// Mark that the VDP needs servicing before more work happens here.
    pub fn request_vdp_sync(&mut self) {
        self.sync.vdp_pending = true;
    }

    /// True while either co-processor sync request is outstanding.
    #[must_use]
    pub const fn sync_pending(&self) -> bool {
        self.sync.z80_pending || self.sync.vdp_pending
    }

    /// The cooperative scheduling signal: the budget is spent or a
    /// co-processor is waiting. Performs no blocking itself.
    #[must_use]
    pub const fn should_sync(&self) -> bool {
        self.current_cycles >= self.target_cycles || self.sync_pending()
    }

    /// Acknowledge a pending Z80 sync, charging the handoff wait.
    pub fn sync_with_z80(&mut self) {
        if self.sync.z80_pending {
            self.stats.wait_cycles = self.stats.wait_cycles.wrapping_add(3);
            self.current_cycles = self.current_cycles.wrapping_add(3);
            self.sync.z80_pending = false;
        }
    }

    /// Acknowledge a pending VDP sync, charging the access wait.
    pub fn sync_with_vdp(&mut self) {
        if self.sync.vdp_pending {
            self.stats.wait_cycles = self.stats.wait_cycles.wrapping_add(4);
            self.current_cycles = self.current_cycles.wrapping_add(4);
            self.sync.vdp_pending = false;
        }
    }

    /// Close out a completed slice: record the watermark and rearm the
    /// counters for the next budget.
    pub fn complete_slice(&mut self) {
        if self.current_cycles >= self.target_cycles {
            self.sync.last_sync_cycle = self.current_cycles;
            self.current_cycles = 0;
            self.target_cycles = 0;
        }
    }

    /// Cycle watermark at the last completed slice.
    #[must_use]
    pub const fn last_sync_cycle(&self) -> u32 {
        self.sync.last_sync_cycle
    }

    /// Configured wait states per memory access.
    #[must_use]
    pub const fn wait_states(&self) -> u8 {
        self.wait_states
    }

    /// True while a Z80 sync request is outstanding.
    #[must_use]
    pub const fn z80_sync_pending(&self) -> bool {
        self.sync.z80_pending
    }

    /// True while a VDP sync request is outstanding.
    #[must_use]
    pub const fn vdp_sync_pending(&self) -> bool {
        self.sync.vdp_pending
    }

    /// Rebuild the full state from snapshot fields.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        &mut self,
        current: u32,
        target: u32,
        wait_states: u8,
        prefetch: u8,
        stats: TimingStats,
        last_sync: u32,
        z80_pending: bool,
        vdp_pending: bool,
    ) {
        self.current_cycles = current;
        self.target_cycles = target;
        self.wait_states = wait_states;
        self.prefetch_queue = prefetch;
        self.stats = stats;
        self.sync = SyncState {
            last_sync_cycle: last_sync,
            z80_pending,
            vdp_pending,
        };
    }

    /// Profiling counters, read-only.
    #[must_use]
    pub const fn stats(&self) -> TimingStats {
        self.stats
    }

    /// Clear the profiling counters only.
    pub fn reset_stats(&mut self) {
        self.stats = TimingStats::default();
    }
}
