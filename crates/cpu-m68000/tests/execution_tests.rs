//! Integration tests driving whole programs through the core.
//!
//! The bus is a flat 16 MB byte array with no wait states, so cycle
//! assertions here exercise only the engine's own accounting.

use cpu_m68000::bus::MemoryBus;
use cpu_m68000::exceptions::Exception;
use cpu_m68000::flags::{C, V, X, Z};
use cpu_m68000::Cpu68000;

/// Flat 24-bit address space.
struct TestBus {
    mem: Vec<u8>,
}

impl TestBus {
    fn new() -> Self {
        Self { mem: vec![0; 0x100_0000] }
    }

    fn load_words(&mut self, address: u32, words: &[u16]) {
        for (n, word) in words.iter().enumerate() {
            let at = (address as usize + n * 2) & 0xFF_FFFF;
            self.mem[at] = (word >> 8) as u8;
            self.mem[at + 1] = *word as u8;
        }
    }

    fn load_long(&mut self, address: u32, value: u32) {
        self.load_words(address, &[(value >> 16) as u16, value as u16]);
    }
}

impl MemoryBus for TestBus {
    fn read_byte(&mut self, address: u32) -> u8 {
        self.mem[(address & 0xFF_FFFF) as usize]
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        self.mem[(address & 0xFF_FFFF) as usize] = value;
    }
}

fn cpu_at(pc: u32) -> Cpu68000 {
    let mut cpu = Cpu68000::new();
    cpu.regs.pc = pc;
    cpu.regs.ssp = 0x0000_8000;
    cpu
}

#[test]
fn moveq_zero_then_tst_sets_z_clears_nvc() {
    let mut bus = TestBus::new();
    // MOVEQ #0,D0 ; TST.L D0.
    bus.load_words(0x1000, &[0x7000, 0x4A80]);
    let mut cpu = cpu_at(0x1000);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0);
    assert!(cpu.regs.sr.is_zero());

    cpu.step(&mut bus);
    assert!(cpu.regs.sr.is_zero());
    assert!(!cpu.regs.sr.is_negative());
    assert!(!cpu.regs.sr.contains(V));
    assert!(!cpu.regs.sr.contains(C));
}

#[test]
fn move_word_then_ext_long_sign_extends() {
    let mut bus = TestBus::new();
    // MOVE.W #$FFFF,D0 ; EXT.L D0.
    bus.load_words(0x1000, &[0x303C, 0xFFFF, 0x48C0]);
    let mut cpu = cpu_at(0x1000);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0x0000_FFFF);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0xFFFF_FFFF);
    assert!(cpu.regs.sr.is_negative());
}

#[test]
fn add_long_wraps_with_carry_but_no_overflow() {
    let mut bus = TestBus::new();
    // ADD.L D1,D0 with D0=5, D1=0xFFFFFFFF (the -1 + 5 scenario).
    bus.load_words(0x1000, &[0xD081]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 5;
    cpu.regs.d[1] = 0xFFFF_FFFF;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 4);
    assert!(cpu.regs.sr.contains(C));
    assert!(!cpu.regs.sr.contains(V));
    assert!(!cpu.regs.sr.is_negative());
    assert!(!cpu.regs.sr.is_zero());
}

#[test]
fn sub_then_add_restores_value_and_flags() {
    let mut bus = TestBus::new();
    // SUB.W D1,D0 ; ADD.W D1,D0.
    bus.load_words(0x1000, &[0x9041, 0xD041]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 0x1234;
    cpu.regs.d[1] = 0x0030;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0] & 0xFFFF, 0x1204);
    assert!(!cpu.regs.sr.contains(C) && !cpu.regs.sr.contains(V));

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0] & 0xFFFF, 0x1234, "round trip restores the value");
    assert!(!cpu.regs.sr.contains(C) && !cpu.regs.sr.contains(V));
}

#[test]
fn divu_by_zero_dispatches_and_preserves_the_destination() {
    let mut bus = TestBus::new();
    bus.load_long(0x14, 0x0000_4000); // zero-divide vector
    // DIVU D1,D0 with D1 = 0.
    bus.load_words(0x1000, &[0x80C1]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 0x0001_2345;
    cpu.regs.d[1] = 0;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0x0001_2345, "destination untouched");
    assert_eq!(cpu.regs.pc, 0x4000, "handler entered");
    // The frame's saved SR carries V from the aborted divide.
    let sp = cpu.regs.ssp;
    let saved_sr = u16::from(bus.mem[sp as usize]) << 8 | u16::from(bus.mem[sp as usize + 1]);
    assert_ne!(saved_sr & 0x0002, 0, "V was set before the dispatch");
}

#[test]
fn divu_overflow_sets_v_without_trapping() {
    let mut bus = TestBus::new();
    // DIVU D1,D0: 0x00100000 / 1 overflows 16 bits.
    bus.load_words(0x1000, &[0x80C1]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 0x0010_0000;
    cpu.regs.d[1] = 1;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0x0010_0000, "result unchanged on overflow");
    assert!(cpu.regs.sr.contains(V));
    assert_eq!(cpu.regs.pc, 0x1002, "no exception for overflow");
}

#[test]
fn muls_multiplies_signed_words_into_a_long() {
    let mut bus = TestBus::new();
    // MULS D1,D0: -3 * 100 = -300.
    bus.load_words(0x1000, &[0xC1C1]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 100;
    cpu.regs.d[1] = 0xFFFD;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0] as i32, -300);
    assert!(cpu.regs.sr.is_negative());
}

#[test]
fn masked_interrupt_stays_pending_until_the_mask_drops() {
    let mut bus = TestBus::new();
    bus.load_long(0x6C, 0x0000_5000); // autovector level 3
    bus.load_words(0x1000, &[0x4E71, 0x4E71]); // NOP ; NOP
    let mut cpu = cpu_at(0x1000);
    // Reset state masks everything at level 7.
    cpu.set_irq(3);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x1002, "PC advanced normally, no dispatch");
    assert_eq!(cpu.exceptions().stats().raised, 0);

    // Lower the mask below the pending level; the request releases.
    cpu.regs.sr.set_interrupt_mask(2);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x5000, "pending interrupt dispatched");
    assert_eq!(cpu.regs.sr.interrupt_mask(), 3, "mask raised to the level");
    assert!(cpu.regs.sr.is_supervisor());
}

#[test]
fn interrupt_frame_round_trips_through_rte() {
    let mut bus = TestBus::new();
    bus.load_long(0x74, 0x0000_5000); // autovector level 5
    bus.load_words(0x1000, &[0x4E71, 0x4E71]); // NOP ; NOP
    bus.load_words(0x5000, &[0x4E73]); // RTE
    let mut cpu = cpu_at(0x1000);
    cpu.regs.sr.set_interrupt_mask(0);
    let sp_before = cpu.regs.ssp;

    cpu.set_irq(5);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x5000);
    assert_eq!(cpu.regs.ssp, sp_before - 6, "PC long + SR word stacked");

    cpu.set_irq(0); // line released while in service
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x1000, "RTE restores the interrupted PC");
    assert_eq!(cpu.regs.ssp, sp_before, "frame fully popped");
    assert_eq!(cpu.regs.sr.interrupt_mask(), 0, "saved mask restored");
}

#[test]
fn exception_handler_callback_sees_the_info() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut bus = TestBus::new();
    bus.load_long(0x10, 0x0000_3000); // illegal instruction vector
    bus.load_words(0x1000, &[0x4AFC]); // ILLEGAL
    let mut cpu = cpu_at(0x1000);

    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    cpu.exceptions_mut().set_handler(
        Exception::IllegalInstruction,
        Box::new(move |info| {
            *sink.borrow_mut() = Some((info.vector, info.pc, info.opcode));
        }),
    );

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x3000);
    let seen = seen.borrow();
    let (vector, pc, opcode) = seen.expect("handler ran");
    assert_eq!(vector, 4);
    assert_eq!(pc, 0x1002, "frame PC points after the opcode");
    assert_eq!(opcode, 0x4AFC);
}

#[test]
fn privileged_instruction_in_user_mode_dispatches() {
    let mut bus = TestBus::new();
    bus.load_long(0x20, 0x0000_3000); // privilege violation vector
    bus.load_words(0x1000, &[0x46C0]); // MOVE D0,SR
    let mut cpu = cpu_at(0x1000);
    cpu.regs.sr.set_supervisor(false);
    cpu.regs.usp = 0x0000_7000;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x3000);
    assert!(cpu.regs.sr.is_supervisor(), "handler runs in supervisor mode");
    assert_eq!(cpu.exceptions().stats().raised, 1);
}

#[test]
fn stop_waits_and_an_interrupt_wakes_it() {
    let mut bus = TestBus::new();
    bus.load_long(0x70, 0x0000_5000); // autovector level 4
    bus.load_words(0x1000, &[0x4E72, 0x2000]); // STOP #$2000 (mask 0)
    let mut cpu = cpu_at(0x1000);

    cpu.step(&mut bus);
    assert!(cpu.is_stopped());
    let pc_stopped = cpu.regs.pc;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, pc_stopped, "stopped core makes no progress");

    cpu.set_irq(4);
    cpu.step(&mut bus);
    assert!(!cpu.is_stopped());
    assert_eq!(cpu.regs.pc, 0x5000);
}

#[test]
fn odd_opcode_fetch_is_an_address_error() {
    let mut bus = TestBus::new();
    bus.load_long(0x0C, 0x0000_3000); // address error vector
    let mut cpu = cpu_at(0x1001);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x3000);
    assert_eq!(cpu.exceptions().stats().raised, 1);
}

#[test]
fn trap_reaches_its_own_vector() {
    let mut bus = TestBus::new();
    bus.load_long(0x80 + 4 * 3, 0x0000_3000); // TRAP #3 = vector 35
    bus.load_words(0x1000, &[0x4E43]);
    let mut cpu = cpu_at(0x1000);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x3000);
}

#[test]
fn chk_in_bounds_is_a_no_op_and_out_of_bounds_traps() {
    let mut bus = TestBus::new();
    bus.load_long(0x18, 0x0000_3000); // CHK vector
    // CHK.W D1,D0 twice.
    bus.load_words(0x1000, &[0x41C1]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 10;
    cpu.regs.d[1] = 20;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x1002, "within bounds");

    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 30;
    cpu.regs.d[1] = 20;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x3000, "above the bound traps");
    assert!(!cpu.regs.sr.is_negative());
}

#[test]
fn addx_chains_the_extend_flag_across_words() {
    let mut bus = TestBus::new();
    // ADD.W D2,D0 ; ADDX.W D3,D1: a 32-bit add done in two halves.
    bus.load_words(0x1000, &[0xD042, 0xD343]);
    let mut cpu = cpu_at(0x1000);
    // 0x0001_8000 + 0x0001_8000 split into halves.
    cpu.regs.d[0] = 0x8000;
    cpu.regs.d[2] = 0x8000;
    cpu.regs.d[1] = 0x0001;
    cpu.regs.d[3] = 0x0001;

    cpu.step(&mut bus);
    assert!(cpu.regs.sr.contains(X), "low half carried");
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0] & 0xFFFF, 0x0000);
    assert_eq!(cpu.regs.d[1] & 0xFFFF, 0x0003, "1 + 1 + X");
}

#[test]
fn scc_writes_all_ones_or_zeros() {
    let mut bus = TestBus::new();
    // SEQ D0 with Z set; SNE D1 with Z set.
    bus.load_words(0x1000, &[0x57C0, 0x56C1]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.sr.set(Z, true);
    cpu.regs.d[0] = 0x1234_5600;
    cpu.regs.d[1] = 0x1234_56FF;

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0x1234_56FF, "condition true: byte of ones");
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[1], 0x1234_5600, "condition false: byte of zeros");
}

#[test]
fn movem_spills_and_restores_registers() {
    let mut bus = TestBus::new();
    // MOVEM.L D0-D1/A1,-(A7) ; MOVEM.L (A7)+,D0-D1/A1.
    bus.load_words(0x1000, &[0x48E7, 0xC040, 0x4CDF, 0x0203]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.d[0] = 0x1111_1111;
    cpu.regs.d[1] = 0x2222_2222;
    cpu.regs.set_a(1, 0x3333_3333);
    let sp_before = cpu.regs.active_sp();

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.active_sp(), sp_before - 12);

    cpu.regs.d[0] = 0;
    cpu.regs.d[1] = 0;
    cpu.regs.set_a(1, 0);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0x1111_1111);
    assert_eq!(cpu.regs.d[1], 0x2222_2222);
    assert_eq!(cpu.regs.a(1), 0x3333_3333);
    assert_eq!(cpu.regs.active_sp(), sp_before, "stack balanced");
}

#[test]
fn movem_word_loads_sign_extend() {
    let mut bus = TestBus::new();
    // MOVEM.W (A0),D0-D1.
    bus.load_words(0x1000, &[0x4C90, 0x0003]);
    bus.load_words(0x2000, &[0x8000, 0x7FFF]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.set_a(0, 0x2000);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.d[0], 0xFFFF_8000, "negative word widens");
    assert_eq!(cpu.regs.d[1], 0x0000_7FFF);
}

#[test]
fn link_and_unlk_are_inverses() {
    let mut bus = TestBus::new();
    // LINK A6,#-8 ; UNLK A6.
    bus.load_words(0x1000, &[0x4E56, 0xFFF8, 0x4E5E]);
    let mut cpu = cpu_at(0x1000);
    cpu.regs.set_a(6, 0xDEAD_BEE0);
    let sp_before = cpu.regs.active_sp();

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.a(6), sp_before - 4, "frame pointer at the saved slot");
    assert_eq!(cpu.regs.active_sp(), sp_before - 12, "old A6 plus locals");

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.a(6), 0xDEAD_BEE0, "A6 restored");
    assert_eq!(cpu.regs.active_sp(), sp_before, "stack restored");
}

#[test]
fn tas_sets_the_high_bit_in_one_access() {
    let mut bus = TestBus::new();
    // TAS (A0).
    bus.load_words(0x1000, &[0x4AD0]);
    bus.mem[0x2000] = 0x00;
    let mut cpu = cpu_at(0x1000);
    cpu.regs.set_a(0, 0x2000);

    cpu.step(&mut bus);
    assert_eq!(bus.mem[0x2000], 0x80);
    assert!(cpu.regs.sr.is_zero(), "flags describe the prior value");
}

#[test]
fn run_honors_the_cycle_budget() {
    let mut bus = TestBus::new();
    // An endless stream of NOPs.
    for n in 0..256 {
        bus.load_words(0x1000 + n * 2, &[0x4E71]);
    }
    let mut cpu = cpu_at(0x1000);
    let consumed = cpu.run(&mut bus, 64);
    assert!(consumed >= 64, "runs at least to the budget");
    assert!(consumed < 64 + 32, "stops at the first boundary past it");
    assert!(cpu.timing().should_sync());
}

#[test]
fn sync_request_preempts_the_budget() {
    let mut bus = TestBus::new();
    bus.load_words(0x1000, &[0x4E71]);
    let mut cpu = cpu_at(0x1000);
    cpu.timing_mut().request_z80_sync();
    let consumed = cpu.run(&mut bus, 10_000);
    assert_eq!(consumed, 0, "sync pending: yield before executing");
    cpu.timing_mut().sync_with_z80();
    assert!(!cpu.timing().sync_pending());
}

#[test]
fn snapshot_mid_program_resumes_identically() {
    let mut bus = TestBus::new();
    // MOVEQ #5,D0 ; ADDQ.L #2,D0 ; SWAP D0.
    bus.load_words(0x1000, &[0x7005, 0x5480, 0x4840]);
    let mut cpu = cpu_at(0x1000);
    cpu.step(&mut bus);

    let blob = cpu.save_state();
    let mut resumed = Cpu68000::new();
    resumed.load_state(&blob);

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    resumed.step(&mut bus);
    resumed.step(&mut bus);
    assert_eq!(resumed.regs, cpu.regs);
    assert_eq!(resumed.regs.d[0], 0x0007_0000);
}

#[test]
fn debug_register_api_uses_sentinels() {
    let mut cpu = Cpu68000::new();
    cpu.set_register(0, 0x1234_5678);
    assert_eq!(cpu.get_register(0), 0x1234_5678);
    cpu.set_register(17, 0xFFFF_FFFF);
    assert_eq!(cpu.get_register(17), 0xA71F, "SR masked to implemented bits");
    assert_eq!(cpu.get_register(99), 0xFFFF_FFFF, "sentinel for bad index");
    cpu.set_register(99, 0); // silently ignored, no corruption
    assert_eq!(cpu.get_register(0), 0x1234_5678);
}

#[test]
fn byte_push_on_a7_keeps_the_stack_word_aligned() {
    let mut bus = TestBus::new();
    // MOVE.B D0,-(A7).
    bus.load_words(0x1000, &[0x1F00]);
    let mut cpu = cpu_at(0x1000);
    let sp_before = cpu.regs.active_sp();
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.active_sp(), sp_before - 2, "byte costs a word on A7");
}

#[test]
fn reset_loads_ssp_and_pc_from_the_vector_table() {
    let mut bus = TestBus::new();
    bus.load_long(0x0, 0x0000_8000);
    bus.load_long(0x4, 0x0000_1000);
    bus.load_words(0x1000, &[0x4E71]);
    let mut cpu = Cpu68000::new();
    cpu.reset(&mut bus);
    assert_eq!(cpu.regs.ssp, 0x8000);
    assert_eq!(cpu.regs.pc, 0x1000);
    assert!(cpu.regs.sr.is_supervisor());
    assert_eq!(cpu.regs.sr.interrupt_mask(), 7);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0x1002);
}
