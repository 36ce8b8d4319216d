//! End-to-end programs: assembled from source, loaded, and executed step by
//! step through the public API.

use mips32sim::assembler::assemble;
use mips32sim::simulator::{
    CopFlags, Memory, Processor, ADDR_STACK_TOP, REG_RA, REG_T0, REG_T1, REG_T2,
};
use mips32sim::{decode, StepError};

fn boot(source: &str) -> Processor {
    boot_with(source, CopFlags::all())
}

fn boot_with(source: &str, cops: CopFlags) -> Processor {
    let mut mem = Memory::new();
    let program = assemble(source, &mut mem).expect("assembly failed");
    Processor::new(mem, program.entry, ADDR_STACK_TOP as u32, cops)
}

#[test]
fn branch_delay_slot_program() {
    // The delay-slot instruction after bal executes exactly once, then the
    // subroutine call target is honored.
    let mut cpu = boot(
        "bal sub
         addiu $t0, $zero, 42
         j done
         sub: jr $ra
         done: nop",
    );

    for _ in 0..4 {
        cpu.step().unwrap();
    }

    assert_eq!(cpu.regs().get_u32(REG_T0), 42);
}

#[test]
fn trap_on_equal_values() {
    let mut cpu = boot(
        "addiu $t1, $zero, 5
         addiu $t2, $zero, 5
         teq $t1, $t2",
    );

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(matches!(cpu.step(), Err(StepError::Trap)));
}

#[test]
fn no_trap_on_unequal_values() {
    let mut cpu = boot(
        "addiu $t1, $zero, 5
         addiu $t2, $zero, 7
         teq $t1, $t2
         addiu $t0, $zero, 9",
    );

    for _ in 0..4 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.regs().get_u32(REG_T0), 9);
}

#[test]
fn signaling_nan_comparison_writes_then_signals() {
    // Quiet NaN bits into $f2, 1.0 into $f4, then a signaling equality.
    let mut cpu = boot(
        "li $t0, 0x7fc00000
         mtc1 $t0, $f2
         li $t1, 0x3f800000
         mtc1 $t1, $f4
         li $t2, 0xffffffff
         mtc1 $t2, $f6
         cmp.seq.s $f6, $f2, $f4",
    );

    for _ in 0..12 {
        // the wide li forms expand to two instructions each
        match cpu.step() {
            Ok(()) => continue,
            Err(StepError::InvalidFpOperation) => {
                // the mask result was written before the signal
                assert_eq!(cpu.fpu().get(6), 0);
                return;
            }
            Err(other) => panic!("unexpected condition: {other}"),
        }
    }
    panic!("signaling comparison never raised");
}

#[test]
fn multiply_accumulate_chain() {
    let mut cpu = boot(
        "addiu $t3, $zero, 10
         addiu $t4, $zero, 20
         mult $t3, $t4
         addiu $t1, $zero, 5
         addiu $t2, $zero, 6
         madd $t1, $t2
         mflo $t0",
    );

    for _ in 0..7 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.regs().get_u32(REG_T0), 230);
}

#[test]
fn deterministic_execution() {
    let source = "li $t0, 0xdeadbeef
         addiu $t1, $zero, 77
         mult $t0, $t1
         mflo $t2
         xor $t0, $t0, $t2
         sw $t0, 0($sp)
         lw $t3, 0($sp)";

    let run = || {
        let mut cpu = boot(source);
        for _ in 0..8 {
            cpu.step().unwrap();
        }
        (cpu.regs().clone(), cpu.pc(), cpu.hi(), cpu.lo())
    };

    assert_eq!(run(), run());
}

#[test]
fn compact_branch_assembles_and_branches() {
    let mut cpu = boot(
        "addiu $t0, $zero, 3
         addiu $t1, $zero, 3
         beqc $t0, $t1, out
         addiu $t3, $zero, 1
         out: addiu $t2, $zero, 2",
    );

    // The assembled word must decode back to beqc, not a POP10 sibling.
    let branch_addr = cpu.pc() + 8;
    let word = cpu.memory_mut().read_word(branch_addr).unwrap();
    assert_eq!(decode(word).unwrap().name, "beqc");

    for _ in 0..4 {
        cpu.step().unwrap();
    }
    // Branch taken: the skipped addiu never ran.
    assert_eq!(cpu.regs().get_u32(REG_T2), 2);
    assert_eq!(cpu.regs().get_u32(mips32sim::simulator::REG_T3), 0);
}

#[test]
fn cop2_space_stalls_when_disabled() {
    let mut cpu = boot_with("sdc2 $t0, 3($t1)", CopFlags::empty());
    let entry = cpu.pc();
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), entry);
}

#[test]
fn syscall_raises() {
    let mut cpu = boot("syscall");
    assert!(matches!(cpu.step(), Err(StepError::Syscall)));
}

#[test]
fn data_section_round_trip() {
    let mut cpu = boot(
        ".data
         value: .word 123
         .text
         la $t0, value
         lw $t1, 0($t0)",
    );

    for _ in 0..3 {
        // la is two instructions
        cpu.step().unwrap();
    }
    assert_eq!(cpu.regs().get_u32(REG_T1), 123);
}

#[test]
fn subroutine_link_register_round_trip() {
    let mut cpu = boot(
        "jal sub
         nop
         addiu $t0, $zero, 1
         sub: addiu $t1, $zero, 2
         jr $ra",
    );

    cpu.step().unwrap(); // jal runs its delay slot (nop) inline
    assert_eq!(cpu.regs().get_u32(REG_T1), 0);
    let ra = cpu.regs().get_u32(REG_RA);

    cpu.step().unwrap(); // sub: addiu
    assert_eq!(cpu.regs().get_u32(REG_T1), 2);

    cpu.step().unwrap(); // jr $ra
    assert_eq!(cpu.pc(), ra);

    cpu.step().unwrap(); // addiu $t0 after the delay slot
    assert_eq!(cpu.regs().get_u32(REG_T0), 1);
}
