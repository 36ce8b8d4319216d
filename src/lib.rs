//! An educational MIPS32 (Release 6) assembler and emulator.
//!
//! The crate splits into three layers:
//!
//! - [`isa`]: the static opcode table, the word decoder (including the
//!   register-field heuristics that untangle the Release 6 compact-branch
//!   encoding collisions) and a diagnostic disassembler.
//! - [`simulator`]: the processor (registers, HI/LO, pc, coprocessor files)
//!   executing one decoded instruction per [`simulator::Processor::step`]
//!   over a sparse big-endian [`simulator::Memory`].
//! - [`assembler`]: a line-oriented assembler (lexer, parser,
//!   pseudo-instruction expansion, two-pass loader) producing the memory
//!   image and entry point the processor consumes.
//!
//! ```
//! use mips32sim::assembler::assemble;
//! use mips32sim::simulator::{CopFlags, Memory, Processor, ADDR_STACK_TOP, REG_T0};
//!
//! let mut mem = Memory::new();
//! let program = assemble("li $t0, 42", &mut mem).unwrap();
//! let mut cpu = Processor::new(mem, program.entry, ADDR_STACK_TOP as u32, CopFlags::all());
//! cpu.step().unwrap();
//! assert_eq!(cpu.regs().get_u32(REG_T0), 42);
//! ```

pub mod assembler;
pub mod isa;
pub mod simulator;

pub use isa::{decode, disassemble, Format, Instruction, Mnemonic, Opcode};
pub use simulator::{CopFlags, Memory, Processor, StepError};
