use std::io;

use bitflags::bitflags;
use log::debug;
use thiserror::Error;

use crate::isa::{decode, Instruction, Mnemonic, OPCODE_MASK};

use super::memory::{Memory, ADDR_HEAP};
use super::registers::{
    Cop2Registers, FpuControl, FpuRegisters, Registers, REG_GP, REG_RA, REG_SP,
};

bitflags! {
    /// Coprocessor enable bits handed to the processor at construction.
    pub struct CopFlags: u8 {
        const COP1 = 0b01;
        const COP2 = 0b10;
    }
}

/// A fatal condition raised out of [`Processor::step`].
///
/// None of these are caught internally; the host decides whether to report,
/// terminate or inspect. A handler either applies its effects fully or raises
/// before mutating anything visible, with one documented exception: a
/// signaling FPU comparison writes its mask result and then raises
/// [`StepError::InvalidFpOperation`].
#[derive(Error, Debug)]
pub enum StepError {
    #[error("unknown opcode {0:#010x}")]
    UnknownOpcode(u32),
    #[error("trap")]
    Trap,
    #[error("breakpoint")]
    Break,
    #[error("system call")]
    Syscall,
    #[error("debug breakpoint")]
    DebugBreakpoint,
    #[error("reserved instruction")]
    ReservedInstruction,
    #[error("address error at {0:#010x}")]
    AddressError(u32),
    #[error("invalid floating point operation")]
    InvalidFpOperation,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("memory error: {0}")]
    Memory(#[from] io::Error),
}

/// The execution engine: register state plus the memory image it runs over.
///
/// One `step()` call fetches, decodes and retires a single instruction.
/// All mutable machine state lives here; introspection goes through the
/// borrowing accessors and every write goes through an instruction.
#[derive(Debug)]
pub struct Processor {
    pub(super) mem: Memory,
    pub(super) regs: Registers,
    pub(super) fpu: FpuRegisters,
    pub(super) cop2: Cop2Registers,
    pub(super) shadow: Registers,
    pub(super) fpc: FpuControl,
    pub(super) pc: u32,
    pub(super) hi: u32,
    pub(super) lo: u32,
    cops: CopFlags,
}

impl Processor {
    /// Build a processor over an assembled memory image.
    ///
    /// `entry` is the first text-segment address; `initial_sp` seeds GPR 29.
    pub fn new(mem: Memory, entry: u32, initial_sp: u32, cops: CopFlags) -> Self {
        let mut regs = Registers::default();
        regs.set_u32(REG_SP, initial_sp);
        regs.set_u32(REG_GP, ADDR_HEAP as u32);

        Self {
            mem,
            regs,
            fpu: FpuRegisters::default(),
            cop2: Cop2Registers::default(),
            shadow: Registers::default(),
            fpc: FpuControl::default(),
            pc: entry,
            hi: 0,
            lo: 0,
            cops,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    pub fn fpu(&self) -> &FpuRegisters {
        &self.fpu
    }

    pub fn cop2(&self) -> &Cop2Registers {
        &self.cop2
    }

    pub fn shadow(&self) -> &Registers {
        &self.shadow
    }

    pub fn fpu_control(&self) -> &FpuControl {
        &self.fpc
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    // Field-width adapters between the 5-bit instruction fields and the
    // register files.

    pub(super) fn gpr(&self, i: u32) -> u32 {
        self.regs.get_u32(i as u8)
    }

    pub(super) fn gpr_i(&self, i: u32) -> i32 {
        self.regs.get_i32(i as u8)
    }

    pub(super) fn set_gpr(&mut self, i: u32, value: u32) {
        self.regs.set_u32(i as u8, value);
    }

    pub(super) fn set_gpr_i(&mut self, i: u32, value: i32) {
        self.regs.set_i32(i as u8, value);
    }

    /// Branch target relative to the already-advanced pc.
    fn branch_target(&self, inst: Instruction) -> u32 {
        self.pc.wrapping_add((inst.simm16() << 2) as u32)
    }

    /// Jump target: the 26-bit index shifted into the already-advanced pc's
    /// 256MB region.
    fn jump_target(&self, inst: Instruction) -> u32 {
        self.pc & 0xf000_0000 | inst.target() << 2
    }

    pub(super) fn branch_if(&mut self, cond: bool, inst: Instruction) {
        if cond {
            self.pc = self.branch_target(inst);
        }
    }

    /// The delay-slot convention for the linking jumps: write the link, run
    /// the next sequential instruction via one nested `step()`, then redirect.
    fn link_and_delay(&mut self, link_reg: u32, target: u32) -> Result<(), StepError> {
        self.set_gpr(link_reg, self.pc.wrapping_add(4));
        self.step()?;
        self.pc = target;
        Ok(())
    }

    /// Execute one instruction.
    ///
    /// Fetches the word at pc. A COP2-space word with the COP2 enable bit
    /// clear is skipped entirely: pc does not advance and nothing executes.
    /// Otherwise pc advances by 4 before dispatch, so branch handlers compute
    /// targets relative to the following instruction.
    pub fn step(&mut self) -> Result<(), StepError> {
        let word = self.mem.read_word(self.pc)?;

        if word & OPCODE_MASK == 0x12 << 26 && !self.cops.contains(CopFlags::COP2) {
            debug!("COP2 disabled, stalling on {word:#010x} at {:#010x}", self.pc);
            return Ok(());
        }

        self.pc = self.pc.wrapping_add(4);

        let opcode = decode(word).ok_or(StepError::UnknownOpcode(word))?;
        self.dispatch(Instruction(word), opcode.mnemonic)
    }

    fn dispatch(&mut self, inst: Instruction, mnemonic: Mnemonic) -> Result<(), StepError> {
        use Mnemonic::*;

        let (rs, rt, rd) = (inst.rs(), inst.rt(), inst.rd());

        match mnemonic {
            // Shifts and rotates. Register-specified amounts mask to 5 bits.
            Sll => self.set_gpr(rd, self.gpr(rt) << inst.shamt()),
            Srl => self.set_gpr(rd, self.gpr(rt) >> inst.shamt()),
            Sra => self.set_gpr_i(rd, self.gpr_i(rt) >> inst.shamt()),
            Rotr => self.set_gpr(rd, self.gpr(rt).rotate_right(inst.shamt())),
            Sllv => self.set_gpr(rd, self.gpr(rt) << (self.gpr(rs) & 0x1f)),
            Srlv => self.set_gpr(rd, self.gpr(rt) >> (self.gpr(rs) & 0x1f)),
            Srav => self.set_gpr_i(rd, self.gpr_i(rt) >> (self.gpr(rs) & 0x1f)),
            Rotrv => self.set_gpr(rd, self.gpr(rt).rotate_right(self.gpr(rs) & 0x1f)),

            // ALU. add wraps like addu; sub alone carries checked semantics.
            Add => self.set_gpr_i(rd, self.gpr_i(rs).wrapping_add(self.gpr_i(rt))),
            Addu => self.set_gpr(rd, self.gpr(rs).wrapping_add(self.gpr(rt))),
            Sub => {
                let diff = self
                    .gpr_i(rs)
                    .checked_sub(self.gpr_i(rt))
                    .ok_or(StepError::Overflow)?;
                self.set_gpr_i(rd, diff);
            }
            Subu => self.set_gpr(rd, self.gpr(rs).wrapping_sub(self.gpr(rt))),
            And => self.set_gpr(rd, self.gpr(rs) & self.gpr(rt)),
            Or => self.set_gpr(rd, self.gpr(rs) | self.gpr(rt)),
            Xor => self.set_gpr(rd, self.gpr(rs) ^ self.gpr(rt)),
            Nor => self.set_gpr(rd, !(self.gpr(rs) | self.gpr(rt))),
            Slt => self.set_gpr(rd, (self.gpr_i(rs) < self.gpr_i(rt)) as u32),
            Sltu => self.set_gpr(rd, (self.gpr(rs) < self.gpr(rt)) as u32),
            Clz => self.set_gpr(rd, self.gpr(rs).leading_zeros()),
            Clo => self.set_gpr(rd, (!self.gpr(rs)).leading_zeros()),
            Seleqz => self.set_gpr(rd, if self.gpr(rt) == 0 { self.gpr(rs) } else { 0 }),
            Selnez => self.set_gpr(rd, if self.gpr(rt) != 0 { self.gpr(rs) } else { 0 }),

            // The immediate family writes through the rs field.
            Addiu => self.set_gpr(rs, self.gpr(rt).wrapping_add(inst.simm16() as u32)),
            Slti => self.set_gpr(rs, (self.gpr_i(rt) < inst.simm16()) as u32),
            Sltiu => self.set_gpr(rs, (self.gpr(rt) < inst.simm16() as u32) as u32),
            Andi => self.set_gpr(rs, self.gpr(rt) & inst.imm16()),
            Ori => self.set_gpr(rs, self.gpr(rt) | inst.imm16()),
            Xori => self.set_gpr(rs, self.gpr(rt) ^ inst.imm16()),
            Lui => self.set_gpr(rt, inst.imm16() << 16),

            // Multiply/divide: legacy HI/LO forms
            Mult => {
                let product = self.gpr_i(rs) as i64 * self.gpr_i(rt) as i64;
                self.hi = (product as u64 >> 32) as u32;
                self.lo = product as u32;
            }
            Multu => {
                let product = self.gpr(rs) as u64 * self.gpr(rt) as u64;
                self.hi = (product >> 32) as u32;
                self.lo = product as u32;
            }
            Div => {
                // Division by zero leaves HI/LO alone (UNPREDICTABLE in the
                // architecture).
                let (a, b) = (self.gpr_i(rs), self.gpr_i(rt));
                if b != 0 {
                    self.lo = a.wrapping_div(b) as u32;
                    self.hi = a.wrapping_rem(b) as u32;
                }
            }
            Divu => {
                let (a, b) = (self.gpr(rs), self.gpr(rt));
                if b != 0 {
                    self.lo = a / b;
                    self.hi = a % b;
                }
            }

            // Multiply: R6 register-destination forms
            Mul => self.set_gpr(rd, self.gpr(rs).wrapping_mul(self.gpr(rt))),
            Muh => {
                let product = self.gpr_i(rs) as i64 * self.gpr_i(rt) as i64;
                self.set_gpr(rd, (product as u64 >> 32) as u32);
            }
            Mulu => self.set_gpr(rd, self.gpr(rs).wrapping_mul(self.gpr(rt))),
            Muhu => {
                let product = self.gpr(rs) as u64 * self.gpr(rt) as u64;
                self.set_gpr(rd, (product >> 32) as u32);
            }

            // Multiply-accumulate into the HI:LO pair
            Madd | Msub => {
                let acc = ((self.hi as u64) << 32 | self.lo as u64) as i64;
                let product = self.gpr_i(rs) as i64 * self.gpr_i(rt) as i64;
                let acc = if mnemonic == Madd {
                    acc.wrapping_add(product)
                } else {
                    acc.wrapping_sub(product)
                };
                self.hi = (acc as u64 >> 32) as u32;
                self.lo = acc as u32;
            }
            Maddu | Msubu => {
                let acc = (self.hi as u64) << 32 | self.lo as u64;
                let product = self.gpr(rs) as u64 * self.gpr(rt) as u64;
                let acc = if mnemonic == Maddu {
                    acc.wrapping_add(product)
                } else {
                    acc.wrapping_sub(product)
                };
                self.hi = (acc >> 32) as u32;
                self.lo = acc as u32;
            }

            Mfhi => self.set_gpr(rd, self.hi),
            Mthi => self.hi = self.gpr(rs),
            Mflo => self.set_gpr(rd, self.lo),
            Mtlo => self.lo = self.gpr(rs),

            // Loads and stores
            Lb => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_byte(addr)? as i8;
                self.set_gpr_i(rt, value as i32);
            }
            Lbu => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_byte(addr)?;
                self.set_gpr(rt, value as u32);
            }
            Lh => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_half(addr)? as i16;
                self.set_gpr_i(rt, value as i32);
            }
            Lhu => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_half(addr)?;
                self.set_gpr(rt, value as u32);
            }
            Lw => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_word(addr)?;
                self.set_gpr(rt, value);
            }
            Sb => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                self.mem.store_byte(addr, self.gpr(rt) as u8)?;
            }
            Sh => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                self.mem.store_half(addr, self.gpr(rt) as u16)?;
            }
            Sw => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                self.mem.store_word(addr, self.gpr(rt))?;
            }

            // Load-linked/store-conditional: no second agent exists, so the
            // store always succeeds and writes 1.
            Ll => {
                let addr = self.gpr(rs).wrapping_add(inst.simm9() as u32);
                let value = self.mem.read_word(addr)?;
                self.set_gpr(rt, value);
            }
            Sc => {
                let addr = self.gpr(rs).wrapping_add(inst.simm9() as u32);
                self.mem.store_word(addr, self.gpr(rt))?;
                self.set_gpr(rt, 1);
            }

            // Jumps. bal/jal/jalr link and run their delay slot through one
            // nested step(); plain jumps redirect immediately.
            J => self.pc = self.jump_target(inst),
            Jr => self.pc = self.gpr(rs),
            Jal => {
                let target = self.jump_target(inst);
                self.link_and_delay(REG_RA as u32, target)?;
            }
            Jalr => {
                let target = self.gpr(rs);
                if target & 3 != 0 {
                    return Err(StepError::AddressError(target));
                }
                self.link_and_delay(rd, target)?;
            }
            Bal => {
                let target = self.branch_target(inst);
                self.link_and_delay(REG_RA as u32, target)?;
            }
            Bltzal => {
                // Links like bal, but only a taken branch runs the delay
                // slot eagerly; otherwise the next step executes it anyway.
                let target = self.branch_target(inst);
                self.set_gpr(REG_RA as u32, self.pc.wrapping_add(4));
                if self.gpr_i(rs) < 0 {
                    self.step()?;
                    self.pc = target;
                }
            }
            // bgezal and nal write the link register without the delay-slot
            // recursion of their siblings above. Kept as the source behaves.
            Bgezal => {
                self.set_gpr(REG_RA as u32, self.pc.wrapping_add(4));
                self.branch_if(self.gpr_i(rs) >= 0, inst);
            }
            Nal => self.set_gpr(REG_RA as u32, self.pc.wrapping_add(4)),

            // Legacy conditional branches
            Beq => self.branch_if(self.gpr(rs) == self.gpr(rt), inst),
            Bne => self.branch_if(self.gpr(rs) != self.gpr(rt), inst),
            Blez => self.branch_if(self.gpr_i(rs) <= 0, inst),
            Bgtz => self.branch_if(self.gpr_i(rs) > 0, inst),
            Bltz => self.branch_if(self.gpr_i(rs) < 0, inst),
            Bgez => self.branch_if(self.gpr_i(rs) >= 0, inst),

            // Release 6 compact branches (no delay slot)
            Beqc => self.branch_if(self.gpr(rs) == self.gpr(rt), inst),
            Bnec => self.branch_if(self.gpr(rs) != self.gpr(rt), inst),
            Bgec => self.branch_if(self.gpr_i(rs) >= self.gpr_i(rt), inst),
            Bltc => self.branch_if(self.gpr_i(rs) < self.gpr_i(rt), inst),
            Bgeuc => self.branch_if(self.gpr(rs) >= self.gpr(rt), inst),
            Bltuc => self.branch_if(self.gpr(rs) < self.gpr(rt), inst),
            Bovc => {
                let overflows = self.gpr_i(rs).checked_add(self.gpr_i(rt)).is_none();
                self.branch_if(overflows, inst);
            }
            Bnvc => {
                let overflows = self.gpr_i(rs).checked_add(self.gpr_i(rt)).is_none();
                self.branch_if(!overflows, inst);
            }
            Bgezc => self.branch_if(self.gpr_i(rs) >= 0, inst),
            Bltzc => self.branch_if(self.gpr_i(rs) < 0, inst),
            Blezc => self.branch_if(self.gpr_i(rt) <= 0, inst),
            Bgtzc => self.branch_if(self.gpr_i(rt) > 0, inst),
            Beqzc => self.branch_if(self.gpr(rs) == 0, inst),
            Bnezc => self.branch_if(self.gpr(rs) != 0, inst),

            // Compact branch-and-link: the link is written unconditionally,
            // with no delay-slot recursion.
            Beqzalc => {
                self.set_gpr(REG_RA as u32, self.pc);
                self.branch_if(self.gpr(rt) == 0, inst);
            }
            Bnezalc => {
                self.set_gpr(REG_RA as u32, self.pc);
                self.branch_if(self.gpr(rt) != 0, inst);
            }
            Blezalc => {
                self.set_gpr(REG_RA as u32, self.pc);
                self.branch_if(self.gpr_i(rt) <= 0, inst);
            }
            Bgtzalc => {
                self.set_gpr(REG_RA as u32, self.pc);
                self.branch_if(self.gpr_i(rt) > 0, inst);
            }
            Bgezalc => {
                self.set_gpr(REG_RA as u32, self.pc);
                self.branch_if(self.gpr_i(rs) >= 0, inst);
            }
            Bltzalc => {
                self.set_gpr(REG_RA as u32, self.pc);
                self.branch_if(self.gpr_i(rs) < 0, inst);
            }

            // Compact indexed jumps
            Jic => self.pc = self.gpr(rt).wrapping_add(inst.simm16() as u32),
            Jialc => {
                let target = self.gpr(rt).wrapping_add(inst.simm16() as u32);
                self.set_gpr(REG_RA as u32, self.pc);
                self.pc = target;
            }

            // Conditional traps
            Teq => {
                if self.gpr_i(rs) == self.gpr_i(rt) {
                    return Err(StepError::Trap);
                }
            }
            Tne => {
                if self.gpr_i(rs) != self.gpr_i(rt) {
                    return Err(StepError::Trap);
                }
            }
            Tge => {
                if self.gpr_i(rs) >= self.gpr_i(rt) {
                    return Err(StepError::Trap);
                }
            }
            Tgeu => {
                if self.gpr(rs) >= self.gpr(rt) {
                    return Err(StepError::Trap);
                }
            }
            Tlt => {
                if self.gpr_i(rs) < self.gpr_i(rt) {
                    return Err(StepError::Trap);
                }
            }
            Tltu => {
                if self.gpr(rs) < self.gpr(rt) {
                    return Err(StepError::Trap);
                }
            }

            // Fatal controls
            Syscall => return Err(StepError::Syscall),
            Break => return Err(StepError::Break),
            Sdbbp => return Err(StepError::DebugBreakpoint),
            Sigrie => return Err(StepError::ReservedInstruction),

            // Accepted but architecturally inert here: cache control, TLB
            // management, privileged mode and hazard instructions.
            Sync | Pref | Cache | Rdhwr | Ginvi | Ginvt | Mfc0 | Mtc0 | Di | Ei | Eret | Wait
            | Tlbr | Tlbwi | Tlbwr | Tlbp | Tlbinv | Tlbinvf => {}

            // Shadow register file access
            Rdpgpr => {
                let value = self.shadow.get_u32(rt as u8);
                self.set_gpr(rd, value);
            }
            Wrpgpr => self.shadow.set_u32(rd as u8, self.gpr(rt)),

            // COP1/COP2 handlers live in cop.rs
            Mfc1 | Mtc1 | Mfhc1 | Mthc1 | Cfc1 | Ctc1 | Bc1eqz | Bc1nez | Lwc1 | Swc1 | Ldc1
            | Sdc1 => self.cop1(inst, mnemonic)?,

            AddS | SubS | MulS | DivS | SqrtS | AbsS | MovS | NegS | TruncWS | CvtDS | CvtWS
            | AddD | SubD | MulD | DivD | SqrtD | AbsD | MovD | NegD | TruncWD | CvtSD | CvtWD
            | CvtSW | CvtDW => self.fpu_arith(inst, mnemonic)?,

            CmpAfS | CmpUnS | CmpEqS | CmpUeqS | CmpLtS | CmpUltS | CmpLeS | CmpUleS | CmpSafS
            | CmpSunS | CmpSeqS | CmpSueqS | CmpSltS | CmpSultS | CmpSleS | CmpSuleS | CmpOrS
            | CmpUneS | CmpNeS | CmpSorS | CmpSuneS | CmpSneS | CmpAfD | CmpUnD | CmpEqD
            | CmpUeqD | CmpLtD | CmpUltD | CmpLeD | CmpUleD | CmpSafD | CmpSunD | CmpSeqD
            | CmpSueqD | CmpSltD | CmpSultD | CmpSleD | CmpSuleD | CmpOrD | CmpUneD | CmpNeD
            | CmpSorD | CmpSuneD | CmpSneD => self.fpu_cmp(inst)?,

            Mfc2 | Mtc2 | Mfhc2 | Mthc2 | Cfc2 | Ctc2 | Bc2eqz | Bc2nez | Lwc2 | Swc2 | Ldc2
            | Sdc2 => self.cop2_op(inst, mnemonic)?,

            // Idioms are expanded away before code generation; the decoder
            // never produces them.
            Nop | Move | Not | Negu | Li | La | B | Beqz | Bnez | Ulw | Usw => {
                return Err(StepError::UnknownOpcode(inst.0))
            }
        }

        Ok(())
    }
}
