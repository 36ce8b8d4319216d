//! Coprocessor execution: COP1 moves, arithmetic and comparisons over the
//! single/double views of the FPU file, and the program-defined COP2 space.

use crate::isa::opcode::FMT_L;
use crate::isa::{Instruction, Mnemonic};

use super::processor::{Processor, StepError};

impl Processor {
    /// COP1 moves, condition branches and memory accesses.
    pub(super) fn cop1(&mut self, inst: Instruction, m: Mnemonic) -> Result<(), StepError> {
        use Mnemonic::*;

        let (rs, rt, fs) = (inst.rs(), inst.rt(), inst.rd());

        match m {
            Mfc1 => {
                let value = self.fpu.get(fs as u8);
                self.set_gpr(rt, value);
            }
            Mtc1 => {
                let value = self.gpr(rt);
                self.fpu.set(fs as u8, value);
            }
            // The h-forms address the upper word of the fs pair.
            Mfhc1 => {
                let value = self.fpu.get(fs as u8 | 1);
                self.set_gpr(rt, value);
            }
            Mthc1 => {
                let value = self.gpr(rt);
                self.fpu.set(fs as u8 | 1, value);
            }
            Cfc1 => {
                let value = self.fpc.get(fs as u8);
                self.set_gpr(rt, value);
            }
            Ctc1 => {
                let value = self.gpr(rt);
                self.fpc.set(fs as u8, value);
            }

            // ft rides in the rt field for the condition branches.
            Bc1eqz => self.branch_if(self.fpu.get(rt as u8) & 1 == 0, inst),
            Bc1nez => self.branch_if(self.fpu.get(rt as u8) & 1 != 0, inst),

            Lwc1 => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_word(addr)?;
                self.fpu.set(rt as u8, value);
            }
            Swc1 => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                self.mem.store_word(addr, self.fpu.get(rt as u8))?;
            }
            Ldc1 => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                let value = self.mem.read_dword(addr)?;
                self.fpu.set_bits64(rt as u8, value);
            }
            Sdc1 => {
                let addr = self.gpr(rs).wrapping_add(inst.simm16() as u32);
                self.mem.store_dword(addr, self.fpu.get_bits64(rt as u8))?;
            }

            _ => return Err(StepError::UnknownOpcode(inst.0)),
        }

        Ok(())
    }

    /// COP1 arithmetic and conversions. Operands: ft in rt, fs in rd, fd in
    /// the shamt position.
    pub(super) fn fpu_arith(&mut self, inst: Instruction, m: Mnemonic) -> Result<(), StepError> {
        use Mnemonic::*;

        let (ft, fs, fd) = (inst.rt() as u8, inst.rd() as u8, inst.shamt() as u8);

        match m {
            AddS => self.fpu.set_f32(fd, self.fpu.get_f32(fs) + self.fpu.get_f32(ft)),
            SubS => self.fpu.set_f32(fd, self.fpu.get_f32(fs) - self.fpu.get_f32(ft)),
            MulS => self.fpu.set_f32(fd, self.fpu.get_f32(fs) * self.fpu.get_f32(ft)),
            DivS => self.fpu.set_f32(fd, self.fpu.get_f32(fs) / self.fpu.get_f32(ft)),
            SqrtS => self.fpu.set_f32(fd, self.fpu.get_f32(fs).sqrt()),
            AbsS => self.fpu.set_f32(fd, self.fpu.get_f32(fs).abs()),
            MovS => self.fpu.set(fd, self.fpu.get(fs)),
            NegS => self.fpu.set_f32(fd, -self.fpu.get_f32(fs)),

            AddD => self.fpu.set_f64(fd, self.fpu.get_f64(fs) + self.fpu.get_f64(ft)),
            SubD => self.fpu.set_f64(fd, self.fpu.get_f64(fs) - self.fpu.get_f64(ft)),
            MulD => self.fpu.set_f64(fd, self.fpu.get_f64(fs) * self.fpu.get_f64(ft)),
            DivD => self.fpu.set_f64(fd, self.fpu.get_f64(fs) / self.fpu.get_f64(ft)),
            SqrtD => self.fpu.set_f64(fd, self.fpu.get_f64(fs).sqrt()),
            AbsD => self.fpu.set_f64(fd, self.fpu.get_f64(fs).abs()),
            MovD => self.fpu.set_bits64(fd, self.fpu.get_bits64(fs)),
            NegD => self.fpu.set_f64(fd, -self.fpu.get_f64(fs)),

            // Conversions. trunc chops; cvt.w rounds ties to even (the
            // default IEEE mode). Float-to-int casts saturate, NaN goes to 0.
            TruncWS => self.fpu.set(fd, self.fpu.get_f32(fs).trunc() as i32 as u32),
            TruncWD => self.fpu.set(fd, self.fpu.get_f64(fs).trunc() as i32 as u32),
            CvtWS => self
                .fpu
                .set(fd, self.fpu.get_f32(fs).round_ties_even() as i32 as u32),
            CvtWD => self
                .fpu
                .set(fd, self.fpu.get_f64(fs).round_ties_even() as i32 as u32),
            CvtSD => self.fpu.set_f32(fd, self.fpu.get_f64(fs) as f32),
            CvtDS => self.fpu.set_f64(fd, self.fpu.get_f32(fs) as f64),
            CvtSW => self.fpu.set_f32(fd, self.fpu.get(fs) as i32 as f32),
            CvtDW => self.fpu.set_f64(fd, self.fpu.get(fs) as i32 as f64),

            _ => return Err(StepError::UnknownOpcode(inst.0)),
        }

        Ok(())
    }

    /// The R6 `cmp.cond.fmt` comparisons.
    ///
    /// The all-ones/all-zero mask is always written to fd first; signaling
    /// conditions (bit 3 of the condition code) then raise the invalid
    /// operation if either operand was NaN. The register side effect is
    /// observable even though the condition is fatal.
    pub(super) fn fpu_cmp(&mut self, inst: Instruction) -> Result<(), StepError> {
        let cond = inst.funct() & 0x1f;
        let signaling = cond & 0x8 != 0;
        let (ft, fs, fd) = (inst.rt() as u8, inst.rd() as u8, inst.shamt() as u8);
        let double = inst.rs() == FMT_L;

        let (lt, eq, unordered) = if double {
            let (a, b) = (self.fpu.get_f64(fs), self.fpu.get_f64(ft));
            (a < b, a == b, a.is_nan() || b.is_nan())
        } else {
            let (a, b) = (self.fpu.get_f32(fs), self.fpu.get_f32(ft));
            (a < b, a == b, a.is_nan() || b.is_nan())
        };

        // IEEE-754 predicates; the unordered variants are true on NaN.
        let result = match cond & !0x8 {
            0x00 => false,
            0x01 => unordered,
            0x02 => eq,
            0x03 => unordered || eq,
            0x04 => lt,
            0x05 => unordered || lt,
            0x06 => lt || eq,
            0x07 => unordered || lt || eq,
            0x11 => !unordered,
            0x12 => unordered || !eq,
            0x13 => !unordered && !eq,
            _ => false,
        };

        if double {
            self.fpu.set_bits64(fd, if result { u64::MAX } else { 0 });
        } else {
            self.fpu.set(fd, if result { u32::MAX } else { 0 });
        }

        if signaling && unordered {
            return Err(StepError::InvalidFpOperation);
        }

        Ok(())
    }

    /// COP2 moves, condition branches and memory accesses. The data and
    /// control files are plain storage; no coprocessor computation is
    /// modeled.
    pub(super) fn cop2_op(&mut self, inst: Instruction, m: Mnemonic) -> Result<(), StepError> {
        use Mnemonic::*;

        let (rt, rd) = (inst.rt(), inst.rd());

        match m {
            Mfc2 => {
                let value = self.cop2.data(rd as u8);
                self.set_gpr(rt, value);
            }
            Mtc2 => {
                let value = self.gpr(rt);
                self.cop2.set_data(rd as u8, value);
            }
            Mfhc2 => {
                let value = self.cop2.data(rd as u8 | 1);
                self.set_gpr(rt, value);
            }
            Mthc2 => {
                let value = self.gpr(rt);
                self.cop2.set_data(rd as u8 | 1, value);
            }
            Cfc2 => {
                let value = self.cop2.ctrl(rd as u8);
                self.set_gpr(rt, value);
            }
            Ctc2 => {
                let value = self.gpr(rt);
                self.cop2.set_ctrl(rd as u8, value);
            }

            Bc2eqz => self.branch_if(self.cop2.data(rt as u8) & 1 == 0, inst),
            Bc2nez => self.branch_if(self.cop2.data(rt as u8) & 1 != 0, inst),

            // R6 COP2 loads/stores: base in the rd field, 11-bit offset.
            Lwc2 => {
                let addr = self.gpr(rd).wrapping_add(inst.simm11() as u32);
                let value = self.mem.read_word(addr)?;
                self.cop2.set_data(rt as u8, value);
            }
            Swc2 => {
                let addr = self.gpr(rd).wrapping_add(inst.simm11() as u32);
                self.mem.store_word(addr, self.cop2.data(rt as u8))?;
            }
            Ldc2 => {
                let addr = self.gpr(rd).wrapping_add(inst.simm11() as u32);
                let value = self.mem.read_dword(addr)?;
                self.cop2.set_data_bits64(rt as u8, value);
            }
            Sdc2 => {
                let addr = self.gpr(rd).wrapping_add(inst.simm11() as u32);
                self.mem.store_dword(addr, self.cop2.data_bits64(rt as u8))?;
            }

            _ => return Err(StepError::UnknownOpcode(inst.0)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Opcode;
    use crate::simulator::memory::{Memory, ADDR_TEXT};
    use crate::simulator::processor::CopFlags;
    use crate::simulator::registers::{REG_T0, REG_T1};

    fn fpu_word(name: &str, fd: u32, fs: u32, ft: u32) -> u32 {
        let op = Opcode::lookup(name).unwrap();
        op.primary | op.partial | ft << 16 | fs << 11 | fd << 6
    }

    fn cpu_with(words: &[u32]) -> Processor {
        let mut mem = Memory::new();
        for (i, &word) in words.iter().enumerate() {
            mem.store_word(ADDR_TEXT as u32 + 4 * i as u32, word).unwrap();
        }
        Processor::new(mem, ADDR_TEXT as u32, 0x8000_0000, CopFlags::all())
    }

    #[test]
    fn single_precision_add() {
        let mut cpu = cpu_with(&[fpu_word("add.s", 0, 2, 4)]);
        cpu.fpu.set_f32(2, 1.25);
        cpu.fpu.set_f32(4, 2.5);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get_f32(0), 3.75);
    }

    #[test]
    fn double_precision_add_uses_pairs() {
        let mut cpu = cpu_with(&[fpu_word("add.d", 0, 2, 4)]);
        cpu.fpu.set_f64(2, 1.0e100);
        cpu.fpu.set_f64(4, 2.0e100);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get_f64(0), 3.0e100);
    }

    #[test]
    fn conversions() {
        let mut cpu = cpu_with(&[
            fpu_word("cvt.d.s", 2, 0, 0),
            fpu_word("cvt.w.d", 4, 2, 0),
            fpu_word("trunc.w.s", 6, 0, 0),
        ]);
        cpu.fpu.set_f32(0, 2.5);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get_f64(2), 2.5);
        cpu.step().unwrap();
        // Ties to even: 2.5 rounds to 2
        assert_eq!(cpu.fpu().get(4), 2);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get(6), 2);
    }

    #[test]
    fn ordered_comparison_writes_mask() {
        let mut cpu = cpu_with(&[fpu_word("cmp.lt.s", 0, 2, 4), fpu_word("cmp.lt.s", 1, 4, 2)]);
        cpu.fpu.set_f32(2, 1.0);
        cpu.fpu.set_f32(4, 2.0);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get(0), u32::MAX);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get(1), 0);
    }

    #[test]
    fn unordered_predicate_true_on_nan() {
        let mut cpu = cpu_with(&[fpu_word("cmp.ueq.s", 0, 2, 4)]);
        cpu.fpu.set_f32(2, f32::NAN);
        cpu.fpu.set_f32(4, 1.0);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get(0), u32::MAX);
    }

    #[test]
    fn signaling_comparison_writes_then_raises() {
        let mut cpu = cpu_with(&[fpu_word("cmp.seq.s", 6, 2, 4)]);
        cpu.fpu.set_f32(2, f32::NAN);
        cpu.fpu.set_f32(4, 1.0);
        cpu.fpu.set(6, 0xdead_beef);
        assert!(matches!(cpu.step(), Err(StepError::InvalidFpOperation)));
        // The not-taken mask landed before the condition was raised.
        assert_eq!(cpu.fpu().get(6), 0);
    }

    #[test]
    fn signaling_comparison_without_nan_is_quiet() {
        let mut cpu = cpu_with(&[fpu_word("cmp.seq.s", 6, 2, 4)]);
        cpu.fpu.set_f32(2, 5.0);
        cpu.fpu.set_f32(4, 5.0);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get(6), u32::MAX);
    }

    #[test]
    fn double_comparison_masks_the_pair() {
        let mut cpu = cpu_with(&[fpu_word("cmp.le.d", 0, 2, 4)]);
        cpu.fpu.set_f64(2, 1.0);
        cpu.fpu.set_f64(4, 1.0);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get_bits64(0), u64::MAX);
    }

    #[test]
    fn fpu_condition_branches() {
        let bc1nez = {
            let op = Opcode::lookup("bc1nez").unwrap();
            op.primary | op.partial | 2 << 16 | 0x0004
        };
        let mut cpu = cpu_with(&[bc1nez]);
        cpu.fpu.set(2, 1);
        cpu.step().unwrap();
        assert_eq!(cpu.pc(), ADDR_TEXT as u32 + 4 + 16);
    }

    #[test]
    fn fpu_control_round_trip() {
        let ctc1 = {
            let op = Opcode::lookup("ctc1").unwrap();
            op.primary | op.partial | (REG_T1 as u32) << 16 | 31 << 11
        };
        let cfc1 = {
            let op = Opcode::lookup("cfc1").unwrap();
            op.primary | op.partial | (REG_T0 as u32) << 16 | 31 << 11
        };
        let mut cpu = cpu_with(&[ctc1, cfc1]);
        cpu.regs.set_u32(REG_T1, 0x0003);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.regs().get_u32(REG_T0), 0x0003);
    }

    #[test]
    fn fpu_memory_round_trip() {
        let lwc1 = {
            let op = Opcode::lookup("lwc1").unwrap();
            op.primary | (REG_T1 as u32) << 21 | 2 << 16 | 0x0010
        };
        let sdc1 = {
            let op = Opcode::lookup("sdc1").unwrap();
            op.primary | (REG_T1 as u32) << 21 | 4 << 16 | 0x0020
        };
        let mut cpu = cpu_with(&[lwc1, sdc1]);
        cpu.regs.set_u32(REG_T1, 0x1000_0000);
        cpu.memory_mut().store_word(0x1000_0010, 0x3f80_0000).unwrap(); // 1.0f
        cpu.fpu.set_f64(4, 2.5);
        cpu.step().unwrap();
        assert_eq!(cpu.fpu().get_f32(2), 1.0);
        cpu.step().unwrap();
        assert_eq!(
            cpu.memory_mut().read_dword(0x1000_0020).unwrap(),
            2.5f64.to_bits()
        );
    }

    #[test]
    fn cop2_register_files() {
        let mtc2 = {
            let op = Opcode::lookup("mtc2").unwrap();
            op.primary | op.partial | (REG_T1 as u32) << 16 | 7 << 11
        };
        let mfc2 = {
            let op = Opcode::lookup("mfc2").unwrap();
            op.primary | op.partial | (REG_T0 as u32) << 16 | 7 << 11
        };
        let mut cpu = cpu_with(&[mtc2, mfc2]);
        cpu.regs.set_u32(REG_T1, 0x1234);
        cpu.step().unwrap();
        cpu.step().unwrap();
        assert_eq!(cpu.regs().get_u32(REG_T0), 0x1234);
        assert_eq!(cpu.cop2().data(7), 0x1234);
    }

    #[test]
    fn sdc2_reference_word_stores_the_pair() {
        // sdc2 $t0, 3($t1)
        let mut cpu = cpu_with(&[0x49e84803]);
        cpu.regs.set_u32(REG_T1, 0x1000_0100);
        cpu.cop2.set_data_bits64(8, 0x0102_0304_0506_0708);
        cpu.step().unwrap();
        assert_eq!(
            cpu.memory_mut().read_dword(0x1000_0103).unwrap(),
            0x0102_0304_0506_0708
        );
    }
}
