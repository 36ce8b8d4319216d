/// The general-purpose register file.
///
/// Index 0 is the `$zero` register by convention; neither the file nor the
/// processor forces it to zero, callers (assembled programs) uphold it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    pub data: [Register; 32],
}

macro_rules! reg_defs {
    {$($name:ident = $index:literal),*,} => {
        $(#[allow(dead_code)] pub const $name: u8 = $index;)*
    }
}

reg_defs! {
    REG_ZERO = 0,
    REG_AT = 1,
    REG_V0 = 2, REG_V1 = 3,
    REG_A0 = 4, REG_A1 = 5, REG_A2 = 6, REG_A3 = 7,
    REG_T0 = 8, REG_T1 = 9, REG_T2 = 10, REG_T3 = 11,
    REG_T4 = 12, REG_T5 = 13, REG_T6 = 14, REG_T7 = 15,
    REG_S0 = 16, REG_S1 = 17, REG_S2 = 18, REG_S3 = 19,
    REG_S4 = 20, REG_S5 = 21, REG_S6 = 22, REG_S7 = 23,
    REG_T8 = 24, REG_T9 = 25,
    REG_K0 = 26, REG_K1 = 27,
    REG_GP = 28,
    REG_SP = 29,
    REG_FP = 30,
    REG_RA = 31,
}

impl Registers {
    #[rustfmt::skip]
    pub const fn name(i: usize) -> &'static str {
        match i {
            0 => "zero",
            1 => "at",
            2 => "v0", 3 => "v1",
            4 => "a0", 5 => "a1", 6 => "a2", 7 => "a3",
            8 => "t0", 9 => "t1", 10 => "t2", 11 => "t3",
            12 => "t4", 13 => "t5", 14 => "t6", 15 => "t7",
            16 => "s0", 17 => "s1", 18 => "s2", 19 => "s3",
            20 => "s4", 21 => "s5", 22 => "s6", 23 => "s7",
            24 => "t8", 25 => "t9",
            26 => "k0", 27 => "k1",
            28 => "gp",
            29 => "sp",
            30 => "fp",
            31 => "ra",
            _ => panic!("invalid register index"),
        }
    }

    #[rustfmt::skip]
    pub fn index(s: &str) -> Option<usize> {
        Some(match s {
            "zero" => 0,
            "at" => 1,
            "v0" => 2, "v1" => 3,
            "a0" => 4, "a1" => 5, "a2" => 6, "a3" => 7,
            "t0" => 8, "t1" => 9, "t2" => 10, "t3" => 11,
            "t4" => 12, "t5" => 13, "t6" => 14, "t7" => 15,
            "s0" => 16, "s1" => 17, "s2" => 18, "s3" => 19,
            "s4" => 20, "s5" => 21, "s6" => 22, "s7" => 23,
            "t8" => 24, "t9" => 25,
            "k0" => 26, "k1" => 27,
            "gp" => 28,
            "sp" => 29,
            "fp" => 30,
            "ra" => 31,
            _ => {
                let i: usize = s.parse().ok()?;
                if i < 32 { i } else { return None }
            }
        })
    }

    pub fn set_i32(&mut self, index: u8, value: i32) {
        self.data[index as usize] = Register(value);
    }

    pub fn set_u32(&mut self, index: u8, value: u32) {
        self.data[index as usize] = Register(value as i32);
    }

    pub fn get_i32(&self, index: u8) -> i32 {
        self.data[index as usize].0
    }

    pub fn get_u32(&self, index: u8) -> u32 {
        self.data[index as usize].to_u32()
    }
}

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Register(pub i32);

impl Register {
    pub fn to_u32(self) -> u32 {
        self.0 as u32
    }
}

/// The floating-point register file: 32 single-width slots, pairable into
/// doubles. A double occupies an even/odd pair with the low word in the even
/// register.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FpuRegisters {
    pub data: [u32; 32],
}

impl FpuRegisters {
    /// Parse an `f`-prefixed register name (the `$` is stripped upstream).
    pub fn index(s: &str) -> Option<usize> {
        let i: usize = s.strip_prefix('f')?.parse().ok()?;
        (i < 32).then_some(i)
    }

    pub fn get(&self, index: u8) -> u32 {
        self.data[index as usize]
    }

    pub fn set(&mut self, index: u8, value: u32) {
        self.data[index as usize] = value;
    }

    pub fn get_f32(&self, index: u8) -> f32 {
        f32::from_bits(self.get(index))
    }

    pub fn set_f32(&mut self, index: u8, value: f32) {
        self.set(index, value.to_bits());
    }

    /// Raw 64 bits of the pair at `index & !1` (low word) and `index | 1`
    /// (high word).
    pub fn get_bits64(&self, index: u8) -> u64 {
        let low = self.get(index & !1) as u64;
        let high = self.get(index | 1) as u64;
        high << 32 | low
    }

    pub fn set_bits64(&mut self, index: u8, value: u64) {
        self.set(index & !1, value as u32);
        self.set(index | 1, (value >> 32) as u32);
    }

    pub fn get_f64(&self, index: u8) -> f64 {
        f64::from_bits(self.get_bits64(index))
    }

    pub fn set_f64(&mut self, index: u8, value: f64) {
        self.set_bits64(index, value.to_bits());
    }
}

/// The program-defined coprocessor 2 register space, data and control files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cop2Registers {
    pub data: [u32; 32],
    pub ctrl: [u32; 32],
}

impl Cop2Registers {
    pub fn data(&self, index: u8) -> u32 {
        self.data[index as usize]
    }

    pub fn set_data(&mut self, index: u8, value: u32) {
        self.data[index as usize] = value;
    }

    pub fn ctrl(&self, index: u8) -> u32 {
        self.ctrl[index as usize]
    }

    pub fn set_ctrl(&mut self, index: u8, value: u32) {
        self.ctrl[index as usize] = value;
    }

    /// 64-bit view over an adjacent data-register pair, low word first.
    pub fn data_bits64(&self, index: u8) -> u64 {
        let low = self.data(index & !1) as u64;
        let high = self.data(index | 1) as u64;
        high << 32 | low
    }

    pub fn set_data_bits64(&mut self, index: u8, value: u64) {
        self.set_data(index & !1, value as u32);
        self.set_data(index | 1, (value >> 32) as u32);
    }
}

/// FPU control/status register index used by `cfc1`/`ctc1`.
pub const FCSR: u8 = 31;

/// The FPU control register file (`fcsr` and friends).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FpuControl {
    pub data: [u32; 32],
}

impl FpuControl {
    pub fn get(&self, index: u8) -> u32 {
        self.data[index as usize]
    }

    pub fn set(&mut self, index: u8, value: u32) {
        self.data[index as usize] = value;
    }
}
