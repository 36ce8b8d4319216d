use std::collections::HashMap;

use lazy_static::lazy_static;

/// The instruction format families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Register format: operands in the rs/rt/rd/shamt fields.
    R,
    /// Immediate format: rs/rt plus a 16-bit immediate or offset.
    I,
    /// Jump format: a 26-bit jump index.
    J,
    /// An assembler idiom with no hardware encoding. Expanded to real
    /// instructions before code generation, never decoded.
    Idiom,
}

/// The operand shapes the assembler parses for an instruction, in source
/// order, together with the encoding field each one lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    /// GPR into the rs field.
    Rs,
    /// GPR into the rt field.
    Rt,
    /// GPR into the rd field.
    Rd,
    /// One GPR written into both rs and rt (the compact `rs == rt` forms).
    RsRt,
    /// 5-bit shift amount.
    Shamt,
    /// FPU register into the rd field (fs position).
    Fs,
    /// FPU register into the rt field (ft position).
    Ft,
    /// FPU register into the shamt field (fd position).
    Fd,
    /// COP2 register number into the rd field.
    C2Rd,
    /// COP2 register number into the rt field.
    C2Rt,
    /// Cache-op/prefetch hint number into the rt field.
    Hint,
    /// Signed 16-bit immediate.
    SImm,
    /// Unsigned 16-bit immediate.
    UImm,
    /// Signed 9-bit immediate in bits 15-7 (ll/sc family).
    SImm9,
    /// Signed 11-bit immediate in bits 10-0 (COP2 load/store family).
    SImm11,
    /// 32-bit immediate (idioms only; expansion splits it).
    Imm32,
    /// Branch offset: a label or a signed 16-bit word offset.
    Off,
    /// Jump target: a label or an absolute address.
    Target,
    /// Parenthesized base register into the rs field.
    BaseRs,
    /// Parenthesized base register into the rd field (COP2 load/store).
    BaseRd,
}

/// Static metadata for one instruction.
///
/// `primary` and `partial` are stored pre-shifted to their bit positions, so
/// `(word & partial) == partial` is the collision test and `primary | partial`
/// is the skeleton of an encoded word.
#[derive(Debug, Clone, PartialEq)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub name: &'static str,
    pub format: Format,
    /// 6-bit primary opcode, pre-shifted to bits 31-26.
    pub primary: u32,
    /// The fixed bits beyond the primary opcode that identify this
    /// instruction. Zero matches anything in its primary-opcode group.
    pub partial: u32,
    /// Whether the rs field names a semantically meaningful register.
    pub rs: bool,
    /// Whether the rt field names a semantically meaningful register.
    pub rt: bool,
    /// Whether the rd field names a semantically meaningful register.
    pub rd: bool,
    pub args: &'static [Arg],
}

impl Opcode {
    pub fn is_idiom(&self) -> bool {
        self.format == Format::Idiom
    }

    /// Look an opcode up by mnemonic string.
    pub fn lookup(name: &str) -> Option<&'static Opcode> {
        BY_NAME.get(name).copied()
    }

    /// How many of the rs/rt/rd flags are set.
    pub fn flag_count(&self) -> u32 {
        self.rs as u32 + self.rt as u32 + self.rd as u32
    }
}

// Partial-encoding constructors. Everything is pre-shifted so the table rows
// read like the encoding tables in the architecture manual.

/// Function code, bits 5-0 (SPECIAL/SPECIAL2/SPECIAL3 groups).
const fn funct(f: u32) -> u32 {
    f
}

/// Function code plus a fixed shamt-field selector (the R6 sop encodings).
const fn sop(f: u32, s: u32) -> u32 {
    f | s << 6
}

/// REGIMM sub-opcode, rt field.
const fn regimm(code: u32) -> u32 {
    code << 16
}

/// Coprocessor sub-opcode, rs field.
const fn sub_op(code: u32) -> u32 {
    code << 21
}

/// COP1 arithmetic: format selector in the rs field plus a function code.
const fn fpu(fmt: u32, f: u32) -> u32 {
    fmt << 21 | f
}

/// COP0 CO-space: the CO bit plus a function code.
const fn co(f: u32) -> u32 {
    1 << 25 | f
}

/// Single-precision format selector.
pub const FMT_S: u32 = 0x10;
/// Double-precision format selector.
pub const FMT_D: u32 = 0x11;
/// Word format selector, shared with the single-precision cmp space.
pub const FMT_W: u32 = 0x14;
/// Long format selector, shared with the double-precision cmp space.
pub const FMT_L: u32 = 0x15;

macro_rules! opflags {
    (none) => {
        (false, false, false)
    };
    (rs) => {
        (true, false, false)
    };
    (rt) => {
        (false, true, false)
    };
    (rd) => {
        (false, false, true)
    };
    (rs_rt) => {
        (true, true, false)
    };
    (rs_rd) => {
        (true, false, true)
    };
    (rt_rd) => {
        (false, true, true)
    };
    (rs_rt_rd) => {
        (true, true, true)
    };
}

macro_rules! opcodes {
    {
        $( $variant:ident $name:literal ($fmt:ident, $op:literal, $partial:expr) $flags:ident [$($arg:ident),*] ),* $(,)?
    } => {
        /// Discriminant for every instruction in the table, real and idiom.
        /// Execution dispatches on this with one exhaustive match.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Mnemonic {
            $($variant,)*
        }

        lazy_static! {
            /// Every instruction this assembler/emulator knows, one entry per
            /// mnemonic, in manual order.
            pub static ref OPCODES: Vec<Opcode> = vec![
                $({
                    let (rs, rt, rd) = opflags!($flags);
                    Opcode {
                        mnemonic: Mnemonic::$variant,
                        name: $name,
                        format: Format::$fmt,
                        primary: ($op as u32) << 26,
                        partial: $partial,
                        rs,
                        rt,
                        rd,
                        args: &[$(Arg::$arg),*],
                    }
                },)*
            ];

            pub static ref BY_NAME: HashMap<&'static str, &'static Opcode> =
                OPCODES.iter().map(|o| (o.name, o)).collect();
        }
    }
}

opcodes! {
    // SPECIAL: shifts and rotates
    Sll     "sll"     (R, 0x00, funct(0x00))          rt_rd    [Rd, Rt, Shamt],
    Srl     "srl"     (R, 0x00, funct(0x02))          rt_rd    [Rd, Rt, Shamt],
    Rotr    "rotr"    (R, 0x00, sub_op(0x01) | 0x02)  rt_rd    [Rd, Rt, Shamt],
    Sra     "sra"     (R, 0x00, funct(0x03))          rt_rd    [Rd, Rt, Shamt],
    Sllv    "sllv"    (R, 0x00, funct(0x04))          rs_rt_rd [Rd, Rt, Rs],
    Srlv    "srlv"    (R, 0x00, funct(0x06))          rs_rt_rd [Rd, Rt, Rs],
    Rotrv   "rotrv"   (R, 0x00, sop(0x06, 0x01))      rs_rt_rd [Rd, Rt, Rs],
    Srav    "srav"    (R, 0x00, funct(0x07))          rs_rt_rd [Rd, Rt, Rs],

    // SPECIAL: jumps and the fatal/no-op controls
    Jr      "jr"      (R, 0x00, funct(0x08))          rs       [Rs],
    Jalr    "jalr"    (R, 0x00, funct(0x09))          rs_rd    [Rd, Rs],
    Syscall "syscall" (R, 0x00, funct(0x0c))          none     [],
    Break   "break"   (R, 0x00, funct(0x0d))          none     [],
    Sdbbp   "sdbbp"   (R, 0x00, funct(0x0e))          none     [],
    Sync    "sync"    (R, 0x00, funct(0x0f))          none     [],

    // SPECIAL: HI/LO access and counts
    Mfhi    "mfhi"    (R, 0x00, funct(0x10))          rd       [Rd],
    Mthi    "mthi"    (R, 0x00, funct(0x11))          rs       [Rs],
    Mflo    "mflo"    (R, 0x00, funct(0x12))          rd       [Rd],
    Mtlo    "mtlo"    (R, 0x00, funct(0x13))          rs       [Rs],
    Clz     "clz"     (R, 0x00, sop(0x10, 0x01))      rs_rd    [Rd, Rs],
    Clo     "clo"     (R, 0x00, sop(0x11, 0x01))      rs_rd    [Rd, Rs],

    // SPECIAL: multiply and divide, legacy HI/LO forms and the R6
    // register-destination forms
    Mult    "mult"    (R, 0x00, funct(0x18))          rs_rt    [Rs, Rt],
    Multu   "multu"   (R, 0x00, funct(0x19))          rs_rt    [Rs, Rt],
    Div     "div"     (R, 0x00, funct(0x1a))          rs_rt    [Rs, Rt],
    Divu    "divu"    (R, 0x00, funct(0x1b))          rs_rt    [Rs, Rt],
    Mul     "mul"     (R, 0x00, sop(0x18, 0x02))      rs_rt_rd [Rd, Rs, Rt],
    Muh     "muh"     (R, 0x00, sop(0x18, 0x03))      rs_rt_rd [Rd, Rs, Rt],
    Mulu    "mulu"    (R, 0x00, sop(0x19, 0x02))      rs_rt_rd [Rd, Rs, Rt],
    Muhu    "muhu"    (R, 0x00, sop(0x19, 0x03))      rs_rt_rd [Rd, Rs, Rt],

    // SPECIAL: ALU
    Add     "add"     (R, 0x00, funct(0x20))          rs_rt_rd [Rd, Rs, Rt],
    Addu    "addu"    (R, 0x00, funct(0x21))          rs_rt_rd [Rd, Rs, Rt],
    Sub     "sub"     (R, 0x00, funct(0x22))          rs_rt_rd [Rd, Rs, Rt],
    Subu    "subu"    (R, 0x00, funct(0x23))          rs_rt_rd [Rd, Rs, Rt],
    And     "and"     (R, 0x00, funct(0x24))          rs_rt_rd [Rd, Rs, Rt],
    Or      "or"      (R, 0x00, funct(0x25))          rs_rt_rd [Rd, Rs, Rt],
    Xor     "xor"     (R, 0x00, funct(0x26))          rs_rt_rd [Rd, Rs, Rt],
    Nor     "nor"     (R, 0x00, funct(0x27))          rs_rt_rd [Rd, Rs, Rt],
    Slt     "slt"     (R, 0x00, funct(0x2a))          rs_rt_rd [Rd, Rs, Rt],
    Sltu    "sltu"    (R, 0x00, funct(0x2b))          rs_rt_rd [Rd, Rs, Rt],

    // SPECIAL: traps and conditional selects
    Tge     "tge"     (R, 0x00, funct(0x30))          rs_rt    [Rs, Rt],
    Tgeu    "tgeu"    (R, 0x00, funct(0x31))          rs_rt    [Rs, Rt],
    Tlt     "tlt"     (R, 0x00, funct(0x32))          rs_rt    [Rs, Rt],
    Tltu    "tltu"    (R, 0x00, funct(0x33))          rs_rt    [Rs, Rt],
    Teq     "teq"     (R, 0x00, funct(0x34))          rs_rt    [Rs, Rt],
    Seleqz  "seleqz"  (R, 0x00, funct(0x35))          rs_rt_rd [Rd, Rs, Rt],
    Tne     "tne"     (R, 0x00, funct(0x36))          rs_rt    [Rs, Rt],
    Selnez  "selnez"  (R, 0x00, funct(0x37))          rs_rt_rd [Rd, Rs, Rt],

    // SPECIAL2: multiply-accumulate
    Madd    "madd"    (R, 0x1c, funct(0x00))          rs_rt    [Rs, Rt],
    Maddu   "maddu"   (R, 0x1c, funct(0x01))          rs_rt    [Rs, Rt],
    Msub    "msub"    (R, 0x1c, funct(0x04))          rs_rt    [Rs, Rt],
    Msubu   "msubu"   (R, 0x1c, funct(0x05))          rs_rt    [Rs, Rt],

    // SPECIAL3: linked/conditional memory, prefetch, misc privileged
    Sc      "sc"      (R, 0x1f, funct(0x26))          rs_rt    [Rt, SImm9, BaseRs],
    Ll      "ll"      (R, 0x1f, funct(0x36))          rs_rt    [Rt, SImm9, BaseRs],
    Cache   "cache"   (R, 0x1f, funct(0x25))          rs       [Hint, SImm9, BaseRs],
    Pref    "pref"    (R, 0x1f, funct(0x35))          rs       [Hint, SImm9, BaseRs],
    Rdhwr   "rdhwr"   (R, 0x1f, funct(0x3b))          rt_rd    [Rt, Rd],
    Ginvi   "ginvi"   (R, 0x1f, funct(0x3d))          rs       [Rs],
    Ginvt   "ginvt"   (R, 0x1f, funct(0x3d) | 2 << 8) rs       [Rs],

    // REGIMM branches
    Bltz    "bltz"    (I, 0x01, regimm(0x00))         rs       [Rs, Off],
    Bgez    "bgez"    (I, 0x01, regimm(0x01))         rs       [Rs, Off],
    Nal     "nal"     (I, 0x01, regimm(0x10))         none     [],
    Bltzal  "bltzal"  (I, 0x01, regimm(0x10))         rs       [Rs, Off],
    Bal     "bal"     (I, 0x01, regimm(0x11))         none     [Off],
    Bgezal  "bgezal"  (I, 0x01, regimm(0x11))         rs       [Rs, Off],
    Sigrie  "sigrie"  (I, 0x01, regimm(0x17))         none     [UImm],

    // Jumps
    J       "j"       (J, 0x02, 0)                    none     [Target],
    Jal     "jal"     (J, 0x03, 0)                    none     [Target],

    // Branches and the immediate ALU family
    Beq     "beq"     (I, 0x04, 0)                    rs_rt    [Rs, Rt, Off],
    Bne     "bne"     (I, 0x05, 0)                    rs_rt    [Rs, Rt, Off],
    Blez    "blez"    (I, 0x06, 0)                    rs       [Rs, Off],
    Blezalc "blezalc" (I, 0x06, 0)                    rt       [Rt, Off],
    Bgezalc "bgezalc" (I, 0x06, 0)                    rs_rt    [RsRt, Off],
    Bgeuc   "bgeuc"   (I, 0x06, 0)                    rs_rt    [Rs, Rt, Off],
    Bgtz    "bgtz"    (I, 0x07, 0)                    rs       [Rs, Off],
    Bgtzalc "bgtzalc" (I, 0x07, 0)                    rt       [Rt, Off],
    Bltzalc "bltzalc" (I, 0x07, 0)                    rs_rt    [RsRt, Off],
    Bltuc   "bltuc"   (I, 0x07, 0)                    rs_rt    [Rs, Rt, Off],
    Addiu   "addiu"   (I, 0x08, 0)                    rs_rt    [Rs, Rt, SImm],
    Bovc    "bovc"    (I, 0x08, 0)                    rs_rt    [Rs, Rt, Off],
    Beqzalc "beqzalc" (I, 0x08, 0)                    rt       [Rt, Off],
    Beqc    "beqc"    (I, 0x08, 0)                    rs_rt    [Rs, Rt, Off],
    Slti    "slti"    (I, 0x0a, 0)                    rs_rt    [Rs, Rt, SImm],
    Sltiu   "sltiu"   (I, 0x0b, 0)                    rs_rt    [Rs, Rt, SImm],
    Andi    "andi"    (I, 0x0c, 0)                    rs_rt    [Rs, Rt, UImm],
    Ori     "ori"     (I, 0x0d, 0)                    rs_rt    [Rs, Rt, UImm],
    Xori    "xori"    (I, 0x0e, 0)                    rs_rt    [Rs, Rt, UImm],
    Lui     "lui"     (I, 0x0f, 0)                    rt       [Rt, UImm],

    // Compact branch groups POP26/POP27/POP30
    Blezc   "blezc"   (I, 0x16, 0)                    rt       [Rt, Off],
    Bgezc   "bgezc"   (I, 0x16, 0)                    rs_rt    [RsRt, Off],
    Bgec    "bgec"    (I, 0x16, 0)                    rs_rt    [Rs, Rt, Off],
    Bgtzc   "bgtzc"   (I, 0x17, 0)                    rt       [Rt, Off],
    Bltzc   "bltzc"   (I, 0x17, 0)                    rs_rt    [RsRt, Off],
    Bltc    "bltc"    (I, 0x17, 0)                    rs_rt    [Rs, Rt, Off],
    Bnvc    "bnvc"    (I, 0x18, 0)                    rs_rt    [Rs, Rt, Off],
    Bnezalc "bnezalc" (I, 0x18, 0)                    rt       [Rt, Off],
    Bnec    "bnec"    (I, 0x18, 0)                    rs_rt    [Rs, Rt, Off],

    // Loads and stores
    Lb      "lb"      (I, 0x20, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Lh      "lh"      (I, 0x21, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Lw      "lw"      (I, 0x23, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Lbu     "lbu"     (I, 0x24, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Lhu     "lhu"     (I, 0x25, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Sb      "sb"      (I, 0x28, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Sh      "sh"      (I, 0x29, 0)                    rs_rt    [Rt, SImm, BaseRs],
    Sw      "sw"      (I, 0x2b, 0)                    rs_rt    [Rt, SImm, BaseRs],

    // COP0: register moves and the privileged no-op space
    Mfc0    "mfc0"    (R, 0x10, sub_op(0x00))         rt_rd    [Rt, Rd],
    Mtc0    "mtc0"    (R, 0x10, sub_op(0x04))         rt_rd    [Rt, Rd],
    Rdpgpr  "rdpgpr"  (R, 0x10, sub_op(0x0a))         rt_rd    [Rd, Rt],
    Di      "di"      (R, 0x10, sub_op(0x0b))         none     [],
    Ei      "ei"      (R, 0x10, sub_op(0x0b) | 1 << 5) none    [],
    Wrpgpr  "wrpgpr"  (R, 0x10, sub_op(0x0e))         rt_rd    [Rd, Rt],
    Tlbr    "tlbr"    (R, 0x10, co(0x01))             none     [],
    Tlbwi   "tlbwi"   (R, 0x10, co(0x02))             none     [],
    Tlbinv  "tlbinv"  (R, 0x10, co(0x03))             none     [],
    Tlbinvf "tlbinvf" (R, 0x10, co(0x04))             none     [],
    Tlbwr   "tlbwr"   (R, 0x10, co(0x06))             none     [],
    Tlbp    "tlbp"    (R, 0x10, co(0x08))             none     [],
    Eret    "eret"    (R, 0x10, co(0x18))             none     [],
    Wait    "wait"    (R, 0x10, co(0x20))             none     [],

    // COP1: moves and condition branches
    Mfc1    "mfc1"    (R, 0x11, sub_op(0x00))         rt       [Rt, Fs],
    Cfc1    "cfc1"    (R, 0x11, sub_op(0x02))         rt       [Rt, Fs],
    Mfhc1   "mfhc1"   (R, 0x11, sub_op(0x03))         rt       [Rt, Fs],
    Mtc1    "mtc1"    (R, 0x11, sub_op(0x04))         rt       [Rt, Fs],
    Ctc1    "ctc1"    (R, 0x11, sub_op(0x06))         rt       [Rt, Fs],
    Mthc1   "mthc1"   (R, 0x11, sub_op(0x07))         rt       [Rt, Fs],
    Bc1eqz  "bc1eqz"  (I, 0x11, sub_op(0x09))         none     [Ft, Off],
    Bc1nez  "bc1nez"  (I, 0x11, sub_op(0x0d))         none     [Ft, Off],

    // COP1: single-precision arithmetic
    AddS    "add.s"   (R, 0x11, fpu(FMT_S, 0x00))     none     [Fd, Fs, Ft],
    SubS    "sub.s"   (R, 0x11, fpu(FMT_S, 0x01))     none     [Fd, Fs, Ft],
    MulS    "mul.s"   (R, 0x11, fpu(FMT_S, 0x02))     none     [Fd, Fs, Ft],
    DivS    "div.s"   (R, 0x11, fpu(FMT_S, 0x03))     none     [Fd, Fs, Ft],
    SqrtS   "sqrt.s"  (R, 0x11, fpu(FMT_S, 0x04))     none     [Fd, Fs],
    AbsS    "abs.s"   (R, 0x11, fpu(FMT_S, 0x05))     none     [Fd, Fs],
    MovS    "mov.s"   (R, 0x11, fpu(FMT_S, 0x06))     none     [Fd, Fs],
    NegS    "neg.s"   (R, 0x11, fpu(FMT_S, 0x07))     none     [Fd, Fs],
    TruncWS "trunc.w.s" (R, 0x11, fpu(FMT_S, 0x0d))   none     [Fd, Fs],
    CvtDS   "cvt.d.s" (R, 0x11, fpu(FMT_S, 0x21))     none     [Fd, Fs],
    CvtWS   "cvt.w.s" (R, 0x11, fpu(FMT_S, 0x24))     none     [Fd, Fs],

    // COP1: double-precision arithmetic
    AddD    "add.d"   (R, 0x11, fpu(FMT_D, 0x00))     none     [Fd, Fs, Ft],
    SubD    "sub.d"   (R, 0x11, fpu(FMT_D, 0x01))     none     [Fd, Fs, Ft],
    MulD    "mul.d"   (R, 0x11, fpu(FMT_D, 0x02))     none     [Fd, Fs, Ft],
    DivD    "div.d"   (R, 0x11, fpu(FMT_D, 0x03))     none     [Fd, Fs, Ft],
    SqrtD   "sqrt.d"  (R, 0x11, fpu(FMT_D, 0x04))     none     [Fd, Fs],
    AbsD    "abs.d"   (R, 0x11, fpu(FMT_D, 0x05))     none     [Fd, Fs],
    MovD    "mov.d"   (R, 0x11, fpu(FMT_D, 0x06))     none     [Fd, Fs],
    NegD    "neg.d"   (R, 0x11, fpu(FMT_D, 0x07))     none     [Fd, Fs],
    TruncWD "trunc.w.d" (R, 0x11, fpu(FMT_D, 0x0d))   none     [Fd, Fs],
    CvtSD   "cvt.s.d" (R, 0x11, fpu(FMT_D, 0x20))     none     [Fd, Fs],
    CvtWD   "cvt.w.d" (R, 0x11, fpu(FMT_D, 0x24))     none     [Fd, Fs],

    // COP1: word-to-float conversions (the W format space)
    CvtSW   "cvt.s.w" (R, 0x11, fpu(FMT_W, 0x20))     none     [Fd, Fs],
    CvtDW   "cvt.d.w" (R, 0x11, fpu(FMT_W, 0x21))     none     [Fd, Fs],

    // COP1: R6 comparisons, single. Condition code in the function field;
    // bit 3 marks the signaling variants.
    CmpAfS  "cmp.af.s"  (R, 0x11, fpu(FMT_W, 0x00))   none     [Fd, Fs, Ft],
    CmpUnS  "cmp.un.s"  (R, 0x11, fpu(FMT_W, 0x01))   none     [Fd, Fs, Ft],
    CmpEqS  "cmp.eq.s"  (R, 0x11, fpu(FMT_W, 0x02))   none     [Fd, Fs, Ft],
    CmpUeqS "cmp.ueq.s" (R, 0x11, fpu(FMT_W, 0x03))   none     [Fd, Fs, Ft],
    CmpLtS  "cmp.lt.s"  (R, 0x11, fpu(FMT_W, 0x04))   none     [Fd, Fs, Ft],
    CmpUltS "cmp.ult.s" (R, 0x11, fpu(FMT_W, 0x05))   none     [Fd, Fs, Ft],
    CmpLeS  "cmp.le.s"  (R, 0x11, fpu(FMT_W, 0x06))   none     [Fd, Fs, Ft],
    CmpUleS "cmp.ule.s" (R, 0x11, fpu(FMT_W, 0x07))   none     [Fd, Fs, Ft],
    CmpSafS "cmp.saf.s" (R, 0x11, fpu(FMT_W, 0x08))   none     [Fd, Fs, Ft],
    CmpSunS "cmp.sun.s" (R, 0x11, fpu(FMT_W, 0x09))   none     [Fd, Fs, Ft],
    CmpSeqS "cmp.seq.s" (R, 0x11, fpu(FMT_W, 0x0a))   none     [Fd, Fs, Ft],
    CmpSueqS "cmp.sueq.s" (R, 0x11, fpu(FMT_W, 0x0b)) none     [Fd, Fs, Ft],
    CmpSltS "cmp.slt.s" (R, 0x11, fpu(FMT_W, 0x0c))   none     [Fd, Fs, Ft],
    CmpSultS "cmp.sult.s" (R, 0x11, fpu(FMT_W, 0x0d)) none     [Fd, Fs, Ft],
    CmpSleS "cmp.sle.s" (R, 0x11, fpu(FMT_W, 0x0e))   none     [Fd, Fs, Ft],
    CmpSuleS "cmp.sule.s" (R, 0x11, fpu(FMT_W, 0x0f)) none     [Fd, Fs, Ft],
    CmpOrS  "cmp.or.s"  (R, 0x11, fpu(FMT_W, 0x11))   none     [Fd, Fs, Ft],
    CmpUneS "cmp.une.s" (R, 0x11, fpu(FMT_W, 0x12))   none     [Fd, Fs, Ft],
    CmpNeS  "cmp.ne.s"  (R, 0x11, fpu(FMT_W, 0x13))   none     [Fd, Fs, Ft],
    CmpSorS "cmp.sor.s" (R, 0x11, fpu(FMT_W, 0x19))   none     [Fd, Fs, Ft],
    CmpSuneS "cmp.sune.s" (R, 0x11, fpu(FMT_W, 0x1a)) none     [Fd, Fs, Ft],
    CmpSneS "cmp.sne.s" (R, 0x11, fpu(FMT_W, 0x1b))   none     [Fd, Fs, Ft],

    // COP1: R6 comparisons, double
    CmpAfD  "cmp.af.d"  (R, 0x11, fpu(FMT_L, 0x00))   none     [Fd, Fs, Ft],
    CmpUnD  "cmp.un.d"  (R, 0x11, fpu(FMT_L, 0x01))   none     [Fd, Fs, Ft],
    CmpEqD  "cmp.eq.d"  (R, 0x11, fpu(FMT_L, 0x02))   none     [Fd, Fs, Ft],
    CmpUeqD "cmp.ueq.d" (R, 0x11, fpu(FMT_L, 0x03))   none     [Fd, Fs, Ft],
    CmpLtD  "cmp.lt.d"  (R, 0x11, fpu(FMT_L, 0x04))   none     [Fd, Fs, Ft],
    CmpUltD "cmp.ult.d" (R, 0x11, fpu(FMT_L, 0x05))   none     [Fd, Fs, Ft],
    CmpLeD  "cmp.le.d"  (R, 0x11, fpu(FMT_L, 0x06))   none     [Fd, Fs, Ft],
    CmpUleD "cmp.ule.d" (R, 0x11, fpu(FMT_L, 0x07))   none     [Fd, Fs, Ft],
    CmpSafD "cmp.saf.d" (R, 0x11, fpu(FMT_L, 0x08))   none     [Fd, Fs, Ft],
    CmpSunD "cmp.sun.d" (R, 0x11, fpu(FMT_L, 0x09))   none     [Fd, Fs, Ft],
    CmpSeqD "cmp.seq.d" (R, 0x11, fpu(FMT_L, 0x0a))   none     [Fd, Fs, Ft],
    CmpSueqD "cmp.sueq.d" (R, 0x11, fpu(FMT_L, 0x0b)) none     [Fd, Fs, Ft],
    CmpSltD "cmp.slt.d" (R, 0x11, fpu(FMT_L, 0x0c))   none     [Fd, Fs, Ft],
    CmpSultD "cmp.sult.d" (R, 0x11, fpu(FMT_L, 0x0d)) none     [Fd, Fs, Ft],
    CmpSleD "cmp.sle.d" (R, 0x11, fpu(FMT_L, 0x0e))   none     [Fd, Fs, Ft],
    CmpSuleD "cmp.sule.d" (R, 0x11, fpu(FMT_L, 0x0f)) none     [Fd, Fs, Ft],
    CmpOrD  "cmp.or.d"  (R, 0x11, fpu(FMT_L, 0x11))   none     [Fd, Fs, Ft],
    CmpUneD "cmp.une.d" (R, 0x11, fpu(FMT_L, 0x12))   none     [Fd, Fs, Ft],
    CmpNeD  "cmp.ne.d"  (R, 0x11, fpu(FMT_L, 0x13))   none     [Fd, Fs, Ft],
    CmpSorD "cmp.sor.d" (R, 0x11, fpu(FMT_L, 0x19))   none     [Fd, Fs, Ft],
    CmpSuneD "cmp.sune.d" (R, 0x11, fpu(FMT_L, 0x1a)) none     [Fd, Fs, Ft],
    CmpSneD "cmp.sne.d" (R, 0x11, fpu(FMT_L, 0x1b))   none     [Fd, Fs, Ft],

    // COP2: moves, condition branches, loads/stores (R6 rs-field encoding)
    Mfc2    "mfc2"    (R, 0x12, sub_op(0x00))         rt       [Rt, C2Rd],
    Cfc2    "cfc2"    (R, 0x12, sub_op(0x02))         rt       [Rt, C2Rd],
    Mfhc2   "mfhc2"   (R, 0x12, sub_op(0x03))         rt       [Rt, C2Rd],
    Mtc2    "mtc2"    (R, 0x12, sub_op(0x04))         rt       [Rt, C2Rd],
    Ctc2    "ctc2"    (R, 0x12, sub_op(0x06))         rt       [Rt, C2Rd],
    Mthc2   "mthc2"   (R, 0x12, sub_op(0x07))         rt       [Rt, C2Rd],
    Bc2eqz  "bc2eqz"  (I, 0x12, sub_op(0x09))         none     [C2Rt, Off],
    Bc2nez  "bc2nez"  (I, 0x12, sub_op(0x0d))         none     [C2Rt, Off],
    Lwc2    "lwc2"    (I, 0x12, sub_op(0x0a))         rt_rd    [Rt, SImm11, BaseRd],
    Swc2    "swc2"    (I, 0x12, sub_op(0x0b))         rt_rd    [Rt, SImm11, BaseRd],
    Ldc2    "ldc2"    (I, 0x12, sub_op(0x0e))         rt_rd    [Rt, SImm11, BaseRd],
    Sdc2    "sdc2"    (I, 0x12, sub_op(0x0f))         rt_rd    [Rt, SImm11, BaseRd],

    // COP1 loads/stores
    Lwc1    "lwc1"    (I, 0x31, 0)                    rs       [Ft, SImm, BaseRs],
    Ldc1    "ldc1"    (I, 0x35, 0)                    rs       [Ft, SImm, BaseRs],
    Swc1    "swc1"    (I, 0x39, 0)                    rs       [Ft, SImm, BaseRs],
    Sdc1    "sdc1"    (I, 0x3d, 0)                    rs       [Ft, SImm, BaseRs],

    // POP66/POP76: compact zero-compares and indexed jumps
    Beqzc   "beqzc"   (I, 0x3e, 0)                    rs       [Rs, Off],
    Jic     "jic"     (I, 0x3e, 0)                    rt       [Rt, SImm],
    Bnezc   "bnezc"   (I, 0x3f, 0)                    rs       [Rs, Off],
    Jialc   "jialc"   (I, 0x3f, 0)                    rt       [Rt, SImm],

    // Assembler idioms. Expanded before code generation; never decoded.
    Nop     "nop"     (Idiom, 0x00, 0)                none     [],
    Move    "move"    (Idiom, 0x00, 0)                none     [Rd, Rs],
    Not     "not"     (Idiom, 0x00, 0)                none     [Rd, Rs],
    Negu    "negu"    (Idiom, 0x00, 0)                none     [Rd, Rs],
    Li      "li"      (Idiom, 0x00, 0)                none     [Rs, Imm32],
    La      "la"      (Idiom, 0x00, 0)                none     [Rs, Target],
    B       "b"       (Idiom, 0x00, 0)                none     [Off],
    Beqz    "beqz"    (Idiom, 0x00, 0)                none     [Rs, Off],
    Bnez    "bnez"    (Idiom, 0x00, 0)                none     [Rs, Off],
    Ulw     "ulw"     (Idiom, 0x00, 0)                none     [Rt, SImm, BaseRs],
    Usw     "usw"     (Idiom, 0x00, 0)                none     [Rt, SImm, BaseRs],
}
