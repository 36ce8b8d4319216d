use std::fmt::Write;

use super::opcode::{Arg, Opcode};
use super::Instruction;
use crate::simulator::Registers;

/// Render a decoded word in assembly-like form, driven by the opcode's
/// operand shapes. Diagnostic output only; it is not meant to re-assemble.
pub fn disassemble(word: u32, opcode: &Opcode) -> String {
    let inst = Instruction(word);
    let mut out = String::from(opcode.name);

    for (i, arg) in opcode.args.iter().enumerate() {
        let base = matches!(arg, Arg::BaseRs | Arg::BaseRd);
        if base {
            out.push('(');
        } else if i == 0 {
            out.push(' ');
        } else {
            out.push_str(", ");
        }

        match arg {
            Arg::Rs | Arg::RsRt => write!(out, "${}", Registers::name(inst.rs() as usize)),
            Arg::Rt => write!(out, "${}", Registers::name(inst.rt() as usize)),
            Arg::Rd => write!(out, "${}", Registers::name(inst.rd() as usize)),
            Arg::BaseRs => write!(out, "${})", Registers::name(inst.rs() as usize)),
            Arg::BaseRd => write!(out, "${})", Registers::name(inst.rd() as usize)),
            Arg::Fs => write!(out, "$f{}", inst.rd()),
            Arg::Ft => write!(out, "$f{}", inst.rt()),
            Arg::Fd => write!(out, "$f{}", inst.shamt()),
            Arg::C2Rd => write!(out, "{}", inst.rd()),
            Arg::C2Rt => write!(out, "{}", inst.rt()),
            Arg::Hint => write!(out, "{}", inst.rt()),
            Arg::Shamt => write!(out, "{}", inst.shamt()),
            Arg::SImm | Arg::Off => write!(out, "{}", inst.simm16()),
            Arg::UImm => write!(out, "{:#x}", inst.imm16()),
            Arg::SImm9 => write!(out, "{}", inst.simm9()),
            Arg::SImm11 => write!(out, "{}", inst.simm11()),
            Arg::Imm32 => write!(out, "{:#x}", inst.imm16()),
            Arg::Target => write!(out, "{:#010x}", inst.target() << 2),
        }
        .expect("writing to a String cannot fail");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::decode;

    fn dis(word: u32) -> String {
        disassemble(word, decode(word).unwrap())
    }

    #[test]
    fn r_type() {
        assert_eq!(dis(0x012a4020), "add $t0, $t1, $t2");
    }

    #[test]
    fn load_store() {
        // lw $t0, 4($sp)
        let lw = crate::isa::Opcode::lookup("lw").unwrap();
        let word = lw.primary | 29 << 21 | 8 << 16 | 4;
        assert_eq!(dis(word), "lw $t0, 4($sp)");
    }

    #[test]
    fn no_operands() {
        let syscall = crate::isa::Opcode::lookup("syscall").unwrap();
        assert_eq!(dis(syscall.primary | syscall.partial), "syscall");
    }

    #[test]
    fn cop2_store() {
        assert_eq!(dis(0x49e84803), "sdc2 $t0, 3($t1)");
    }
}
