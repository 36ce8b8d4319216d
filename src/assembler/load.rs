use std::{
    collections::HashMap,
    io::{self, Seek, SeekFrom, Write},
};

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use log::debug;
use thiserror::Error;

use crate::isa::opcode::{Arg, Format};
use crate::simulator::{Memory, ADDR_STATIC, ADDR_TEXT};

use super::parser::{Directive, InstNode, Node, NodeImm, ParseError, Section};

#[derive(Error, Debug)]
pub enum AssembleError<'a> {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(ParseError<'a>),
    #[error("unknown label {0}")]
    UnknownLabel(&'a str),
}

impl<'a> From<ParseError<'a>> for AssembleError<'a> {
    fn from(err: ParseError<'a>) -> Self {
        AssembleError::Parse(err)
    }
}

/// What loading produced: the text-segment entry address and every label's
/// resolved address.
#[derive(Debug)]
pub struct LoadSummary<'a> {
    pub entry: u32,
    pub labels: HashMap<&'a str, u32>,
}

/// Encode one real instruction node to its 32-bit word (label fields still
/// zero; the fixup pass ORs them in).
pub fn encode(inst: &InstNode) -> u32 {
    let op = inst.opcode;

    let mut word = op.primary
        | op.partial
        | (inst.rs as u32) << 21
        | (inst.rt as u32) << 16
        | (inst.rd as u32) << 11
        | (inst.shamt as u32) << 6;

    let value = match inst.imm {
        NodeImm::Half(h) => h as u32,
        NodeImm::Word(w) => w,
        NodeImm::Addr(a) => a,
        // resolved later
        NodeImm::Label(_) | NodeImm::LabelHi(_) | NodeImm::LabelLo(_) => 0,
    };

    for arg in op.args {
        match arg {
            Arg::SImm | Arg::UImm | Arg::Off | Arg::Imm32 => word |= value & 0xffff,
            Arg::SImm9 => word |= (value & 0x1ff) << 7,
            Arg::SImm11 => word |= value & 0x7ff,
            Arg::Target => word |= value >> 2 & 0x03ff_ffff,
            _ => {}
        }
    }

    word
}

/// Whether a label in this instruction's immediate resolves pc-relative
/// (branches) or absolute (jumps).
fn is_pc_relative(inst: &InstNode) -> bool {
    inst.opcode.format != Format::J
}

/// Lay a parsed (idiom-free) program out in memory.
///
/// First pass walks the nodes writing sections, directives and encoded
/// instructions while collecting label addresses; the second patches every
/// label reference now that its target is known.
pub fn load<'a>(
    mem: &mut Memory,
    nodes: &[Node<'a>],
) -> Result<LoadSummary<'a>, AssembleError<'a>> {
    let mut labels: HashMap<&'a str, u32> = HashMap::new();
    let mut fixups: Vec<(u32, &InstNode<'a>)> = vec![];

    mem.seek(SeekFrom::Start(ADDR_TEXT as u64))?;

    for node in nodes {
        match node {
            Node::Section(Section::Data) => {
                mem.seek(SeekFrom::Start(ADDR_STATIC as u64))?;
            }
            Node::Section(Section::Text) => {
                mem.seek(SeekFrom::Start(ADDR_TEXT as u64))?;
            }

            Node::Label(label) => {
                labels.insert(*label, mem.pos() as u32);
            }

            Node::Directive(Directive::Byte(byte)) => mem.write_u8(*byte)?,
            Node::Directive(Directive::Half(half)) => mem.write_u16::<BE>(*half)?,
            Node::Directive(Directive::Word(word)) => mem.write_u32::<BE>(*word)?,
            Node::Directive(Directive::Asciiz(string)) => {
                mem.write_all(string.as_bytes())?;
                mem.write_u8(0)?;
            }
            Node::Directive(Directive::Stringz(string)) => {
                mem.write_all(string.as_bytes())?;
                mem.write_u8(0)?;
                mem.align(4);
            }
            Node::Directive(Directive::Align(pow)) => {
                mem.align(2usize.pow(*pow as u32));
            }

            Node::Inst(inst) => {
                if matches!(
                    inst.imm,
                    NodeImm::Label(_) | NodeImm::LabelHi(_) | NodeImm::LabelLo(_)
                ) {
                    fixups.push((mem.pos() as u32, inst));
                }
                mem.write_u32::<BE>(encode(inst))?;
            }
        }
    }

    for (addr, inst) in fixups {
        let value = match inst.imm {
            NodeImm::Label(name) => {
                let target = *labels.get(name).ok_or(AssembleError::UnknownLabel(name))?;
                if is_pc_relative(inst) {
                    // offset in words from the instruction after the branch
                    ((target as i64 - (addr as i64 + 4)) >> 2) as u32 & 0xffff
                } else {
                    target >> 2 & 0x03ff_ffff
                }
            }
            NodeImm::LabelHi(name) => {
                let target = *labels.get(name).ok_or(AssembleError::UnknownLabel(name))?;
                target >> 16
            }
            NodeImm::LabelLo(name) => {
                let target = *labels.get(name).ok_or(AssembleError::UnknownLabel(name))?;
                target & 0xffff
            }
            _ => unreachable!("only label nodes are queued for fixup"),
        };

        debug!("patching {} at {addr:#010x} with {value:#x}", inst.opcode.name);
        mem.set_pos(addr as usize);
        let word = mem.read_u32::<BE>()?;
        mem.set_pos(addr as usize);
        mem.write_u32::<BE>(word | value)?;
    }

    debug!("loaded {} nodes, {} labels", nodes.len(), labels.len());

    Ok(LoadSummary {
        entry: ADDR_TEXT as u32,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{idiom, parser::Parser};

    fn assemble_into<'a>(src: &'a str, mem: &mut Memory) -> LoadSummary<'a> {
        let parser = Parser::new(src);
        let nodes = idiom::expand(parser.parse().unwrap());
        load(mem, &nodes).unwrap()
    }

    fn text_word(mem: &mut Memory, index: u32) -> u32 {
        mem.read_word(ADDR_TEXT as u32 + index * 4).unwrap()
    }

    #[test]
    fn reference_encodings() {
        let mut mem = Memory::new();
        assemble_into(
            "add $t0, $t1, $t2\naddiu $t0, $t1, 1\nsdc2 $t0, 3($t1)",
            &mut mem,
        );
        assert_eq!(text_word(&mut mem, 0), 0x012a4020);
        assert_eq!(text_word(&mut mem, 1), 0x21090001);
        assert_eq!(text_word(&mut mem, 2), 0x49e84803);
    }

    #[test]
    fn entry_is_text_base() {
        let mut mem = Memory::new();
        let summary = assemble_into("nop", &mut mem);
        assert_eq!(summary.entry, ADDR_TEXT as u32);
    }

    #[test]
    fn backward_branch_offset() {
        let mut mem = Memory::new();
        assemble_into("loop: nop\nbne $t0, $zero, loop", &mut mem);
        // branch at +4, target 0: offset words = (0 - 8) >> 2 = -2
        assert_eq!(text_word(&mut mem, 1) & 0xffff, 0xfffe);
    }

    #[test]
    fn forward_branch_offset() {
        let mut mem = Memory::new();
        assemble_into("beq $t0, $t1, out\nnop\nout: nop", &mut mem);
        // branch at 0, target +8: ((8 - 4) >> 2) = 1
        assert_eq!(text_word(&mut mem, 0) & 0xffff, 1);
    }

    #[test]
    fn jump_targets_are_absolute() {
        let mut mem = Memory::new();
        assemble_into("j end\nnop\nend: nop", &mut mem);
        let word = text_word(&mut mem, 0);
        assert_eq!(word & 0x03ff_ffff, (ADDR_TEXT as u32 + 8) >> 2);
    }

    #[test]
    fn la_resolves_data_addresses() {
        let mut mem = Memory::new();
        let summary = assemble_into(
            ".data\nmessage: .asciiz \"hey\"\n.text\nla $t0, message",
            &mut mem,
        );
        assert_eq!(summary.labels["message"], ADDR_STATIC as u32);
        assert_eq!(text_word(&mut mem, 0) & 0xffff, 0x1000); // lui upper half
        assert_eq!(text_word(&mut mem, 1) & 0xffff, 0x0000); // ori lower half
    }

    #[test]
    fn data_directives_lay_out_in_order() {
        let mut mem = Memory::new();
        assemble_into(
            ".data\n.byte 1\n.byte 2\n.align 2\n.word 0x01020304\n.text\nnop",
            &mut mem,
        );
        assert_eq!(mem.read_byte(ADDR_STATIC as u32).unwrap(), 1);
        assert_eq!(mem.read_byte(ADDR_STATIC as u32 + 1).unwrap(), 2);
        assert_eq!(mem.read_word(ADDR_STATIC as u32 + 4).unwrap(), 0x01020304);
    }

    #[test]
    fn unknown_labels_error() {
        let mut mem = Memory::new();
        let parser = Parser::new("j nowhere");
        let nodes = idiom::expand(parser.parse().unwrap());
        assert!(matches!(
            load(&mut mem, &nodes),
            Err(AssembleError::UnknownLabel("nowhere"))
        ));
    }

    #[test]
    fn ll_sc_offsets_land_in_bits_15_to_7() {
        let mut mem = Memory::new();
        assemble_into("ll $t0, 4($t1)\nsc $t0, -4($t1)", &mut mem);
        let ll = text_word(&mut mem, 0);
        assert_eq!(ll >> 7 & 0x1ff, 4);
        let sc = text_word(&mut mem, 1);
        assert_eq!(sc >> 7 & 0x1ff, 0x1fc); // -4 in 9 bits
    }
}
