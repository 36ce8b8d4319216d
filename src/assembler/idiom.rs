//! Pseudo-instruction expansion.
//!
//! Idioms have no hardware encoding; each one lowers to real instructions
//! here, before layout, so label addresses stay stable and the decode table
//! never sees them.

use crate::isa::{Mnemonic, Opcode};

use super::parser::{InstNode, Node, NodeImm};

fn real(name: &str) -> &'static Opcode {
    Opcode::lookup(name).expect("expansion targets are table entries")
}

/// Replace every idiom node with its real-instruction lowering.
pub fn expand(nodes: Vec<Node<'_>>) -> Vec<Node<'_>> {
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node {
            Node::Inst(inst) if inst.opcode.is_idiom() => expand_idiom(inst, &mut out),
            other => out.push(other),
        }
    }

    out
}

fn expand_idiom<'a>(inst: InstNode<'a>, out: &mut Vec<Node<'a>>) {
    use Mnemonic::*;

    match inst.opcode.mnemonic {
        // nop is sll $zero, $zero, 0
        Nop => out.push(Node::Inst(InstNode::new(real("sll")))),

        // move rd, rs -> or rd, rs, $zero
        Move => out.push(Node::Inst(InstNode {
            opcode: real("or"),
            ..inst
        })),

        // not rd, rs -> nor rd, rs, $zero
        Not => out.push(Node::Inst(InstNode {
            opcode: real("nor"),
            ..inst
        })),

        // negu rd, rs -> subu rd, $zero, rs
        Negu => out.push(Node::Inst(InstNode {
            opcode: real("subu"),
            rt: inst.rs,
            rs: 0,
            ..inst
        })),

        // li picks the shortest real encoding for the immediate
        Li => {
            let value = match &inst.imm {
                NodeImm::Word(w) => *w,
                NodeImm::Half(h) => *h as u32,
                _ => unreachable!("li takes a literal immediate"),
            };

            if (-0x8000..0x8000).contains(&(value as i32)) {
                // addiu r, $zero, imm
                out.push(Node::Inst(InstNode {
                    opcode: real("addiu"),
                    rt: 0,
                    imm: NodeImm::Half(value as u16),
                    ..inst
                }));
            } else if value <= 0xffff {
                // ori r, $zero, imm
                out.push(Node::Inst(InstNode {
                    opcode: real("ori"),
                    rt: 0,
                    imm: NodeImm::Half(value as u16),
                    ..inst
                }));
            } else {
                load_upper_lower(
                    inst.rs,
                    NodeImm::Half((value >> 16) as u16),
                    NodeImm::Half(value as u16),
                    out,
                );
            }
        }

        // la always expands to the two-word lui/ori pair so that layout
        // never depends on where the label lands
        La => match inst.imm {
            NodeImm::Label(label) => load_upper_lower(
                inst.rs,
                NodeImm::LabelHi(label),
                NodeImm::LabelLo(label),
                out,
            ),
            NodeImm::Addr(addr) | NodeImm::Word(addr) => load_upper_lower(
                inst.rs,
                NodeImm::Half((addr >> 16) as u16),
                NodeImm::Half(addr as u16),
                out,
            ),
            NodeImm::Half(addr) => load_upper_lower(
                inst.rs,
                NodeImm::Half(0),
                NodeImm::Half(addr),
                out,
            ),
            _ => unreachable!("la takes a label or literal address"),
        },

        // unconditional and zero-compare branches lower onto beq/bne
        B => out.push(Node::Inst(InstNode {
            opcode: real("beq"),
            ..inst
        })),
        Beqz => out.push(Node::Inst(InstNode {
            opcode: real("beq"),
            rt: 0,
            ..inst
        })),
        Bnez => out.push(Node::Inst(InstNode {
            opcode: real("bne"),
            rt: 0,
            ..inst
        })),

        // Memory never enforces alignment, so the unaligned access idioms
        // are plain loads/stores.
        Ulw => out.push(Node::Inst(InstNode {
            opcode: real("lw"),
            ..inst
        })),
        Usw => out.push(Node::Inst(InstNode {
            opcode: real("sw"),
            ..inst
        })),

        _ => unreachable!("caller only passes idiom nodes"),
    }
}

/// The lui/ori pair materializing a 32-bit value into `reg`.
fn load_upper_lower<'a>(reg: u8, hi: NodeImm<'a>, lo: NodeImm<'a>, out: &mut Vec<Node<'a>>) {
    let mut lui = InstNode::new(real("lui"));
    lui.rt = reg;
    lui.imm = hi;
    out.push(Node::Inst(lui));

    let mut ori = InstNode::new(real("ori"));
    ori.rs = reg;
    ori.rt = reg;
    ori.imm = lo;
    out.push(Node::Inst(ori));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::parser::Parser;

    fn expand_src(src: &str) -> Vec<Node<'_>> {
        expand(Parser::new(src).parse().unwrap())
    }

    fn inst<'a>(node: &'a Node<'a>) -> &'a InstNode<'a> {
        match node {
            Node::Inst(inst) => inst,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn nop_is_zero_shift() {
        let nodes = expand_src("nop");
        let sll = inst(&nodes[0]);
        assert_eq!(sll.opcode.mnemonic, Mnemonic::Sll);
        assert_eq!((sll.rs, sll.rt, sll.rd, sll.shamt), (0, 0, 0, 0));
    }

    #[test]
    fn small_li_is_one_addiu() {
        let nodes = expand_src("li $t0, -5");
        assert_eq!(nodes.len(), 1);
        let addiu = inst(&nodes[0]);
        assert_eq!(addiu.opcode.mnemonic, Mnemonic::Addiu);
        assert_eq!((addiu.rs, addiu.rt), (8, 0));
        assert!(matches!(addiu.imm, NodeImm::Half(0xfffb)));
    }

    #[test]
    fn unsigned_halfword_li_is_ori() {
        let nodes = expand_src("li $t0, 0xbeef");
        assert_eq!(nodes.len(), 1);
        assert_eq!(inst(&nodes[0]).opcode.mnemonic, Mnemonic::Ori);
    }

    #[test]
    fn wide_li_is_lui_ori() {
        let nodes = expand_src("li $t0, 0xdeadbeef");
        assert_eq!(nodes.len(), 2);
        let lui = inst(&nodes[0]);
        let ori = inst(&nodes[1]);
        assert_eq!(lui.opcode.mnemonic, Mnemonic::Lui);
        assert!(matches!(lui.imm, NodeImm::Half(0xdead)));
        assert_eq!(ori.opcode.mnemonic, Mnemonic::Ori);
        assert_eq!((ori.rs, ori.rt), (8, 8));
        assert!(matches!(ori.imm, NodeImm::Half(0xbeef)));
    }

    #[test]
    fn la_defers_to_label_fixups() {
        let nodes = expand_src("la $t0, message");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(inst(&nodes[0]).imm, NodeImm::LabelHi("message")));
        assert!(matches!(inst(&nodes[1]).imm, NodeImm::LabelLo("message")));
    }

    #[test]
    fn zero_branches() {
        let nodes = expand_src("beqz $t3, out\nbnez $t3, out\nb out");
        assert_eq!(inst(&nodes[0]).opcode.mnemonic, Mnemonic::Beq);
        assert_eq!(inst(&nodes[0]).rs, 11);
        assert_eq!(inst(&nodes[1]).opcode.mnemonic, Mnemonic::Bne);
        assert_eq!(inst(&nodes[2]).opcode.mnemonic, Mnemonic::Beq);
        assert_eq!((inst(&nodes[2]).rs, inst(&nodes[2]).rt), (0, 0));
    }

    #[test]
    fn register_aliases() {
        let nodes = expand_src("move $t0, $t1\nnot $t2, $t3\nnegu $t4, $t5");
        let mv = inst(&nodes[0]);
        assert_eq!(mv.opcode.mnemonic, Mnemonic::Or);
        assert_eq!((mv.rd, mv.rs, mv.rt), (8, 9, 0));
        let not = inst(&nodes[1]);
        assert_eq!(not.opcode.mnemonic, Mnemonic::Nor);
        let negu = inst(&nodes[2]);
        assert_eq!(negu.opcode.mnemonic, Mnemonic::Subu);
        assert_eq!((negu.rd, negu.rs, negu.rt), (12, 0, 13));
    }

    #[test]
    fn unaligned_accesses_lower_to_plain_words() {
        let nodes = expand_src("ulw $t0, 1($t1)\nusw $t0, 1($t1)");
        assert_eq!(inst(&nodes[0]).opcode.mnemonic, Mnemonic::Lw);
        assert_eq!(inst(&nodes[1]).opcode.mnemonic, Mnemonic::Sw);
    }
}
