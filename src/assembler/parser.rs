use std::{cell::Cell, num::ParseIntError};

use thiserror::Error;

use crate::isa::opcode::{Arg, Opcode};
use crate::simulator::{FpuRegisters, Registers};

use super::lexer::{Lexeme, LexemeKind, Lexer};

#[derive(Debug, Error)]
pub enum ParseError<'a> {
    #[error("unknown section or directive \"{0}\"")]
    UnknownSectDirective(&'a str),
    #[error("expected {0:?}, got {1:?}")]
    ExpectedLexeme(LexemeKind, Option<LexemeKind>),
    #[error("unexpected {0:?} on line {1}")]
    UnexpectedLexeme(LexemeKind, u32),
    #[error("integer parse error")]
    ParseIntError(#[from] ParseIntError),
    #[error("string parse error on line {0}")]
    ParseStringError(u32),
    #[error("unterminated string on line {0}")]
    UnterminatedString(u32),
    #[error("unknown instruction {0}")]
    UnknownInstruction(&'a str),
    #[error("expected {0}, got {1:?}")]
    ExpectedPunct(&'static str, Option<&'a str>),
    #[error("expected immediate or label on line {0}")]
    ExpectedImm(u32),
    #[error("unknown register {0}")]
    UnknownRegister(&'a str),
}

/// A node in the assembly tree.
#[derive(Debug, Clone)]
pub enum Node<'a> {
    /// An instruction call, idioms included (expanded before loading).
    Inst(InstNode<'a>),

    /// A label definition.
    Label(&'a str),

    /// A section, e.g. `.text` or `.data`.
    Section(Section),

    /// A directive, e.g. `.word` or `.asciiz`.
    Directive(Directive),
}

/// A parsed instruction: the opcode plus its encoding fields. Which fields
/// are populated is dictated by the opcode's operand shapes.
#[derive(Debug, Clone)]
pub struct InstNode<'a> {
    pub opcode: &'static Opcode,
    pub rs: u8,
    pub rt: u8,
    pub rd: u8,
    pub shamt: u8,
    pub imm: NodeImm<'a>,
}

impl<'a> InstNode<'a> {
    pub fn new(opcode: &'static Opcode) -> Self {
        Self {
            opcode,
            rs: 0,
            rt: 0,
            rd: 0,
            shamt: 0,
            imm: NodeImm::Half(0),
        }
    }
}

/// An immediate value for a node: a literal, or a label reference resolved
/// during loading.
#[derive(Debug, Clone)]
pub enum NodeImm<'a> {
    /// A literal 16-bit field value.
    Half(u16),

    /// A literal 32-bit value (idiom expansion splits it).
    Word(u32),

    /// An absolute address. Shifted right two bits by the loader for jumps.
    Addr(u32),

    /// A label reference. Branches resolve it pc-relative, jumps absolute.
    Label(&'a str),

    /// The upper half of a label's address (idiom expansion of `la`).
    LabelHi(&'a str),

    /// The lower half of a label's address.
    LabelLo(&'a str),
}

/// A section in the assembly, e.g. `.text` or `.data`.
#[derive(Debug, Clone)]
pub enum Section {
    Text,
    Data,
}

#[derive(Debug, Clone)]
pub enum Directive {
    Byte(u8),
    Half(u16),
    Word(u32),
    Asciiz(String),
    /// Equivalent to `.asciiz "string" .align 2`.
    Stringz(String),
    Align(u8),
}

#[derive(Debug)]
pub struct Parser<'a> {
    source: &'a str,
    lexemes: Vec<Lexeme>,
    pos: Cell<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lexemes: Lexer::new(source).lex(),
            pos: Cell::new(0),
        }
    }

    fn skip(&self) {
        self.pos.set(self.pos.get() + 1);
    }

    fn peek(&self) -> Option<(&Lexeme, &'a str)> {
        self.lexemes
            .get(self.pos.get())
            .map(|l| (l, &self.source[l.slice.clone()]))
    }

    fn peek_kind(&self) -> Option<LexemeKind> {
        self.peek().map(|l| l.0.kind)
    }

    fn next(&self) -> Option<(&Lexeme, &'a str)> {
        match self.peek() {
            Some(l) => {
                self.skip();
                Some(l)
            }
            None => None,
        }
    }

    fn next_expect_kind(&self, expected: LexemeKind) -> Result<(&Lexeme, &'a str), ParseError<'a>> {
        match self.peek() {
            Some((lexeme, slice)) if lexeme.kind == expected => {
                self.skip();
                Ok((lexeme, slice))
            }
            x => Err(ParseError::ExpectedLexeme(expected, x.map(|l| l.0.kind))),
        }
    }

    fn expect_punct(&self, punct: &'static str) -> Result<(), ParseError<'a>> {
        match self.peek() {
            Some((lexeme, slice)) if lexeme.kind == LexemeKind::Punct && slice == punct => {
                self.skip();
                Ok(())
            }
            x => Err(ParseError::ExpectedPunct(punct, x.map(|l| l.1))),
        }
    }

    fn parse_u8(&self) -> Result<u8, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Imm)?;

        if let Some(stripped) = slice.strip_prefix("0x") {
            Ok(u8::from_str_radix(stripped, 16)?)
        } else {
            Ok(str::parse(slice)?)
        }
    }

    fn parse_u16(&self) -> Result<u16, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Imm)?;

        if let Some(stripped) = slice.strip_prefix("0x") {
            Ok(u16::from_str_radix(stripped, 16)?)
        } else {
            Ok(str::parse(slice)?)
        }
    }

    /// A signed 16-bit field: accepts negatives, positive decimals and hex
    /// up to 0xffff; stored as its field bits.
    fn parse_i16(&self) -> Result<u16, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Imm)?;

        if let Some(stripped) = slice.strip_prefix("0x") {
            Ok(u16::from_str_radix(stripped, 16)?)
        } else if slice.starts_with('-') {
            Ok(str::parse::<i16>(slice)? as u16)
        } else {
            Ok(str::parse::<u16>(slice)?)
        }
    }

    fn parse_u32(&self) -> Result<u32, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Imm)?;

        if let Some(stripped) = slice.strip_prefix("0x") {
            Ok(u32::from_str_radix(stripped, 16)?)
        } else {
            Ok(str::parse(slice)?)
        }
    }

    /// A 32-bit immediate, signed or unsigned spelling.
    fn parse_imm32(&self) -> Result<u32, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Imm)?;

        if let Some(stripped) = slice.strip_prefix("0x") {
            Ok(u32::from_str_radix(stripped, 16)?)
        } else if slice.starts_with('-') {
            Ok(str::parse::<i32>(slice)? as u32)
        } else {
            Ok(str::parse::<u32>(slice)?)
        }
    }

    fn parse_string(&self) -> Result<String, ParseError<'a>> {
        let (lex, slice) = self.next_expect_kind(LexemeKind::Imm)?;
        if !slice.starts_with('"') {
            return Err(ParseError::ParseStringError(lex.line));
        }

        let mut buf = String::new();
        let mut escape = false;
        for c in slice.chars().skip(1) {
            match c {
                '\\' if !escape => {
                    escape = true;
                }
                '"' if !escape => {
                    return Ok(buf);
                }
                _ => {
                    escape = false;
                    buf.push(c);
                }
            }
        }

        Err(ParseError::UnterminatedString(lex.line))
    }

    fn parse_register(&self) -> Result<u8, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Reg)?;

        let name = slice
            .strip_prefix('$')
            .expect("lexer gave bad input to parser");
        Ok(Registers::index(name).ok_or(ParseError::UnknownRegister(slice))? as u8)
    }

    fn parse_fpu_register(&self) -> Result<u8, ParseError<'a>> {
        let (_, slice) = self.next_expect_kind(LexemeKind::Reg)?;

        let name = slice
            .strip_prefix('$')
            .expect("lexer gave bad input to parser");
        Ok(FpuRegisters::index(name).ok_or(ParseError::UnknownRegister(slice))? as u8)
    }

    /// A branch offset or jump target: a literal or a label reference.
    fn parse_imm_or_label(&self, absolute: bool) -> Result<NodeImm<'a>, ParseError<'a>> {
        match self.peek_kind() {
            Some(LexemeKind::Imm) if absolute => Ok(NodeImm::Addr(self.parse_u32()?)),
            Some(LexemeKind::Imm) => Ok(NodeImm::Half(self.parse_i16()?)),
            Some(LexemeKind::Label) => Ok(NodeImm::Label(self.next().expect("peeked").1)),
            _ => Err(ParseError::ExpectedImm(
                self.peek().map(|l| l.0.line).unwrap_or(0),
            )),
        }
    }

    pub fn parse(&self) -> Result<Vec<Node<'a>>, ParseError<'a>> {
        let mut nodes = vec![];

        while let Some((lexeme, slice)) = self.next() {
            match lexeme.kind {
                // sections and directives
                LexemeKind::Sect => {
                    let name = &slice[1..];
                    match name {
                        "data" => nodes.push(Node::Section(Section::Data)),
                        "text" => nodes.push(Node::Section(Section::Text)),

                        "byte" => nodes.push(Node::Directive(Directive::Byte(self.parse_u8()?))),
                        "half" => nodes.push(Node::Directive(Directive::Half(self.parse_u16()?))),
                        "word" => {
                            nodes.push(Node::Directive(Directive::Word(self.parse_imm32()?)))
                        }

                        "asciiz" => {
                            nodes.push(Node::Directive(Directive::Asciiz(self.parse_string()?)))
                        }
                        "stringz" => {
                            nodes.push(Node::Directive(Directive::Stringz(self.parse_string()?)))
                        }

                        "align" => nodes.push(Node::Directive(Directive::Align(self.parse_u8()?))),

                        _ => return Err(ParseError::UnknownSectDirective(name)),
                    };
                }

                // labels
                LexemeKind::Label => nodes.push(Node::Label(
                    slice
                        .strip_suffix(':')
                        .expect("lexer gave bad input to parser"),
                )),

                // instructions
                LexemeKind::Inst => {
                    let opcode = Opcode::lookup(slice)
                        .ok_or(ParseError::UnknownInstruction(slice))?;
                    let mut node = InstNode::new(opcode);

                    for (i, arg) in opcode.args.iter().enumerate() {
                        let base = matches!(arg, Arg::BaseRs | Arg::BaseRd);

                        if base {
                            self.expect_punct("(")?;
                        } else if i > 0 {
                            self.expect_punct(",")?;
                        }

                        match arg {
                            Arg::Rs => node.rs = self.parse_register()?,
                            Arg::Rt => node.rt = self.parse_register()?,
                            Arg::Rd => node.rd = self.parse_register()?,
                            Arg::RsRt => {
                                let reg = self.parse_register()?;
                                node.rs = reg;
                                node.rt = reg;
                            }
                            Arg::BaseRs => {
                                node.rs = self.parse_register()?;
                                self.expect_punct(")")?;
                            }
                            Arg::BaseRd => {
                                node.rd = self.parse_register()?;
                                self.expect_punct(")")?;
                            }
                            Arg::Fs => node.rd = self.parse_fpu_register()?,
                            Arg::Ft => node.rt = self.parse_fpu_register()?,
                            Arg::Fd => node.shamt = self.parse_fpu_register()?,
                            Arg::C2Rd => node.rd = self.parse_u8()? & 0x1f,
                            Arg::C2Rt | Arg::Hint => node.rt = self.parse_u8()? & 0x1f,
                            Arg::Shamt => node.shamt = self.parse_u8()? & 0x1f,
                            Arg::SImm | Arg::SImm9 | Arg::SImm11 => {
                                node.imm = NodeImm::Half(self.parse_i16()?)
                            }
                            Arg::UImm => node.imm = NodeImm::Half(self.parse_u16()?),
                            Arg::Imm32 => node.imm = NodeImm::Word(self.parse_imm32()?),
                            Arg::Off => node.imm = self.parse_imm_or_label(false)?,
                            Arg::Target => node.imm = self.parse_imm_or_label(true)?,
                        }
                    }

                    nodes.push(Node::Inst(node));
                }

                kind => return Err(ParseError::UnexpectedLexeme(kind, lexeme.line)),
            }
        }

        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Mnemonic;

    fn parse(src: &str) -> Vec<Node<'_>> {
        Parser::new(src).parse().unwrap()
    }

    fn only_inst<'a>(nodes: &'a [Node<'a>]) -> &'a InstNode<'a> {
        match &nodes[0] {
            Node::Inst(inst) => inst,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn three_register_form() {
        let nodes = parse("add $t0, $t1, $t2");
        let inst = only_inst(&nodes);
        assert_eq!(inst.opcode.mnemonic, Mnemonic::Add);
        assert_eq!((inst.rd, inst.rs, inst.rt), (8, 9, 10));
    }

    #[test]
    fn immediate_family_destination_in_rs() {
        let nodes = parse("addiu $t0, $t1, -4");
        let inst = only_inst(&nodes);
        assert_eq!((inst.rs, inst.rt), (8, 9));
        assert!(matches!(inst.imm, NodeImm::Half(0xfffc)));
    }

    #[test]
    fn load_store_base_form() {
        let nodes = parse("lw $t0, 4($sp)");
        let inst = only_inst(&nodes);
        assert_eq!((inst.rt, inst.rs), (8, 29));
        assert!(matches!(inst.imm, NodeImm::Half(4)));
    }

    #[test]
    fn cop2_base_rides_in_rd() {
        let nodes = parse("sdc2 $t0, 3($t1)");
        let inst = only_inst(&nodes);
        assert_eq!((inst.rt, inst.rd), (8, 9));
        assert!(matches!(inst.imm, NodeImm::Half(3)));
    }

    #[test]
    fn fpu_registers() {
        let nodes = parse("cmp.seq.s $f0, $f2, $f4");
        let inst = only_inst(&nodes);
        // fd in shamt, fs in rd, ft in rt
        assert_eq!((inst.shamt, inst.rd, inst.rt), (0, 2, 4));
    }

    #[test]
    fn branch_label_reference() {
        let nodes = parse("loop: bne $t0, $zero, loop");
        assert!(matches!(nodes[0], Node::Label("loop")));
        let inst = match &nodes[1] {
            Node::Inst(inst) => inst,
            other => panic!("{other:?}"),
        };
        assert!(matches!(inst.imm, NodeImm::Label("loop")));
    }

    #[test]
    fn compact_same_register_form() {
        let nodes = parse("bgezc $t1, 8");
        let inst = only_inst(&nodes);
        assert_eq!((inst.rs, inst.rt), (9, 9));
    }

    #[test]
    fn sections_and_directives() {
        let nodes = parse(".data\n.word 0xdeadbeef\n.asciiz \"hi\"\n.align 2\n.text");
        assert!(matches!(nodes[0], Node::Section(Section::Data)));
        assert!(matches!(
            nodes[1],
            Node::Directive(Directive::Word(0xdeadbeef))
        ));
        assert!(matches!(&nodes[2], Node::Directive(Directive::Asciiz(s)) if s == "hi"));
        assert!(matches!(nodes[3], Node::Directive(Directive::Align(2))));
        assert!(matches!(nodes[4], Node::Section(Section::Text)));
    }

    #[test]
    fn errors() {
        assert!(matches!(
            Parser::new("frobnicate $t0").parse(),
            Err(ParseError::UnknownInstruction("frobnicate"))
        ));
        assert!(matches!(
            Parser::new("add $t0, $t1").parse(),
            Err(ParseError::ExpectedPunct(",", _))
        ));
        assert!(matches!(
            Parser::new("addiu $t0, $nope, 1").parse(),
            Err(ParseError::UnknownRegister("$nope"))
        ));
        assert!(matches!(
            Parser::new(".sponge").parse(),
            Err(ParseError::UnknownSectDirective("sponge"))
        ));
    }
}
