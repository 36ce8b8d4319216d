use std::{iter::Peekable, ops::Range, str::CharIndices};

#[derive(Default, Debug, Clone)]
pub struct Lexeme {
    pub slice: Range<usize>,
    pub line: u32,
    pub kind: LexemeKind,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LexemeKind {
    /// Punctuation (or other characters), e.g. `,`.
    #[default]
    Punct,

    /// A section or directive, e.g. `.text`.
    Sect,

    /// A label, e.g. `label:`.
    Label,

    /// An instruction, e.g. `addiu`.
    Inst,

    /// A register, e.g. `$t0`.
    Reg,

    /// An immediate value, e.g. `42`.
    Imm,
}

/// Peekable char scanner that tracks byte boundaries for slicing.
struct Cursor<'a> {
    len: usize,
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            len: text.len(),
            iter: text.char_indices().peekable(),
        }
    }

    fn next(&mut self) -> Option<(usize, char)> {
        self.iter.next()
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.iter.peek().copied()
    }

    /// Byte offset of the next char, or the end of input.
    fn boundary(&mut self) -> usize {
        self.peek().map(|(idx, _)| idx).unwrap_or(self.len)
    }
}

pub struct Lexer<'a> {
    chars: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: Cursor::new(text),
        }
    }

    fn peek_is<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(char) -> bool,
    {
        matches!(self.chars.peek(), Some((_, c)) if f(c))
    }

    fn take_while<F>(&mut self, base: usize, mut f: F) -> Range<usize>
    where
        F: FnMut(char) -> bool,
    {
        while self.peek_is(&mut f) {
            self.chars.next();
        }

        base..self.chars.boundary()
    }

    pub fn lex(mut self) -> Vec<Lexeme> {
        let mut lexemes = vec![];
        let mut line = 0u32;
        let mut line_has_inst = false;

        while let Some((idx, c)) = self.chars.next() {
            match c {
                // comments run to end of line and are dropped
                ';' | '#' => {
                    self.take_while(idx, |c| c != '\n');
                }

                // sections and directives
                '.' if self.peek_is(char::is_alphabetic) => {
                    lexemes.push(Lexeme {
                        slice: self.take_while(idx, char::is_alphabetic),
                        line,
                        kind: LexemeKind::Sect,
                    });
                }

                // registers
                '$' => lexemes.push(Lexeme {
                    slice: self.take_while(idx, char::is_alphanumeric),
                    line,
                    kind: LexemeKind::Reg,
                }),

                // either a label or an instruction
                _ if c.is_alphabetic() => {
                    // mnemonics may carry format suffixes ("add.s",
                    // "cmp.seq.d"), labels may carry underscores
                    let mut slice =
                        self.take_while(idx, |c| c == '_' || c == '.' || c.is_alphanumeric());

                    if self.peek_is(|c| c == ':') {
                        // a label marker
                        self.chars.next();
                        slice.end = self.chars.boundary();

                        lexemes.push(Lexeme {
                            slice,
                            line,
                            kind: LexemeKind::Label,
                        });
                    } else if line_has_inst {
                        // if this line already had an instruction, this is a
                        // label reference
                        lexemes.push(Lexeme {
                            slice,
                            line,
                            kind: LexemeKind::Label,
                        });
                    } else {
                        // otherwise, this is an instruction
                        line_has_inst = true;
                        lexemes.push(Lexeme {
                            slice,
                            line,
                            kind: LexemeKind::Inst,
                        });
                    }
                }

                '-' if self.peek_is(char::is_numeric) => lexemes.push(Lexeme {
                    slice: self.take_while(idx, char::is_numeric),
                    line,
                    kind: LexemeKind::Imm,
                }),

                // immediates
                _ if c.is_numeric() => {
                    if c == '0' && self.peek_is(|c| c == 'x') {
                        // hexadecimal
                        self.chars.next();

                        lexemes.push(Lexeme {
                            slice: self.take_while(idx, |c| c.is_ascii_hexdigit()),
                            line,
                            kind: LexemeKind::Imm,
                        })
                    } else {
                        lexemes.push(Lexeme {
                            slice: self.take_while(idx, char::is_numeric),
                            line,
                            kind: LexemeKind::Imm,
                        });
                    }
                }

                // strings (when used with .asciiz/.stringz)
                '"' => {
                    let mut escape = false;
                    let mut end = false;

                    lexemes.push(Lexeme {
                        slice: self.take_while(idx, |c| {
                            if end {
                                return false;
                            }

                            match c {
                                '\\' if !escape => {
                                    escape = true;
                                }

                                '"' if !escape => {
                                    end = true;
                                }

                                _ => {
                                    escape = false;
                                }
                            }

                            true
                        }),
                        line,
                        kind: LexemeKind::Imm,
                    });
                }

                // whitespace
                _ if c.is_whitespace() => {
                    if c == '\n' {
                        line += 1;
                        line_has_inst = false;
                    }
                }

                // catch all other characters as punctuation, one char each
                _ => lexemes.push(Lexeme {
                    slice: idx..self.chars.boundary(),
                    line,
                    kind: LexemeKind::Punct,
                }),
            }
        }

        lexemes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(LexemeKind, &str)> {
        Lexer::new(src)
            .lex()
            .into_iter()
            .map(|l| (l.kind, &src[l.slice]))
            .collect()
    }

    #[test]
    fn instruction_line() {
        use LexemeKind::*;
        assert_eq!(
            kinds("addiu $t0, $t1, 1"),
            vec![
                (Inst, "addiu"),
                (Reg, "$t0"),
                (Punct, ","),
                (Reg, "$t1"),
                (Punct, ","),
                (Imm, "1"),
            ]
        );
    }

    #[test]
    fn labels_and_references() {
        use LexemeKind::*;
        assert_eq!(
            kinds("loop: bne $t0, $zero, loop"),
            vec![
                (Label, "loop:"),
                (Inst, "bne"),
                (Reg, "$t0"),
                (Punct, ","),
                (Reg, "$zero"),
                (Punct, ","),
                (Label, "loop"),
            ]
        );
    }

    #[test]
    fn dotted_mnemonics_stay_whole() {
        use LexemeKind::*;
        assert_eq!(
            kinds("cmp.seq.s $f0, $f2, $f4")[0],
            (Inst, "cmp.seq.s")
        );
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(kinds("# whole line\naddiu $t0, $t0, 1 ; trailing").len(), 6);
    }

    #[test]
    fn numeric_forms() {
        use LexemeKind::*;
        assert_eq!(
            kinds("-12 0x1f 42"),
            vec![(Imm, "-12"), (Imm, "0x1f"), (Imm, "42")]
        );
    }

    #[test]
    fn sections_and_strings() {
        use LexemeKind::*;
        let lexed = kinds(".data\n.asciiz \"hi\\\"there\"");
        assert_eq!(lexed[0], (Sect, ".data"));
        assert_eq!(lexed[1], (Sect, ".asciiz"));
        assert_eq!(lexed[2].0, Imm);
    }
}
