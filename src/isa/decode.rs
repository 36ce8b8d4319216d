use std::collections::HashMap;

use lazy_static::lazy_static;
use log::trace;

use super::opcode::{Mnemonic, Opcode, OPCODES};
use super::Instruction;

lazy_static! {
    /// Real (non-idiom) opcodes grouped by primary opcode, most-specific
    /// partial encoding first. Built once at startup.
    static ref DECODE_INDEX: HashMap<u32, Vec<&'static Opcode>> = {
        let mut index: HashMap<u32, Vec<&'static Opcode>> = HashMap::new();
        for op in OPCODES.iter().filter(|o| !o.is_idiom()) {
            index.entry(op.primary).or_default().push(op);
        }
        for group in index.values_mut() {
            group.sort_by_key(|o| std::cmp::Reverse(o.partial.count_ones()));
        }
        index
    };
}

/// Decode a raw instruction word back to its opcode.
///
/// Candidates are the opcodes of the word's primary-opcode group whose fixed
/// bits are all present in the word. A single candidate wins outright; the
/// compact-branch collision groups fall through to register-field rules, and
/// anything still ambiguous is ranked deterministically (see
/// [`disambiguate`]).
pub fn decode(word: u32) -> Option<&'static Opcode> {
    let inst = Instruction(word);
    let group = DECODE_INDEX.get(&inst.primary())?;

    let candidates: Vec<&'static Opcode> = group
        .iter()
        .copied()
        .filter(|op| word & op.partial == op.partial)
        .collect();

    match candidates.len() {
        0 => None,
        1 => Some(candidates[0]),
        _ => Some(disambiguate(&candidates, inst)),
    }
}

/// The register-field conventions that separate instructions sharing both a
/// primary opcode and indistinguishable fixed bits.
///
/// These encode ISA-level rules: the compact branches restrict which rs/rt
/// combinations each form may carry precisely so that an encoded word maps
/// back to one mnemonic. `None` means the opcode takes no part in collision
/// resolution (it wins only when every rule-bearing sibling is ruled out).
fn collision_rule(m: Mnemonic, rs: u32, rt: u32) -> Option<bool> {
    use Mnemonic::*;
    Some(match m {
        Bgec | Bltc | Bgeuc | Bltuc => rs != rt && rs != 0 && rt != 0,
        Beqc | Bnec => rs != 0 && rt != 0 && rs < rt,
        Beqzalc | Bnezalc => rs == 0 && rt != 0 && rs < rt,
        Bovc => rs >= rt && rt != 0,
        Bnvc => rs >= rt,
        Bgezc | Bltzalc | Bgezalc => rs == rt && rs != 0,
        Bltzc => rs == rt && rt != 0,
        Bgtzc | Bgtzalc | Blezalc | Blezc => rs == 0 && rt != 0,
        Beqzc | Bnezc => rs != 0 && rt == 0,
        Jic | Jialc => rt != 0,
        Bgezal | Bltzal => rs != 0,
        Bal | Nal => rs == 0,
        _ => return None,
    })
}

/// Whether a mnemonic participates in register-field collision resolution.
pub fn has_collision_rule(m: Mnemonic) -> bool {
    collision_rule(m, 0, 0).is_some()
}

/// Resolve a multi-candidate collision.
///
/// Rule-bearing candidates survive only if their register rule holds. A lone
/// survivor wins; with no survivor, a lone rule-free candidate wins. The
/// remaining cases (synthetic or malformed words, and the REGIMM group where
/// narrow partials are subsets of wider ones) are ranked by partial-encoding
/// specificity, then operand-flag consistency with the word's nonzero fields,
/// then declared-flag count. The ranking is deterministic but not an
/// architectural guarantee.
fn disambiguate(candidates: &[&'static Opcode], inst: Instruction) -> &'static Opcode {
    let (rs, rt) = (inst.rs(), inst.rt());

    let mut passed = Vec::new();
    let mut ruleless = Vec::new();
    for &op in candidates {
        match collision_rule(op.mnemonic, rs, rt) {
            Some(true) => passed.push(op),
            Some(false) => {}
            None => ruleless.push(op),
        }
    }

    if passed.len() == 1 {
        return passed[0];
    }
    if passed.is_empty() && ruleless.len() == 1 {
        return ruleless[0];
    }

    let pool = if passed.is_empty() && ruleless.is_empty() {
        candidates.to_vec()
    } else {
        passed.extend(ruleless);
        passed
    };

    trace!(
        "ambiguous decode {:#010x}: ranking {:?}",
        inst.0,
        pool.iter().map(|o| o.name).collect::<Vec<_>>()
    );

    // Vectors above preserve the index's specificity-first order, so
    // max_by_key's "last wins on ties" is overridden by taking the first
    // maximum explicitly.
    let mut best = pool[0];
    let mut best_key = rank(best, inst);
    for &op in &pool[1..] {
        let key = rank(op, inst);
        if key > best_key {
            best = op;
            best_key = key;
        }
    }
    best
}

fn rank(op: &Opcode, inst: Instruction) -> (u32, u32, u32) {
    let consistency = (op.rs == (inst.rs() != 0)) as u32
        + (op.rt == (inst.rt() != 0)) as u32
        + (op.rd == (inst.rd() != 0)) as u32;
    (op.partial.count_ones(), consistency, op.flag_count())
}
