//! Recursion without cyclic terms.
//!
//! A recursive definition is first parsed with its self-reference pointing at a gamma
//! slot. [bind] turns that reference into a bound variable of a new outer abstraction,
//! and applying the fixed-point combinator to the result ties the knot.

use crate::gamma::SymbolTable;
use crate::tt::{mk_abs, mk_app, mk_var, Term};

/// `\f.(\s.(f (s s)) \s.(f (s s)))`
pub fn mk_fix() -> Term {
    let half = mk_abs(mk_app(mk_var(1), mk_app(mk_var(0), mk_var(0))));
    mk_abs(mk_app(half.clone(), half))
}

/// Abstracts every free occurrence of the symbol `label` in `m`, a term at binder depth 0.
///
/// Returns `None` if `label` is not declared.
pub fn bind(gamma: &SymbolTable, label: &str, m: &Term) -> Option<Term> {
    let slot = gamma.find_by_label(label)?;
    Some(bind_slot(m, slot, 0))
}

/// Like [bind], for a term sitting under `outer` binders.
pub fn bind_slot(m: &Term, slot: usize, outer: usize) -> Term {
    let mut m = m.clone();
    bind_at(&mut m, slot, outer, 0);
    mk_abs(m)
}

fn bind_at(m: &mut Term, slot: usize, outer: usize, level: usize) {
    match m {
        Term::Var(i) => {
            if *i >= level + outer && *i - level - outer == slot {
                *i = level;
            } else if *i >= level {
                *i += 1;
            }
        }
        Term::Abs(inner) => bind_at(&mut inner.body, slot, outer, level + 1),
        Term::App(inner) => {
            bind_at(&mut inner.fun, slot, outer, level);
            bind_at(&mut inner.arg, slot, outer, level);
        }
        Term::Assign(inner) => {
            // assignment targets stay global
            if inner.name >= level {
                inner.name += 1;
            }
            bind_at(&mut inner.value, slot, outer, level);
        }
        Term::Empty => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tt::mk_assign;

    #[test]
    fn rewrites_only_the_chosen_slot() {
        let mut gamma = SymbolTable::new();
        gamma.declare("f");
        gamma.declare("g");
        // \x.(f g x) with f = slot 0, g = slot 1
        let m = mk_abs(mk_app(mk_app(mk_var(1), mk_var(2)), mk_var(0)));
        let bound = bind(&gamma, "f", &m).unwrap();
        // \f.\x.(f g x) with g now one binder further out
        let expected = mk_abs(mk_abs(mk_app(mk_app(mk_var(1), mk_var(3)), mk_var(0))));
        assert_eq!(bound, expected);
    }

    #[test]
    fn undeclared_label() {
        let gamma = SymbolTable::new();
        assert_eq!(bind(&gamma, "f", &mk_var(0)), None);
    }

    #[test]
    fn respects_outer_binders() {
        // under one outer binder, index 1 at level 0 is slot 0 and index 0 is the outer local
        let m = mk_app(mk_var(1), mk_var(0));
        assert_eq!(bind_slot(&m, 0, 1), mk_abs(mk_app(mk_var(0), mk_var(1))));
    }

    #[test]
    fn assignment_names_are_shifted() {
        let m = mk_assign(0, mk_var(0));
        assert_eq!(bind_slot(&m, 0, 0), mk_abs(mk_assign(1, mk_var(0))));
    }

    #[test]
    fn fix_is_closed() {
        assert!(mk_fix().is_closed());
    }
}
