//! Nameless terms.
//!
//! A [Term::Var] index `i` under `d` enclosing abstractions is bound when `i < d`
//! (counting outward from the innermost binder) and otherwise refers to the gamma
//! slot `i - d`.

use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Term {
    Var(usize),
    Abs(Box<TermAbs>),
    App(Box<TermApp>),
    Assign(Box<TermAssign>),
    #[default]
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TermAbs {
    pub body: Term,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TermApp {
    pub fun: Term,
    pub arg: Term,
}

/// `name` is the index of a free variable, subject to the same shifting as [Term::Var].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TermAssign {
    pub name: usize,
    pub value: Term,
}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(i) => write!(f, "N({i})"),
            Term::Abs(inner) => write!(f, "F({})", inner.body),
            Term::App(inner) => write!(f, "A({} {})", inner.fun, inner.arg),
            Term::Assign(inner) => write!(f, "<N({}), {}>", inner.name, inner.value),
            Term::Empty => write!(f, "nil"),
        }
    }
}

pub fn mk_var(i: usize) -> Term {
    Term::Var(i)
}

pub fn mk_abs(body: Term) -> Term {
    Term::Abs(Box::new(TermAbs { body }))
}

pub fn mk_app(fun: Term, arg: Term) -> Term {
    Term::App(Box::new(TermApp { fun, arg }))
}

pub fn mk_assign(name: usize, value: Term) -> Term {
    Term::Assign(Box::new(TermAssign { name, value }))
}

pub fn mk_empty() -> Term {
    Term::Empty
}

/// `\x.x`
pub fn mk_identity() -> Term {
    mk_abs(mk_var(0))
}

/// Wraps `body` in `n` abstractions.
pub fn mk_abs_n(n: usize, mut body: Term) -> Term {
    for _ in 0..n {
        body = mk_abs(body);
    }
    body
}

/// Left-folds `fun args...` into nested binary applications.
pub fn mk_app_n(fun: Term, args: impl IntoIterator<Item = Term>) -> Term {
    args.into_iter().fold(fun, mk_app)
}

fn shift_index(i: usize, amount: isize) -> usize {
    i.checked_add_signed(amount)
        .expect("negative de Bruijn index")
}

impl Term {
    /// Adds `amount` to every index `>= threshold`, where the threshold grows by one under
    /// each abstraction.
    pub fn shift(&mut self, amount: isize, threshold: usize) {
        match self {
            Term::Var(i) => {
                if *i >= threshold {
                    *i = shift_index(*i, amount);
                }
            }
            Term::Abs(inner) => inner.body.shift(amount, threshold + 1),
            Term::App(inner) => {
                inner.fun.shift(amount, threshold);
                inner.arg.shift(amount, threshold);
            }
            Term::Assign(inner) => {
                if inner.name >= threshold {
                    inner.name = shift_index(inner.name, amount);
                }
                inner.value.shift(amount, threshold);
            }
            Term::Empty => {}
        }
    }

    pub fn inc(&mut self, threshold: usize) {
        self.shift(1, threshold);
    }

    pub fn dec(&mut self, threshold: usize) {
        self.shift(-1, threshold);
    }

    /// `self.subst(arg, i) == [arg/i]self`
    ///
    /// Under `k` abstractions the target becomes `i + k` and the inserted copy of `arg`
    /// is shifted up by `k`, which is the same as incrementing `arg` at every binder.
    pub fn subst(&mut self, arg: &Term, target: usize) {
        self.subst_at(arg, target, 0)
    }

    fn subst_at(&mut self, arg: &Term, target: usize, level: usize) {
        match self {
            Term::Var(i) => {
                if *i == target + level {
                    let mut arg = arg.clone();
                    if level > 0 {
                        arg.shift(level as isize, 0);
                    }
                    *self = arg;
                }
            }
            Term::Abs(inner) => inner.body.subst_at(arg, target, level + 1),
            Term::App(inner) => {
                inner.fun.subst_at(arg, target, level);
                inner.arg.subst_at(arg, target, level);
            }
            Term::Assign(inner) => inner.value.subst_at(arg, target, level),
            Term::Empty => {}
        }
    }

    /// One beta step: `(\.body arg)` becomes `body[arg/0]` with the binder removed.
    pub fn beta(body: Term, mut arg: Term) -> Term {
        let mut body = body;
        arg.inc(0);
        body.subst(&arg, 0);
        body.dec(0);
        body
    }

    /// Whether no index reaches past its binders and no assignment is left.
    pub fn is_closed(&self) -> bool {
        self.is_closed_at(0)
    }

    fn is_closed_at(&self, level: usize) -> bool {
        match self {
            Term::Var(i) => *i < level,
            Term::Abs(inner) => inner.body.is_closed_at(level + 1),
            Term::App(inner) => inner.fun.is_closed_at(level) && inner.arg.is_closed_at(level),
            Term::Assign(_) => false,
            Term::Empty => true,
        }
    }

    /// Whether an assignment node remains anywhere in the term.
    pub fn has_assign(&self) -> bool {
        match self {
            Term::Var(_) | Term::Empty => false,
            Term::Abs(inner) => inner.body.has_assign(),
            Term::App(inner) => inner.fun.has_assign() || inner.arg.has_assign(),
            Term::Assign(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: usize) -> Term {
        mk_var(i)
    }

    fn f(body: Term) -> Term {
        mk_abs(body)
    }

    fn a(fun: Term, arg: Term) -> Term {
        mk_app(fun, arg)
    }

    #[test]
    fn shift_respects_threshold() {
        // \.(0 1) 0
        let mut m = a(f(a(n(0), n(1))), n(0));
        m.inc(0);
        assert_eq!(m, a(f(a(n(0), n(2))), n(1)));
        m.dec(0);
        assert_eq!(m, a(f(a(n(0), n(1))), n(0)));
    }

    #[test]
    fn shift_moves_assignment_names() {
        let mut m = f(mk_assign(3, n(1)));
        m.shift(2, 0);
        assert_eq!(m, f(mk_assign(5, n(3))));
    }

    #[test]
    #[should_panic(expected = "negative de Bruijn index")]
    fn negative_index_is_fatal() {
        let mut m = n(0);
        m.dec(0);
    }

    #[test]
    fn subst_shifts_argument_under_binders() {
        // [5/0] \.(0 1) == \.(0 6)
        let mut m = f(a(n(0), n(1)));
        m.subst(&n(5), 0);
        assert_eq!(m, f(a(n(0), n(6))));
    }

    #[test]
    fn beta_avoids_capture() {
        // (\.\.1 \.1) where \.1 has a free index 1 (slot 0 under one binder)
        // reduces to \.\.2 : the free reference must survive under the extra binder
        let body = f(n(1));
        let arg = f(n(1));
        assert_eq!(Term::beta(body, arg), f(f(n(2))));
    }

    #[test]
    fn beta_lowers_free_variables() {
        // (\.3 x) == 2 : index 3 at depth 1 is gamma slot 2
        assert_eq!(Term::beta(n(3), n(0)), n(2));
    }

    #[test]
    fn closedness() {
        assert!(mk_identity().is_closed());
        assert!(!f(n(1)).is_closed());
        assert!(f(mk_empty()).is_closed());
    }

    #[test]
    fn display_is_nameless() {
        let m = a(f(mk_assign(1, n(0))), mk_empty());
        assert_eq!(m.to_string(), "A(F(<N(1), N(0)>) nil)");
    }

    #[test]
    fn builders_fold_left() {
        assert_eq!(mk_app_n(n(0), [n(1), n(2)]), a(a(n(0), n(1)), n(2)));
        assert_eq!(mk_abs_n(2, n(0)), f(f(n(0))));
    }
}
