use thiserror::Error;

use crate::gamma::SymbolTable;
use crate::tt::{mk_app, Term, TermAbs, TermApp, TermAssign};

/// Nesting limit for reductions, low enough for an unoptimised build on an 8 MiB stack.
pub const DEFAULT_MAX_DEPTH: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("undefined free symbol at slot {slot}")]
    Undefined { slot: usize },
    #[error("reduction did not finish within {steps} beta steps")]
    OutOfFuel { steps: usize },
    #[error("reduction nested deeper than {depth} levels")]
    TooDeep { depth: usize },
}

/// Normal-order reducer over the top level of a term.
///
/// Abstractions are values: nothing under a binder is reduced. Free names are replaced
/// by their current gamma values and assignments write to gamma as they are reduced.
pub struct Reducer<'a> {
    gamma: &'a mut SymbolTable,
    fuel: Option<usize>,
    max_depth: usize,
    steps: usize,
    depth: usize,
}

impl<'a> Reducer<'a> {
    pub fn new(gamma: &'a mut SymbolTable) -> Self {
        Self {
            gamma,
            fuel: None,
            max_depth: DEFAULT_MAX_DEPTH,
            steps: 0,
            depth: 0,
        }
    }

    /// Limits the number of beta steps this reducer may take. `None` means unbounded.
    pub fn with_fuel(mut self, fuel: Option<usize>) -> Self {
        self.fuel = fuel;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Beta steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn reduce(&mut self, m: Term) -> Result<Term, EvalError> {
        if self.depth >= self.max_depth {
            return Err(EvalError::TooDeep {
                depth: self.max_depth,
            });
        }
        self.depth += 1;
        let res = self.reduce_help(m);
        self.depth -= 1;
        res
    }

    fn reduce_help(&mut self, mut m: Term) -> Result<Term, EvalError> {
        loop {
            match m {
                // at the top level every name is free and its index is its slot
                Term::Var(slot) => {
                    return match self.gamma.get(slot) {
                        Some(symbol) => Ok(symbol.value.clone()),
                        None => Err(EvalError::Undefined { slot }),
                    };
                }
                Term::Abs(_) | Term::Empty => return Ok(m),
                Term::App(inner) => {
                    let TermApp { fun, arg } = *inner;
                    match self.reduce(fun)? {
                        Term::Abs(abs) => {
                            let TermAbs { body } = *abs;
                            self.tick()?;
                            m = Term::beta(body, arg);
                            if log::log_enabled!(log::Level::Trace) {
                                log::trace!("beta step {}: {}", self.steps, m);
                            }
                        }
                        fun => {
                            let arg = self.reduce(arg)?;
                            return Ok(mk_app(fun, arg));
                        }
                    }
                }
                Term::Assign(inner) => {
                    let TermAssign { name, value } = *inner;
                    let value = self.reduce(value)?;
                    if !self.gamma.set_slot(name, value.clone()) {
                        return Err(EvalError::Undefined { slot: name });
                    }
                    log::debug!("assigned slot {name}");
                    return Ok(value);
                }
            }
        }
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        if let Some(fuel) = self.fuel {
            if self.steps >= fuel {
                return Err(EvalError::OutOfFuel { steps: fuel });
            }
        }
        self.steps += 1;
        Ok(())
    }
}

/// Reduces `m` with an unbounded reducer.
pub fn beta_reduce(m: Term, gamma: &mut SymbolTable) -> Result<Term, EvalError> {
    Reducer::new(gamma).reduce(m)
}
