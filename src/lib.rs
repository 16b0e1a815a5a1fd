pub mod cmd;
pub mod config;
pub mod fix;
pub mod gamma;
pub mod lex;
pub mod parse;
pub mod print;
pub mod reduce;
pub mod tt;

pub use cmd::{Cmd, Reply, Session};
pub use config::Config;
pub use gamma::SymbolTable;
pub use lex::tokenize;
pub use parse::{parse, parse_term, ErrorKind, ParseError};
pub use print::{prettify, Layout, Printer};
pub use reduce::{beta_reduce, EvalError, Reducer};
pub use tt::Term;

/// Runs `input` as a program in a fresh session and returns the last value together with
/// its rendering.
pub fn process(input: &str) -> anyhow::Result<Option<(Term, String)>> {
    let mut session = Session::default();
    let value = session.load_program(input)?;
    Ok(value.map(|m| {
        let printed = session.prettify(&m);
        (m, printed)
    }))
}
