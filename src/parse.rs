use thiserror::Error;

use crate::fix::{bind_slot, mk_fix};
use crate::gamma::SymbolTable;
use crate::lex::{LexError, Token, TokenKind, TokensExt};
use crate::tt::{mk_abs, mk_abs_n, mk_app, mk_assign, mk_var, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("Cannot assign to local variable")]
    AssignToLocal,
    #[error("Illegal token")]
    IllegalToken,
    #[error("Incomplete term")]
    Incomplete,
    #[error("Invalid name")]
    InvalidName,
    #[error("Invalid parameter name")]
    InvalidParam,
    #[error("Invalid free-variable declaration")]
    InvalidSymDecl,
    #[error("Malformed def statement")]
    MalformedDef,
    #[error("Missing assignment operator")]
    MissingAssignOp,
    #[error("Missing dot after parameter name")]
    MissingDot,
    #[error("Missing 'in'")]
    MissingIn,
    #[error("Missing parameter")]
    MissingParam,
    #[error("Trailing garbage")]
    TrailingGarbage,
    #[error("Term nested too deeply")]
    TooDeep,
    #[error("Undeclared free symbol")]
    UndeclaredSymbol,
    #[error("Meaningless token")]
    UnexpectedToken,
}

/// Nesting limit for terms; each level costs several stack frames.
pub const DEFAULT_MAX_NESTING: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Position {position}: {kind}\n{view}")]
pub struct ParseError {
    pub kind: ErrorKind,
    /// index of the offending token
    pub position: usize,
    pub view: String,
}

impl ParseError {
    pub fn new(tokens: &[Token], position: usize, kind: ErrorKind) -> Self {
        Self {
            kind,
            position,
            view: tokens.render_marked(position),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            kind: ErrorKind::IllegalToken,
            position: err.position,
            view: err.view,
        }
    }
}

/// Recursive-descent parser producing nameless terms.
///
/// Every production takes the index of its first token and returns the parsed term
/// together with the index just past it. Free names are declared in `gamma` as they are
/// met, so their slots are fixed before any reduction runs.
pub struct Parser<'a> {
    tokens: &'a [Token],
    gamma: &'a mut SymbolTable,
    locals: Vec<String>,
    auto_declare: bool,
    max_nesting: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], gamma: &'a mut SymbolTable) -> Self {
        Self {
            tokens,
            gamma,
            locals: vec![],
            auto_declare: true,
            max_nesting: DEFAULT_MAX_NESTING,
            nesting: 0,
        }
    }

    pub fn with_locals(mut self, locals: Vec<String>) -> Self {
        self.locals = locals;
        self
    }

    /// When disabled, an unknown free name is an [ErrorKind::UndeclaredSymbol] instead of a
    /// fresh declaration.
    pub fn auto_declare(mut self, auto_declare: bool) -> Self {
        self.auto_declare = auto_declare;
        self
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    fn fail<R>(&self, at: usize, kind: ErrorKind) -> Result<R, ParseError> {
        Err(ParseError::new(self.tokens, at, kind))
    }

    fn peek(&self, at: usize) -> Option<&'a Token> {
        self.tokens.get(at)
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|local| local == name)
    }

    /// Runs `f` with `names` pushed as the innermost binders.
    fn scoped<R>(
        &mut self,
        names: &[String],
        f: impl FnOnce(&mut Self) -> Result<R, ParseError>,
    ) -> Result<R, ParseError> {
        let len = self.locals.len();
        self.locals.extend_from_slice(names);
        let res = f(self);
        self.locals.truncate(len);
        res
    }

    /// Parses the whole token stream as a single term.
    pub fn parse(&mut self) -> Result<Term, ParseError> {
        let (m, next) = self.parse_term(0)?;
        if next < self.tokens.len() {
            return self.fail(next, ErrorKind::TrailingGarbage);
        }
        Ok(m)
    }

    pub fn parse_term(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        if self.nesting >= self.max_nesting {
            return self.fail(at, ErrorKind::TooDeep);
        }
        self.nesting += 1;
        let res = self.parse_term_help(at);
        self.nesting -= 1;
        res
    }

    fn parse_term_help(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let Some(token) = self.peek(at) else {
            return self.fail(at, ErrorKind::Incomplete);
        };
        match token.kind {
            TokenKind::LeftParen => self.application(at),
            TokenKind::Lambda => self.abstraction(at),
            TokenKind::Name => self.name(at),
            TokenKind::Def => self.assignment(at),
            TokenKind::Let => self.let_in(at),
            TokenKind::Letrec => self.letrec_in(at),
            TokenKind::Assign
            | TokenKind::Semicolon
            | TokenKind::RightParen
            | TokenKind::Dot
            | TokenKind::In
            | TokenKind::Sym => self.fail(at, ErrorKind::UnexpectedToken),
        }
    }

    /// e.g. `"(f x y)"`, read as `((f x) y)`
    fn application(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let (fun, at) = self.parse_term(at + 1)?;
        let (arg, mut at) = self.parse_term(at)?;
        let mut m = mk_app(fun, arg);
        loop {
            match self.peek(at) {
                None => return self.fail(at, ErrorKind::Incomplete),
                Some(token) if token.kind == TokenKind::RightParen => break,
                Some(_) => {
                    let (arg, next) = self.parse_term(at)?;
                    m = mk_app(m, arg);
                    at = next;
                }
            }
        }
        Ok((m, at + 1))
    }

    /// e.g. `"\x.x"`
    fn abstraction(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let (param, at) = self.binder(at + 1)?;
        match self.peek(at) {
            None => return self.fail(at, ErrorKind::Incomplete),
            Some(token) if token.kind != TokenKind::Dot => {
                return self.fail(at, ErrorKind::MissingDot);
            }
            Some(_) => {}
        }
        let (body, at) = self.scoped(&[param], |this| this.parse_term(at + 1))?;
        Ok((mk_abs(body), at))
    }

    fn name(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let Some(token) = self.peek(at) else {
            return self.fail(at, ErrorKind::Incomplete);
        };
        if !token.is_name() {
            return self.fail(at, ErrorKind::InvalidName);
        }
        if let Some(index) = self.locals.iter().rev().position(|x| x == token.as_str()) {
            return Ok((mk_var(index), at + 1));
        }
        let slot = match self.gamma.find_by_label(token.as_str()) {
            Some(slot) => slot,
            None if self.auto_declare => self.gamma.declare(token.as_str()),
            None => return self.fail(at, ErrorKind::UndeclaredSymbol),
        };
        Ok((mk_var(slot + self.locals.len()), at + 1))
    }

    /// e.g. `"def add x y := (x succ y)"`
    ///
    /// The defined name is declared before its value is parsed so that the value may
    /// refer to it.
    fn assignment(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let at = at + 1;
        let Some(token) = self.peek(at) else {
            return self.fail(at, ErrorKind::MalformedDef);
        };
        if !token.is_name() {
            return self.fail(at, ErrorKind::InvalidName);
        }
        if self.is_local(token.as_str()) {
            return self.fail(at, ErrorKind::AssignToLocal);
        }
        let slot = self.gamma.declare(token.as_str());
        let name = slot + self.locals.len();
        let (params, at) = self.params(at + 1, ErrorKind::InvalidParam)?;
        let (value, at) = self.scoped(&params, |this| this.parse_term(at))?;
        Ok((mk_assign(name, mk_abs_n(params.len(), value)), at))
    }

    /// e.g. `"let apply f a := (f a) in (apply g x)"`, read as `(\apply.(apply g x) \f.\a.(f a))`
    fn let_in(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let (label, at) = self.binder(at + 1)?;
        let (params, at) = self.params(at, ErrorKind::MissingAssignOp)?;
        let (value, at) = self.scoped(&params, |this| this.parse_term(at))?;
        let value = mk_abs_n(params.len(), value);
        let at = self.keyword_in(at)?;
        let (body, at) = self.scoped(&[label], |this| this.parse_term(at))?;
        Ok((mk_app(mk_abs(body), value), at))
    }

    /// e.g. `"letrec f x := (f x) in f"`
    ///
    /// The value is parsed with its own name resolved through gamma, then that slot is
    /// rebound to a fresh outer binder and the result is handed to the fixed-point
    /// combinator.
    fn letrec_in(&mut self, at: usize) -> Result<(Term, usize), ParseError> {
        let name_at = at + 1;
        let (label, at) = self.binder(name_at)?;
        if self.is_local(&label) {
            return self.fail(name_at, ErrorKind::AssignToLocal);
        }
        let slot = self.gamma.declare(&label);
        let (params, at) = self.params(at, ErrorKind::MissingAssignOp)?;
        let (value, at) = self.scoped(&params, |this| this.parse_term(at))?;
        let value = mk_abs_n(params.len(), value);
        let fixed = mk_app(mk_fix(), bind_slot(&value, slot, self.locals.len()));
        let at = self.keyword_in(at)?;
        let (body, at) = self.scoped(&[label], |this| this.parse_term(at))?;
        Ok((mk_app(mk_abs(body), fixed), at))
    }

    /// A binder name, as after `\` or `let`.
    fn binder(&self, at: usize) -> Result<(String, usize), ParseError> {
        match self.peek(at) {
            None => self.fail(at, ErrorKind::MissingParam),
            Some(token) if !token.is_name() => self.fail(at, ErrorKind::InvalidParam),
            Some(token) => Ok((token.text.clone(), at + 1)),
        }
    }

    /// Parameter names up to and including `:=`.
    ///
    /// A keyword in parameter position is always [ErrorKind::InvalidParam]; any other
    /// non-name token is reported as `misplaced`.
    fn params(
        &self,
        mut at: usize,
        misplaced: ErrorKind,
    ) -> Result<(Vec<String>, usize), ParseError> {
        let mut params = vec![];
        loop {
            match self.peek(at) {
                None => return self.fail(at, ErrorKind::Incomplete),
                Some(token) => match token.kind {
                    TokenKind::Assign => return Ok((params, at + 1)),
                    TokenKind::Name => params.push(token.text.clone()),
                    TokenKind::Def
                    | TokenKind::Let
                    | TokenKind::Letrec
                    | TokenKind::In
                    | TokenKind::Sym => return self.fail(at, ErrorKind::InvalidParam),
                    _ => return self.fail(at, misplaced),
                },
            }
            at += 1;
        }
    }

    fn keyword_in(&self, at: usize) -> Result<usize, ParseError> {
        match self.peek(at) {
            Some(token) if token.kind == TokenKind::In => Ok(at + 1),
            _ => self.fail(at, ErrorKind::MissingIn),
        }
    }
}

/// Parses one term starting at `at` under the given binders (innermost last).
pub fn parse_term(
    tokens: &[Token],
    at: usize,
    locals: &[String],
    gamma: &mut SymbolTable,
) -> Result<(Term, usize), ParseError> {
    Parser::new(tokens, gamma)
        .with_locals(locals.to_vec())
        .parse_term(at)
}

/// Parses `tokens` as exactly one term.
pub fn parse(tokens: &[Token], gamma: &mut SymbolTable) -> Result<Term, ParseError> {
    Parser::new(tokens, gamma).parse()
}
