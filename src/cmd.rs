use std::path::Path;

use anyhow::{bail, Context};

use crate::{
    config::Config,
    gamma::SymbolTable,
    lex::{tokenize, Token, TokenKind, TokensExt},
    parse::{ErrorKind, ParseError, Parser},
    print::Printer,
    reduce::Reducer,
    tt::{mk_var, Term},
};

/// One line of input, after comments are stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Eval(CmdEval),
    Load(CmdLoad),
    Gamma,
    Clear(CmdClear),
    Reset,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdEval {
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdLoad {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdClear {
    pub label: String,
}

impl Cmd {
    /// Returns `None` for blank and comment-only lines.
    pub fn parse_line(line: &str) -> anyhow::Result<Option<Cmd>> {
        let line = match line.split_once('#') {
            Some((code, _)) => code,
            None => line,
        }
        .trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(directive) = line.strip_prefix(':') else {
            return Ok(Some(Cmd::Eval(CmdEval {
                source: line.to_owned(),
            })));
        };
        let words: Vec<&str> = directive.split_whitespace().collect();
        let cmd = match words.as_slice() {
            ["load", name] => Cmd::Load(CmdLoad {
                name: name.to_string(),
            }),
            ["gamma"] => Cmd::Gamma,
            ["clear", label] => Cmd::Clear(CmdClear {
                label: label.to_string(),
            }),
            ["reset"] => Cmd::Reset,
            ["quit"] | ["q"] => Cmd::Quit,
            ["load" | "clear", ..] => bail!("directive `:{}` takes exactly one argument", words[0]),
            _ => bail!("undefined directive: `:{directive}`"),
        };
        Ok(Some(cmd))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Value(Term),
    Listing(String),
    Nothing,
    Quit,
}

/// An interpreter session: one gamma table and the settings used to evaluate against it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub gamma: SymbolTable,
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            gamma: SymbolTable::new(),
            config,
        }
    }

    /// Evaluates every `;`-separated chunk of `input` in order and returns the value of the
    /// last one. The first failing chunk aborts the rest; changes made to gamma by the
    /// chunks before it are kept.
    pub fn eval_str(&mut self, input: &str) -> anyhow::Result<Option<Term>> {
        let tokens = tokenize(input)
            .map_err(ParseError::from)
            .context("parse error")?;
        self.eval_tokens(&tokens)
    }

    pub fn eval_tokens(&mut self, tokens: &[Token]) -> anyhow::Result<Option<Term>> {
        let mut value = None;
        for chunk in tokens.split_chunks() {
            value = Some(self.eval_chunk(chunk)?);
        }
        Ok(value)
    }

    fn eval_chunk(&mut self, tokens: &[Token]) -> anyhow::Result<Term> {
        if log::log_enabled!(log::Level::Debug) {
            let source: Vec<&str> = tokens.iter().map(Token::as_str).collect();
            log::debug!("evaluating {}", source.join(" "));
        }
        if tokens[0].kind == TokenKind::Sym {
            return self.declare_syms(tokens).context("parse error");
        }
        let m = Parser::new(tokens, &mut self.gamma)
            .auto_declare(self.config.auto_declare)
            .parse()
            .context("parse error")?;
        let mut reducer = Reducer::new(&mut self.gamma)
            .with_fuel(self.config.fuel)
            .with_max_depth(self.config.max_depth);
        let m = reducer.reduce(m).context("evaluation error")?;
        log::debug!("reduced in {} beta steps", reducer.steps());
        if m.has_assign() {
            log::debug!("value keeps assignments under its binders");
        }
        Ok(m)
    }

    /// `sym a b c` declares each name and yields the free name of the last one.
    fn declare_syms(&mut self, tokens: &[Token]) -> Result<Term, ParseError> {
        if tokens.len() < 2 {
            return Err(ParseError::new(tokens, 1, ErrorKind::InvalidSymDecl));
        }
        let mut last = 0;
        for (i, token) in tokens.iter().enumerate().skip(1) {
            if !token.is_name() {
                return Err(ParseError::new(tokens, i, ErrorKind::InvalidSymDecl));
            }
            last = self.gamma.declare(token.as_str());
        }
        Ok(mk_var(last))
    }

    pub fn run_cmd(&mut self, cmd: Cmd) -> anyhow::Result<Reply> {
        match cmd {
            Cmd::Eval(CmdEval { source }) => Ok(match self.eval_str(&source)? {
                Some(m) => Reply::Value(m),
                None => Reply::Nothing,
            }),
            Cmd::Load(CmdLoad { name }) => {
                let path = self.config.lambda_filename(&name);
                Ok(match self.load_file(&path)? {
                    Some(m) => Reply::Value(m),
                    None => Reply::Nothing,
                })
            }
            Cmd::Gamma => Ok(Reply::Listing(self.gamma.to_string())),
            Cmd::Clear(CmdClear { label }) => {
                let Some(slot) = self.gamma.find_by_label(&label) else {
                    bail!("undeclared symbol: `{label}`");
                };
                self.gamma.clear(slot);
                log::debug!("cleared {label} at slot {slot}");
                Ok(Reply::Nothing)
            }
            Cmd::Reset => {
                self.gamma.reset();
                log::debug!("gamma reset");
                Ok(Reply::Nothing)
            }
            Cmd::Quit => Ok(Reply::Quit),
        }
    }

    pub fn run_line(&mut self, line: &str) -> anyhow::Result<Reply> {
        match Cmd::parse_line(line)? {
            Some(cmd) => self.run_cmd(cmd),
            None => Ok(Reply::Nothing),
        }
    }

    pub fn load_file(&mut self, path: &Path) -> anyhow::Result<Option<Term>> {
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        log::info!("loading {}", path.display());
        self.load_program(&input)
            .with_context(|| format!("in '{}'", path.display()))
    }

    /// Runs `input` line by line and returns the last value produced.
    pub fn load_program(&mut self, input: &str) -> anyhow::Result<Option<Term>> {
        let mut value = None;
        for (i, line) in input.lines().enumerate() {
            match self
                .run_line(line)
                .with_context(|| format!("line {}", i + 1))?
            {
                Reply::Value(m) => value = Some(m),
                Reply::Quit => break,
                Reply::Listing(_) | Reply::Nothing => {}
            }
        }
        Ok(value)
    }

    pub fn prettify(&self, m: &Term) -> String {
        Printer::new(&self.gamma)
            .with_layout(self.config.layout)
            .print(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tt::{mk_abs, mk_app, mk_empty, mk_identity};

    fn parse_error(err: &anyhow::Error) -> &ParseError {
        err.downcast_ref::<ParseError>()
            .unwrap_or_else(|| panic!("not a parse error: {err:?}"))
    }

    #[test]
    fn parse_lines() {
        assert_eq!(Cmd::parse_line("   ").unwrap(), None);
        assert_eq!(Cmd::parse_line("# a comment").unwrap(), None);
        assert_eq!(
            Cmd::parse_line("def id x := x # identity").unwrap(),
            Some(Cmd::Eval(CmdEval {
                source: "def id x := x".to_owned()
            }))
        );
        assert_eq!(
            Cmd::parse_line(":load prelude").unwrap(),
            Some(Cmd::Load(CmdLoad {
                name: "prelude".to_owned()
            }))
        );
        assert_eq!(Cmd::parse_line(":q").unwrap(), Some(Cmd::Quit));
        assert_eq!(Cmd::parse_line(":gamma").unwrap(), Some(Cmd::Gamma));
        assert_eq!(
            Cmd::parse_line(":frobnicate").unwrap_err().to_string(),
            "undefined directive: `:frobnicate`"
        );
        assert!(Cmd::parse_line(":load").is_err());
    }

    #[test]
    fn sym_declares_in_order() {
        let mut session = Session::default();
        let m = session.eval_str("sym x y z").unwrap().unwrap();
        assert_eq!(m, mk_var(2));
        assert_eq!(session.gamma.len(), 3);
        assert_eq!(session.gamma.find_by_label("y"), Some(1));

        let m = session.eval_str("sym y").unwrap().unwrap();
        assert_eq!(m, mk_var(1));
        assert_eq!(session.gamma.len(), 3);
    }

    #[test]
    fn sym_rejects_non_names() {
        let mut session = Session::default();
        let err = session.eval_str("sym a (b)").unwrap_err();
        let err = parse_error(&err);
        assert_eq!(err.kind, ErrorKind::InvalidSymDecl);
        assert_eq!(err.position, 2);
        // names before the bad token were already declared
        assert_eq!(session.gamma.len(), 1);

        let err = session.eval_str("sym").unwrap_err();
        assert_eq!(parse_error(&err).kind, ErrorKind::InvalidSymDecl);
    }

    #[test]
    fn chunks_share_gamma() {
        let mut session = Session::default();
        let m = session
            .eval_str("def id x := x; def k x y := x; (k id)")
            .unwrap()
            .unwrap();
        // the argument goes in unreduced, so the body keeps the free name `id`
        assert_eq!(m, mk_abs(mk_var(1)));
        assert_eq!(session.prettify(&m), "\\_.ID");
    }

    #[test]
    fn failing_chunk_keeps_earlier_effects() {
        let mut session = Session::default();
        let err = session
            .eval_str("def id x := x; \\x..x; def k x y := x")
            .unwrap_err();
        assert_eq!(parse_error(&err).kind, ErrorKind::UnexpectedToken);
        assert_eq!(session.gamma.get_by_label("id").unwrap().value, mk_identity());
        assert_eq!(session.gamma.find_by_label("k"), None);
    }

    #[test]
    fn empty_input_has_no_value() {
        let mut session = Session::default();
        assert_eq!(session.eval_str("").unwrap(), None);
        assert_eq!(session.eval_str(" ; ;").unwrap(), None);
    }

    #[test]
    fn strict_sessions_reject_unknown_names() {
        let mut session = Session::new(Config {
            auto_declare: false,
            ..Config::default()
        });
        let err = session.eval_str("(f x)").unwrap_err();
        assert_eq!(parse_error(&err).kind, ErrorKind::UndeclaredSymbol);
        let m = session.eval_str("sym f x; (f x)").unwrap().unwrap();
        assert_eq!(m, mk_app(mk_empty(), mk_empty()));
    }

    #[test]
    fn fuel_comes_from_config() {
        let mut session = Session::new(Config {
            fuel: Some(100),
            ..Config::default()
        });
        let err = session.eval_str("(\\x.(x x) \\x.(x x))").unwrap_err();
        assert_eq!(err.to_string(), "evaluation error");
        assert_eq!(
            err.root_cause().to_string(),
            "reduction did not finish within 100 beta steps"
        );
    }

    #[test]
    fn directives() {
        let mut session = Session::default();
        session.run_line("def id x := x").unwrap();
        assert_eq!(
            session.run_line(":gamma").unwrap(),
            Reply::Listing("0 id = F(N(0))\n".to_owned())
        );
        assert_eq!(session.run_line(":clear id").unwrap(), Reply::Nothing);
        assert_eq!(session.gamma.get(0).unwrap().value, mk_empty());
        assert!(session.run_line(":clear nope").is_err());
        session.run_line(":reset").unwrap();
        assert!(session.gamma.is_empty());
        assert_eq!(session.run_line(":quit").unwrap(), Reply::Quit);
    }

    #[test]
    fn programs_run_line_by_line() {
        let mut session = Session::default();
        let program = "# combinators\n\ndef id x := x\ndef k x y := x\n(k id id)\n";
        let m = session.load_program(program).unwrap();
        assert_eq!(m, Some(mk_identity()));

        let err = session.load_program("def a := id\n\\x.(x").unwrap_err();
        assert_eq!(err.to_string(), "line 2");
        assert_eq!(session.gamma.get_by_label("a").unwrap().value, mk_identity());
    }

    #[test]
    fn prettify_uses_layout() {
        let mut session = Session::default();
        let m = session.eval_str("\\x.\\y.(x y y)").unwrap().unwrap();
        assert_eq!(session.prettify(&m), "\\a.\\b.(a b b)");
        session.config.layout = crate::print::Layout::Indented;
        assert_eq!(session.prettify(&m), "\\a.\\b.(a\n  b\n  b)");
    }
}
