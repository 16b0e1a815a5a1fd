use easy_ext::ext;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Assign,     // ":="
    Semicolon,  // ";"
    LeftParen,  // "("
    RightParen, // ")"
    Dot,        // "."
    Lambda,     // "\"
    Def,
    Let,
    Letrec,
    In,
    Sym,
    Name, // e.g. "x", "select_first", "_"
}

impl TokenKind {
    fn keyword(text: &str) -> Option<TokenKind> {
        match text {
            "def" => Some(TokenKind::Def),
            "let" => Some(TokenKind::Let),
            "letrec" => Some(TokenKind::Letrec),
            "in" => Some(TokenKind::In),
            "sym" => Some(TokenKind::Sym),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// byte offset of the token in the tokenized text
    pub offset: usize,
}

impl Token {
    pub fn is_name(&self) -> bool {
        self.kind == TokenKind::Name
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[ext(TokensExt)]
pub impl [Token] {
    /// Joins the tokens with single spaces, wrapping the token at `position` in braces.
    /// A position past the end is rendered as a trailing `???`.
    fn render_marked(&self, position: usize) -> String {
        let mut view: Vec<String> = self
            .iter()
            .enumerate()
            .map(|(i, token)| {
                if i == position {
                    format!("{{{}}}", token.text)
                } else {
                    token.text.clone()
                }
            })
            .collect();
        if position >= self.len() {
            view.push("???".to_owned());
        }
        view.join(" ")
    }

    /// Splits the token stream at every `;`, dropping empty chunks.
    fn split_chunks(&self) -> Vec<&[Token]> {
        self.split(|token| token.kind == TokenKind::Semicolon)
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Position {position}: Illegal token\n{view}")]
pub struct LexError {
    /// index the offending token would have had in the stream
    pub position: usize,
    /// byte offset of the offending character
    pub offset: usize,
    pub view: String,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    enum Kind {
        Space,
        Assign,
        Semicolon,
        LeftParen,
        RightParen,
        Dot,
        Lambda,
        Keyword,
        Name,
        Error,
    }

    // order matters: keywords must win over names, and the catch-all comes last
    const TABLE: &[(Kind, &str)] = &[
        (Kind::Space, r"\s+"),
        (Kind::Assign, r":="),
        (Kind::Semicolon, r";"),
        (Kind::LeftParen, r"\("),
        (Kind::RightParen, r"\)"),
        (Kind::Dot, r"\."),
        (Kind::Lambda, r"\\"),
        (Kind::Keyword, r"(?:letrec|let|def|in|sym)\b"),
        (Kind::Name, r"[A-Za-z_]\w*"),
        (Kind::Error, r"(?s:.)"),
    ];

    static RE: Lazy<Regex> = Lazy::new(|| {
        let s = TABLE
            .iter()
            .map(|(kind, re)| format!("(?P<{:?}>{})", kind, re))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("^(?:{})", s)).unwrap()
    });

    let mut tokens: Vec<Token> = vec![];
    let mut position = 0;
    while position < input.len() {
        let cap = RE
            .captures(&input[position..])
            .expect("the catch-all pattern matches any character");
        let (kind, m) = TABLE
            .iter()
            .find_map(|(kind, _)| cap.name(&format!("{:?}", kind)).map(|m| (*kind, m)))
            .expect("exactly one group matches");
        let offset = position;
        position += m.end();
        let text = m.as_str();
        let kind = match kind {
            Kind::Space => continue,
            Kind::Error => {
                let mut view: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
                view.push(format!("{{{text}}}"));
                return Err(LexError {
                    position: tokens.len(),
                    offset,
                    view: view.join(" "),
                });
            }
            Kind::Assign => TokenKind::Assign,
            Kind::Semicolon => TokenKind::Semicolon,
            Kind::LeftParen => TokenKind::LeftParen,
            Kind::RightParen => TokenKind::RightParen,
            Kind::Dot => TokenKind::Dot,
            Kind::Lambda => TokenKind::Lambda,
            Kind::Keyword => TokenKind::keyword(text).expect("keyword pattern is in sync"),
            Kind::Name => TokenKind::Name,
        };
        tokens.push(Token {
            kind,
            text: text.to_owned(),
            offset,
        });
    }
    Ok(tokens)
}
