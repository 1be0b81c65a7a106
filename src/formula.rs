//! The propositional formula surface syntax (§6) and its AST.
//!
//! `Formula` itself is an opaque, validated string: everything in
//! `dataset`, `kernel`, `tree` and `search` moves `Formula` values around
//! without ever looking inside them. Only the Tseitin encoder (`tseitin.rs`)
//! parses a `Formula` into the [`Expr`] tree defined here, to hand the
//! external SAT solver a CNF encoding.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// An opaque propositional formula in the grammar of §6.
///
/// Equality and hashing are on the *normalised* text (all whitespace
/// stripped), so that `"A && B"` and `"A&&B"` are the same dataset
/// element, matching the "no duplicate elements" invariant of §3.
#[derive(Clone, Debug, Eq)]
pub struct Formula {
    raw: String,
    normalized: String,
}

impl Formula {
    /// Parses and validates `text` as a formula, returning the normalised
    /// form. Does not build an AST — that only happens when the Tseitin
    /// encoder needs one.
    pub fn parse(text: impl Into<String>) -> Result<Self, FormulaError> {
        let raw = text.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FormulaError::Empty);
        }
        // Validate by actually building the AST once; throw it away.
        let _ = Parser::new(trimmed)?.parse_formula()?;
        let normalized = normalize(trimmed);
        Ok(Formula { raw, normalized })
    }

    /// Builds a `Formula` without validation. Used internally for formulas
    /// the crate itself constructs (e.g. `!(alpha)`), which are
    /// syntactically valid by construction as long as `alpha` was.
    pub(crate) fn from_trusted(text: impl Into<String>) -> Self {
        let raw = text.into();
        let normalized = normalize(raw.trim());
        Formula { raw, normalized }
    }

    /// The formula's negation, `!(self)`.
    #[must_use]
    pub fn negate(&self) -> Formula {
        Formula::from_trusted(format!("!({})", self.raw.trim()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn ast(&self) -> Result<Expr, FormulaError> {
        Parser::new(&self.raw)?.parse_formula()
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl std::hash::Hash for Formula {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw.trim())
    }
}

fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("formula text is empty")]
    Empty,
    #[error("unexpected character {0:?} at byte offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of formula")]
    UnexpectedEof,
    #[error("expected ')' but found {0:?}")]
    ExpectedCloseParen(String),
    #[error("trailing input after a complete formula: {0:?}")]
    TrailingInput(String),
}

/// The parsed structure of a [`Formula`], used only by the Tseitin encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    True,
    False,
    Var(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Iff(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Atom(String),
    True,
    False,
    Not,
    And,
    Or,
    Implies,
    Iff,
    Xor,
    LParen,
    RParen,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?x)
            \s*(?:
                (?P<atom>[A-Za-z_][A-Za-z0-9_]*)
              | (?P<true>\+)
              | (?P<false>-)
              | (?P<not>!)
              | (?P<and>&&)
              | (?P<or>\|\|)
              | (?P<iff><=>)
              | (?P<implies>=>)
              | (?P<xor>\^\^)
              | (?P<lparen>\()
              | (?P<rparen>\))
            )
        ")
        .expect("static token regex is valid")
    })
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let re = token_regex();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let bytes = input.as_bytes();
    while pos < bytes.len() {
        // Skip whitespace manually so offsets reported in errors are exact.
        while pos < bytes.len() && (bytes[pos] as char).is_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        match re.captures(&input[pos..]) {
            Some(caps) if caps.get(0).unwrap().start() == 0 => {
                let whole = caps.get(0).unwrap();
                let consumed = whole.end();
                if let Some(m) = caps.name("atom") {
                    tokens.push(Token::Atom(m.as_str().to_string()));
                } else if caps.name("true").is_some() {
                    tokens.push(Token::True);
                } else if caps.name("false").is_some() {
                    tokens.push(Token::False);
                } else if caps.name("not").is_some() {
                    tokens.push(Token::Not);
                } else if caps.name("and").is_some() {
                    tokens.push(Token::And);
                } else if caps.name("or").is_some() {
                    tokens.push(Token::Or);
                } else if caps.name("iff").is_some() {
                    tokens.push(Token::Iff);
                } else if caps.name("implies").is_some() {
                    tokens.push(Token::Implies);
                } else if caps.name("xor").is_some() {
                    tokens.push(Token::Xor);
                } else if caps.name("lparen").is_some() {
                    tokens.push(Token::LParen);
                } else if caps.name("rparen").is_some() {
                    tokens.push(Token::RParen);
                }
                pos += consumed;
            }
            _ => {
                return Err(FormulaError::UnexpectedChar(
                    input[pos..].chars().next().unwrap(),
                    pos,
                ));
            }
        }
    }
    Ok(tokens)
}

/// Recursive-descent parser. Precedence, tightest first: `!`, `&&`, `||`,
/// `^^`, `=>` (right-associative), `<=>`.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, FormulaError> {
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn parse_formula(&mut self) -> Result<Expr, FormulaError> {
        let expr = self.parse_iff()?;
        if self.pos != self.tokens.len() {
            return Err(FormulaError::TrailingInput(format!(
                "{:?}",
                &self.tokens[self.pos..]
            )));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_iff(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_implies()?;
        while matches!(self.peek(), Some(Token::Iff)) {
            self.bump();
            let rhs = self.parse_implies()?;
            lhs = Expr::Iff(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_implies(&mut self) -> Result<Expr, FormulaError> {
        let lhs = self.parse_xor()?;
        if matches!(self.peek(), Some(Token::Implies)) {
            self.bump();
            // Right-associative: recurse into parse_implies again.
            let rhs = self.parse_implies()?;
            return Ok(Expr::Implies(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_or()?;
        while matches!(self.peek(), Some(Token::Xor)) {
            self.bump();
            let rhs = self.parse_or()?;
            lhs = Expr::Xor(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, FormulaError> {
        match self.bump() {
            Some(Token::Atom(name)) => Ok(Expr::Var(name)),
            Some(Token::True) => Ok(Expr::True),
            Some(Token::False) => Ok(Expr::False),
            Some(Token::LParen) => {
                let inner = self.parse_iff()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(FormulaError::ExpectedCloseParen(format!("{other:?}"))),
                    None => Err(FormulaError::UnexpectedEof),
                }
            }
            Some(other) => Err(FormulaError::ExpectedCloseParen(format!("{other:?}"))),
            None => Err(FormulaError::UnexpectedEof),
        }
    }
}
