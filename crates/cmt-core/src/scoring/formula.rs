//! Score formulas
//!
//! A small arithmetic language over a fixed set of upper-case variables:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | VARIABLE | FUNC '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! Functions are `min`, `max` and `round(x[, digits])`. Identifiers are
//! case-insensitive and checked when parsing, so a stored formula either
//! evaluates or was rejected on save.

use std::fmt;

use crate::error::DomainError;

/// Every name a formula may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Members,
    Alumni,
    Guests,
    Stem,
    Hours,
    Miles,
    /// Members present divided by the chapter's active count
    Attendance,
    Base,
    AttendanceMultiplier,
    MemberAdd,
    StemAdd,
    AlumniAdd,
    GuestAdd,
}

impl Variable {
    pub const ALL: [Variable; 13] = [
        Self::Members,
        Self::Alumni,
        Self::Guests,
        Self::Stem,
        Self::Hours,
        Self::Miles,
        Self::Attendance,
        Self::Base,
        Self::AttendanceMultiplier,
        Self::MemberAdd,
        Self::StemAdd,
        Self::AlumniAdd,
        Self::GuestAdd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Members => "MEMBERS",
            Self::Alumni => "ALUMNI",
            Self::Guests => "GUESTS",
            Self::Stem => "STEM",
            Self::Hours => "HOURS",
            Self::Miles => "MILES",
            Self::Attendance => "ATTENDANCE",
            Self::Base => "BASE",
            Self::AttendanceMultiplier => "ATTENDANCE_MULTIPLIER",
            Self::MemberAdd => "MEMBER_ADD",
            Self::StemAdd => "STEM_ADD",
            Self::AlumniAdd => "ALUMNI_ADD",
            Self::GuestAdd => "GUEST_ADD",
        }
    }

    fn lookup(ident: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(ident))
    }
}

/// Values bound to each [`Variable`] for one evaluation
pub trait Bindings {
    fn value(&self, var: Variable) -> f64;
}

impl<F: Fn(Variable) -> f64> Bindings for F {
    fn value(&self, var: Variable) -> f64 {
        self(var)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Min,
    Max,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Var(Variable),
    Neg(Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    Call(Func, Vec<Expr>),
}

/// Parsed formula, ready to evaluate many times
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    /// The formula applied when a score type leaves it blank
    pub const DEFAULT: &'static str = "BASE + ATTENDANCE_MULTIPLIER * ATTENDANCE \
        + MEMBER_ADD * MEMBERS + STEM_ADD * STEM + ALUMNI_ADD * ALUMNI + GUEST_ADD * GUESTS";

    /// Parse `source`, substituting [`Formula::DEFAULT`] for blank input
    pub fn parse(source: &str) -> Result<Self, DomainError> {
        let source = if source.trim().is_empty() {
            Self::DEFAULT
        } else {
            source
        };
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.expr()?;
        if let Some((position, token)) = parser.tokens.get(parser.pos) {
            return Err(syntax(*position, format!("unexpected {token}")));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, bindings: &impl Bindings) -> Result<f64, DomainError> {
        let value = eval(&self.root, bindings)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DomainError::FormulaEvaluation(format!(
                "{} produced a non-finite value",
                self.source
            )))
        }
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Ident(s) => write!(f, "identifier {s}"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Star => f.write_str("'*'"),
            Self::Slash => f.write_str("'/'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
        }
    }
}

fn syntax(position: usize, message: impl Into<String>) -> DomainError {
    DomainError::FormulaSyntax {
        position,
        message: message.into(),
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, DomainError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = pos;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &source[pos..end];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| syntax(pos, format!("bad number {text:?}")))?;
                tokens.push((pos, Token::Number(value)));
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((pos, Token::Ident(source[pos..end].to_string())));
                continue;
            }
            other => return Err(syntax(pos, format!("unexpected character {other:?}"))),
        };
        tokens.push((pos, token));
        chars.next();
    }
    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |(p, _)| *p)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, wanted: &Token) -> Result<(), DomainError> {
        let at = self.offset();
        match self.bump() {
            Some(ref t) if t == wanted => Ok(()),
            Some(t) => Err(syntax(at, format!("expected {wanted}, found {t}"))),
            None => Err(syntax(at, format!("expected {wanted}, found end of formula"))),
        }
    }

    fn expr(&mut self) -> Result<Expr, DomainError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, DomainError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, DomainError> {
        if self.peek() == Some(&Token::Minus) {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, DomainError> {
        let at = self.offset();
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.call(at, &name)
                } else {
                    Variable::lookup(&name)
                        .map(Expr::Var)
                        .ok_or(DomainError::UnknownFormulaVariable(name))
                }
            }
            Some(t) => Err(syntax(at, format!("unexpected {t}"))),
            None => Err(syntax(at, "unexpected end of formula")),
        }
    }

    fn call(&mut self, at: usize, name: &str) -> Result<Expr, DomainError> {
        let func = match name.to_ascii_lowercase().as_str() {
            "min" => Func::Min,
            "max" => Func::Max,
            "round" => Func::Round,
            _ => return Err(syntax(at, format!("unknown function {name}"))),
        };
        self.expect(&Token::LParen)?;
        let mut args = vec![self.expr()?];
        while self.peek() == Some(&Token::Comma) {
            self.bump();
            args.push(self.expr()?);
        }
        self.expect(&Token::RParen)?;

        let arity_ok = match func {
            Func::Min | Func::Max => !args.is_empty(),
            Func::Round => args.len() <= 2,
        };
        if !arity_ok {
            return Err(syntax(at, format!("wrong number of arguments to {name}")));
        }
        Ok(Expr::Call(func, args))
    }
}

// =============================================================================
// Evaluation
// =============================================================================

fn eval(expr: &Expr, bindings: &impl Bindings) -> Result<f64, DomainError> {
    Ok(match expr {
        Expr::Number(n) => *n,
        Expr::Var(v) => bindings.value(*v),
        Expr::Neg(inner) => -eval(inner, bindings)?,
        Expr::Binary(lhs, op, rhs) => {
            let l = eval(lhs, bindings)?;
            let r = eval(rhs, bindings)?;
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div if r == 0.0 => {
                    return Err(DomainError::FormulaEvaluation("division by zero".into()))
                }
                BinOp::Div => l / r,
            }
        }
        Expr::Call(func, args) => {
            let values = args
                .iter()
                .map(|a| eval(a, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            match func {
                Func::Min => values.into_iter().fold(f64::INFINITY, f64::min),
                Func::Max => values.into_iter().fold(f64::NEG_INFINITY, f64::max),
                Func::Round => round_to(values[0], values.get(1).copied().unwrap_or(0.0) as i32),
            }
        }
    })
}

/// Round half away from zero to `digits` decimal places
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
