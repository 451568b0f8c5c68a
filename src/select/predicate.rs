//! Translation of pairtools-style select conditions into DuckDB SQL.
//!
//! A condition is tokenized, parsed into an [`Expr`] tree and rendered back
//! out as a SQL predicate. Quoted text is carried through the tree as data, so
//! a value such as `"a and b"` is never rewritten.
//!
//! ## Vocabulary
//!
//! | Condition | SQL |
//! |-----------|-----|
//! | `and`, `or`, `not` | `AND`, `OR`, `NOT` |
//! | `==`, `!=` | `=`, `<>` |
//! | `x in ["a", "b"]` | `x IN ('a', 'b')` |
//! | `regex_match(c, "p")` | `c ~ 'p'` |
//! | `wildcard_match(c, "p*")` | `c LIKE 'p%'` |
//! | `csv_match(c, "a,b")` | `c IN ('a','b')` |
//! | `region_match(c, p, "chr1", s, e)` | `(c = 'chr1' AND p BETWEEN s AND e)` |
//! | `region_match(c, p, "chr1", s)` | `(c = 'chr1' AND p >= s)` |
//!
//! ## Example
//!
//! ```rust
//! use pairs_to_parquet::select::predicate::translate;
//!
//! let sql = translate(r#"(pair_type == "UU") and region_match(chrom1, pos1, "chr1", 0, 50)"#).unwrap();
//! assert_eq!(sql, "(pair_type = 'UU') AND (chrom1 = 'chr1' AND pos1 BETWEEN 0 AND 50)");
//! ```

use std::fmt;

use thiserror::Error;

use crate::utils::validation::{is_identifier, sql_quote};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("Unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error("Unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("{name}() takes {expected} arguments, got {found} (offset {offset})")]
    WrongArity {
        name: &'static str,
        expected: &'static str,
        found: usize,
        offset: usize,
    },

    #[error("Invalid argument {index} to {name}() at offset {offset}: {reason}")]
    BadArgument {
        name: &'static str,
        index: usize,
        reason: &'static str,
        offset: usize,
    },

    #[error("Empty condition")]
    Empty,
}

/// Translate a condition into a SQL predicate.
///
/// # Errors
///
/// Returns a `PredicateError` carrying the byte offset of the offending input.
pub fn translate(condition: &str) -> Result<String, PredicateError> {
    Ok(parse(condition)?.to_string())
}

/// Parse a condition into an expression tree.
///
/// # Errors
///
/// Returns a `PredicateError` if the condition is outside the grammar.
pub fn parse(condition: &str) -> Result<Expr, PredicateError> {
    let tokens = tokenize(condition)?;
    if tokens.len() == 1 {
        return Err(PredicateError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or()?;
    parser.expect_end()?;
    Ok(expr)
}

// ============================================================================
// Expression tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    fn sql(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(String),
    Str(String),
    Bool(bool),
    Column(String),
    /// Explicit parentheses in the condition
    Group(Box<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },
    Abs(Box<Expr>),
    RegexMatch {
        column: String,
        pattern: String,
    },
    WildcardMatch {
        column: String,
        pattern: String,
    },
    CsvMatch {
        column: String,
        values: Vec<String>,
    },
    RegionMatch {
        chrom_column: String,
        pos_column: String,
        chrom: String,
        start: Box<Expr>,
        end: Option<Box<Expr>>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{}", sql_quote(s)),
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Column(c) => write!(f, "{c}"),
            Self::Group(inner) => write!(f, "({inner})"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            // `--` would open a SQL comment
            Self::Neg(inner) => match inner.as_ref() {
                Self::Number(_) | Self::Column(_) | Self::Group(_) => write!(f, "-{inner}"),
                _ => write!(f, "-({inner})"),
            },
            Self::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.sql()),
            Self::In {
                expr,
                values,
                negated,
            } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                write!(f, "{expr} {keyword} ({})", values.join(", "))
            }
            Self::Abs(inner) => write!(f, "abs({inner})"),
            Self::RegexMatch { column, pattern } => write!(f, "{column} ~ {}", sql_quote(pattern)),
            Self::WildcardMatch { column, pattern } => {
                let (like, escaped) = wildcard_to_like(pattern);
                if escaped {
                    write!(f, "{column} LIKE {} ESCAPE '\\'", sql_quote(&like))
                } else {
                    write!(f, "{column} LIKE {}", sql_quote(&like))
                }
            }
            Self::CsvMatch { column, values } => {
                let values: Vec<String> = values.iter().map(|v| sql_quote(v)).collect();
                write!(f, "{column} IN ({})", values.join(","))
            }
            Self::RegionMatch {
                chrom_column,
                pos_column,
                chrom,
                start,
                end,
            } => match end {
                Some(end) => write!(
                    f,
                    "({chrom_column} = {} AND {pos_column} BETWEEN {start} AND {end})",
                    sql_quote(chrom)
                ),
                None => write!(
                    f,
                    "({chrom_column} = {} AND {pos_column} >= {start})",
                    sql_quote(chrom)
                ),
            },
        }
    }
}

/// Convert a glob pattern to a LIKE pattern.
///
/// Returns the pattern and whether a literal `%`, `_` or `\` had to be escaped.
fn wildcard_to_like(pattern: &str) -> (String, bool) {
    let mut like = String::with_capacity(pattern.len());
    let mut escaped = false;
    for c in pattern.chars() {
        match c {
            '*' => like.push('%'),
            '?' => like.push('_'),
            '%' | '_' | '\\' => {
                like.push('\\');
                like.push(c);
                escaped = true;
            }
            _ => like.push(c),
        }
    }
    (like, escaped)
}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(String),
    Str(String),
    Ident(String),
    Punct(&'static str),
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Str(s) => write!(f, "string \"{s}\""),
            Self::Ident(i) => write!(f, "'{i}'"),
            Self::Punct(p) => write!(f, "'{p}'"),
            Self::End => write!(f, "end of condition"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

const PUNCTUATION: &[&str] = &[
    "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "(", ")", "[", "]", ",",
];

fn tokenize(input: &str) -> Result<Vec<Token>, PredicateError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c == b'"' || c == b'\'' {
            let start = i;
            let mut value = Vec::new();
            i += 1;
            loop {
                match bytes.get(i) {
                    None => return Err(PredicateError::UnterminatedString(start)),
                    Some(&b) if b == c => break,
                    Some(&b'\\') if matches!(bytes.get(i + 1), Some(&n) if n == c || n == b'\\') => {
                        value.push(bytes[i + 1]);
                        i += 2;
                    }
                    Some(&b) => {
                        value.push(b);
                        i += 1;
                    }
                }
            }
            i += 1;
            // Input is a str and quotes are ASCII, so the slice is valid UTF-8
            let value = String::from_utf8_lossy(&value).into_owned();
            tokens.push(Token {
                kind: TokenKind::Str(value),
                offset: start,
            });
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            let text = &input[start..i];
            if text.matches('.').count() > 1 {
                return Err(PredicateError::UnexpectedChar { ch: '.', offset: start });
            }
            tokens.push(Token {
                kind: TokenKind::Number(text.to_string()),
                offset: start,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(input[start..i].to_string()),
                offset: start,
            });
            continue;
        }

        let rest = &input[i..];
        if let Some(p) = PUNCTUATION.iter().find(|p| rest.starts_with(**p)) {
            tokens.push(Token {
                kind: TokenKind::Punct(*p),
                offset: i,
            });
            i += p.len();
            continue;
        }

        let ch = rest.chars().next().unwrap_or('\0');
        return Err(PredicateError::UnexpectedChar { ch, offset: i });
    }

    tokens.push(Token {
        kind: TokenKind::End,
        offset: input.len(),
    });
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// A parsed call argument with its position
struct Arg {
    expr: Expr,
    offset: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The End token is never consumed
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::End {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(i) if i == keyword)
    }

    fn at_punct(&self, punct: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Punct(p) if *p == punct)
    }

    fn unexpected(&self, expected: &'static str) -> PredicateError {
        let token = self.peek();
        PredicateError::UnexpectedToken {
            found: token.kind.to_string(),
            expected,
            offset: token.offset,
        }
    }

    fn expect_punct(&mut self, punct: &'static str) -> Result<(), PredicateError> {
        if self.at_punct(punct) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(punct))
        }
    }

    fn expect_end(&self) -> Result<(), PredicateError> {
        if self.peek().kind == TokenKind::End {
            Ok(())
        } else {
            Err(self.unexpected("end of condition"))
        }
    }

    fn or(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.and()?;
        while self.at_keyword("or") {
            self.advance();
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.not()?;
        while self.at_keyword("and") {
            self.advance();
            let rhs = self.not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, PredicateError> {
        if self.at_keyword("not") {
            self.advance();
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, PredicateError> {
        let lhs = self.sum()?;

        let op = match &self.peek().kind {
            TokenKind::Punct("==") => Some(BinaryOp::Eq),
            TokenKind::Punct("!=") => Some(BinaryOp::Ne),
            TokenKind::Punct("<") => Some(BinaryOp::Lt),
            TokenKind::Punct("<=") => Some(BinaryOp::Le),
            TokenKind::Punct(">") => Some(BinaryOp::Gt),
            TokenKind::Punct(">=") => Some(BinaryOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.sum()?;
            return Ok(binary(op, lhs, rhs));
        }

        let negated = self.at_keyword("not");
        if negated {
            self.advance();
            if !self.at_keyword("in") {
                return Err(self.unexpected("'in'"));
            }
        }
        if self.at_keyword("in") {
            self.advance();
            let values = self.list()?;
            return Ok(Expr::In {
                expr: Box::new(lhs),
                values,
                negated,
            });
        }

        Ok(lhs)
    }

    fn list(&mut self) -> Result<Vec<Expr>, PredicateError> {
        let close = if self.at_punct("(") {
            ")"
        } else if self.at_punct("[") {
            "]"
        } else {
            return Err(self.unexpected("'(' or '['"));
        };
        self.advance();

        let mut values = Vec::new();
        while !self.at_punct(close) {
            values.push(self.sum()?);
            if !self.at_punct(close) {
                self.expect_punct(",")?;
            }
        }
        self.advance();

        if values.is_empty() {
            return Err(self.unexpected("a non-empty list"));
        }
        Ok(values)
    }

    fn sum(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.product()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Punct("+") => BinaryOp::Add,
                TokenKind::Punct("-") => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.product()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn product(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Punct("*") => BinaryOp::Mul,
                TokenKind::Punct("/") => BinaryOp::Div,
                TokenKind::Punct("%") => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, PredicateError> {
        if self.at_punct("-") {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, PredicateError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.or()?;
                self.expect_punct(")")?;
                Ok(Expr::Group(Box::new(inner)))
            }
            TokenKind::Ident(ident) => match ident.as_str() {
                "True" => {
                    self.advance();
                    Ok(Expr::Bool(true))
                }
                "False" => {
                    self.advance();
                    Ok(Expr::Bool(false))
                }
                "and" | "or" | "not" | "in" => Err(self.unexpected("a value")),
                _ => {
                    self.advance();
                    if self.at_punct("(") {
                        self.call(ident, token.offset)
                    } else {
                        Ok(Expr::Column(ident))
                    }
                }
            },
            _ => Err(self.unexpected("a value")),
        }
    }

    fn call(&mut self, name: String, offset: usize) -> Result<Expr, PredicateError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.at_punct(")") {
            let arg_offset = self.peek().offset;
            args.push(Arg {
                expr: self.or()?,
                offset: arg_offset,
            });
            if !self.at_punct(")") {
                self.expect_punct(",")?;
            }
        }
        self.advance();

        build_call(&name, args, offset)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn check_arity(
    name: &'static str,
    args: &[Arg],
    allowed: &[usize],
    expected: &'static str,
    offset: usize,
) -> Result<(), PredicateError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        Err(PredicateError::WrongArity {
            name,
            expected,
            found: args.len(),
            offset,
        })
    }
}

fn column_arg(name: &'static str, index: usize, arg: Arg) -> Result<String, PredicateError> {
    match arg.expr {
        Expr::Column(c) if is_identifier(&c) => Ok(c),
        _ => Err(PredicateError::BadArgument {
            name,
            index,
            reason: "expected a column name",
            offset: arg.offset,
        }),
    }
}

fn string_arg(name: &'static str, index: usize, arg: Arg) -> Result<String, PredicateError> {
    match arg.expr {
        Expr::Str(s) => Ok(s),
        _ => Err(PredicateError::BadArgument {
            name,
            index,
            reason: "expected a quoted string",
            offset: arg.offset,
        }),
    }
}

fn build_call(name: &str, args: Vec<Arg>, offset: usize) -> Result<Expr, PredicateError> {
    match name {
        "abs" => {
            check_arity("abs", &args, &[1], "1", offset)?;
            let mut args = args.into_iter();
            let inner = args.next().map(|a| a.expr).ok_or(PredicateError::Empty)?;
            Ok(Expr::Abs(Box::new(inner)))
        }
        "regex_match" | "wildcard_match" | "csv_match" => {
            let name: &'static str = match name {
                "regex_match" => "regex_match",
                "wildcard_match" => "wildcard_match",
                _ => "csv_match",
            };
            check_arity(name, &args, &[2], "2", offset)?;
            let mut args = args.into_iter();
            let (Some(column), Some(pattern)) = (args.next(), args.next()) else {
                return Err(PredicateError::Empty);
            };
            let column = column_arg(name, 1, column)?;
            let pattern = string_arg(name, 2, pattern)?;

            Ok(match name {
                "regex_match" => Expr::RegexMatch { column, pattern },
                "wildcard_match" => Expr::WildcardMatch { column, pattern },
                _ => Expr::CsvMatch {
                    column,
                    values: pattern.split(',').map(|v| v.trim().to_string()).collect(),
                },
            })
        }
        "region_match" => {
            check_arity("region_match", &args, &[4, 5], "4 or 5", offset)?;
            let mut args = args.into_iter();
            let (Some(chrom_column), Some(pos_column), Some(chrom), Some(start)) =
                (args.next(), args.next(), args.next(), args.next())
            else {
                return Err(PredicateError::Empty);
            };

            Ok(Expr::RegionMatch {
                chrom_column: column_arg("region_match", 1, chrom_column)?,
                pos_column: column_arg("region_match", 2, pos_column)?,
                chrom: string_arg("region_match", 3, chrom)?,
                start: Box::new(start.expr),
                end: args.next().map(|a| Box::new(a.expr)),
            })
        }
        _ => Err(PredicateError::UnknownFunction {
            name: name.to_string(),
            offset,
        }),
    }
}
