//! Arithmetic Expressions
//!
//! Restricted evaluator for model-supplied math. Only numeric literals,
//! unary `+`/`-`, binary `+ - * /` and parentheses are understood; anything
//! else is rejected at tokenization.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '(' expr ')'
//! ```

use std::fmt;

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    Empty,
    UnexpectedChar { ch: char, pos: usize },
    InvalidNumber(String),
    UnexpectedToken { found: String, pos: usize },
    UnexpectedEnd,
    DivisionByZero,
    NotFinite,
    TooDeep,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcError::Empty => write!(f, "empty expression"),
            CalcError::UnexpectedChar { ch, pos } => {
                write!(f, "unexpected character '{}' at position {}", ch, pos)
            }
            CalcError::InvalidNumber(s) => write!(f, "invalid number '{}'", s),
            CalcError::UnexpectedToken { found, pos } => {
                write!(f, "unexpected '{}' at position {}", found, pos)
            }
            CalcError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            CalcError::DivisionByZero => write!(f, "division by zero"),
            CalcError::NotFinite => write!(f, "result is not a finite number"),
            CalcError::TooDeep => write!(f, "expression nested too deeply"),
        }
    }
}

impl std::error::Error for CalcError {}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self) -> Result<f64, CalcError> {
        let value = match self {
            Expr::Num(n) => *n,
            Expr::Neg(inner) => -inner.eval()?,
            Expr::Binary(op, lhs, rhs) => {
                let (l, r) = (lhs.eval()?, rhs.eval()?);
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div if r == 0.0 => return Err(CalcError::DivisionByZero),
                    BinOp::Div => l / r,
                }
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(CalcError::NotFinite)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Op(c) => write!(f, "{}", c),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' || c == '_' {
                        if c != '_' {
                            literal.push(c);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal.clone()))?;
                tokens.push((pos, Token::Num(n)));
            }
            '+' | '-' | '*' | '/' => {
                tokens.push((pos, Token::Op(ch)));
                chars.next();
            }
            '(' => {
                tokens.push((pos, Token::LParen));
                chars.next();
            }
            ')' => {
                tokens.push((pos, Token::RParen));
                chars.next();
            }
            _ => return Err(CalcError::UnexpectedChar { ch, pos }),
        }
    }

    Ok(tokens)
}

const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expr(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            let op = if op == '+' { BinOp::Add } else { BinOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            let op = if op == '*' { BinOp::Mul } else { BinOp::Div };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }

        let expr = match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Expr::Neg(Box::new(self.unary()?))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()?
            }
            _ => self.primary()?,
        };

        self.depth -= 1;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, CalcError> {
        match self.next() {
            Some((_, Token::Num(n))) => Ok(Expr::Num(n)),
            Some((_, Token::LParen)) => {
                let inner = self.expr()?;
                match self.next() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((pos, tok)) => Err(CalcError::UnexpectedToken {
                        found: tok.to_string(),
                        pos,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some((pos, tok)) => Err(CalcError::UnexpectedToken {
                found: tok.to_string(),
                pos,
            }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// Parse an expression into its tree
pub fn parse(input: &str) -> Result<Expr, CalcError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;

    if let Some((pos, tok)) = parser.next() {
        return Err(CalcError::UnexpectedToken {
            found: tok.to_string(),
            pos,
        });
    }

    Ok(expr)
}

/// Parse and evaluate
pub fn evaluate(input: &str) -> Result<f64, CalcError> {
    parse(input)?.eval()
}

/// Render a result the way a person would write it (`360`, not `360.0`)
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> f64 {
        evaluate(s).unwrap()
    }

    #[test]
    fn test_calculator() {
        assert_eq!(eval("2 + 2"), 4.0);
        assert_eq!(eval("10 * 5"), 50.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("15 * 24"), 360.0);
        assert_eq!(eval("15 * 24 + 100"), 460.0);
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("100 / 10 / 5"), 2.0);
        assert_eq!(eval("7 / 2"), 3.5);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(eval("-3 + 5"), 2.0);
        assert_eq!(eval("2 * -3"), -6.0);
        assert_eq!(eval("-(2 + 3)"), -5.0);
        assert_eq!(eval("--4"), 4.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("(1 + 2"), Err(CalcError::UnexpectedEnd));
        assert!(matches!(evaluate("1 + 2)"), Err(CalcError::UnexpectedToken { .. })));
        assert!(matches!(evaluate("2 ** 3"), Err(CalcError::UnexpectedToken { .. })));
        assert!(matches!(evaluate("1..2"), Err(CalcError::InvalidNumber(_))));
    }

    #[test]
    fn test_rejects_code() {
        assert!(matches!(
            evaluate("__import__('os').system('ls')"),
            Err(CalcError::UnexpectedChar { ch: '_', pos: 0 })
        ));
        assert!(matches!(
            evaluate("2 + x"),
            Err(CalcError::UnexpectedChar { ch: 'x', .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(evaluate(&deep), Err(CalcError::TooDeep));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(360.0), "360");
        assert_eq!(format_number(-6.0), "-6");
        assert_eq!(format_number(3.5), "3.5");
    }
}
