use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::pow::Pow as _;

use crate::error::{Result, TensorError};
use crate::symbolic::expr::{Expr, Func};

/// Parses a raw user string into an expression tree.
///
/// Accepts the grammar the presentation layer exposes: `+ - * /`, powers as
/// `^` or `**`, parentheses, decimal and integer literals (kept exact), and
/// the elementary functions of [`Func`].
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(TensorError::Parse(format!(
            "unexpected trailing token {token:?} in `{input}`"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(BigRational),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Number(decimal_to_rational(&num_str)?));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            match c {
                '+' => tokens.push(Token::Plus),
                '-' => tokens.push(Token::Minus),
                '*' => {
                    chars.next();
                    // `**` is the power operator in the input syntax.
                    if chars.peek() == Some(&'*') {
                        chars.next();
                        tokens.push(Token::Caret);
                    } else {
                        tokens.push(Token::Star);
                    }
                    continue;
                }
                '/' => tokens.push(Token::Slash),
                '^' => tokens.push(Token::Caret),
                '(' => tokens.push(Token::LParen),
                ')' => tokens.push(Token::RParen),
                other => {
                    return Err(TensorError::Parse(format!(
                        "unexpected character `{other}` in `{input}`"
                    )))
                }
            }
            chars.next();
        }
    }
    Ok(tokens)
}

/// Converts a decimal literal to an exact rational, e.g. `0.25` -> `1/4`.
fn decimal_to_rational(literal: &str) -> Result<BigRational> {
    let mut parts = literal.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next();
    if whole.is_empty() && frac.map_or(true, str::is_empty) {
        return Err(TensorError::Parse(format!("malformed number `{literal}`")));
    }
    let mut digits = String::from(whole);
    let scale = match frac {
        Some(frac) => {
            digits.push_str(frac);
            frac.len()
        }
        None => 0,
    };
    let numer: BigInt = digits
        .parse()
        .map_err(|_| TensorError::Parse(format!("malformed number `{literal}`")))?;
    let denom = BigInt::from(10u32).pow(scale);
    Ok(BigRational::new(numer, denom))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.consume();
                    let right = self.parse_factor()?;
                    left = left + right;
                }
                Token::Minus => {
                    self.consume();
                    let right = self.parse_factor()?;
                    left = left - right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.consume();
                    let right = self.parse_unary()?;
                    left = left * right;
                }
                Token::Slash => {
                    self.consume();
                    let right = self.parse_unary()?;
                    left = left / right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // Power binds tighter than unary minus: `-r^2` is `-(r^2)`, never
    // `(-r)^2`.
    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let expr = self.parse_unary()?;
            return Ok(-expr);
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            // Right-associative (`x^a^b` is `x^(a^b)`), and the exponent
            // re-enters at unary so `x^-2` keeps its sign.
            let exponent = self.parse_unary()?;
            return Ok(base.pow(exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Num(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.consume();
                    let arg = self.parse_expression()?;
                    match self.consume() {
                        Some(Token::RParen) => {}
                        _ => return Err(TensorError::Parse("expected `)`".into())),
                    }
                    match Func::from_name(&name) {
                        Some(func) => Ok(Expr::Func(func, arg.boxed())),
                        None => Err(TensorError::Parse(format!("unknown function `{name}`"))),
                    }
                } else {
                    Ok(Expr::Sym(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(TensorError::Parse("expected `)`".into())),
                }
            }
            other => Err(TensorError::Parse(format!(
                "unexpected token {other:?}; expected a number, symbol, or `(`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::simplify::simplify;

    #[test]
    fn parses_precedence_and_powers() {
        let expr = parse("r^2 + 2*r").unwrap();
        let expected = Expr::sym("r").pow(Expr::int(2)) + Expr::int(2) * Expr::sym("r");
        assert_eq!(simplify(&expr), simplify(&expected));
    }

    #[test]
    fn double_star_is_power() {
        assert_eq!(
            simplify(&parse("r**2*sin(theta)**2").unwrap()),
            simplify(
                &(Expr::sym("r").pow(Expr::int(2)) * Expr::sym("theta").sin().pow(Expr::int(2)))
            )
        );
    }

    #[test]
    fn decimals_stay_exact() {
        assert_eq!(parse("0.25").unwrap(), Expr::rational(25, 100));
    }

    #[test]
    fn power_binds_tighter_than_unary_minus() {
        // A g_tt entry like `-r**2` must stay negative.
        assert_eq!(
            simplify(&parse("-r**2").unwrap()),
            simplify(&-(Expr::sym("r").pow(Expr::int(2))))
        );
        assert_eq!(
            simplify(&parse("r**-2").unwrap()),
            simplify(&Expr::sym("r").pow(Expr::int(-2)))
        );
        // An explicitly parenthesized base keeps the old meaning.
        assert_eq!(
            simplify(&parse("(-r)**2").unwrap()),
            simplify(&Expr::sym("r").pow(Expr::int(2)))
        );
    }

    #[test]
    fn unary_minus_and_nesting() {
        let expr = parse("-(x + y)/2").unwrap();
        let expected = -(Expr::sym("x") + Expr::sym("y")) / Expr::int(2);
        assert_eq!(simplify(&expr), simplify(&expected));
    }

    #[test]
    fn rejects_unknown_function_and_garbage() {
        assert!(matches!(parse("foo(x)"), Err(TensorError::Parse(_))));
        assert!(matches!(parse("x $ y"), Err(TensorError::Parse(_))));
        assert!(matches!(parse("x +"), Err(TensorError::Parse(_))));
        assert!(matches!(parse("x y"), Err(TensorError::Parse(_))));
    }
}
