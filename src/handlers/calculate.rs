//! The `calculate` tool: a safe arithmetic evaluator.
//!
//! Accepts digits, `+ - * /`, parentheses, decimal points, and whitespace.
//! Anything else is rejected before parsing — the input is free-form text
//! chosen by a language model, so it must never reach an evaluator that
//! could do more than arithmetic.

/// Evaluate an arithmetic expression to its textual result.
pub fn evaluate(expression: &str) -> Result<String, String> {
    if let Some(c) = expression
        .chars()
        .find(|c| !matches!(c, '0'..='9' | '+' | '-' | '*' | '/' | '(' | ')' | '.') && !c.is_whitespace())
    {
        return Err(format!("invalid characters in expression: {c:?}"));
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("unexpected trailing input".to_string());
    }

    Ok(format_number(value))
}

/// Integral results render without a fractional part: `20`, not `20.0`.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n: f64 = literal
                    .parse()
                    .map_err(|_| format!("malformed number: {literal:?}"))?;
                tokens.push(Token::Number(n));
            }
            other => {
                // Unreachable after the whitelist check, but keep the parser
                // self-contained.
                return Err(format!("invalid characters in expression: {other:?}"));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    acc += self.term()?;
                }
                Token::Minus => {
                    self.next();
                    acc -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut acc = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    acc *= self.factor()?;
                }
                Token::Slash => {
                    self.next();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    acc /= divisor;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn factor(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("unbalanced parentheses".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token: {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(evaluate("10 + 5 * 2").unwrap(), "20");
    }

    #[test]
    fn simple_addition() {
        assert_eq!(evaluate("2 + 2").unwrap(), "4");
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(evaluate("(10 + 5) * 2").unwrap(), "30");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-3 + 5").unwrap(), "2");
        assert_eq!(evaluate("2 * -4").unwrap(), "-8");
    }

    #[test]
    fn fractional_results_keep_decimals() {
        assert_eq!(evaluate("7 / 2").unwrap(), "3.5");
        assert_eq!(evaluate("1.5 + 1.5").unwrap(), "3");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = evaluate("1 / 0").unwrap_err();
        assert!(err.contains("division by zero"), "got: {err}");
    }

    #[test]
    fn non_arithmetic_input_is_rejected_unevaluated() {
        let err = evaluate("DROP TABLE users").unwrap_err();
        assert!(err.contains("invalid characters"), "got: {err}");
    }

    #[test]
    fn empty_and_malformed_inputs() {
        assert!(evaluate("").is_err());
        assert!(evaluate("   ").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 +").is_err());
        assert!(evaluate("1..2").is_err());
    }
}
