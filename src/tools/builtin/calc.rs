use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::tools::builtin::str_param;
use crate::tools::registry::Tool;

/// Arithmetic evaluator over a fixed allow-list of functions and constants.
/// Anything outside the grammar (names, attributes, strings) is an error,
/// never executed.
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations. Usage: expression='math_expression'"
    }

    async fn execute(&self, params: &Map<String, Value>) -> String {
        let expression = str_param(params, "expression");
        match evaluate(&expression) {
            Ok(value) => format!("Result: {}", format_number(value)),
            Err(e) => format!("Error calculating '{expression}': {e}"),
        }
    }
}

pub fn evaluate(expression: &str) -> Result<f64, String> {
    if expression.trim().is_empty() {
        return Err("empty expression".to_string());
    }
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("unexpected trailing input".to_string());
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{text}'"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                value += self.term()?;
            } else if self.eat(&Token::Minus) {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                value *= self.unary()?;
            } else if self.eat(&Token::Slash) {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= rhs;
            } else if self.eat(&Token::Percent) {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err("modulo by zero".to_string());
                }
                value %= rhs;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, String> {
        if self.eat(&Token::Minus) {
            return Ok(-self.unary()?);
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.atom()?;
        if self.eat(&Token::DoubleStar) {
            // Right-associative; the exponent may itself be signed.
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, String> {
        match self.bump() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                if !self.eat(&Token::RParen) {
                    return Err("expected ')'".to_string());
                }
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args()?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(format!("unexpected token {token:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn args(&mut self) -> Result<Vec<f64>, String> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            return Err("expected ',' or ')' in argument list".to_string());
        }
    }
}

fn constant(name: &str) -> Result<f64, String> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(format!("name '{name}' is not defined")),
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, String> {
    match name {
        "abs" => {
            expect_args(name, args, 1)?;
            Ok(args[0].abs())
        }
        "round" => match args {
            [x] => Ok(x.round()),
            [x, digits] => {
                let factor = 10f64.powi(*digits as i32);
                Ok((x * factor).round() / factor)
            }
            _ => Err(format!("{name}() expects 1 or 2 arguments")),
        },
        "min" => fold_args(name, args, f64::min),
        "max" => fold_args(name, args, f64::max),
        "sum" => Ok(args.iter().sum()),
        "pow" => {
            expect_args(name, args, 2)?;
            Ok(args[0].powf(args[1]))
        }
        _ => Err(format!("unknown function '{name}'")),
    }
}

fn expect_args(name: &str, args: &[f64], count: usize) -> Result<(), String> {
    if args.len() == count {
        Ok(())
    } else {
        Err(format!("{name}() expects {count} argument(s)"))
    }
}

fn fold_args(name: &str, args: &[f64], f: fn(f64, f64) -> f64) -> Result<f64, String> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| format!("{name}() expects at least 1 argument"))?;
    Ok(rest.iter().fold(*first, |acc, x| f(acc, *x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(text: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("expression".to_string(), Value::String(text.to_string()));
        params
    }

    #[tokio::test]
    async fn simple_arithmetic() {
        assert_eq!(CalculatorTool.execute(&expr("2+2")).await, "Result: 4");
        assert_eq!(CalculatorTool.execute(&expr("2 * (3 + 4)")).await, "Result: 14");
        assert_eq!(CalculatorTool.execute(&expr("7 / 2")).await, "Result: 3.5");
        assert_eq!(CalculatorTool.execute(&expr("2 ** 10")).await, "Result: 1024");
        assert_eq!(CalculatorTool.execute(&expr("-2 ** 2")).await, "Result: -4");
    }

    #[tokio::test]
    async fn allow_listed_functions_and_constants() {
        assert_eq!(CalculatorTool.execute(&expr("abs(-3)")).await, "Result: 3");
        assert_eq!(CalculatorTool.execute(&expr("min(3, 1, 2)")).await, "Result: 1");
        assert_eq!(CalculatorTool.execute(&expr("max(3, 1, 2)")).await, "Result: 3");
        assert_eq!(CalculatorTool.execute(&expr("sum(1, 2, 3)")).await, "Result: 6");
        assert_eq!(CalculatorTool.execute(&expr("pow(2, 8)")).await, "Result: 256");
        assert_eq!(CalculatorTool.execute(&expr("round(pi, 2)")).await, "Result: 3.14");
        assert_eq!(CalculatorTool.execute(&expr("round(e)")).await, "Result: 3");
    }

    #[tokio::test]
    async fn arbitrary_code_is_rejected_as_text_error() {
        let out = CalculatorTool.execute(&expr("__import__('os')")).await;
        assert!(out.starts_with("Error calculating '__import__('os')':"), "{out}");

        let out = CalculatorTool.execute(&expr("open('/etc/passwd')")).await;
        assert!(out.starts_with("Error calculating"), "{out}");
    }

    #[tokio::test]
    async fn unknown_names_and_bad_syntax_are_errors() {
        let out = CalculatorTool.execute(&expr("foo + 1")).await;
        assert_eq!(out, "Error calculating 'foo + 1': name 'foo' is not defined");

        let out = CalculatorTool.execute(&expr("2 +")).await;
        assert!(out.starts_with("Error calculating '2 +':"), "{out}");

        let out = CalculatorTool.execute(&expr("1 / 0")).await;
        assert_eq!(out, "Error calculating '1 / 0': division by zero");

        let out = CalculatorTool.execute(&expr("")).await;
        assert_eq!(out, "Error calculating '': empty expression");
    }
}
