//! calculator tool: arithmetic over `+ - * / % ^` and parentheses.
//!
//! Parsed with a small recursive-descent evaluator; nothing is executed.
//! `$` signs and thousands separators in numbers are ignored, so the LLM can
//! pass amounts as they appear in documents.

use async_trait::async_trait;
use serde_json::json;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::logger::{log_shared, SharedToolLogger};
use crate::tools::Tool;

pub const TOOL_CALCULATOR: &str = "calculator";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unbalanced parentheses")]
    Unbalanced,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Nesting allowed for parentheses, unary signs and exponents combined.
pub const MAX_DEPTH: usize = 256;

/// Evaluates `expr`.
///
/// Grammar, lowest precedence first; `^` is right-associative and binds
/// tighter than unary minus (`-2^2 == -4`):
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := unary (('*' | '/' | '%') unary)*
/// unary  := ('+' | '-') unary | power
/// power  := atom ('^' unary)?
/// atom   := number | '(' expr ')'
/// ```
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut parser = Parser {
        chars,
        pos: 0,
        depth: 0,
    };
    parser.skip_ws();
    if parser.peek().is_none() {
        return Err(CalcError::Empty);
    }
    let value = parser.expr()?;
    parser.skip_ws();
    match parser.peek() {
        None => {}
        Some(')') => return Err(CalcError::Unbalanced),
        Some(c) => return Err(CalcError::UnexpectedChar(c, parser.pos)),
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    /// Active `unary` frames. Every recursive path passes through `unary`.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                value /= rhs;
            } else if self.eat('%') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                // Sign follows the divisor, as in floor modulo.
                value = value - rhs * (value / rhs).floor();
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let value = if self.eat('-') {
            self.unary().map(|v| -v)
        } else if self.eat('+') {
            self.unary()
        } else {
            self.power()
        };
        self.depth -= 1;
        value
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.eat('^') {
            let exp = self.unary()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        self.skip_ws();
        match self.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(')') {
                    Ok(value)
                } else {
                    Err(CalcError::Unbalanced)
                }
            }
            Some(c) if c == '$' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) => Err(CalcError::UnexpectedChar(c, self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        if self.peek() == Some('$') {
            self.pos += 1;
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == ',')
        {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let cleaned = raw.replace(',', "");
        if cleaned.is_empty() {
            return match self.peek() {
                Some(c) => Err(CalcError::UnexpectedChar(c, self.pos)),
                None => Err(CalcError::UnexpectedEnd),
            };
        }
        cleaned
            .parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(raw))
    }
}

/// Evaluates arithmetic expressions for the calculation agent.
pub struct CalculatorTool {
    logger: SharedToolLogger,
}

impl CalculatorTool {
    pub fn new(logger: SharedToolLogger) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        TOOL_CALCULATOR
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_CALCULATOR.to_string(),
            description: Some(
                "Evaluate a mathematical expression. Supports + - * / % ^ and parentheses; \
                 numbers may include $ and thousands separators (e.g. \"$22,000 + $69,300\")."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The expression to evaluate."
                    }
                },
                "required": ["expression"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let expression = args
            .get("expression")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing expression".to_string()))?;

        let text = match evaluate(expression) {
            Ok(value) => format!("The result of {} is {}", expression, value),
            Err(e) => {
                tracing::debug!(expression, error = %e, "calculator rejected expression");
                format!("Error calculating {}: {}", expression, e)
            }
        };
        log_shared(
            &self.logger,
            TOOL_CALCULATOR,
            json!({ "expression": expression }),
            text.clone(),
        )
        .await;
        Ok(ToolCallContent::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolLogger;

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("7 % 3").unwrap(), 1.0);
        assert_eq!(evaluate("-7 % 3").unwrap(), 2.0);
        assert_eq!(evaluate("+-3").unwrap(), -3.0);
    }

    /// **Scenario**: Amounts copied from documents evaluate as plain numbers.
    #[test]
    fn dollar_amounts_with_commas() {
        assert_eq!(
            evaluate("$22,000 + $69,300 + $214,500").unwrap(),
            305800.0
        );
        assert_eq!(evaluate("$1,200.50 * 2").unwrap(), 2401.0);
    }

    #[test]
    fn errors() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 % 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("(1 + 2"), Err(CalcError::Unbalanced));
        assert_eq!(evaluate("1 + 2)"), Err(CalcError::Unbalanced));
        assert_eq!(evaluate("2 +"), Err(CalcError::UnexpectedEnd));
        assert!(matches!(
            evaluate("__import__('os')"),
            Err(CalcError::UnexpectedChar('_', 0))
        ));
        assert!(matches!(evaluate("1.2.3"), Err(CalcError::InvalidNumber(_))));
        assert_eq!(evaluate("10 ^ 400"), Err(CalcError::NotFinite));
    }

    /// **Scenario**: Deep nesting is rejected before it can exhaust the stack.
    #[test]
    fn deep_nesting_is_an_error() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&parens), Err(CalcError::TooDeep(MAX_DEPTH)));

        let signs = format!("{}1", "-".repeat(10_000));
        assert_eq!(evaluate(&signs), Err(CalcError::TooDeep(MAX_DEPTH)));

        let powers = vec!["2"; 5_000].join("^");
        assert_eq!(evaluate(&powers), Err(CalcError::TooDeep(MAX_DEPTH)));

        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&nested).unwrap(), 1.0);
    }

    /// **Scenario**: The limit surfaces as tool text, not a crash.
    #[tokio::test]
    async fn deep_nesting_comes_back_as_tool_text() {
        let dir = tempfile::tempdir().unwrap();
        let tool = CalculatorTool::new(ToolLogger::shared(dir.path(), None));
        let expr = format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000));
        let out = tool.call(json!({ "expression": expr }), None).await.unwrap();
        assert!(out.text.starts_with("Error calculating ("));
        assert!(out.text.ends_with("nested deeper than 256 levels"));
    }

    /// **Scenario**: The tool returns result or error text, logs the call, and rejects a missing argument.
    #[tokio::test]
    async fn tool_text_and_logging() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ToolLogger::shared(dir.path(), Some("t"));
        let tool = CalculatorTool::new(logger.clone());

        let ok = tool
            .call(json!({"expression": "22000 + 69300"}), None)
            .await
            .unwrap();
        assert_eq!(ok.text, "The result of 22000 + 69300 is 91300");

        let bad = tool.call(json!({"expression": "1/0"}), None).await.unwrap();
        assert_eq!(bad.text, "Error calculating 1/0: division by zero");

        let missing = tool.call(json!({}), None).await.unwrap_err();
        assert!(matches!(missing, ToolSourceError::InvalidInput(_)));

        let logs = logger.lock().unwrap().get_logs().to_vec();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].input["expression"], "22000 + 69300");
    }
}
