//! `when (...)` 条件求值：比较、`and`/`or`/`not` 与括号分组。

use crate::error::{LessError, LessResult};
use crate::evaluator::Evaluator;
use crate::utils::unquote;
use crate::value::{parse_number, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    And,
    Or,
    Not,
    Compare(Comparison),
    Operand(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

/// 求值 guard 条件，空条件视为成立。
pub fn evaluate(condition: &str, evaluator: &Evaluator<'_>) -> LessResult<bool> {
    let tokens = tokenize(condition)?;
    if tokens.is_empty() {
        return Ok(true);
    }
    let mut parser = GuardParser {
        tokens,
        pos: 0,
        evaluator,
    };
    let result = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(LessError::guard(format!(
            "条件 `{}` 中存在多余的内容",
            condition.trim()
        )));
    }
    Ok(result)
}

fn tokenize(input: &str) -> LessResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_whitespace() => i += 1,
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
            '>' | '<' | '=' => {
                let next = chars.get(i + 1).copied();
                let (comparison, width) = match (ch, next) {
                    ('>', Some('=')) => (Comparison::Ge, 2),
                    ('<', Some('=')) | ('=', Some('<')) => (Comparison::Le, 2),
                    ('=', Some('>')) => (Comparison::Ge, 2),
                    ('>', _) => (Comparison::Gt, 1),
                    ('<', _) => (Comparison::Lt, 1),
                    _ => (Comparison::Eq, 1),
                };
                tokens.push(Token::Compare(comparison));
                i += width;
            }
            '"' | '\'' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i] != ch {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(LessError::guard(format!("字符串未闭合: {input}")));
                }
                i += 1;
                tokens.push(Token::Operand(chars[start..i].iter().collect()));
            }
            _ => {
                let start = i;
                while i < chars.len() {
                    let c = chars[i];
                    if c.is_whitespace() || matches!(c, ')' | ',' | '>' | '<' | '=') {
                        break;
                    }
                    if c == '(' {
                        if i == start {
                            break;
                        }
                        i = skip_call(&chars, i)?;
                        continue;
                    }
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Operand(word),
                });
            }
        }
    }
    Ok(tokens)
}

fn skip_call(chars: &[char], open: usize) -> LessResult<usize> {
    let mut depth = 0usize;
    for (offset, c) in chars[open..].iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset + 1);
                }
            }
            _ => {}
        }
    }
    Err(LessError::guard("函数调用括号未闭合"))
}

struct GuardParser<'e, 'v> {
    tokens: Vec<Token>,
    pos: usize,
    evaluator: &'e Evaluator<'v>,
}

impl<'e, 'v> GuardParser<'e, 'v> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> LessResult<bool> {
        let mut result = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or | Token::Comma)) {
            self.advance();
            let rhs = self.parse_and()?;
            result = result || rhs;
        }
        Ok(result)
    }

    fn parse_and(&mut self) -> LessResult<bool> {
        let mut result = self.parse_not()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let rhs = self.parse_not()?;
            result = result && rhs;
        }
        Ok(result)
    }

    fn parse_not(&mut self) -> LessResult<bool> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            return Ok(!self.parse_not()?);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> LessResult<bool> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let result = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(result),
                    _ => Err(LessError::guard("缺少右括号")),
                }
            }
            Some(Token::Operand(_)) => self.parse_comparison(),
            Some(other) => Err(LessError::guard(format!("意外的符号 {other:?}"))),
            None => Err(LessError::guard("条件不完整")),
        }
    }

    fn parse_comparison(&mut self) -> LessResult<bool> {
        let lhs = self.operands();
        let Some(Token::Compare(op)) = self.peek().cloned() else {
            return Ok(self.evaluator.evaluate(&lhs)?.trim() == "true");
        };
        self.advance();
        let rhs = self.operands();
        if rhs.is_empty() {
            return Err(LessError::guard(format!("比较运算缺少右侧操作数: {lhs}")));
        }
        let lhs = self.evaluator.evaluate(&lhs)?;
        let rhs = self.evaluator.evaluate(&rhs)?;
        Ok(compare(&lhs, op, &rhs))
    }

    fn operands(&mut self) -> String {
        let mut parts = Vec::new();
        while let Some(Token::Operand(text)) = self.peek() {
            parts.push(text.clone());
            self.pos += 1;
        }
        parts.join(" ")
    }
}

/// 能解析为数字时按数值比较（忽略单位），否则按去引号后的字符串比较。
fn compare(lhs: &str, op: Comparison, rhs: &str) -> bool {
    if let (Some(a), Some(b)) = (parse_number(lhs), parse_number(rhs)) {
        let ordering = a.value.partial_cmp(&b.value);
        return match op {
            Comparison::Eq => ordering == Some(Ordering::Equal),
            Comparison::Gt => ordering == Some(Ordering::Greater),
            Comparison::Lt => ordering == Some(Ordering::Less),
            Comparison::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Comparison::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        };
    }
    if op != Comparison::Eq {
        return false;
    }
    if let (Some(Value::Color(a)), Some(Value::Color(b))) = (Value::parse(lhs), Value::parse(rhs)) {
        return a == b;
    }
    unquote(lhs).0 == unquote(rhs).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalContext;
    use crate::scope::Snapshot;
    use proptest::prelude::*;

    fn check(vars: &[(&str, &str)], condition: &str) -> LessResult<bool> {
        let snapshot: Snapshot = vars.iter().copied().collect();
        let context = EvalContext::default();
        evaluate(condition, &Evaluator::new(&snapshot, &context))
    }

    #[test]
    fn numeric_comparisons() {
        assert!(check(&[("n", "3")], "(@n > 0)").unwrap());
        assert!(!check(&[("n", "0")], "(@n > 0)").unwrap());
        assert!(!check(&[("n", "-1")], "(@n > 0)").unwrap());
        assert!(check(&[("w", "768px")], "(@w >= 768)").unwrap());
        assert!(check(&[("w", "10px")], "(@w =< 10px)").unwrap());
    }

    #[test]
    fn string_equality() {
        assert!(check(&[("mode", "dark")], "(@mode = dark)").unwrap());
        assert!(check(&[("mode", "\"dark\"")], "(@mode = dark)").unwrap());
        assert!(!check(&[("mode", "light")], "(@mode = dark)").unwrap());
        assert!(!check(&[("mode", "light")], "(@mode > dark)").unwrap());
    }

    #[test]
    fn boolean_combinators() {
        let vars = [("a", "1"), ("b", "5")];
        assert!(check(&vars, "(@a > 0) and (@b > 3)").unwrap());
        assert!(!check(&vars, "(@a > 2) and (@b > 3)").unwrap());
        assert!(check(&vars, "(@a > 2), (@b > 3)").unwrap());
        assert!(check(&vars, "(@a > 2) or (@b > 3)").unwrap());
        assert!(check(&vars, "not (@a > 2)").unwrap());
        assert!(check(&vars, "((@a > 2) or (@b = 5)) and not (@a = 0)").unwrap());
    }

    #[test]
    fn function_operands_and_bare_values() {
        let vars = [("c", "#fff"), ("flag", "true")];
        assert!(check(&vars, "(iscolor(@c))").unwrap());
        assert!(!check(&vars, "(isnumber(@c))").unwrap());
        assert!(check(&vars, "(@flag)").unwrap());
        assert!(check(&vars, "(@flag = true)").unwrap());
        assert!(check(&[], "").unwrap());
    }

    #[test]
    fn malformed_guards_fail() {
        assert!(matches!(check(&[], "(1 > 0"), Err(LessError::GuardEvalError(_))));
        assert!(matches!(check(&[], "(1 >)"), Err(LessError::GuardEvalError(_))));
        assert!(matches!(check(&[], "and"), Err(LessError::GuardEvalError(_))));
    }

    proptest! {
        #[test]
        fn positive_guard_matches_sign(n in -1000i32..1000) {
            let value = n.to_string();
            let holds = check(&[("n", value.as_str())], "(@n > 0)").unwrap();
            prop_assert_eq!(holds, n > 0);
        }
    }
}
