//! 表达式求值：变量替换、两级优先级的四则运算以及内置函数分派。

use crate::error::{LessError, LessResult};
use crate::functions::FunctionRegistry;
use crate::guard;
use crate::scope::Variables;
use crate::utils::{split_top_level, unquote};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::path::PathBuf;
use tracing::{trace, warn};

static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@[\w-]+$").expect("变量正则编译失败"));
static FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(%|[A-Za-z_-][\w-]*)\(").expect("函数正则编译失败"));
static INTERPOLATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\{([\w-]+)\}").expect("插值正则编译失败"));
static VARIABLE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\{([\w-]+)\}|@([\w-]+)").expect("变量引用正则编译失败"));

/// 求值时可见的外部环境。
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    /// `image-*` 函数解析相对路径的目录。
    pub base_dir: Option<PathBuf>,
    /// 严格模式下未定义变量直接报错。
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Operand(String),
    Operator(char),
}

/// 针对一个变量来源的表达式求值器。
pub struct Evaluator<'v> {
    vars: &'v dyn Variables,
    context: &'v EvalContext,
    resolving: RefCell<Vec<String>>,
}

impl<'v> Evaluator<'v> {
    pub fn new(vars: &'v dyn Variables, context: &'v EvalContext) -> Self {
        Self {
            vars,
            context,
            resolving: RefCell::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &EvalContext {
        self.context
    }

    /// 求值一段属性值或参数文本。
    pub fn evaluate(&self, input: &str) -> LessResult<String> {
        self.eval_list(input, false)
    }

    /// 求值 guard 条件。
    pub fn evaluate_guard(&self, condition: &str) -> LessResult<bool> {
        guard::evaluate(condition, self)
    }

    /// 返回变量求值后的文本，未定义时返回 `None`。
    pub fn resolve_variable(&self, name: &str) -> LessResult<Option<String>> {
        let Some(raw) = self.vars.variable(name) else {
            return Ok(None);
        };
        if self.resolving.borrow().iter().any(|n| n == name) {
            return Err(LessError::eval(format!("变量 @{name} 存在循环引用")));
        }
        trace!(variable = name, raw, "resolving variable");
        self.resolving.borrow_mut().push(name.to_string());
        let result = self.evaluate(raw);
        self.resolving.borrow_mut().pop();
        result.map(Some)
    }

    /// 替换 `@{name}` 插值，字符串值去掉引号后插入。
    pub fn interpolate(&self, text: &str) -> LessResult<String> {
        if !text.contains("@{") {
            return Ok(text.to_string());
        }
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for caps in INTERPOLATION_RE.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            match self.resolve_variable(name.as_str())? {
                Some(value) => output.push_str(unquote(&value).0),
                None => output.push_str(&self.unresolved(name.as_str())?),
            }
            last = whole.end();
        }
        output.push_str(&text[last..]);
        Ok(output)
    }

    /// 只替换变量引用，不做运算（用于 `calc()` 等原生函数）。
    pub fn substitute_variables(&self, text: &str) -> LessResult<String> {
        if !text.contains('@') {
            return Ok(text.to_string());
        }
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for caps in VARIABLE_REF_RE.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            output.push_str(&text[last..whole.start()]);
            let (name, interpolated) = match (caps.get(1), caps.get(2)) {
                (Some(name), _) => (name.as_str(), true),
                (None, Some(name)) => (name.as_str(), false),
                _ => continue,
            };
            match self.resolve_variable(name)? {
                Some(value) if interpolated => output.push_str(unquote(&value).0),
                Some(value) => output.push_str(&value),
                None => output.push_str(&self.unresolved(name)?),
            }
            last = whole.end();
        }
        output.push_str(&text[last..]);
        Ok(output)
    }

    fn unresolved(&self, name: &str) -> LessResult<String> {
        if self.context.strict {
            return Err(LessError::UndefinedVariable(name.to_string()));
        }
        warn!(variable = name, "unresolved variable passed through");
        Ok(format!("@{name}"))
    }

    fn variable_or_literal(&self, name: &str) -> LessResult<String> {
        match self.resolve_variable(name)? {
            Some(value) => Ok(value),
            None => self.unresolved(name),
        }
    }

    fn eval_list(&self, input: &str, in_parens: bool) -> LessResult<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        if VARIABLE_RE.is_match(trimmed) {
            return self.variable_or_literal(&trimmed[1..]);
        }
        let parts = split_top_level(trimmed, ',');
        if parts.len() > 1 {
            let evaluated = parts
                .iter()
                .map(|part| self.eval_space_list(part, in_parens))
                .collect::<LessResult<Vec<_>>>()?;
            return Ok(evaluated.join(", "));
        }
        self.eval_space_list(trimmed, in_parens)
    }

    fn eval_space_list(&self, input: &str, in_parens: bool) -> LessResult<String> {
        let tokens = tokenize(input, in_parens);
        let mut pieces = Vec::new();
        for group in group_expressions(tokens) {
            let piece = self.eval_expression(&group, in_parens)?;
            if !piece.is_empty() {
                pieces.push(piece);
            }
        }
        Ok(pieces.join(" "))
    }

    fn eval_expression(&self, group: &[Token], in_parens: bool) -> LessResult<String> {
        if let [Token::Operand(text)] = group {
            return self.eval_operand(text, in_parens);
        }

        let mut texts = Vec::new();
        let mut ops = Vec::new();
        let mut parts = Vec::new();
        for token in group {
            match token {
                Token::Operand(text) => {
                    let evaluated = self.eval_operand(text, in_parens)?;
                    parts.push(evaluated.clone());
                    texts.push(evaluated);
                }
                Token::Operator(op) => {
                    ops.push(*op);
                    parts.push(op.to_string());
                }
            }
        }
        let literal = parts.join(" ");
        if texts.is_empty() || ops.len() != texts.len() - 1 {
            return Ok(literal);
        }

        let values: Option<Vec<Value>> = texts.iter().map(|t| Value::parse(t)).collect();
        let Some(values) = values else {
            if self.context.strict {
                return Err(LessError::eval(format!("无法对非数值进行运算: {literal}")));
            }
            return Ok(literal);
        };

        let mut operands = vec![values[0].clone()];
        let mut pending = Vec::new();
        for (op, value) in ops.iter().zip(values.into_iter().skip(1)) {
            if matches!(op, '*' | '/') {
                let lhs = operands.pop().unwrap_or_else(|| Value::unitless(0.0));
                operands.push(lhs.apply(*op, &value)?);
            } else {
                pending.push(*op);
                operands.push(value);
            }
        }
        let mut iter = operands.into_iter();
        let mut result = iter.next().unwrap_or_else(|| Value::unitless(0.0));
        for (op, value) in pending.into_iter().zip(iter) {
            result = result.apply(op, &value)?;
        }
        Ok(result.to_css())
    }

    fn eval_operand(&self, text: &str, in_parens: bool) -> LessResult<String> {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix('~') {
            let (inner, quote) = unquote(rest);
            if quote.is_some() {
                return self.interpolate(inner);
            }
        }
        if let (inner, Some(quote)) = unquote(text) {
            return Ok(format!("{quote}{}{quote}", self.interpolate(inner)?));
        }
        if text.starts_with('(') && balanced_end_str(text, 0) == text.len() {
            let result = self.eval_list(&text[1..text.len() - 1], true)?;
            if Value::parse(&result).is_some() {
                return Ok(result);
            }
            return Ok(format!("({result})"));
        }
        if let Some(signed) = self.eval_signed(text, in_parens)? {
            return Ok(signed);
        }
        if let Some(name) = text.strip_prefix("@@") {
            let target = self.variable_or_literal(name)?;
            return self.variable_or_literal(unquote(&target).0);
        }
        if VARIABLE_RE.is_match(text) {
            return self.variable_or_literal(&text[1..]);
        }
        if let Some(caps) = FUNCTION_RE.captures(text) {
            if let Some(name) = caps.get(1) {
                let open = name.end();
                if balanced_end_str(text, open) == text.len() {
                    return self.call_function(name.as_str(), &text[open + 1..text.len() - 1]);
                }
            }
        }
        if text.contains('@') {
            return self.substitute_variables(text);
        }
        Ok(text.to_string())
    }

    /// `-(...)`、`-@var`、`-fn(...)` 这类带符号的操作数。
    fn eval_signed(&self, text: &str, in_parens: bool) -> LessResult<Option<String>> {
        let mut chars = text.chars();
        let sign = match chars.next() {
            Some(c @ ('-' | '+')) => c,
            _ => return Ok(None),
        };
        let rest = chars.as_str();
        let applies = rest.starts_with('(')
            || rest.starts_with('@')
            || (FUNCTION_RE.is_match(rest) && !rest.starts_with('-'));
        if !applies {
            return Ok(None);
        }
        let evaluated = self.eval_operand(rest, in_parens)?;
        if let Some(Value::Number(mut number)) = Value::parse(&evaluated) {
            if sign == '-' {
                number.value = -number.value;
            }
            return Ok(Some(number.to_string()));
        }
        Ok(Some(format!("{sign}{evaluated}")))
    }

    fn call_function(&self, name: &str, inner: &str) -> LessResult<String> {
        let lowered = name.to_ascii_lowercase();
        match lowered.as_str() {
            "url" => return Ok(format!("url({})", self.eval_url(inner)?)),
            "calc" | "var" | "env" | "attr" => {
                return Ok(format!("{name}({})", self.substitute_variables(inner)?));
            }
            _ => {}
        }
        let args = split_top_level(inner, ',')
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<LessResult<Vec<_>>>()?;
        let registry = FunctionRegistry::global();
        if registry.contains(&lowered) {
            return registry.call(self, &lowered, &args);
        }
        trace!(function = name, "native css function passed through");
        Ok(format!("{name}({})", args.join(", ")))
    }

    fn eval_url(&self, inner: &str) -> LessResult<String> {
        let trimmed = inner.trim();
        if unquote(trimmed).1.is_some() {
            return self.eval_operand(trimmed, false);
        }
        if VARIABLE_RE.is_match(trimmed) {
            return self.variable_or_literal(&trimmed[1..]);
        }
        self.interpolate(trimmed)
    }
}

/// 把一段空白分隔的文本切成操作数与二元运算符。
///
/// `+`/`-` 两侧空白对称时才是二元运算符，`a -b` 视为两个列表项；
/// 括号外的 `/` 只有两侧都有空白时才是除法，`12px/1.5` 保持原样。
fn tokenize(input: &str, in_parens: bool) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut space_before = false;
    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            space_before = true;
            i += 1;
            continue;
        }
        let after_operand = matches!(tokens.last(), Some(Token::Operand(_)));
        let space_after = chars.get(i + 1).map_or(true, |c| c.is_whitespace());
        let binary = after_operand
            && match ch {
                '*' => true,
                '/' => in_parens || (space_before && space_after),
                '+' | '-' => space_before == space_after,
                _ => false,
            };
        if binary {
            tokens.push(Token::Operator(ch));
            i += 1;
        } else {
            let end = operand_end(&chars, i, in_parens);
            tokens.push(Token::Operand(chars[i..end].iter().collect()));
            i = end;
        }
        space_before = false;
    }
    tokens
}

/// 相邻操作数之间没有运算符时拆成独立的表达式（列表项）。
fn group_expressions(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut groups: Vec<Vec<Token>> = Vec::new();
    for token in tokens {
        let continues = match (&token, groups.last()) {
            (Token::Operator(_), Some(_)) => true,
            (Token::Operand(_), Some(group)) => matches!(group.last(), Some(Token::Operator(_))),
            _ => false,
        };
        match groups.last_mut() {
            Some(group) if continues => group.push(token),
            _ => groups.push(vec![token]),
        }
    }
    groups
}

fn operand_end(chars: &[char], start: usize, in_parens: bool) -> usize {
    let ch = chars[start];
    if ch == '~' && matches!(chars.get(start + 1), Some('"' | '\'')) {
        return quoted_end(chars, start + 1);
    }
    if ch == '"' || ch == '\'' {
        return quoted_end(chars, start);
    }
    if ch == '(' {
        return balanced_end(chars, start);
    }
    if ch == '-' || ch == '+' {
        return match chars.get(start + 1) {
            Some('(') => balanced_end(chars, start + 1),
            Some(c) if *c == '@' || *c == '.' || *c == '-' || c.is_alphanumeric() => {
                word_end(chars, start + 1, in_parens)
            }
            _ => start + 1,
        };
    }
    word_end(chars, start, in_parens)
}

fn word_end(chars: &[char], start: usize, in_parens: bool) -> usize {
    let numeric = chars[start].is_ascii_digit()
        || (chars[start] == '.' && chars.get(start + 1).map_or(false, char::is_ascii_digit));
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() || c == ',' => break,
            '(' => {
                i = balanced_end(chars, i);
                continue;
            }
            '"' | '\'' => {
                i = quoted_end(chars, i);
                continue;
            }
            '@' if chars.get(i + 1) == Some(&'{') => {
                while i < chars.len() && chars[i] != '}' {
                    i += 1;
                }
            }
            '*' | '+' if i > start => break,
            '/' if in_parens && i > start => break,
            '-' if numeric && i > start => break,
            _ => {}
        }
        i += 1;
    }
    if i == start {
        start + 1
    } else {
        i.min(chars.len())
    }
}

fn quoted_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn balanced_end(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                i = quoted_end(chars, i);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

/// 以字节下标表示的 `balanced_end`，`open` 必须指向 `(`。
fn balanced_end_str(text: &str, open: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let char_open = text[..open].chars().count();
    let end = balanced_end(&chars, char_open);
    chars[..end].iter().map(|c| c.len_utf8()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Snapshot;

    fn eval_with(vars: &[(&str, &str)], input: &str) -> LessResult<String> {
        let snapshot: Snapshot = vars.iter().copied().collect();
        let context = EvalContext::default();
        Evaluator::new(&snapshot, &context).evaluate(input)
    }

    fn eval(vars: &[(&str, &str)], input: &str) -> String {
        eval_with(vars, input).unwrap()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval(&[], "2 + 3 * 4"), "14");
        assert_eq!(eval(&[], "(10 - 4 - 3)"), "3");
        assert_eq!(eval(&[], "(12 / 2 / 3)"), "2");
        assert_eq!(eval(&[], "(2 + 3) * 4"), "20");
    }

    #[test]
    fn variables_substitute_into_arithmetic() {
        let vars = [("base", "10px")];
        assert_eq!(eval(&vars, "@base + 5px"), "15px");
        assert_eq!(eval(&vars, "(@base * 2)"), "20px");
        assert_eq!(eval(&vars, "-(@base / 2)"), "-5px");
        assert_eq!(eval(&vars, "(@base * -2)"), "-20px");
    }

    #[test]
    fn bare_variables_keep_lists_and_strings() {
        let vars = [("stack", "Helvetica, Arial, sans-serif"), ("q", "\"a + b\"")];
        assert_eq!(eval(&vars, "@stack"), "Helvetica, Arial, sans-serif");
        assert_eq!(eval(&vars, "@q"), "\"a + b\"");
    }

    #[test]
    fn space_lists_evaluate_each_segment() {
        let vars = [("spacing", "12px")];
        assert_eq!(eval(&vars, "(@spacing * 0.75) (@spacing * 1.5)"), "9px 18px");
        assert_eq!(eval(&[], "10px -5px"), "10px -5px");
        assert_eq!(eval(&[], "10px - 5px"), "5px");
        assert_eq!(eval(&[], "1px solid darken(#fff, 100%)"), "1px solid #000000");
    }

    #[test]
    fn slash_outside_parentheses_needs_spaces() {
        assert_eq!(eval(&[], "12px/1.5 Arial"), "12px/1.5 Arial");
        assert_eq!(eval(&[], "12px / 2"), "6px");
        assert_eq!(eval(&[], "(12px/2)"), "6px");
    }

    #[test]
    fn hyphenated_words_are_not_arithmetic() {
        assert_eq!(eval(&[], "inline-flex"), "inline-flex");
        assert_eq!(eval(&[], "-webkit-box"), "-webkit-box");
        assert_eq!(eval(&[], "sans-serif"), "sans-serif");
    }

    #[test]
    fn unresolved_variables_pass_through() {
        assert_eq!(eval(&[], "@missing"), "@missing");
        assert_eq!(eval(&[], "1px solid @missing"), "1px solid @missing");
    }

    #[test]
    fn strict_mode_rejects_unresolved_variables() {
        let snapshot = Snapshot::default();
        let context = EvalContext {
            strict: true,
            ..EvalContext::default()
        };
        let err = Evaluator::new(&snapshot, &context)
            .evaluate("@missing")
            .unwrap_err();
        assert!(matches!(err, LessError::UndefinedVariable(name) if name == "missing"));
    }

    #[test]
    fn unit_errors_propagate() {
        assert!(matches!(
            eval_with(&[], "10px + 2em"),
            Err(LessError::UnitMismatch { .. })
        ));
        assert!(matches!(
            eval_with(&[], "(10px / 0)"),
            Err(LessError::DivisionByZero)
        ));
    }

    #[test]
    fn strings_interpolate() {
        let vars = [("name", "\"world\""), ("base", "/img")];
        assert_eq!(eval(&vars, "\"hello @{name}\""), "\"hello world\"");
        assert_eq!(eval(&vars, "~\"@{base}/a.png\""), "/img/a.png");
        assert_eq!(eval(&vars, "url(\"@{base}/a.png\")"), "url(\"/img/a.png\")");
    }

    #[test]
    fn native_functions_pass_through_with_evaluated_args() {
        let vars = [("x", "10px"), ("gutter", "20px")];
        assert_eq!(eval(&vars, "translate(@x * 2, 0)"), "translate(20px, 0)");
        assert_eq!(eval(&vars, "calc(100% - @gutter)"), "calc(100% - 20px)");
        assert_eq!(eval(&vars, "var(--main)"), "var(--main)");
    }

    #[test]
    fn lazy_variables_resolve_recursively() {
        let vars = [("a", "@b * 2"), ("b", "3px")];
        assert_eq!(eval(&vars, "@a"), "6px");
        let vars = [("name", "\"b\""), ("b", "red")];
        assert_eq!(eval(&vars, "@@name"), "red");
    }

    #[test]
    fn cyclic_variables_fail() {
        let vars = [("a", "@b"), ("b", "@a")];
        assert!(matches!(eval_with(&vars, "@a"), Err(LessError::EvalError(_))));
    }

    #[test]
    fn comma_lists_keep_their_delimiter() {
        let vars = [("c", "#336699")];
        assert_eq!(
            eval(&vars, "0 0 5px fade(@c, 30%), inset 0 1px 0 #fff"),
            "0 0 5px rgba(51, 102, 153, 0.3), inset 0 1px 0 #fff"
        );
    }

    #[test]
    fn tokenizer_separates_operators() {
        let tokens = tokenize("@a*2", false);
        assert_eq!(
            tokens,
            vec![
                Token::Operand("@a".into()),
                Token::Operator('*'),
                Token::Operand("2".into())
            ]
        );
        assert_eq!(tokenize("10px-5px", false).len(), 3);
        assert_eq!(tokenize("a -b", false).len(), 2);
    }
}
