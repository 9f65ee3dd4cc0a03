use crate::ast::*;
use crate::error::{LessError, LessResult};
use crate::selector::split_selector_list;
use crate::utils::{collapse_whitespace, has_top_level, split_top_level};

/// LESS 解析器，负责把源码转换成语法树。
pub struct LessParser;

impl Default for LessParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LessParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> LessResult<Stylesheet> {
        let mut cursor = Cursor::new(input);
        let mut nodes = Vec::new();

        loop {
            cursor.skip_whitespace_and_line_comments();
            if cursor.is_eof() {
                break;
            }
            if let Some(comment) = cursor.read_block_comment() {
                nodes.push(Node::Comment(comment));
                continue;
            }
            if cursor.starts_with('}') {
                return Err(LessError::parse("多余的 '}'", cursor.position()));
            }
            nodes.push(self.parse_item(&mut cursor)?);
        }

        Ok(Stylesheet::new(nodes))
    }

    fn parse_item(&self, cursor: &mut Cursor<'_>) -> LessResult<Node> {
        if cursor.starts_with('@') {
            if cursor.lookahead_is_import() {
                return self.parse_import(cursor).map(Node::Import);
            }
            if cursor.lookahead_is_variable_decl() {
                return self.parse_variable(cursor);
            }
            if cursor.lookahead_is_detached_call() {
                return self.parse_detached_call(cursor).map(Node::Declaration);
            }
            if cursor.lookahead_is_block_at_rule() {
                return self.parse_at_rule(cursor).map(Node::Block);
            }
            if cursor.lookahead_is_at_statement() {
                return self.parse_at_statement(cursor).map(Node::Import);
            }
        }

        if cursor.lookahead_is_each() {
            return self.parse_each(cursor).map(Node::Each);
        }

        if cursor.lookahead_is_extend_call() {
            return self.parse_extend_call(cursor).map(Node::MixinCall);
        }

        if cursor.lookahead_is_mixin_definition() {
            return self.parse_mixin_definition(cursor).map(Node::Block);
        }

        if cursor.lookahead_is_mixin_call() {
            return self.parse_mixin_call(cursor).map(Node::MixinCall);
        }

        match cursor.detect_body_kind() {
            Some(BodyKind::Declaration) => self.parse_declaration(cursor).map(Node::Declaration),
            Some(BodyKind::NestedRule) => self.parse_ruleset(cursor).map(Node::Block),
            None => Err(LessError::parse(
                "无法判断声明或子选择器",
                cursor.position(),
            )),
        }
    }

    /// 读取 `{` 之后直到匹配 `}` 的子节点，块内注释直接丢弃。
    fn parse_body(&self, cursor: &mut Cursor<'_>, what: &str) -> LessResult<Vec<Node>> {
        let mut body = Vec::new();
        loop {
            cursor.skip_whitespace_and_comments();
            match cursor.peek_char() {
                Some('}') => {
                    cursor.advance_char();
                    break;
                }
                None => {
                    return Err(LessError::parse(
                        format!("{what} 缺少匹配的 '}}'"),
                        cursor.position(),
                    ));
                }
                Some(';') => {
                    cursor.advance_char();
                }
                _ => body.push(self.parse_item(cursor)?),
            }
        }
        Ok(body)
    }

    fn parse_variable(&self, cursor: &mut Cursor<'_>) -> LessResult<Node> {
        cursor.expect_char('@')?;
        let name = cursor.read_identifier();
        cursor.skip_whitespace_and_comments();
        cursor.expect_char(':')?;
        cursor.skip_whitespace_and_comments();

        if cursor.starts_with('{') {
            cursor.advance_char();
            let children = self.parse_body(cursor, "规则集变量")?;
            cursor.skip_whitespace();
            if cursor.starts_with(';') {
                cursor.advance_char();
            }
            return Ok(Node::BlockVariable(BlockVariable { name, children }));
        }

        let value = cursor.read_value(&[';', '}']);
        if cursor.starts_with(';') {
            cursor.advance_char();
        }
        Ok(Node::Declaration(Decl::new(format!("@{name}"), value.trim())))
    }

    fn parse_ruleset(&self, cursor: &mut Cursor<'_>) -> LessResult<Block> {
        cursor.skip_whitespace_and_comments();
        let start = cursor.position();
        let prelude = cursor.read_selector()?;
        let (selector_text, guard) = split_guard(&prelude);
        let selectors = split_selector_list(&selector_text)
            .iter()
            .map(|sel| collapse_whitespace(sel))
            .filter(|sel| !sel.is_empty())
            .collect::<Vec<_>>();

        if selectors.is_empty() {
            return Err(LessError::parse("缺少合法的选择器", start));
        }

        cursor.expect_char('{')?;
        let children = self.parse_body(cursor, "选择器")?;
        Ok(Block {
            selectors,
            children,
            guard,
            ..Block::default()
        })
    }

    fn parse_at_rule(&self, cursor: &mut Cursor<'_>) -> LessResult<Block> {
        cursor.expect_char('@')?;
        let name = cursor.read_identifier();
        if name.is_empty() {
            return Err(LessError::parse("at-rule 名称不能为空", cursor.position()));
        }
        cursor.skip_whitespace_and_comments();
        let params = cursor.read_selector()?;
        let params = collapse_whitespace(&params);
        cursor.expect_char('{')?;
        let children = self.parse_body(cursor, "at-rule")?;
        let selector = if params.is_empty() {
            format!("@{name}")
        } else {
            format!("@{name} {params}")
        };
        Ok(Block::new(vec![selector], children))
    }

    /// `@charset`、`@namespace` 这类无块的 at-rule，原样保留。
    fn parse_at_statement(&self, cursor: &mut Cursor<'_>) -> LessResult<Import> {
        let statement = cursor.read_value(&[';']);
        cursor.expect_char(';')?;
        Ok(Import {
            raw: format!("{};", collapse_whitespace(&statement)),
            path: None,
            is_css: true,
        })
    }

    fn parse_declaration(&self, cursor: &mut Cursor<'_>) -> LessResult<Decl> {
        let start = cursor.position();
        let name = cursor.read_property_name();
        if name.is_empty() {
            return Err(LessError::parse("属性名不能为空", start));
        }
        cursor.skip_whitespace_and_comments();
        cursor.expect_char(':')?;
        cursor.skip_whitespace_and_comments();
        let value = cursor.read_value(&[';', '}']);

        if cursor.peek_char() == Some(';') {
            cursor.advance_char();
        }

        Ok(Decl::new(name, value.trim()))
    }

    fn parse_import(&self, cursor: &mut Cursor<'_>) -> LessResult<Import> {
        cursor.expect_char('@')?;
        let ident = cursor.read_identifier();
        if !ident.eq_ignore_ascii_case("import") {
            return Err(LessError::parse("仅支持 @import 语句", cursor.position()));
        }

        let spec = cursor.read_value(&[';']);
        cursor.expect_char(';')?;

        let mut remainder = spec.trim_start();
        let mut options = Vec::new();
        if remainder.starts_with('(') {
            if let Some(end) = remainder.find(')') {
                let opt_str = &remainder[1..end];
                options = opt_str
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.trim().to_ascii_lowercase())
                    .collect();
                remainder = remainder[end + 1..].trim_start();
            } else {
                return Err(LessError::parse("不完整的 @import 选项", cursor.position()));
            }
        }

        let trimmed = remainder.trim();
        let path = Self::extract_import_path(trimmed);
        let is_css = options.iter().any(|opt| opt == "css")
            || path.as_deref().map_or(true, |target| target.ends_with(".css"));

        Ok(Import {
            raw: format!("@import {trimmed};"),
            path,
            is_css,
        })
    }

    fn extract_import_path(input: &str) -> Option<String> {
        let trimmed = input.trim();
        let first = trimmed.chars().next()?;
        if first == '"' || first == '\'' {
            let end = trimmed[1..].find(first)?;
            return Some(trimmed[1..1 + end].to_string());
        }
        if trimmed.starts_with("url(") {
            return None;
        }
        trimmed
            .split_whitespace()
            .next()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_mixin_definition(&self, cursor: &mut Cursor<'_>) -> LessResult<Block> {
        let name = cursor.read_mixin_name()?;
        cursor.skip_whitespace_and_comments();
        let start = cursor.position();
        let inner = cursor.read_parenthesized()?;
        let params = parse_params(&inner, start)?;
        cursor.skip_whitespace_and_comments();
        let guard = if cursor.starts_with_keyword("when") {
            cursor.consume_keyword("when");
            cursor.skip_whitespace_and_comments();
            let condition = cursor.read_selector()?;
            Some(Guard::new(collapse_whitespace(&condition)))
        } else {
            None
        };
        cursor.expect_char('{')?;
        let children = self.parse_body(cursor, "mixin")?;
        Ok(Block {
            selectors: vec![name],
            children,
            params: Some(params),
            guard,
            mixin_only: true,
        })
    }

    fn parse_mixin_call(&self, cursor: &mut Cursor<'_>) -> LessResult<MixinCall> {
        let start = cursor.position();
        let path = cursor.read_mixin_path();
        let name = collapse_whitespace(&path);
        if name.is_empty() {
            return Err(LessError::parse("期待 mixin 名称", start));
        }
        cursor.skip_whitespace_and_comments();
        let args = if cursor.starts_with('(') {
            split_arguments(&cursor.read_parenthesized()?)
        } else {
            Vec::new()
        };
        cursor.skip_whitespace_and_comments();
        let important = cursor.match_str("!important");
        cursor.skip_whitespace_and_comments();
        if cursor.starts_with(';') {
            cursor.advance_char();
        }
        Ok(MixinCall {
            name,
            args,
            important,
        })
    }

    fn parse_extend_call(&self, cursor: &mut Cursor<'_>) -> LessResult<MixinCall> {
        cursor.expect_char('&')?;
        cursor.expect_char(':')?;
        cursor.consume_keyword("extend");
        let inner = cursor.read_parenthesized()?;
        cursor.skip_whitespace_and_comments();
        if cursor.starts_with(';') {
            cursor.advance_char();
        }
        Ok(MixinCall::new("&:extend", split_selector_list(&inner)))
    }

    /// `each(list, { ... });`，循环体内以 `@value`、`@key`、`@index` 访问当前元素。
    fn parse_each(&self, cursor: &mut Cursor<'_>) -> LessResult<Each> {
        cursor.consume_keyword("each");
        cursor.skip_whitespace();
        cursor.expect_char('(')?;
        cursor.skip_whitespace_and_comments();
        let list = cursor.read_value(&[',']);
        cursor.expect_char(',')?;
        cursor.skip_whitespace_and_comments();
        cursor.expect_char('{')?;
        let children = self.parse_body(cursor, "each")?;
        cursor.skip_whitespace_and_comments();
        cursor.expect_char(')')?;
        cursor.skip_whitespace();
        if cursor.starts_with(';') {
            cursor.advance_char();
        }
        Ok(Each {
            list: list.trim().to_string(),
            variable: "value".to_string(),
            children,
        })
    }

    fn parse_detached_call(&self, cursor: &mut Cursor<'_>) -> LessResult<Decl> {
        cursor.expect_char('@')?;
        let name = cursor.read_identifier();
        if name.is_empty() {
            return Err(LessError::parse(
                "期待可调用的规则集名称",
                cursor.position(),
            ));
        }
        cursor.skip_whitespace_and_comments();
        cursor.expect_char('(')?;
        cursor.skip_whitespace_and_comments();
        if cursor.peek_char() != Some(')') {
            return Err(LessError::parse(
                "暂不支持带参数的规则集调用",
                cursor.position(),
            ));
        }
        cursor.advance_char();
        cursor.skip_whitespace_and_comments();
        if cursor.starts_with(';') {
            cursor.advance_char();
        }
        Ok(Decl::new(format!("@{name}"), "()"))
    }
}

/// 按顶层 `;` 拆分参数，没有分号时按逗号拆分。
fn split_arguments(inner: &str) -> Vec<String> {
    let separator = if has_top_level(inner, ';') { ';' } else { ',' };
    split_top_level(inner, separator)
        .into_iter()
        .map(|arg| collapse_whitespace(&arg))
        .filter(|arg| !arg.is_empty())
        .collect()
}

fn parse_params(inner: &str, position: usize) -> LessResult<Vec<MixinParam>> {
    let mut params = Vec::new();
    for raw in split_arguments(inner) {
        let Some(rest) = raw.strip_prefix('@') else {
            return Err(LessError::parse(
                format!("mixin 参数必须以 @ 开头: {raw}"),
                position,
            ));
        };
        let param = match rest.split_once(':') {
            Some((name, default)) => MixinParam {
                name: name.trim().to_string(),
                default: Some(default.trim().to_string()),
            },
            None => MixinParam::new(rest.trim()),
        };
        if param.name.is_empty() {
            return Err(LessError::parse("mixin 参数名不能为空", position));
        }
        params.push(param);
    }
    Ok(params)
}

/// 拆出选择器尾部的 `when (...)` 条件。
fn split_guard(prelude: &str) -> (String, Option<Guard>) {
    let mut depth = 0usize;
    let bytes = prelude.as_bytes();
    for (idx, ch) in prelude.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            'w' if depth == 0 && prelude[idx..].starts_with("when") => {
                let before = idx == 0 || bytes[idx - 1].is_ascii_whitespace();
                let after = bytes
                    .get(idx + 4)
                    .map_or(false, |b| b.is_ascii_whitespace() || *b == b'(');
                if before && after {
                    let condition = collapse_whitespace(&prelude[idx + 4..]);
                    return (prelude[..idx].trim().to_string(), Some(Guard::new(condition)));
                }
            }
            _ => {}
        }
    }
    (prelude.trim().to_string(), None)
}

/// 带位置指针的输入游标，提供便捷的字符读取与回退功能。
#[derive(Clone)]
struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    fn starts_with(&self, ch: char) -> bool {
        self.peek_char() == Some(ch)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn expect_char(&mut self, expect: char) -> LessResult<()> {
        match self.advance_char() {
            Some(ch) if ch == expect => Ok(()),
            Some(ch) => Err(LessError::parse(
                format!("期待字符 '{expect}', 却得到 '{ch}'"),
                self.position,
            )),
            None => Err(LessError::parse(
                format!("期待字符 '{expect}'"),
                self.position,
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.skip_whitespace_and_line_comments();
            if self.read_block_comment().is_some() {
                continue;
            }
            break;
        }
    }

    fn skip_whitespace_and_line_comments(&mut self) {
        loop {
            self.skip_whitespace();
            if self.match_str("//") {
                while let Some(ch) = self.advance_char() {
                    if ch == '\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    fn read_block_comment(&mut self) -> Option<String> {
        if !self.rest().starts_with("/*") {
            return None;
        }
        let start = self.position;
        let end = match self.rest()[2..].find("*/") {
            Some(offset) => self.position + 2 + offset + 2,
            None => self.source.len(),
        };
        self.position = end;
        Some(self.source[start..end].to_string())
    }

    fn match_str(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.position += prefix.len();
            true
        } else {
            false
        }
    }

    fn starts_with_keyword(&self, keyword: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(keyword) {
            return false;
        }
        match rest[keyword.len()..].chars().next() {
            Some(ch) => !ch.is_alphanumeric() && ch != '-' && ch != '_',
            None => true,
        }
    }

    fn consume_keyword(&mut self, keyword: &str) {
        if self.rest().starts_with(keyword) {
            self.position += keyword.len();
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                ident.push(ch);
                self.advance_char();
            } else {
                break;
            }
        }
        ident
    }

    fn read_property_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == ':' || ch == ';' || ch == '{' || ch == '}' || ch.is_control() {
                break;
            }
            self.advance_char();
            name.push(ch);
            if ch == '@' && self.starts_with('{') {
                while let Some(inner) = self.advance_char() {
                    name.push(inner);
                    if inner == '}' {
                        break;
                    }
                }
            }
        }
        name.trim().to_string()
    }

    /// 读取到顶层终止符为止（不消耗终止符），括号与引号内的终止符无效。
    fn read_value(&mut self, terminators: &[char]) -> String {
        let mut value = String::new();
        let mut depth = 0usize;
        while let Some(ch) = self.peek_char() {
            if depth == 0 && terminators.contains(&ch) {
                break;
            }
            match ch {
                '"' | '\'' => {
                    value.push_str(&self.read_quoted());
                    continue;
                }
                '(' | '[' => depth += 1,
                ')' | ']' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            value.push(ch);
            self.advance_char();
        }
        value
    }

    fn read_quoted(&mut self) -> String {
        let mut text = String::new();
        let Some(quote) = self.advance_char() else {
            return text;
        };
        text.push(quote);
        while let Some(ch) = self.advance_char() {
            text.push(ch);
            if ch == '\\' {
                if let Some(escaped) = self.advance_char() {
                    text.push(escaped);
                }
                continue;
            }
            if ch == quote {
                break;
            }
        }
        text
    }

    /// 读取选择器或 at-rule 前导文本，直到顶层 `{`；`@{name}` 插值不算块开始。
    fn read_selector(&mut self) -> LessResult<String> {
        let start = self.position;
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(ch) = self.peek_char() {
            match ch {
                '{' if depth == 0 => return Ok(text.trim().to_string()),
                ';' | '}' if depth == 0 => break,
                '"' | '\'' => {
                    text.push_str(&self.read_quoted());
                    continue;
                }
                '@' if self.rest().starts_with("@{") => {
                    while let Some(inner) = self.advance_char() {
                        text.push(inner);
                        if inner == '}' {
                            break;
                        }
                    }
                    continue;
                }
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            text.push(ch);
            self.advance_char();
        }
        Err(LessError::parse("期待字符 '{'", start))
    }

    /// 位于 `(` 时读取配对括号内的文本并越过 `)`。
    fn read_parenthesized(&mut self) -> LessResult<String> {
        let start = self.position;
        self.expect_char('(')?;
        let inner = self.read_value(&[]);
        if !self.starts_with(')') {
            return Err(LessError::parse("括号未闭合", start));
        }
        self.advance_char();
        Ok(inner)
    }

    fn skip_parenthesized(&mut self) -> bool {
        self.read_parenthesized().is_ok()
    }

    fn read_mixin_name(&mut self) -> LessResult<String> {
        match self.peek_char() {
            Some(prefix @ ('.' | '#')) => {
                self.advance_char();
                let ident = self.read_identifier();
                if ident.is_empty() {
                    return Err(LessError::parse("mixin 名称不合法", self.position()));
                }
                Ok(format!("{prefix}{ident}"))
            }
            _ => Err(LessError::parse("期待 mixin 名称", self.position())),
        }
    }

    /// 读取 `#ns > .m`、`#ns.m` 这类带命名空间的 mixin 路径。
    fn read_mixin_path(&mut self) -> String {
        let mut path = String::new();
        loop {
            match self.read_mixin_name() {
                Ok(segment) => path.push_str(&segment),
                Err(_) => break,
            }
            let mut lookahead = self.clone();
            lookahead.skip_whitespace();
            let combinator = lookahead.match_str(">");
            lookahead.skip_whitespace();
            if !matches!(lookahead.peek_char(), Some('.' | '#')) {
                break;
            }
            let spaced = lookahead.position > self.position;
            *self = lookahead;
            if combinator {
                path.push_str(" > ");
            } else if spaced {
                path.push(' ');
            }
        }
        path
    }

    fn lookahead_is_variable_decl(&self) -> bool {
        let mut lookahead = self.clone();
        if !lookahead.match_str("@") {
            return false;
        }
        if lookahead.read_identifier().is_empty() {
            return false;
        }
        lookahead.skip_whitespace();
        lookahead.peek_char() == Some(':')
    }

    fn lookahead_is_import(&self) -> bool {
        let mut lookahead = self.clone();
        if !lookahead.match_str("@") {
            return false;
        }
        lookahead.read_identifier().eq_ignore_ascii_case("import")
    }

    fn lookahead_is_block_at_rule(&self) -> bool {
        let mut lookahead = self.clone();
        if !lookahead.match_str("@") || lookahead.read_identifier().is_empty() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        lookahead.read_selector().is_ok()
    }

    fn lookahead_is_at_statement(&self) -> bool {
        let mut lookahead = self.clone();
        lookahead.match_str("@") && !lookahead.read_identifier().is_empty()
    }

    fn lookahead_is_detached_call(&self) -> bool {
        let mut lookahead = self.clone();
        if !lookahead.match_str("@") || lookahead.read_identifier().is_empty() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        if !lookahead.starts_with('(') || !lookahead.skip_parenthesized() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        matches!(lookahead.peek_char(), Some(';' | '}') | None)
    }

    fn lookahead_is_each(&self) -> bool {
        if !self.starts_with_keyword("each") {
            return false;
        }
        let mut lookahead = self.clone();
        lookahead.consume_keyword("each");
        lookahead.skip_whitespace();
        lookahead.starts_with('(')
    }

    fn lookahead_is_extend_call(&self) -> bool {
        let mut lookahead = self.clone();
        if !lookahead.match_str("&:extend") || !lookahead.starts_with('(') {
            return false;
        }
        if !lookahead.skip_parenthesized() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        matches!(lookahead.peek_char(), Some(';' | '}') | None)
    }

    fn lookahead_is_mixin_definition(&self) -> bool {
        let mut lookahead = self.clone();
        if lookahead.read_mixin_name().is_err() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        if !lookahead.starts_with('(') || !lookahead.skip_parenthesized() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        if lookahead.starts_with_keyword("when") {
            lookahead.consume_keyword("when");
            return lookahead.read_selector().is_ok();
        }
        lookahead.peek_char() == Some('{')
    }

    fn lookahead_is_mixin_call(&self) -> bool {
        let mut lookahead = self.clone();
        if lookahead.read_mixin_path().is_empty() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        if lookahead.starts_with('(') && !lookahead.skip_parenthesized() {
            return false;
        }
        lookahead.skip_whitespace_and_comments();
        lookahead.match_str("!important");
        lookahead.skip_whitespace_and_comments();
        matches!(lookahead.peek_char(), Some(';' | '}') | None)
    }

    /// 通过向前查看判断接下来的语句类型（声明或子规则）。
    fn detect_body_kind(&self) -> Option<BodyKind> {
        let mut iter = self.clone();
        iter.skip_whitespace_and_comments();
        let mut saw_colon = false;
        let mut depth = 0usize;
        while let Some(ch) = iter.peek_char() {
            match ch {
                '"' | '\'' => {
                    iter.read_quoted();
                    continue;
                }
                '@' if iter.rest().starts_with("@{") => {
                    while let Some(inner) = iter.advance_char() {
                        if inner == '}' {
                            break;
                        }
                    }
                    continue;
                }
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                '{' if depth == 0 => return Some(BodyKind::NestedRule),
                ';' if depth == 0 => return Some(BodyKind::Declaration),
                '}' if depth == 0 => {
                    return if saw_colon {
                        Some(BodyKind::Declaration)
                    } else {
                        None
                    }
                }
                ':' => saw_colon = true,
                _ => {}
            }
            iter.advance_char();
        }
        if saw_colon {
            Some(BodyKind::Declaration)
        } else {
            None
        }
    }
}

enum BodyKind {
    Declaration,
    NestedRule,
}
