/// 压缩多余空白字符，主要用于输出压缩模式。
pub fn collapse_whitespace(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }
    result.trim().to_string()
}

/// 保持相对缩进的辅助函数。
pub fn indent(level: usize) -> String {
    const INDENT: &str = "  ";
    (0..level).map(|_| INDENT).collect()
}

/// 按顶层分隔符拆分，括号与引号内的分隔符不生效。
pub fn split_top_level(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c == separator && depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// 是否存在顶层（括号深度为 0）的分隔符。
pub fn has_top_level(input: &str, separator: char) -> bool {
    split_top_level(input, separator).len() > 1
}

/// 列表拆分：有顶层逗号时按逗号，否则按空白。
pub fn split_list(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if has_top_level(trimmed, ',') {
        return split_top_level(trimmed, ',')
            .into_iter()
            .filter(|item| !item.is_empty())
            .collect();
    }
    let mut items = Vec::new();
    for item in split_top_level(trimmed, ' ') {
        for piece in split_top_level(&item, '\n') {
            let piece = piece.trim();
            if !piece.is_empty() {
                items.push(piece.to_string());
            }
        }
    }
    items
}

/// 去掉成对的外层引号，返回内容与引号字符。
pub fn unquote(input: &str) -> (&str, Option<char>) {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if (first == '"' || first == '\'') && first == last => {
            (&trimmed[1..trimmed.len() - 1], Some(first))
        }
        _ => (trimmed, None),
    }
}

pub fn is_quoted(input: &str) -> bool {
    unquote(input).1.is_some()
}
