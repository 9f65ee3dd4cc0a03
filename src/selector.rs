//! 父子选择器拼接：`&` 替换、组合符规范化以及多选择器的笛卡尔积。

/// 拼接单个父选择器与子选择器。
pub fn compose(parent: &str, child: &str) -> String {
    let child = normalize_combinators(child);
    let parent = parent.trim();
    if child.contains('&') {
        return child.replace('&', parent).trim().to_string();
    }
    if parent.is_empty() {
        child
    } else {
        format!("{parent} {child}")
    }
}

/// 对所有父选择器与子选择器求笛卡尔积，n 个父选择器与 m 个子选择器得到 n*m 个结果。
///
/// 结果按子选择器优先排列：每个子选择器依次与全部父选择器拼接。
pub fn compose_all(parents: &[String], children: &[String]) -> Vec<String> {
    if parents.is_empty() {
        return children.iter().map(|child| compose("", child)).collect();
    }
    let mut result = Vec::with_capacity(parents.len() * children.len());
    for child in children {
        for parent in parents {
            let composed = compose(parent, child);
            if !result.contains(&composed) {
                result.push(composed);
            }
        }
    }
    result
}

/// 把 `>`、`+`、`~` 两侧的空白统一为一个空格，其余连续空白压缩为一个。
pub fn normalize_combinators(selector: &str) -> String {
    let mut output = String::with_capacity(selector.len() + 4);
    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = selector.trim().chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            output.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                output.push(ch);
            }
            '(' => {
                paren_depth += 1;
                output.push(ch);
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                output.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                output.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                output.push(ch);
            }
            '>' | '+' | '~' if paren_depth == 0 && bracket_depth == 0 => {
                while output.ends_with(' ') {
                    output.pop();
                }
                if !output.is_empty() {
                    output.push(' ');
                }
                output.push(ch);
                output.push(' ');
                while chars.peek().map_or(false, |c| c.is_whitespace()) {
                    chars.next();
                }
            }
            c if c.is_whitespace() && paren_depth == 0 && bracket_depth == 0 => {
                if !output.ends_with(' ') {
                    output.push(' ');
                }
            }
            _ => output.push(ch),
        }
    }
    output.trim().to_string()
}

/// 拆出选择器中的 `:extend(...)`，返回剩余选择器与扩展目标。
pub fn strip_extend(selector: &str) -> (String, Vec<String>) {
    const MARKER: &str = ":extend(";
    let mut rest = selector;
    let mut output = String::new();
    let mut targets = Vec::new();
    while let Some(start) = rest.find(MARKER) {
        output.push_str(&rest[..start]);
        let inner_start = start + MARKER.len();
        let mut depth = 1usize;
        let mut end = None;
        for (idx, ch) in rest[inner_start..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(inner_start + idx);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            output.push_str(&rest[start..]);
            rest = "";
            break;
        };
        targets.extend(split_selector_list(&rest[inner_start..end]));
        rest = &rest[end + 1..];
    }
    output.push_str(rest);
    (output.trim().to_string(), targets)
}

/// 按顶层逗号拆分选择器列表（括号内的逗号不拆）。
pub fn split_selector_list(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in input.chars() {
        match ch {
            '(' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    parts
}
