//! 引擎消费的语法树。树由前端一次性构建，之后只读；子节点顺序即输出顺序。

/// 表示一份完整的 LESS 样式表。
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}

impl Stylesheet {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

/// 树中的节点。
#[derive(Debug, Clone)]
pub enum Node {
    Comment(String),
    Declaration(Decl),
    Block(Block),
    MixinCall(MixinCall),
    BlockVariable(BlockVariable),
    Each(Each),
    Import(Import),
}

/// 选择器块、at-rule 块或 mixin 定义。
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub selectors: Vec<String>,
    pub children: Vec<Node>,
    /// 带括号定义的 mixin 才有参数列表。
    pub params: Option<Vec<MixinParam>>,
    pub guard: Option<Guard>,
    /// 仅作为 mixin 使用，自身不输出。
    pub mixin_only: bool,
}

impl Block {
    pub fn new(selectors: Vec<String>, children: Vec<Node>) -> Self {
        Self {
            selectors,
            children,
            ..Self::default()
        }
    }

    /// 选择器以 `@` 开头的块（`@media`、`@font-face` 等）。
    pub fn is_at_rule(&self) -> bool {
        self.selectors
            .first()
            .map_or(false, |sel| sel.starts_with('@'))
    }

    /// 可以被 mixin 调用引用的块。
    pub fn is_mixin_candidate(&self) -> bool {
        self.mixin_only
            || (!self.selectors.is_empty()
                && self
                    .selectors
                    .iter()
                    .all(|sel| sel.starts_with('.') || sel.starts_with('#')))
    }

    pub fn param_count(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }

    /// 没有默认值的参数个数。
    pub fn required_param_count(&self) -> usize {
        self.params.as_ref().map_or(0, |params| {
            params.iter().filter(|p| p.default.is_none()).count()
        })
    }
}

#[derive(Debug, Clone)]
pub struct MixinParam {
    /// 不含 `@` 前缀的参数名。
    pub name: String,
    pub default: Option<String>,
}

impl MixinParam {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }
}

/// 属性声明或变量赋值，值保持未求值的原始文本。
#[derive(Debug, Clone)]
pub struct Decl {
    pub key: String,
    pub value: String,
}

impl Decl {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `@name();` 形式的规则集调用。
    pub fn is_ruleset_invocation(&self) -> bool {
        self.key.starts_with('@') && !self.key.contains('{') && self.value.trim() == "()"
    }

    /// `@name: value;` 形式的变量赋值。
    pub fn is_variable_assignment(&self) -> bool {
        self.key.starts_with('@') && !self.key.contains('{') && !self.is_ruleset_invocation()
    }

    /// 去掉 `@` 后的变量名。
    pub fn variable_name(&self) -> &str {
        self.key.trim_start_matches('@')
    }
}

#[derive(Debug, Clone)]
pub struct MixinCall {
    pub name: String,
    pub args: Vec<String>,
    pub important: bool,
}

impl MixinCall {
    pub fn new<S: Into<String>>(name: S, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            important: false,
        }
    }

    /// `&:extend(...)` 约定的调用。
    pub fn is_extend(&self) -> bool {
        self.name == "&:extend"
    }
}

#[derive(Debug, Clone)]
pub struct Guard {
    pub condition: String,
}

impl Guard {
    pub fn new<S: Into<String>>(condition: S) -> Self {
        Self {
            condition: condition.into(),
        }
    }
}

/// `each(list, { ... })` 循环。
#[derive(Debug, Clone)]
pub struct Each {
    pub list: String,
    pub variable: String,
    pub children: Vec<Node>,
}

/// `@name: { ... }` 形式的分离规则集。
#[derive(Debug, Clone)]
pub struct BlockVariable {
    pub name: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub raw: String,
    pub path: Option<String>,
    pub is_css: bool,
}
