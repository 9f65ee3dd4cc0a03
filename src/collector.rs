//! 渲染前的一次遍历：索引 mixin 定义与 extend 关系，之后只读。

use crate::ast::{Block, Node};
use crate::selector::{compose_all, strip_extend};
use indexmap::{IndexMap, IndexSet};

/// extend 传递闭包的迭代上限。
const MAX_EXTEND_STEPS: usize = 1024;

/// mixin 名称到定义的索引，同名定义按出现顺序排列。
#[derive(Debug, Default)]
pub struct MixinIndex<'a> {
    entries: IndexMap<String, Vec<&'a Block>>,
}

impl<'a> MixinIndex<'a> {
    pub fn get(&self, name: &str) -> &[&'a Block] {
        self.entries
            .get(&normalize_mixin_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, block: &'a Block) {
        let definitions = self.entries.entry(name).or_default();
        if !definitions.iter().any(|known| std::ptr::eq(*known, block)) {
            definitions.push(block);
        }
    }
}

/// 被扩展选择器到扩展者的索引。
#[derive(Debug, Default)]
pub struct ExtendIndex {
    exact: IndexMap<String, Vec<String>>,
    /// 带 `all` 的目标：选择器中任意位置出现即替换。
    partial: IndexMap<String, Vec<String>>,
}

impl ExtendIndex {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.partial.is_empty()
    }

    /// 返回应追加到 `selector` 上的全部选择器（含传递扩展），不含自身。
    pub fn extenders(&self, selector: &str) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut seen: IndexSet<String> = IndexSet::new();
        seen.insert(selector.to_string());
        let mut cursor = 0;
        while cursor < seen.len() && seen.len() < MAX_EXTEND_STEPS {
            let Some(current) = seen.get_index(cursor).cloned() else {
                break;
            };
            cursor += 1;
            if let Some(extenders) = self.exact.get(&current) {
                for extender in extenders {
                    seen.insert(extender.clone());
                }
            }
            for (target, extenders) in &self.partial {
                if !current.contains(target.as_str()) {
                    continue;
                }
                for extender in extenders {
                    seen.insert(current.replace(target.as_str(), extender));
                }
            }
        }
        seen.into_iter().skip(1).collect()
    }

    fn insert(&mut self, target: &str, extender: &str) {
        let target = target.trim();
        let (target, all) = match target.strip_suffix(" all") {
            Some(stripped) => (stripped.trim(), true),
            None => (target, false),
        };
        if target.is_empty() || target == extender {
            return;
        }
        let map = if all { &mut self.partial } else { &mut self.exact };
        let extenders = map.entry(target.to_string()).or_default();
        if !extenders.iter().any(|known| known == extender) {
            extenders.push(extender.to_string());
        }
    }
}

#[derive(Debug, Default)]
pub struct Collected<'a> {
    pub mixins: MixinIndex<'a>,
    pub extends: ExtendIndex,
}

/// 遍历整棵树，建立 mixin 与 extend 索引。
pub fn collect(nodes: &[Node]) -> Collected<'_> {
    let mut collected = Collected::default();
    walk(nodes, &[], &[], false, &mut collected);
    collected
}

fn walk<'a>(
    nodes: &'a [Node],
    namespace: &[String],
    parents: &[String],
    in_definition: bool,
    out: &mut Collected<'a>,
) {
    for node in nodes {
        match node {
            Node::Block(block) if block.is_at_rule() => {
                walk(&block.children, namespace, parents, in_definition, out);
            }
            Node::Block(block) => collect_block(block, namespace, parents, in_definition, out),
            Node::Each(each) => walk(&each.children, namespace, parents, in_definition, out),
            _ => {}
        }
    }
}

fn collect_block<'a>(
    block: &'a Block,
    namespace: &[String],
    parents: &[String],
    in_definition: bool,
    out: &mut Collected<'a>,
) {
    let mut own = Vec::with_capacity(block.selectors.len());
    let mut selector_extends = Vec::new();
    for raw in &block.selectors {
        let (selector, targets) = strip_extend(raw);
        if !targets.is_empty() {
            selector_extends.push((selector.clone(), targets));
        }
        own.push(selector);
    }

    let mut child_namespace = namespace.to_vec();
    if block.is_mixin_candidate() {
        for selector in &own {
            let name = normalize_mixin_name(selector);
            out.mixins.insert(name.clone(), block);
            if !namespace.is_empty() {
                let qualified = format!("{} > {name}", namespace.join(" > "));
                out.mixins.insert(qualified, block);
            }
        }
        if let Some(first) = own.first() {
            child_namespace.push(normalize_mixin_name(first));
        }
    }

    // 带参数的 mixin 自身不输出，其中的 extend 不生效。
    let in_definition = in_definition || block.params.is_some();
    let composed = compose_all(parents, &own);
    if !in_definition {
        for (selector, targets) in &selector_extends {
            for extender in compose_all(parents, std::slice::from_ref(selector)) {
                for target in targets {
                    out.extends.insert(target, &extender);
                }
            }
        }
        for child in &block.children {
            if let Node::MixinCall(call) = child {
                if call.is_extend() {
                    for target in &call.args {
                        for extender in &composed {
                            out.extends.insert(target, extender);
                        }
                    }
                }
            }
        }
    }

    walk(&block.children, &child_namespace, &composed, in_definition, out);
}

/// 把 `#ns.m`、`#ns .m`、`#ns>.m` 统一成 `#ns > .m`。
pub fn normalize_mixin_name(name: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in name.trim().chars() {
        match ch {
            '.' | '#' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
            '>' => {}
            c if c.is_whitespace() => {}
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LessParser;

    fn parse(src: &str) -> Vec<Node> {
        LessParser::new().parse(src).unwrap().nodes
    }

    #[test]
    fn names_normalize_to_one_form() {
        assert_eq!(normalize_mixin_name("#ns.m"), "#ns > .m");
        assert_eq!(normalize_mixin_name("#ns .m"), "#ns > .m");
        assert_eq!(normalize_mixin_name("#ns>.m"), "#ns > .m");
        assert_eq!(normalize_mixin_name(".m"), ".m");
    }

    #[test]
    fn indexes_plain_and_namespaced_mixins() {
        let nodes = parse(".m() { a: b; }\n.m(@x) { a: @x; }\n#ns { .inner() { c: d; } }");
        let collected = collect(&nodes);
        assert_eq!(collected.mixins.get(".m").len(), 2);
        assert_eq!(collected.mixins.get("#ns.inner").len(), 1);
        assert_eq!(collected.mixins.get("#ns > .inner").len(), 1);
        assert_eq!(collected.mixins.get(".inner").len(), 1);
        assert!(collected.mixins.get(".missing").is_empty());
    }

    #[test]
    fn extend_calls_record_composed_selectors() {
        let nodes = parse(".err { &:extend(.msg); }\n.page { .warn { &:extend(.msg); } }\n.msg { color: red; }");
        let collected = collect(&nodes);
        assert_eq!(collected.extends.extenders(".msg"), vec![".err", ".page .warn"]);
    }

    #[test]
    fn selector_form_all_and_transitive() {
        let nodes = parse(
            ".b:extend(.a) { x: y; }\n.c:extend(.b) { x: y; }\n.d:extend(.btn all) { x: y; }",
        );
        let collected = collect(&nodes);
        assert_eq!(collected.extends.extenders(".a"), vec![".b", ".c"]);
        assert_eq!(collected.extends.extenders(".btn:hover"), vec![".d:hover"]);
        assert!(collected.extends.extenders(".zzz").is_empty());
    }

    #[test]
    fn extends_inside_parametric_mixins_are_ignored() {
        let nodes = parse(".m(@x) { &:extend(.a); }\n.a { b: c; }");
        let collected = collect(&nodes);
        assert!(collected.extends.is_empty());
    }
}
