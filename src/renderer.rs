use crate::ast::{Block, Decl, Each, MixinCall, Node, Stylesheet};
use crate::collector::{collect, Collected};
use crate::error::{LessError, LessResult};
use crate::evaluator::{EvalContext, Evaluator};
use crate::scope::{Binding, ScopeStack};
use crate::selector::{compose_all, strip_extend};
use crate::utils::split_list;
use tracing::{debug, warn};

/// mixin 嵌套展开的最大深度。
pub const MAX_MIXIN_DEPTH: usize = 100;

/// 会冒泡到所在选择器外层的条件 at-rule。
const CONDITIONAL_AT_RULES: &[&str] = &["media", "supports", "container", "document"];

/// 经过语义求值后的规则信息。
#[derive(Debug, Clone, Default)]
pub struct EvaluatedStylesheet {
    pub imports: Vec<String>,
    pub nodes: Vec<EvaluatedNode>,
}

#[derive(Debug, Clone)]
pub enum EvaluatedNode {
    Rule(EvaluatedRule),
    AtRule(EvaluatedAtRule),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct EvaluatedRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<EvaluatedDeclaration>,
}

#[derive(Debug, Clone)]
pub struct EvaluatedAtRule {
    pub name: String,
    pub params: String,
    pub declarations: Vec<EvaluatedDeclaration>,
    pub children: Vec<EvaluatedNode>,
}

#[derive(Debug, Clone)]
pub struct EvaluatedDeclaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// 一个选择器层级的渲染结果：自身声明、冒泡的条件 at-rule、嵌套规则。
#[derive(Debug, Default)]
struct RuleOutput {
    declarations: Vec<EvaluatedDeclaration>,
    bubbled: Vec<EvaluatedNode>,
    nested: Vec<EvaluatedNode>,
}

impl RuleOutput {
    fn append(&mut self, other: RuleOutput) {
        self.declarations.extend(other.declarations);
        self.bubbled.extend(other.bubbled);
        self.nested.extend(other.nested);
    }

    /// 输出顺序：自身规则、冒泡的 at-rule、嵌套规则。
    fn into_nodes(self, selectors: &[String]) -> Vec<EvaluatedNode> {
        let mut nodes = Vec::with_capacity(1 + self.bubbled.len() + self.nested.len());
        if !self.declarations.is_empty() {
            nodes.push(EvaluatedNode::Rule(EvaluatedRule {
                selectors: selectors.to_vec(),
                declarations: self.declarations,
            }));
        }
        nodes.extend(self.bubbled);
        nodes.extend(self.nested);
        nodes
    }
}

/// 渲染整棵树。每次调用使用全新的作用域与索引，互不共享状态。
pub fn render_stylesheet(tree: &Stylesheet, context: EvalContext) -> LessResult<EvaluatedStylesheet> {
    let collected = collect(&tree.nodes);
    debug!(
        mixins = collected.mixins.len(),
        extends = !collected.extends.is_empty(),
        "collected definitions"
    );
    let mut renderer = Renderer::new(&collected, context);
    renderer.render(&tree.nodes)
}

/// 负责维护作用域并把语法树展开为扁平化 CSS 规则。
pub struct Renderer<'a> {
    scope: ScopeStack<'a>,
    collected: &'a Collected<'a>,
    context: EvalContext,
    mixin_depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(collected: &'a Collected<'a>, context: EvalContext) -> Self {
        Self {
            scope: ScopeStack::new(),
            collected,
            context,
            mixin_depth: 0,
        }
    }

    pub fn render(&mut self, nodes: &'a [Node]) -> LessResult<EvaluatedStylesheet> {
        self.hoist(nodes);
        let mut stylesheet = EvaluatedStylesheet::default();
        for node in nodes {
            match node {
                Node::Comment(text) => stylesheet.nodes.push(EvaluatedNode::Comment(text.clone())),
                Node::Import(import) => stylesheet.imports.push(import.raw.clone()),
                Node::Block(block) => {
                    let produced = if block.is_at_rule() {
                        self.render_at_rule(block, &[])?
                    } else {
                        self.render_block(block, &[])?
                    };
                    stylesheet.nodes.extend(produced);
                }
                other => {
                    let mut out = RuleOutput::default();
                    self.render_children(std::slice::from_ref(other), &[], &mut out)?;
                    if let Some(decl) = out.declarations.first() {
                        return Err(LessError::eval(format!(
                            "顶层不能出现属性声明: {}",
                            decl.name
                        )));
                    }
                    stylesheet.nodes.extend(out.bubbled);
                    stylesheet.nodes.extend(out.nested);
                }
            }
        }
        Ok(stylesheet)
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.scope, &self.context)
    }

    /// 把一组子节点中的变量赋值与规则集变量写入栈顶帧，后出现的覆盖先出现的。
    fn hoist(&mut self, nodes: &'a [Node]) {
        for node in nodes {
            match node {
                Node::Declaration(decl) if decl.is_variable_assignment() => {
                    self.scope.set_value(decl.variable_name(), decl.value.clone());
                }
                Node::BlockVariable(variable) => {
                    self.scope
                        .set(variable.name.clone(), Binding::Ruleset(&variable.children));
                }
                _ => {}
            }
        }
    }

    fn guard_holds(&self, block: &Block) -> LessResult<bool> {
        match &block.guard {
            Some(guard) => self.evaluator().evaluate_guard(&guard.condition),
            None => Ok(true),
        }
    }

    fn render_block(&mut self, block: &'a Block, parents: &[String]) -> LessResult<Vec<EvaluatedNode>> {
        if block.params.is_some() {
            return Ok(Vec::new());
        }

        self.scope.push();
        self.hoist(&block.children);
        let result = self.render_block_body(block, parents);
        self.scope.pop()?;
        result
    }

    fn render_block_body(&mut self, block: &'a Block, parents: &[String]) -> LessResult<Vec<EvaluatedNode>> {
        if !self.guard_holds(block)? {
            return Ok(Vec::new());
        }
        let (context, emitted) = self.resolve_selectors(block, parents)?;
        let mut out = RuleOutput::default();
        self.render_children(&block.children, &context, &mut out)?;
        Ok(out.into_nodes(&emitted))
    }

    /// 返回 (子节点使用的父选择器, 输出时带 extend 的选择器)。
    fn resolve_selectors(&self, block: &Block, parents: &[String]) -> LessResult<(Vec<String>, Vec<String>)> {
        let evaluator = self.evaluator();
        let mut own = Vec::with_capacity(block.selectors.len());
        for raw in &block.selectors {
            let interpolated = evaluator.interpolate(raw)?;
            let (selector, _) = strip_extend(&interpolated);
            if !selector.is_empty() {
                own.push(selector);
            }
        }
        let composed = compose_all(parents, &own);
        let mut emitted = composed.clone();
        for selector in &composed {
            for extender in self.collected.extends.extenders(selector) {
                if !emitted.contains(&extender) {
                    emitted.push(extender);
                }
            }
        }
        Ok((composed, emitted))
    }

    fn render_children(
        &mut self,
        children: &'a [Node],
        selectors: &[String],
        out: &mut RuleOutput,
    ) -> LessResult<()> {
        for child in children {
            match child {
                Node::Declaration(decl) if decl.is_ruleset_invocation() => {
                    self.splice_ruleset(decl, selectors, out)?;
                }
                Node::Declaration(decl) if decl.is_variable_assignment() => {}
                Node::Declaration(decl) => {
                    if let Some(evaluated) = self.render_declaration(decl)? {
                        out.declarations.push(evaluated);
                    }
                }
                Node::Block(block) if block.is_at_rule() => {
                    let produced = self.render_at_rule(block, selectors)?;
                    if selectors.is_empty() {
                        out.nested.extend(produced);
                    } else {
                        out.bubbled.extend(produced);
                    }
                }
                Node::Block(block) => {
                    let produced = self.render_block(block, selectors)?;
                    out.nested.extend(produced);
                }
                Node::MixinCall(call) if call.is_extend() => {}
                Node::MixinCall(call) => self.expand_mixin(call, selectors, out)?,
                Node::Each(each) => self.render_each(each, selectors, out)?,
                Node::Comment(_) | Node::Import(_) | Node::BlockVariable(_) => {}
            }
        }
        Ok(())
    }

    fn render_declaration(&self, decl: &Decl) -> LessResult<Option<EvaluatedDeclaration>> {
        let evaluator = self.evaluator();
        let name = evaluator
            .interpolate(&decl.key)
            .map_err(|err| err.in_declaration(decl.key.as_str()))?;
        let (raw, important) = split_important(&decl.value);
        let value = if name.starts_with("--") {
            evaluator.interpolate(raw)
        } else {
            evaluator.evaluate(raw)
        };
        match value {
            Ok(value) => Ok(Some(EvaluatedDeclaration {
                name,
                value,
                important,
            })),
            Err(err)
                if !self.context.strict
                    && matches!(err.root_cause(), LessError::ImageResolutionError { .. }) =>
            {
                warn!(property = %name, error = %err, "dropping declaration with unresolved image");
                Ok(None)
            }
            Err(err) => Err(err.in_declaration(name)),
        }
    }

    /// `@name();`：在当前位置原地展开规则集，不新建作用域帧。
    fn splice_ruleset(&mut self, decl: &Decl, selectors: &[String], out: &mut RuleOutput) -> LessResult<()> {
        let name = decl.variable_name();
        let Some(children) = self.scope.ruleset(name) else {
            return Err(LessError::eval(format!("未定义的规则集 @{name}")));
        };
        self.hoist(children);
        self.render_children(children, selectors, out)
    }

    fn render_at_rule(&mut self, block: &'a Block, parents: &[String]) -> LessResult<Vec<EvaluatedNode>> {
        let header = block.selectors.first().map(String::as_str).unwrap_or_default();
        let header = header.trim_start_matches('@');
        let (name, raw_params) = match header.split_once(char::is_whitespace) {
            Some((name, params)) => (name.to_string(), params.trim()),
            None => (header.to_string(), ""),
        };
        let params = {
            let evaluator = self.evaluator();
            let interpolated = evaluator.interpolate(raw_params)?;
            evaluator.substitute_variables(&interpolated)?
        };
        let conditional = CONDITIONAL_AT_RULES.contains(&name.to_ascii_lowercase().as_str());
        let context: &[String] = if conditional { parents } else { &[] };

        self.scope.push();
        self.hoist(&block.children);
        let mut out = RuleOutput::default();
        let result = self.render_children(&block.children, context, &mut out);
        self.scope.pop()?;
        result?;

        let mut at_rule = EvaluatedAtRule {
            name,
            params,
            declarations: Vec::new(),
            children: Vec::new(),
        };
        if context.is_empty() {
            at_rule.declarations = out.declarations;
        } else if !out.declarations.is_empty() {
            at_rule.children.push(EvaluatedNode::Rule(EvaluatedRule {
                selectors: context.to_vec(),
                declarations: out.declarations,
            }));
        }

        // 嵌套的同名条件 at-rule 提到外层，条件以 and 连接。
        let mut hoisted = Vec::new();
        for child in out.bubbled.into_iter().chain(out.nested) {
            match child {
                EvaluatedNode::AtRule(mut inner) if conditional && inner.name == at_rule.name => {
                    inner.params = format!("{} and {}", at_rule.params, inner.params);
                    hoisted.push(EvaluatedNode::AtRule(inner));
                }
                other => at_rule.children.push(other),
            }
        }

        let mut produced = Vec::with_capacity(1 + hoisted.len());
        if !at_rule.declarations.is_empty() || !at_rule.children.is_empty() {
            produced.push(EvaluatedNode::AtRule(at_rule));
        }
        produced.extend(hoisted);
        Ok(produced)
    }

    fn expand_mixin(&mut self, call: &MixinCall, selectors: &[String], out: &mut RuleOutput) -> LessResult<()> {
        let collected = self.collected;
        let candidates = collected.mixins.get(&call.name);
        if candidates.is_empty() {
            return Err(LessError::eval(format!("未定义的 mixin {}", call.name)));
        }
        if self.mixin_depth >= MAX_MIXIN_DEPTH {
            return Err(LessError::MixinRecursionLimit {
                name: call.name.clone(),
                depth: MAX_MIXIN_DEPTH,
            });
        }

        let arguments = self.evaluate_arguments(call)?;
        let chosen = select_candidates(candidates, arguments.len());
        debug!(
            mixin = %call.name,
            args = arguments.len(),
            candidates = candidates.len(),
            selected = chosen.len(),
            "expanding mixin"
        );
        if chosen.is_empty() {
            return Err(LessError::eval(format!(
                "没有与 {} 个参数匹配的 mixin 定义 {}",
                arguments.len(),
                call.name
            )));
        }

        self.mixin_depth += 1;
        let mut result = Ok(());
        for block in chosen {
            result = self.expand_definition(block, &arguments, call.important, selectors, out);
            if result.is_err() {
                break;
            }
        }
        self.mixin_depth -= 1;
        result
    }

    /// 在调用方作用域中求值实参，`@name: value` 形式为具名实参。
    fn evaluate_arguments(&self, call: &MixinCall) -> LessResult<Vec<Argument>> {
        let caller = self.scope.snapshot();
        let evaluator = Evaluator::new(&caller, &self.context);
        call.args
            .iter()
            .map(|raw| -> LessResult<Argument> {
                let (name, value) = match named_argument(raw) {
                    Some((name, value)) => (Some(name.to_string()), value),
                    None => (None, raw.as_str()),
                };
                Ok(Argument {
                    name,
                    value: evaluator.evaluate(value)?,
                })
            })
            .collect()
    }

    fn expand_definition(
        &mut self,
        block: &'a Block,
        arguments: &[Argument],
        important: bool,
        selectors: &[String],
        out: &mut RuleOutput,
    ) -> LessResult<()> {
        self.scope.push();
        let result = self.expand_definition_body(block, arguments, important, selectors, out);
        self.scope.pop()?;
        result
    }

    fn expand_definition_body(
        &mut self,
        block: &'a Block,
        arguments: &[Argument],
        important: bool,
        selectors: &[String],
        out: &mut RuleOutput,
    ) -> LessResult<()> {
        if let Some(params) = &block.params {
            let mut positional = arguments.iter().filter(|arg| arg.name.is_none());
            let mut bound = Vec::with_capacity(params.len());
            for param in params {
                let named = arguments
                    .iter()
                    .find(|arg| arg.name.as_deref() == Some(param.name.as_str()));
                let value = match named.or_else(|| positional.next()) {
                    Some(arg) => arg.value.clone(),
                    None => match &param.default {
                        Some(default) => default.clone(),
                        None => {
                            return Err(LessError::eval(format!(
                                "mixin {} 缺少参数 @{}",
                                block.selectors.join(", "),
                                param.name
                            )))
                        }
                    },
                };
                self.scope.set_value(param.name.clone(), value.clone());
                bound.push(value);
            }
            self.scope.set_value("arguments", bound.join(" "));
        }
        self.hoist(&block.children);
        if !self.guard_holds(block)? {
            return Ok(());
        }

        let mut expanded = RuleOutput::default();
        self.render_children(&block.children, selectors, &mut expanded)?;
        if important {
            for decl in &mut expanded.declarations {
                decl.important = true;
            }
            mark_important(&mut expanded.bubbled);
            mark_important(&mut expanded.nested);
        }
        out.append(expanded);
        Ok(())
    }

    /// 循环变量写在当前帧中，结束后恢复原绑定。
    fn render_each(&mut self, each: &'a Each, selectors: &[String], out: &mut RuleOutput) -> LessResult<()> {
        let items = self.each_items(each)?;
        debug!(list = %each.list, items = items.len(), "expanding each");

        // 循环变量与循环体内的赋值都写入当前帧，结束后逐一还原。
        let mut names = vec![each.variable.as_str(), "key", "index"];
        for name in assigned_names(&each.children) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let saved: Vec<_> = names.iter().map(|name| self.scope.unset(name)).collect();

        let mut result = Ok(());
        for (position, (key, value)) in items.into_iter().enumerate() {
            self.scope.set(each.variable.as_str(), Binding::Value(value));
            self.scope.set("key", Binding::Value(key));
            self.scope.set("index", Binding::Value((position + 1).to_string()));
            self.hoist(&each.children);
            result = self.render_children(&each.children, selectors, out);
            if result.is_err() {
                break;
            }
        }
        for (name, binding) in names.iter().zip(saved) {
            match binding {
                Some(binding) => self.scope.set(*name, binding),
                None => self.scope.unset(name),
            };
        }
        result
    }

    /// 返回 (键, 值) 列表：规则集变量按声明展开，普通列表的键为 1 起的序号。
    fn each_items(&self, each: &Each) -> LessResult<Vec<(String, String)>> {
        let list = each.list.trim();
        if let Some(children) = list.strip_prefix('@').and_then(|name| self.scope.ruleset(name)) {
            let evaluator = self.evaluator();
            let mut items = Vec::new();
            for child in children {
                if let Node::Declaration(decl) = child {
                    let key = decl.key.trim_start_matches('@').to_string();
                    items.push((key, evaluator.evaluate(&decl.value)?));
                }
            }
            return Ok(items);
        }
        let evaluated = self.evaluator().evaluate(list)?;
        Ok(split_list(&evaluated)
            .into_iter()
            .enumerate()
            .map(|(idx, item)| ((idx + 1).to_string(), item))
            .collect())
    }
}

#[derive(Debug, Clone)]
struct Argument {
    name: Option<String>,
    value: String,
}

/// 节点列表中直接赋值的变量名（含规则集变量）。
fn assigned_names(nodes: &[Node]) -> impl Iterator<Item = &str> {
    nodes.iter().filter_map(|node| match node {
        Node::Declaration(decl) if decl.is_variable_assignment() => Some(decl.variable_name()),
        Node::BlockVariable(variable) => Some(variable.name.as_str()),
        _ => None,
    })
}

fn named_argument(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.trim().strip_prefix('@')?;
    let (name, value) = rest.split_once(':')?;
    let name = name.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    valid.then_some((name, value.trim()))
}

/// 按参数个数挑选候选定义：先精确匹配，再考虑可选参数，最后退化到按有无参数匹配。
fn select_candidates<'a>(candidates: &[&'a Block], argc: usize) -> Vec<&'a Block> {
    let tiers: [&dyn Fn(&Block) -> bool; 3] = [
        &|block: &Block| block.param_count() == argc,
        &|block: &Block| {
            block.params.is_some()
                && block.required_param_count() <= argc
                && argc <= block.param_count()
        },
        &|block: &Block| {
            if argc == 0 {
                block.param_count() == 0
            } else {
                block.param_count() > 0
            }
        },
    ];
    for tier in tiers {
        let matched: Vec<&Block> = candidates.iter().copied().filter(|block| tier(*block)).collect();
        if !matched.is_empty() {
            return matched;
        }
    }
    Vec::new()
}

fn split_important(value: &str) -> (&str, bool) {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();
    match lowered.rfind('!') {
        Some(idx) if lowered[idx + 1..].trim() == "important" => {
            (trimmed[..idx].trim_end(), true)
        }
        _ => (trimmed, false),
    }
}

fn mark_important(nodes: &mut [EvaluatedNode]) {
    for node in nodes {
        match node {
            EvaluatedNode::Rule(rule) => {
                for decl in &mut rule.declarations {
                    decl.important = true;
                }
            }
            EvaluatedNode::AtRule(at_rule) => {
                for decl in &mut at_rule.declarations {
                    decl.important = true;
                }
                mark_important(&mut at_rule.children);
            }
            EvaluatedNode::Comment(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MixinParam;
    use crate::parser::LessParser;

    fn render(src: &str) -> LessResult<EvaluatedStylesheet> {
        let tree = LessParser::new().parse(src)?;
        render_stylesheet(&tree, EvalContext::default())
    }

    fn rule(node: &EvaluatedNode) -> &EvaluatedRule {
        match node {
            EvaluatedNode::Rule(rule) => rule,
            other => panic!("expected rule, got {other:?}"),
        }
    }

    fn selected_arity(candidates: &[&Block], argc: usize) -> Vec<usize> {
        select_candidates(candidates, argc)
            .iter()
            .map(|b| b.param_count())
            .collect()
    }

    fn mixin(arity: usize, required: usize) -> Block {
        let params = (0..arity)
            .map(|i| MixinParam {
                name: format!("p{i}"),
                default: (i >= required).then(|| "0".to_string()),
            })
            .collect();
        Block {
            selectors: vec![".m".to_string()],
            params: Some(params),
            mixin_only: true,
            ..Block::default()
        }
    }

    #[test]
    fn candidate_tiers() {
        let zero = mixin(0, 0);
        let one = mixin(1, 1);
        let optional = mixin(2, 1);
        let all = [&zero, &one, &optional];
        assert_eq!(selected_arity(&all, 1), vec![1]);
        assert_eq!(selected_arity(&all, 0), vec![0]);
        assert_eq!(selected_arity(&[&zero, &optional], 1), vec![2]);
        assert_eq!(selected_arity(&[&zero, &one], 3), vec![1]);
        assert!(selected_arity(&[&one], 0).is_empty());
    }

    #[test]
    fn important_suffix_is_split() {
        assert_eq!(split_important("10px !important"), ("10px", true));
        assert_eq!(split_important("red ! IMPORTANT"), ("red", true));
        assert_eq!(split_important("red"), ("red", false));
    }

    #[test]
    fn named_arguments_are_detected() {
        assert_eq!(named_argument("@size: 10px"), Some(("size", "10px")));
        assert_eq!(named_argument("10px"), None);
        assert_eq!(named_argument("@{x}: y"), None);
    }

    #[test]
    fn scope_is_balanced_after_render() {
        let tree = LessParser::new()
            .parse("@a: 1px; .x { @b: 2px; .y { width: @a + @b; } }")
            .unwrap();
        let collected = collect(&tree.nodes);
        let mut renderer = Renderer::new(&collected, EvalContext::default());
        let sheet = renderer.render(&tree.nodes).unwrap();
        assert_eq!(renderer.scope.depth(), 1);
        let inner = rule(&sheet.nodes[0]);
        assert_eq!(inner.selectors, vec![".x .y"]);
        assert_eq!(inner.declarations[0].value, "3px");
    }

    #[test]
    fn each_restores_loop_bindings() {
        let tree = LessParser::new()
            .parse("@value: keep; each(a b, { .i-@{value} { n: @index; } }); .after { v: @value; }")
            .unwrap();
        let sheet = render_stylesheet(&tree, EvalContext::default()).unwrap();
        let selectors: Vec<_> = sheet.nodes.iter().map(|n| rule(n).selectors[0].clone()).collect();
        assert_eq!(selectors, vec![".i-a", ".i-b", ".after"]);
        assert_eq!(rule(&sheet.nodes[1]).declarations[0].value, "2");
        assert_eq!(rule(&sheet.nodes[2]).declarations[0].value, "keep");
    }

    #[test]
    fn each_body_assignments_are_scoped_to_the_loop() {
        let tree = LessParser::new()
            .parse("@w: outer; each(1 2, { @w: (@value * 10px); .c-@{value} { width: @w; } }); .after { w: @w; }")
            .unwrap();
        let sheet = render_stylesheet(&tree, EvalContext::default()).unwrap();
        let values: Vec<_> = sheet
            .nodes
            .iter()
            .map(|n| rule(n).declarations[0].value.clone())
            .collect();
        assert_eq!(values, vec!["10px", "20px", "outer"]);
    }

    #[test]
    fn self_recursive_mixins_hit_the_limit() {
        let err = render(".loop() { .loop(); }\n.a { .loop(); }").unwrap_err();
        assert!(matches!(err, LessError::MixinRecursionLimit { depth: MAX_MIXIN_DEPTH, .. }));
    }

    #[test]
    fn top_level_declarations_are_rejected() {
        assert!(matches!(render("color: red;"), Err(LessError::EvalError(_))));
    }

    #[test]
    fn value_errors_carry_the_property() {
        let err = render(".a { width: 10px + 2em; }").unwrap_err();
        match err {
            LessError::Declaration { property, source } => {
                assert_eq!(property, "width");
                assert!(matches!(*source, LessError::UnitMismatch { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_images_drop_the_declaration_in_lenient_mode() {
        let sheet = render(".a { width: image-width(\"missing.png\"); color: red; }").unwrap();
        let decls = &rule(&sheet.nodes[0]).declarations;
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "color");

        let tree = LessParser::new()
            .parse(".a { width: image-width(\"missing.png\"); }")
            .unwrap();
        let strict = EvalContext {
            strict: true,
            ..EvalContext::default()
        };
        let err = render_stylesheet(&tree, strict).unwrap_err();
        assert!(matches!(err.root_cause(), LessError::ImageResolutionError { .. }));
    }
}
