use crate::renderer::{
    EvaluatedAtRule, EvaluatedDeclaration, EvaluatedNode, EvaluatedRule, EvaluatedStylesheet,
};
use crate::utils::{collapse_whitespace, indent};

/// 负责将扁平化的规则转换为最终 CSS 文本。
pub struct Serializer {
    minify: bool,
}

impl Serializer {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }

    pub fn to_css(&self, stylesheet: &EvaluatedStylesheet) -> String {
        if self.minify {
            self.render_minified(stylesheet)
        } else {
            self.render_pretty(stylesheet)
        }
    }

    /// 两空格缩进，每行以换行结尾，不输出空行。
    fn render_pretty(&self, stylesheet: &EvaluatedStylesheet) -> String {
        let mut output = String::new();
        for import in &stylesheet.imports {
            output.push_str(import.trim());
            output.push('\n');
        }
        for node in &stylesheet.nodes {
            self.render_node_pretty(node, 0, &mut output);
        }
        output
    }

    fn render_minified(&self, stylesheet: &EvaluatedStylesheet) -> String {
        let mut output = String::new();
        for import in &stylesheet.imports {
            output.push_str(import.trim());
        }
        for node in &stylesheet.nodes {
            self.render_node_minified(node, &mut output);
        }
        output
    }

    fn format_declaration(&self, decl: &EvaluatedDeclaration) -> String {
        let mut result = format!("{}: {}", decl.name.trim(), decl.value.trim());
        if decl.important {
            result.push_str(" !important");
        }
        result.push(';');
        result
    }

    fn format_declaration_minified(&self, decl: &EvaluatedDeclaration) -> String {
        let mut result = format!("{}:{}", decl.name.trim(), collapse_whitespace(&decl.value));
        if decl.important {
            result.push_str("!important");
        }
        result
    }

    fn render_node_pretty(&self, node: &EvaluatedNode, level: usize, output: &mut String) {
        match node {
            EvaluatedNode::Rule(rule) => self.render_rule_pretty(rule, level, output),
            EvaluatedNode::AtRule(at_rule) => self.render_at_rule_pretty(at_rule, level, output),
            EvaluatedNode::Comment(text) => {
                for line in text.trim().lines() {
                    output.push_str(&indent(level));
                    output.push_str(line.trim_end());
                    output.push('\n');
                }
            }
        }
    }

    fn render_rule_pretty(&self, rule: &EvaluatedRule, level: usize, output: &mut String) {
        if rule.declarations.is_empty() {
            return;
        }
        output.push_str(&indent(level));
        output.push_str(&rule.selectors.join(", "));
        output.push_str(" {\n");
        self.render_declarations_pretty(&rule.declarations, level + 1, output);
        output.push_str(&indent(level));
        output.push_str("}\n");
    }

    fn render_declarations_pretty(&self, declarations: &[EvaluatedDeclaration], level: usize, output: &mut String) {
        for decl in declarations {
            output.push_str(&indent(level));
            output.push_str(&self.format_declaration(decl));
            output.push('\n');
        }
    }

    fn render_at_rule_pretty(&self, at_rule: &EvaluatedAtRule, level: usize, output: &mut String) {
        output.push_str(&indent(level));
        output.push('@');
        output.push_str(&at_rule.name);
        if !at_rule.params.trim().is_empty() {
            output.push(' ');
            output.push_str(at_rule.params.trim());
        }
        output.push_str(" {\n");
        self.render_declarations_pretty(&at_rule.declarations, level + 1, output);
        for child in &at_rule.children {
            self.render_node_pretty(child, level + 1, output);
        }
        output.push_str(&indent(level));
        output.push_str("}\n");
    }

    fn render_node_minified(&self, node: &EvaluatedNode, output: &mut String) {
        match node {
            EvaluatedNode::Rule(rule) => self.render_rule_minified(rule, output),
            EvaluatedNode::AtRule(at_rule) => self.render_at_rule_minified(at_rule, output),
            EvaluatedNode::Comment(_) => {}
        }
    }

    fn render_rule_minified(&self, rule: &EvaluatedRule, output: &mut String) {
        if rule.declarations.is_empty() {
            return;
        }
        output.push_str(&rule.selectors.join(","));
        output.push('{');
        self.render_declarations_minified(&rule.declarations, output);
        output.push('}');
    }

    fn render_declarations_minified(&self, declarations: &[EvaluatedDeclaration], output: &mut String) {
        for (idx, decl) in declarations.iter().enumerate() {
            if idx > 0 {
                output.push(';');
            }
            output.push_str(&self.format_declaration_minified(decl));
        }
    }

    fn render_at_rule_minified(&self, at_rule: &EvaluatedAtRule, output: &mut String) {
        output.push('@');
        output.push_str(&at_rule.name);
        if !at_rule.params.trim().is_empty() {
            output.push(' ');
            output.push_str(&collapse_whitespace(&at_rule.params));
        }
        output.push('{');
        self.render_declarations_minified(&at_rule.declarations, output);
        for child in &at_rule.children {
            self.render_node_minified(child, output);
        }
        output.push('}');
    }
}
