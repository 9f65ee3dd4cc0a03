//! 渲染之前把 `.less` 的 `@import` 原地展开，CSS 导入保留为 Import 节点。

use crate::ast::{Node, Stylesheet};
use crate::error::{LessError, LessResult};
use crate::parser::LessParser;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ImportResolver<'a> {
    parser: &'a LessParser,
    include_paths: Vec<PathBuf>,
    cache: HashMap<PathBuf, Stylesheet>,
    stack: Vec<PathBuf>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(parser: &'a LessParser, include_paths: &[PathBuf]) -> Self {
        Self {
            parser,
            include_paths: include_paths.to_vec(),
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn expand(&mut self, nodes: Vec<Node>, current_dir: Option<&Path>) -> LessResult<Vec<Node>> {
        let mut result = Vec::with_capacity(nodes.len());
        for node in nodes {
            let target = match &node {
                Node::Import(import) if !import.is_css => import.path.clone(),
                _ => None,
            };
            let Some(target) = target else {
                result.push(node);
                continue;
            };

            let resolved = self.resolve_path(&target, current_dir)?;
            if self.stack.contains(&resolved) {
                return Err(LessError::eval(format!(
                    "检测到循环导入: {}",
                    resolved.display()
                )));
            }
            debug!(path = %resolved.display(), "splicing import");
            self.stack.push(resolved.clone());
            let stylesheet = self.load_stylesheet(&resolved)?;
            let expanded = self.expand(stylesheet.nodes, resolved.parent())?;
            self.stack.pop();
            result.extend(expanded);
        }
        Ok(result)
    }

    fn load_stylesheet(&mut self, path: &Path) -> LessResult<Stylesheet> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(cached.clone());
        }
        let content = fs::read_to_string(path)
            .map_err(|err| LessError::eval(format!("读取文件 {} 失败: {err}", path.display())))?;
        let stylesheet = self
            .parser
            .parse(&content)
            .map_err(|err| attach_path(err, path))?;
        self.cache.insert(path.to_path_buf(), stylesheet.clone());
        Ok(stylesheet)
    }

    fn resolve_path(&self, target: &str, current_dir: Option<&Path>) -> LessResult<PathBuf> {
        let raw = Path::new(target);
        let mut candidates = Vec::new();
        if raw.is_absolute() {
            candidates.push(raw.to_path_buf());
        } else {
            if let Some(dir) = current_dir {
                candidates.push(dir.join(raw));
            }
            for base in &self.include_paths {
                candidates.push(base.join(raw));
            }
        }
        candidates
            .iter()
            .find_map(|candidate| find_existing(candidate))
            .ok_or_else(|| LessError::eval(format!("无法解析 @import 路径 {target}")))
    }
}

/// 展开整棵树中的 `.less` 导入。
pub fn expand_imports(
    parser: &LessParser,
    stylesheet: Stylesheet,
    current_dir: Option<&Path>,
    include_paths: &[PathBuf],
) -> LessResult<Stylesheet> {
    let mut resolver = ImportResolver::new(parser, include_paths);
    let nodes = resolver.expand(stylesheet.nodes, current_dir)?;
    Ok(Stylesheet::new(nodes))
}

/// 没有扩展名时补上 `.less`。
fn find_existing(candidate: &Path) -> Option<PathBuf> {
    let mut attempts = vec![candidate.to_path_buf()];
    if candidate.extension().is_none() {
        attempts.push(candidate.with_extension("less"));
    }
    attempts
        .into_iter()
        .find(|attempt| attempt.is_file())
        .map(|attempt| attempt.canonicalize().unwrap_or(attempt))
}

fn attach_path(err: LessError, path: &Path) -> LessError {
    match err {
        LessError::ParseError { message, position } => LessError::ParseError {
            message: format!("{message} (文件: {})", path.display()),
            position,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "less_engine_import_{name}_{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn splices_imports_in_place() {
        let dir = scratch("splice");
        fs::write(dir.join("vars.less"), "@c: red;\n.from-import { a: b; }").unwrap();
        let parser = LessParser::new();
        let tree = parser
            .parse("@import \"vars\";\n@import \"theme.css\";\n.a { color: @c; }")
            .unwrap();
        let expanded = expand_imports(&parser, tree, Some(&dir), &[]).unwrap();
        let kinds: Vec<&str> = expanded
            .nodes
            .iter()
            .map(|node| match node {
                Node::Declaration(_) => "decl",
                Node::Block(_) => "block",
                Node::Import(_) => "import",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["decl", "block", "import", "block"]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_cycles() {
        let dir = scratch("cycle");
        fs::write(dir.join("a.less"), "@import \"b.less\";").unwrap();
        fs::write(dir.join("b.less"), "@import \"a.less\";").unwrap();
        let parser = LessParser::new();
        let tree = parser.parse("@import \"a.less\";").unwrap();
        let err = expand_imports(&parser, tree, Some(&dir), &[]).unwrap_err();
        assert!(err.to_string().contains("循环导入"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn searches_include_paths_and_reports_missing() {
        let dir = scratch("include");
        fs::write(dir.join("shared.less"), ".s { a: b; }").unwrap();
        let parser = LessParser::new();
        let tree = parser.parse("@import \"shared\";").unwrap();
        let expanded = expand_imports(&parser, tree, None, &[dir.clone()]).unwrap();
        assert_eq!(expanded.nodes.len(), 1);

        let missing = parser.parse("@import \"nowhere\";").unwrap();
        assert!(expand_imports(&parser, missing, Some(&dir), &[]).is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
