//! 变量作用域栈：后进先出的帧，查找总是由内向外。

use crate::ast::Node;
use crate::error::{LessError, LessResult};
use indexmap::IndexMap;

/// 帧中绑定的内容：原始值文本或分离规则集。
#[derive(Debug, Clone)]
pub enum Binding<'a> {
    Value(String),
    Ruleset(&'a [Node]),
}

/// 表达式与 guard 求值时使用的变量来源。
pub trait Variables {
    /// 返回变量的原始文本，未定义时返回 `None`。
    fn variable(&self, name: &str) -> Option<&str>;
}

#[derive(Debug)]
pub struct ScopeStack<'a> {
    frames: Vec<IndexMap<String, Binding<'a>>>,
}

impl<'a> Default for ScopeStack<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ScopeStack<'a> {
    /// 新建只含全局帧的栈。
    pub fn new() -> Self {
        Self {
            frames: vec![IndexMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(IndexMap::new());
    }

    /// 弹出栈顶帧，全局帧不可弹出。
    pub fn pop(&mut self) -> LessResult<()> {
        if self.frames.len() <= 1 {
            return Err(LessError::eval("不能弹出全局作用域"));
        }
        self.frames.pop();
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// 写入栈顶帧，返回该帧中被覆盖的旧绑定。
    pub fn set<S: Into<String>>(&mut self, name: S, binding: Binding<'a>) -> Option<Binding<'a>> {
        self.top_mut().insert(name.into(), binding)
    }

    pub fn set_value<S: Into<String>, V: Into<String>>(&mut self, name: S, value: V) {
        self.set(name, Binding::Value(value.into()));
    }

    /// 从栈顶帧删除绑定。
    pub fn unset(&mut self, name: &str) -> Option<Binding<'a>> {
        self.top_mut().shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Binding<'a>> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn ruleset(&self, name: &str) -> Option<&'a [Node]> {
        match self.get(name) {
            Some(Binding::Ruleset(children)) => Some(children),
            _ => None,
        }
    }

    /// 把所有可见帧压平成一张表，内层覆盖外层。
    pub fn snapshot(&self) -> Snapshot {
        let mut values = IndexMap::new();
        for frame in &self.frames {
            for (name, binding) in frame {
                if let Binding::Value(value) = binding {
                    values.insert(name.clone(), value.clone());
                } else {
                    values.shift_remove(name);
                }
            }
        }
        Snapshot { values }
    }

    fn top_mut(&mut self) -> &mut IndexMap<String, Binding<'a>> {
        if self.frames.is_empty() {
            self.frames.push(IndexMap::new());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl<'a> Variables for ScopeStack<'a> {
    fn variable(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Binding::Value(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// 作用域栈某一时刻的扁平视图。
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: IndexMap<String, String>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Variables for Snapshot {
    fn variable(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frames_shadow_outer() {
        let mut scope = ScopeStack::new();
        scope.set_value("color", "red");
        scope.push();
        scope.set_value("color", "blue");
        assert_eq!(scope.variable("color"), Some("blue"));
        scope.pop().unwrap();
        assert_eq!(scope.variable("color"), Some("red"));
    }

    #[test]
    fn missing_names_are_not_found() {
        let scope = ScopeStack::new();
        assert_eq!(scope.variable("nope"), None);
    }

    #[test]
    fn global_frame_cannot_be_popped() {
        let mut scope = ScopeStack::new();
        assert!(scope.pop().is_err());
        scope.push();
        assert!(scope.pop().is_ok());
        assert_eq!(scope.depth(), 1);
    }

    #[test]
    fn set_reports_previous_top_binding() {
        let mut scope = ScopeStack::new();
        assert!(scope.set("i", Binding::Value("1".into())).is_none());
        let previous = scope.set("i", Binding::Value("2".into()));
        assert!(matches!(previous, Some(Binding::Value(v)) if v == "1"));
        scope.unset("i");
        assert_eq!(scope.variable("i"), None);
    }

    #[test]
    fn snapshot_flattens_with_top_winning() {
        let mut scope = ScopeStack::new();
        scope.set_value("a", "1");
        scope.set_value("b", "2");
        scope.push();
        scope.set_value("a", "3");
        let snapshot = scope.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.variable("a"), Some("3"));
        assert_eq!(snapshot.variable("b"), Some("2"));
    }
}
