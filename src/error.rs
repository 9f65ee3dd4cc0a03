use thiserror::Error;

/// 编译过程中统一的错误类型。
#[derive(Debug, Error)]
pub enum LessError {
    #[error("解析失败: {message} (位置 {position})")]
    ParseError { message: String, position: usize },
    #[error("语义求值失败: {0}")]
    EvalError(String),
    #[error("单位不兼容: {left} {op} {right}")]
    UnitMismatch {
        op: char,
        left: String,
        right: String,
    },
    #[error("除法分母不能为 0")]
    DivisionByZero,
    #[error("未知函数 {0}()")]
    UnknownFunction(String),
    #[error("函数 {name}() 参数个数不匹配: 期望 {expected}，实际 {found}")]
    FunctionArity {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("guard 条件求值失败: {0}")]
    GuardEvalError(String),
    #[error("mixin {name} 递归深度超过上限 {depth}")]
    MixinRecursionLimit { name: String, depth: usize },
    #[error("无法读取图片 {path}: {reason}")]
    ImageResolutionError { path: String, reason: String },
    #[error("未定义的变量 @{0}")]
    UndefinedVariable(String),
    #[error("属性 {property} 求值失败: {source}")]
    Declaration {
        property: String,
        #[source]
        source: Box<LessError>,
    },
}

pub type LessResult<T> = Result<T, LessError>;

impl LessError {
    pub fn parse<S: Into<String>>(message: S, position: usize) -> Self {
        LessError::ParseError {
            message: message.into(),
            position,
        }
    }

    pub fn eval<S: Into<String>>(message: S) -> Self {
        LessError::EvalError(message.into())
    }

    pub fn guard<S: Into<String>>(message: S) -> Self {
        LessError::GuardEvalError(message.into())
    }

    pub fn image<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        LessError::ImageResolutionError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 把单个属性求值中的错误挂到该属性上，供调用方决定跳过或中止。
    pub fn in_declaration<S: Into<String>>(self, property: S) -> Self {
        match self {
            already @ LessError::Declaration { .. } => already,
            other => LessError::Declaration {
                property: property.into(),
                source: Box::new(other),
            },
        }
    }

    /// 去掉属性上下文后的根因。
    pub fn root_cause(&self) -> &LessError {
        match self {
            LessError::Declaration { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_context_wraps_once() {
        let err = LessError::DivisionByZero
            .in_declaration("width")
            .in_declaration("height");
        match &err {
            LessError::Declaration { property, .. } => assert_eq!(property, "width"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(err.root_cause(), LessError::DivisionByZero));
        assert!(err.to_string().contains("width"));
    }
}
