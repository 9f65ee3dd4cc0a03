//! less_engine 库入口，提供面向 Rust 与 Node.js 的 LESS 编译能力。
//! 内部分为四个阶段：解析（Parser）→ 导入展开（Importer）→ 语义求值（Renderer）→ CSS 序列化（Serializer）。

pub mod ast;
pub mod collector;
pub mod color;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod guard;
pub mod image;
pub mod importer;
pub mod parser;
pub mod renderer;
pub mod scope;
pub mod selector;
pub mod serializer;
mod utils;
pub mod value;

pub use crate::ast::Stylesheet;
pub use crate::error::{LessError, LessResult};

use evaluator::EvalContext;
use importer::expand_imports;
use parser::LessParser;
use renderer::render_stylesheet;
use serializer::Serializer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// LESS 编译配置。
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// 是否输出压缩后的 CSS。
    pub minify: bool,
    /// 当前源文件所在目录，用于解析相对 @import，同时作为 image-* 函数的基准目录。
    pub current_dir: Option<PathBuf>,
    /// 额外的检索目录。
    pub include_paths: Vec<PathBuf>,
    /// 严格模式：未定义变量报错，图片读取失败不再跳过。
    pub strict: bool,
}

/// 只做解析，返回语法树。
pub fn parse(source: &str) -> LessResult<Stylesheet> {
    LessParser::new().parse(source)
}

/// 渲染已构建好的语法树，输出格式化后的 CSS。
pub fn render(tree: &Stylesheet, base_dir: Option<&Path>) -> LessResult<String> {
    let options = CompileOptions {
        current_dir: base_dir.map(Path::to_path_buf),
        ..CompileOptions::default()
    };
    render_with_options(tree, &options)
}

pub fn render_with_options(tree: &Stylesheet, options: &CompileOptions) -> LessResult<String> {
    let context = EvalContext {
        base_dir: options.current_dir.clone(),
        strict: options.strict,
    };
    let evaluated = render_stylesheet(tree, context)?;
    Ok(Serializer::new(options.minify).to_css(&evaluated))
}

/// 编译 LESS 源码为 CSS 文本。
///
/// # 参数
/// * `source` - 待编译的 LESS 字符串
/// * `options` - 编译配置
pub fn compile(source: &str, options: CompileOptions) -> LessResult<String> {
    debug!(minify = options.minify, strict = options.strict, "compiling less source");
    let parser = LessParser::new();
    let mut ast = parser.parse(source)?;
    if options.current_dir.is_some() || !options.include_paths.is_empty() {
        ast = expand_imports(
            &parser,
            ast,
            options.current_dir.as_deref(),
            &options.include_paths,
        )?;
    }
    render_with_options(&ast, &options)
}

/// 从文件路径编译 LESS，自动处理 @import。
pub fn compile_file<P: AsRef<Path>>(path: P, mut options: CompileOptions) -> LessResult<String> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
        .map_err(|err| LessError::eval(format!("读取文件 {} 失败: {err}", path.display())))?;
    if let Some(parent) = path.parent() {
        if options.current_dir.is_none() {
            options.current_dir = Some(parent.to_path_buf());
        }
        if options.include_paths.is_empty() {
            options.include_paths.push(parent.to_path_buf());
        }
    }
    compile(&source, options)
}

#[cfg(feature = "node")]
use napi::{Error, Result};
#[cfg(feature = "node")]
use napi_derive::napi;

/// Node.js 侧的编译选项对象。
#[cfg(feature = "node")]
#[napi(object)]
pub struct JsCompileOptions {
    /// 是否压缩输出 CSS。
    pub minify: Option<bool>,
    /// 源文件路径，用于解析 @import 与图片。
    pub filename: Option<String>,
    /// 是否启用严格模式。
    pub strict: Option<bool>,
}

/// 暴露给 Node.js 的编译函数。
#[cfg(feature = "node")]
#[napi]
pub fn compile_less(source: String, options: Option<JsCompileOptions>) -> Result<String> {
    let opt = options.unwrap_or(JsCompileOptions {
        minify: None,
        filename: None,
        strict: None,
    });
    let mut compile_options = CompileOptions {
        minify: opt.minify.unwrap_or(false),
        strict: opt.strict.unwrap_or(false),
        ..CompileOptions::default()
    };
    if let Some(filename) = opt.filename {
        let path = PathBuf::from(&filename);
        if let Some(parent) = path.parent() {
            let dir = parent.to_path_buf();
            compile_options.current_dir = Some(dir.clone());
            compile_options.include_paths.push(dir);
        }
    }
    compile(&source, compile_options).map_err(|err| Error::from_reason(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minified() -> CompileOptions {
        CompileOptions {
            minify: true,
            ..CompileOptions::default()
        }
    }

    #[test]
    fn compile_basic_variable() {
        let src = r"@base: #111;
body {
  color: @base;
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(css, "body {\n  color: #111;\n}\n");
    }

    #[test]
    fn compile_nested_selectors() {
        let src = r".btn {
  color: #fff;
  &:hover {
    color: #000;
  }
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(css, ".btn {\n  color: #fff;\n}\n.btn:hover {\n  color: #000;\n}\n");
    }

    #[test]
    fn compile_important_flag() {
        let src = r"@base: 10px;
.box {
  margin: @base !important;
}";
        let css = compile(src, minified()).unwrap();
        assert_eq!(css, ".box{margin:10px!important}");
    }

    #[test]
    fn compile_mixin_invocation() {
        let src = r".rounded(@radius) {
  border-radius: @radius;
}

.card {
  .rounded(8px);
}";
        let css = compile(src, minified()).unwrap();
        assert_eq!(css, ".card{border-radius:8px}");
    }

    #[test]
    fn compile_arithmetic_expression() {
        let src = r"@base: 10px;
.box {
  width: @base + 5px;
  padding: (@base * 2);
  margin: (@base * 0.75) (@base * 1.5);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("width: 15px;"));
        assert!(css.contains("padding: 20px;"));
        assert!(css.contains("margin: 7.5px 15px;"));
    }

    #[test]
    fn compile_color_functions() {
        let src = r"@brand: #336699;
.btn {
  background: lighten(@brand, 20%);
  border-color: darken(#ffffff, 20%);
  color: fade(#ffffff, 40%);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("background: #6699cc;"));
        assert!(css.contains("border-color: #cccccc;"));
        assert!(css.contains("color: rgba(255, 255, 255, 0.4);"));
    }

    #[test]
    fn compile_mixin_with_default() {
        let src = r".shadow(@blur: 4px) {
  box-shadow: 0 0 @blur rgba(0, 0, 0, 0.2);
}

.panel {
  .shadow();
}

.toast {
  .shadow(8px);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains(".panel {\n  box-shadow: 0 0 4px rgba(0, 0, 0, 0.2);"));
        assert!(css.contains(".toast {\n  box-shadow: 0 0 8px rgba(0, 0, 0, 0.2);"));
    }

    #[test]
    fn compile_color_extremes() {
        let src = r"@white: #ffffff;
.banner {
  color: fade(@white, 100%);
  background: lighten(#000, 0%);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("color: #ffffff;"));
        assert!(css.contains("background: #000000;"));
    }

    #[test]
    fn compile_arithmetic_division_and_negative() {
        let src = r"@gap: 12px;
.grid {
  margin: -(@gap / 2);
  width: (@gap * -2);
}";
        let css = compile(src, CompileOptions::default()).unwrap();
        assert!(css.contains("margin: -6px;"));
        assert!(css.contains("width: -24px;"));
    }

    #[test]
    fn compile_import_statement() {
        let src = r#"@import "reset.css";
@color: #000;
body {
  color: @color;
}"#;
        let pretty = compile(src, CompileOptions::default()).unwrap();
        assert_eq!(pretty, "@import \"reset.css\";\nbody {\n  color: #000;\n}\n");

        let minified = compile(src, minified()).unwrap();
        assert_eq!(minified, "@import \"reset.css\";body{color:#000}");
    }

    #[test]
    fn render_accepts_a_prebuilt_tree() {
        let tree = parse(".a { width: (1px + 2px); }").unwrap();
        assert_eq!(render(&tree, None).unwrap(), ".a {\n  width: 3px;\n}\n");
    }

    #[test]
    fn strict_mode_rejects_unknown_variables() {
        let src = ".a { color: @missing; }";
        assert_eq!(
            compile(src, CompileOptions::default()).unwrap(),
            ".a {\n  color: @missing;\n}\n"
        );
        let strict = CompileOptions {
            strict: true,
            ..CompileOptions::default()
        };
        let err = compile(src, strict).unwrap_err();
        assert!(matches!(err.root_cause(), LessError::UndefinedVariable(name) if name == "missing"));
    }
}
