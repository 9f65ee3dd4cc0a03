//! 内置函数注册表。只读，进程内初始化一次，可被多个并发渲染共享。

use crate::color::{self, Color, Hsl};
use crate::error::{LessError, LessResult};
use crate::evaluator::Evaluator;
use crate::guard;
use crate::image;
use crate::utils::{is_quoted, split_list, unquote};
use crate::value::{convert_unit, format_number, parse_number, Number};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// 参数已求值的函数实现。
pub type Handler = fn(&Evaluator<'_>, &[String]) -> LessResult<String>;

#[derive(Debug, Clone, Copy)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    fn check(&self, name: &str, found: usize) -> LessResult<()> {
        let within = found >= self.min && self.max.map_or(true, |max| found <= max);
        if within {
            return Ok(());
        }
        let expected = match self.max {
            Some(max) if max == self.min => max.to_string(),
            Some(max) => format!("{}-{max}", self.min),
            None => format!("至少 {}", self.min),
        };
        Err(LessError::FunctionArity {
            name: name.to_string(),
            expected,
            found,
        })
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    handler: Handler,
}

impl Builtin {
    pub fn call(&self, evaluator: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
        self.arity.check(self.name, args.len())?;
        (self.handler)(evaluator, args)
    }
}

pub struct FunctionRegistry {
    entries: IndexMap<&'static str, Builtin>,
}

static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::builtin);

impl FunctionRegistry {
    pub fn global() -> &'static FunctionRegistry {
        &REGISTRY
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.entries.get(name.to_ascii_lowercase().as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn call(&self, evaluator: &Evaluator<'_>, name: &str, args: &[String]) -> LessResult<String> {
        match self.get(name) {
            Some(builtin) => builtin.call(evaluator, args),
            None => Err(LessError::UnknownFunction(name.to_string())),
        }
    }

    fn builtin() -> Self {
        let table: &[(&'static str, Arity, Handler)] = &[
            // 数学
            ("percentage", Arity::exactly(1), percentage),
            ("round", Arity::between(1, 2), round),
            ("ceil", Arity::exactly(1), |_, a| map_number("ceil", a, f64::ceil)),
            ("floor", Arity::exactly(1), |_, a| map_number("floor", a, f64::floor)),
            ("abs", Arity::exactly(1), |_, a| map_number("abs", a, f64::abs)),
            ("sqrt", Arity::exactly(1), |_, a| map_number("sqrt", a, f64::sqrt)),
            ("pow", Arity::exactly(2), pow),
            ("mod", Arity::exactly(2), modulo),
            ("min", Arity::at_least(1), |_, a| extreme("min", a, |x, y| x < y)),
            ("max", Arity::at_least(1), |_, a| extreme("max", a, |x, y| x > y)),
            ("pi", Arity::exactly(0), |_, _| Ok(format_number(std::f64::consts::PI))),
            // 单位
            ("unit", Arity::between(1, 2), unit),
            ("get-unit", Arity::exactly(1), get_unit),
            ("convert", Arity::exactly(2), convert),
            // 颜色构造与通道
            ("rgb", Arity::between(1, 3), rgb),
            ("rgba", Arity::between(1, 4), rgb),
            ("hsl", Arity::between(1, 3), hsl),
            ("hsla", Arity::between(1, 4), hsl),
            ("red", Arity::exactly(1), |_, a| channel("red", a, |c| c.r)),
            ("green", Arity::exactly(1), |_, a| channel("green", a, |c| c.g)),
            ("blue", Arity::exactly(1), |_, a| channel("blue", a, |c| c.b)),
            ("alpha", Arity::exactly(1), alpha),
            ("hue", Arity::exactly(1), hue),
            ("saturation", Arity::exactly(1), saturation),
            ("lightness", Arity::exactly(1), lightness),
            ("luma", Arity::exactly(1), luma),
            // 颜色运算
            ("lighten", Arity::exactly(2), |_, a| adjust("lighten", a, color::lighten)),
            ("darken", Arity::exactly(2), |_, a| adjust("darken", a, color::darken)),
            ("saturate", Arity::exactly(2), |_, a| adjust("saturate", a, color::saturate)),
            ("desaturate", Arity::exactly(2), |_, a| adjust("desaturate", a, color::desaturate)),
            ("fade", Arity::exactly(2), |_, a| adjust("fade", a, color::fade)),
            ("fadein", Arity::exactly(2), |_, a| adjust("fadein", a, color::fadein)),
            ("fadeout", Arity::exactly(2), |_, a| adjust("fadeout", a, color::fadeout)),
            ("spin", Arity::exactly(2), spin),
            ("mix", Arity::between(2, 3), mix),
            ("tint", Arity::between(1, 2), |_, a| weighted("tint", a, color::tint)),
            ("shade", Arity::between(1, 2), |_, a| weighted("shade", a, color::shade)),
            ("greyscale", Arity::exactly(1), |_, a| {
                Ok(color::greyscale(color_arg("greyscale", a, 0)?).to_css())
            }),
            ("contrast", Arity::between(1, 4), contrast),
            ("multiply", Arity::exactly(2), |_, a| blend("multiply", a, color::multiply)),
            ("screen", Arity::exactly(2), |_, a| blend("screen", a, color::screen)),
            ("overlay", Arity::exactly(2), |_, a| blend("overlay", a, color::overlay)),
            // 类型判断
            ("isnumber", Arity::exactly(1), |_, a| truth(parse_number(&a[0]).is_some())),
            ("isstring", Arity::exactly(1), |_, a| truth(is_quoted(&a[0]))),
            ("iscolor", Arity::exactly(1), |_, a| truth(color::parse_color(&a[0]).is_some())),
            ("iskeyword", Arity::exactly(1), |_, a| truth(is_keyword(&a[0]))),
            ("isurl", Arity::exactly(1), |_, a| {
                truth(a[0].trim().to_ascii_lowercase().starts_with("url("))
            }),
            ("ispixel", Arity::exactly(1), |_, a| truth(has_unit(&a[0], "px"))),
            ("isem", Arity::exactly(1), |_, a| truth(has_unit(&a[0], "em"))),
            ("ispercentage", Arity::exactly(1), |_, a| truth(has_unit(&a[0], "%"))),
            ("isunit", Arity::exactly(2), |_, a| truth(has_unit(&a[0], unquote(&a[1]).0))),
            // 逻辑
            ("boolean", Arity::exactly(1), |e, a| truth(is_truthy(e, &a[0])?)),
            ("if", Arity::between(2, 3), if_function),
            // 字符串
            ("e", Arity::exactly(1), |_, a| Ok(unquote(&a[0]).0.to_string())),
            ("escape", Arity::exactly(1), escape),
            ("%", Arity::at_least(1), format_string),
            ("replace", Arity::between(3, 4), replace),
            // 列表
            ("length", Arity::at_least(1), length),
            ("extract", Arity::at_least(2), extract),
            ("range", Arity::between(1, 3), range),
            // 图片
            ("image-width", Arity::exactly(1), |e, a| {
                image_dimensions(e, &a[0]).map(|(w, _)| format!("{w}px"))
            }),
            ("image-height", Arity::exactly(1), |e, a| {
                image_dimensions(e, &a[0]).map(|(_, h)| format!("{h}px"))
            }),
            ("image-size", Arity::exactly(1), |e, a| {
                image_dimensions(e, &a[0]).map(|(w, h)| format!("{w}px {h}px"))
            }),
        ];
        let entries = table
            .iter()
            .map(|&(name, arity, handler)| (name, Builtin { name, arity, handler }))
            .collect();
        Self { entries }
    }
}

fn truth(value: bool) -> LessResult<String> {
    Ok(if value { "true" } else { "false" }.to_string())
}

fn number_arg(name: &str, args: &[String], index: usize) -> LessResult<Number> {
    let raw = args.get(index).map(String::as_str).unwrap_or_default();
    parse_number(raw)
        .ok_or_else(|| LessError::eval(format!("{name}() 的第 {} 个参数不是数字: {raw}", index + 1)))
}

fn color_arg(name: &str, args: &[String], index: usize) -> LessResult<Color> {
    let raw = args.get(index).map(String::as_str).unwrap_or_default();
    color::parse_color(raw)
        .ok_or_else(|| LessError::eval(format!("{name}() 的第 {} 个参数不是颜色: {raw}", index + 1)))
}

/// 颜色函数的数量参数：`10%` 与 `10` 都表示 0.1。
fn amount(number: &Number) -> f64 {
    number.value / 100.0
}

fn map_number(name: &str, args: &[String], f: fn(f64) -> f64) -> LessResult<String> {
    let number = number_arg(name, args, 0)?;
    Ok(Number::new(f(number.value), number.unit).to_string())
}

fn percentage(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let number = number_arg("percentage", args, 0)?;
    Ok(Number::new(number.value * 100.0, "%").to_string())
}

fn round(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let number = number_arg("round", args, 0)?;
    let places = match args.get(1) {
        Some(_) => number_arg("round", args, 1)?.value.max(0.0) as i32,
        None => 0,
    };
    let factor = 10f64.powi(places);
    Ok(Number::new((number.value * factor).round() / factor, number.unit).to_string())
}

fn pow(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let base = number_arg("pow", args, 0)?;
    let exponent = number_arg("pow", args, 1)?;
    Ok(Number::new(base.value.powf(exponent.value), base.unit).to_string())
}

fn modulo(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let lhs = number_arg("mod", args, 0)?;
    let rhs = number_arg("mod", args, 1)?;
    if rhs.value == 0.0 {
        return Err(LessError::DivisionByZero);
    }
    Ok(Number::new(lhs.value % rhs.value, lhs.unit).to_string())
}

fn extreme(name: &str, args: &[String], better: fn(f64, f64) -> bool) -> LessResult<String> {
    let mut best: Option<Number> = None;
    for index in 0..args.len() {
        let candidate = number_arg(name, args, index)?;
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let compatible = current.unit == candidate.unit
                    || current.is_unitless()
                    || candidate.is_unitless();
                if !compatible {
                    return Err(LessError::UnitMismatch {
                        op: ',',
                        left: current.to_string(),
                        right: candidate.to_string(),
                    });
                }
                if better(candidate.value, current.value) {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.map(|n| n.to_string())
        .ok_or_else(|| LessError::eval(format!("{name}() 需要至少一个参数")))
}

fn unit(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let number = number_arg("unit", args, 0)?;
    let unit = args.get(1).map(|u| unquote(u).0.to_string()).unwrap_or_default();
    Ok(Number::new(number.value, unit).to_string())
}

fn get_unit(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    Ok(number_arg("get-unit", args, 0)?.unit)
}

fn convert(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let number = number_arg("convert", args, 0)?;
    let target = unquote(&args[1]).0;
    match convert_unit(number.value, &number.unit, target) {
        Some(value) => Ok(Number::new(value, target).to_string()),
        None => Ok(number.to_string()),
    }
}

fn rgb(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    if args.len() == 1 {
        return Ok(color_arg("rgb", args, 0)?.to_css());
    }
    if args.len() < 3 {
        return Err(LessError::FunctionArity {
            name: "rgb".to_string(),
            expected: "3-4".to_string(),
            found: args.len(),
        });
    }
    let channel = |index: usize| -> LessResult<f64> {
        let n = number_arg("rgb", args, index)?;
        Ok(if n.unit == "%" { n.value / 100.0 * 255.0 } else { n.value })
    };
    let alpha = match args.get(3) {
        Some(_) => number_arg("rgba", args, 3)?.as_fraction(),
        None => 1.0,
    };
    Ok(Color::rgb(channel(0)?, channel(1)?, channel(2)?, alpha).to_css())
}

fn hsl(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    if args.len() == 1 {
        return Ok(color_arg("hsl", args, 0)?.to_css());
    }
    if args.len() < 3 {
        return Err(LessError::FunctionArity {
            name: "hsl".to_string(),
            expected: "3-4".to_string(),
            found: args.len(),
        });
    }
    let h = number_arg("hsl", args, 0)?.value;
    let s = number_arg("hsl", args, 1)?.as_fraction();
    let l = number_arg("hsl", args, 2)?.as_fraction();
    let alpha = match args.get(3) {
        Some(_) => number_arg("hsla", args, 3)?.as_fraction(),
        None => 1.0,
    };
    Ok(Color::from_hsl(Hsl { h, s, l }, alpha).to_css())
}

fn channel(name: &str, args: &[String], pick: fn(&Color) -> f64) -> LessResult<String> {
    let color = color_arg(name, args, 0)?;
    Ok(format_number(pick(&color).round()))
}

fn alpha(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    Ok(format_number(color_arg("alpha", args, 0)?.alpha))
}

fn hue(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    Ok(format_number(color_arg("hue", args, 0)?.to_hsl().h.round()))
}

fn saturation(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let s = color_arg("saturation", args, 0)?.to_hsl().s;
    Ok(Number::new((s * 100.0).round(), "%").to_string())
}

fn lightness(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let l = color_arg("lightness", args, 0)?.to_hsl().l;
    Ok(Number::new((l * 100.0).round(), "%").to_string())
}

fn luma(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let luma = color_arg("luma", args, 0)?.luma();
    Ok(Number::new((luma * 100.0).round(), "%").to_string())
}

fn adjust(name: &str, args: &[String], op: fn(Color, f64) -> Color) -> LessResult<String> {
    let color = color_arg(name, args, 0)?;
    let amount = amount(&number_arg(name, args, 1)?);
    Ok(op(color, amount).to_css())
}

fn spin(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let color = color_arg("spin", args, 0)?;
    let degrees = number_arg("spin", args, 1)?.value;
    Ok(color::spin(color, degrees).to_css())
}

fn mix(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let first = color_arg("mix", args, 0)?;
    let second = color_arg("mix", args, 1)?;
    let weight = match args.get(2) {
        Some(_) => amount(&number_arg("mix", args, 2)?),
        None => 0.5,
    };
    Ok(color::mix(first, second, weight).to_css())
}

fn weighted(name: &str, args: &[String], op: fn(Color, f64) -> Color) -> LessResult<String> {
    let color = color_arg(name, args, 0)?;
    let weight = match args.get(1) {
        Some(_) => amount(&number_arg(name, args, 1)?),
        None => 0.5,
    };
    Ok(op(color, weight).to_css())
}

fn contrast(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let color = color_arg("contrast", args, 0)?;
    let dark = match args.get(1) {
        Some(_) => color_arg("contrast", args, 1)?,
        None => Color::rgb(0.0, 0.0, 0.0, 1.0),
    };
    let light = match args.get(2) {
        Some(_) => color_arg("contrast", args, 2)?,
        None => Color::rgb(255.0, 255.0, 255.0, 1.0),
    };
    let threshold = match args.get(3) {
        Some(_) => number_arg("contrast", args, 3)?.as_fraction(),
        None => 0.43,
    };
    Ok(color::contrast(color, dark, light, threshold).to_css())
}

fn blend(name: &str, args: &[String], op: fn(Color, Color) -> Color) -> LessResult<String> {
    let top = color_arg(name, args, 0)?;
    let bottom = color_arg(name, args, 1)?;
    Ok(op(top, bottom).to_css())
}

static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[A-Za-z_][\w-]*$").expect("关键字正则编译失败"));
static COMPARISON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(>=|<=|=<|=|>|<)").expect("比较运算正则编译失败"));

fn is_keyword(raw: &str) -> bool {
    let trimmed = raw.trim();
    KEYWORD_RE.is_match(trimmed) && !color::is_named_color(trimmed)
}

fn has_unit(raw: &str, unit: &str) -> bool {
    parse_number(raw).map_or(false, |n| n.unit.eq_ignore_ascii_case(unit))
}

/// 只有字面量 `true` 为真，非零数字同样为假；含比较运算时按 guard 语义求值。
fn is_truthy(evaluator: &Evaluator<'_>, raw: &str) -> LessResult<bool> {
    let trimmed = raw.trim();
    if !is_quoted(trimmed) && COMPARISON_RE.is_match(trimmed) {
        return guard::evaluate(trimmed, evaluator);
    }
    Ok(trimmed == "true")
}

fn if_function(evaluator: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    if is_truthy(evaluator, &args[0])? {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or_default())
    }
}

fn escape(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let mut output = String::new();
    for ch in unquote(&args[0]).0.chars() {
        match ch {
            ' ' | '=' | ':' | '#' | ';' | '(' | ')' | ',' => {
                output.push_str(&format!("%{:02X}", ch as u32));
            }
            _ => output.push(ch),
        }
    }
    Ok(output)
}

/// `%("%d/%s", a, b)`：`%s` 插入去引号的字符串，大写形式额外做 URL 编码。
fn format_string(evaluator: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let (template, quote) = unquote(&args[0]);
    let mut output = String::new();
    let mut rest = args[1..].iter();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            output.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some(spec @ ('s' | 'S' | 'd' | 'D' | 'a' | 'A')) => {
                chars.next();
                let Some(arg) = rest.next() else {
                    output.push('%');
                    output.push(spec);
                    continue;
                };
                let text = if spec.eq_ignore_ascii_case(&'s') {
                    unquote(arg).0.to_string()
                } else {
                    arg.clone()
                };
                if spec.is_ascii_uppercase() {
                    output.push_str(&escape(evaluator, &[text])?);
                } else {
                    output.push_str(&text);
                }
            }
            Some('%') => {
                chars.next();
                output.push('%');
            }
            _ => output.push('%'),
        }
    }
    let quote = quote.unwrap_or('"');
    Ok(format!("{quote}{output}{quote}"))
}

fn replace(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let (subject, quote) = unquote(&args[0]);
    let pattern = unquote(&args[1]).0;
    let replacement = unquote(&args[2]).0;
    let flags = args.get(3).map(|f| unquote(f).0).unwrap_or_default();
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .build()
        .map_err(|err| LessError::eval(format!("replace() 正则无效: {err}")))?;
    let replaced = if flags.contains('g') {
        regex.replace_all(subject, replacement)
    } else {
        regex.replace(subject, replacement)
    };
    Ok(match quote {
        Some(q) => format!("{q}{replaced}{q}"),
        None => replaced.into_owned(),
    })
}

fn list_items(args: &[String]) -> Vec<String> {
    if args.len() > 1 {
        return args.to_vec();
    }
    args.first().map(|list| split_list(list)).unwrap_or_default()
}

fn length(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    Ok(list_items(args).len().to_string())
}

/// 下标从 1 开始，越界时原样输出调用文本。
fn extract(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let (list, index) = args.split_at(args.len() - 1);
    let items = list_items(list);
    let position = number_arg("extract", index, 0)?.value;
    let picked = if position >= 1.0 {
        items.get(position as usize - 1)
    } else {
        None
    };
    Ok(picked
        .cloned()
        .unwrap_or_else(|| format!("extract({}, {})", list.join(", "), index[0])))
}

/// range() 最多生成的元素个数。
const MAX_RANGE_ITEMS: usize = 10_000;

fn range(_: &Evaluator<'_>, args: &[String]) -> LessResult<String> {
    let (start, end, step) = match args.len() {
        1 => (Number::unitless(1.0), number_arg("range", args, 0)?, 1.0),
        2 => (number_arg("range", args, 0)?, number_arg("range", args, 1)?, 1.0),
        _ => (
            number_arg("range", args, 0)?,
            number_arg("range", args, 1)?,
            number_arg("range", args, 2)?.value,
        ),
    };
    if step <= 0.0 {
        return Err(LessError::eval("range() 的步长必须为正数"));
    }
    let unit = end.unit.clone();
    let mut items = Vec::new();
    let mut current = start.value;
    while current <= end.value + 1e-9 {
        if items.len() == MAX_RANGE_ITEMS {
            return Err(LessError::eval(format!("range() 的元素超过上限 {MAX_RANGE_ITEMS}")));
        }
        items.push(Number::new(current, unit.as_str()).to_string());
        current += step;
    }
    Ok(items.join(" "))
}

fn image_dimensions(evaluator: &Evaluator<'_>, raw: &str) -> LessResult<(u32, u32)> {
    image::dimensions(evaluator.context().base_dir.as_deref(), raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalContext;
    use crate::scope::Snapshot;

    fn call(name: &str, args: &[&str]) -> LessResult<String> {
        let snapshot = Snapshot::default();
        let context = EvalContext::default();
        let evaluator = Evaluator::new(&snapshot, &context);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        FunctionRegistry::global().call(&evaluator, name, &args)
    }

    #[test]
    fn registry_is_populated_and_case_insensitive() {
        let registry = FunctionRegistry::global();
        assert!(registry.len() >= 60);
        assert!(registry.contains("LIGHTEN"));
        assert!(!registry.contains("translate"));
    }

    #[test]
    fn boolean_only_accepts_literal_true() {
        assert_eq!(call("boolean", &["true"]).unwrap(), "true");
        assert_eq!(call("boolean", &["\"true\""]).unwrap(), "false");
        assert_eq!(call("boolean", &["false"]).unwrap(), "false");
        assert_eq!(call("boolean", &["1"]).unwrap(), "false");
        assert_eq!(call("boolean", &["3 > 1"]).unwrap(), "true");
    }

    #[test]
    fn type_predicates_follow_literal_form() {
        assert_eq!(call("isstring", &["\"12px\""]).unwrap(), "true");
        assert_eq!(call("isnumber", &["\"12px\""]).unwrap(), "false");
        assert_eq!(call("isnumber", &["12px"]).unwrap(), "true");
        assert_eq!(call("iskeyword", &["solid"]).unwrap(), "true");
        assert_eq!(call("iscolor", &["#fff"]).unwrap(), "true");
        assert_eq!(call("ispixel", &["3px"]).unwrap(), "true");
        assert_eq!(call("ispercentage", &["3px"]).unwrap(), "false");
        assert_eq!(call("isunit", &["3em", "em"]).unwrap(), "true");
        assert_eq!(call("isurl", &["url(a.png)"]).unwrap(), "true");
    }

    #[test]
    fn math_keeps_units() {
        assert_eq!(call("percentage", &["0.5"]).unwrap(), "50%");
        assert_eq!(call("round", &["1.67px", "1"]).unwrap(), "1.7px");
        assert_eq!(call("ceil", &["2.1em"]).unwrap(), "3em");
        assert_eq!(call("max", &["1px", "3px", "2px"]).unwrap(), "3px");
        assert_eq!(call("mod", &["11px", "3"]).unwrap(), "2px");
        assert_eq!(call("unit", &["5em"]).unwrap(), "5");
        assert_eq!(call("unit", &["5", "px"]).unwrap(), "5px");
        assert_eq!(call("convert", &["1s", "ms"]).unwrap(), "1000ms");
        assert!(matches!(call("max", &["1px", "2em"]), Err(LessError::UnitMismatch { .. })));
    }

    #[test]
    fn colors_round_trip_through_functions() {
        assert_eq!(call("lighten", &["#336699", "20%"]).unwrap(), "#6699cc");
        assert_eq!(call("fade", &["#000", "50%"]).unwrap(), "rgba(0, 0, 0, 0.5)");
        assert_eq!(call("mix", &["#ff0000", "#0000ff"]).unwrap(), "#800080");
        assert_eq!(call("rgb", &["255", "0", "0"]).unwrap(), "#ff0000");
        assert_eq!(call("hsl", &["90", "100%", "50%"]).unwrap(), "hsl(90, 100%, 50%)");
        assert_eq!(call("red", &["#336699"]).unwrap(), "51");
        assert_eq!(call("contrast", &["#fff"]).unwrap(), "#000000");
    }

    #[test]
    fn strings_and_lists() {
        assert_eq!(call("e", &["\"a b\""]).unwrap(), "a b");
        assert_eq!(call("%", &["\"%d/%s\"", "10", "\"x\""]).unwrap(), "\"10/x\"");
        assert_eq!(
            call("replace", &["\"Hello, Mars\"", "\"Mars\"", "\"World\""]).unwrap(),
            "\"Hello, World\""
        );
        assert_eq!(call("escape", &["\"a=1\""]).unwrap(), "a%3D1");
        assert_eq!(call("length", &["a b c"]).unwrap(), "3");
        assert_eq!(call("length", &["a", "b"]).unwrap(), "2");
        assert_eq!(call("extract", &["a b c", "2"]).unwrap(), "b");
        assert_eq!(call("range", &["3"]).unwrap(), "1 2 3");
        assert_eq!(call("range", &["10px", "30px", "10"]).unwrap(), "10px 20px 30px");
    }

    #[test]
    fn range_is_capped() {
        assert_eq!(call("range", &["10000"]).unwrap().split(' ').count(), MAX_RANGE_ITEMS);
        assert!(matches!(call("range", &["100000"]), Err(LessError::EvalError(_))));
    }

    #[test]
    fn arity_and_unknown_names_are_typed_errors() {
        assert!(matches!(
            call("lighten", &["#fff"]),
            Err(LessError::FunctionArity { found: 1, .. })
        ));
        assert!(matches!(call("nope", &[]), Err(LessError::UnknownFunction(_))));
    }

    #[test]
    fn if_selects_branch() {
        assert_eq!(call("if", &["true", "a", "b"]).unwrap(), "a");
        assert_eq!(call("if", &["(2 < 1)", "a", "b"]).unwrap(), "b");
        assert_eq!(call("if", &["false", "a"]).unwrap(), "");
    }
}
