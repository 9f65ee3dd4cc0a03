//! LESS 标量值：带单位的数字或颜色，二者互斥。

use crate::color::{self, Color};
use crate::error::{LessError, LessResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+))([a-zA-Z]+|%)?$").expect("数值正则编译失败")
});

/// 数字与单位，单位为空表示无单位。
#[derive(Debug, Clone)]
pub struct Number {
    pub value: f64,
    pub unit: String,
}

impl Number {
    pub fn new<S: Into<String>>(value: f64, unit: S) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn unitless(value: f64) -> Self {
        Self::new(value, "")
    }

    /// 百分比折算为小数，其余单位原样返回数值。
    pub fn as_fraction(&self) -> f64 {
        if self.unit == "%" {
            self.value / 100.0
        } else {
            self.value
        }
    }

    pub fn is_unitless(&self) -> bool {
        self.unit.is_empty()
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        let scale = 1f64.max(self.value.abs()).max(other.value.abs());
        self.unit == other.unit && (self.value - other.value).abs() <= 1e-9 * scale
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(self.value), self.unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Color(Color),
}

impl Value {
    pub fn number<S: Into<String>>(value: f64, unit: S) -> Self {
        Value::Number(Number::new(value, unit))
    }

    pub fn unitless(value: f64) -> Self {
        Value::Number(Number::unitless(value))
    }

    /// 解析单个字面量，无法识别时返回 `None`。
    pub fn parse(input: &str) -> Option<Value> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(number) = parse_number(trimmed) {
            return Some(Value::Number(number));
        }
        color::parse_color(trimmed).map(Value::Color)
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(number) => Some(number),
            Value::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<&Color> {
        match self {
            Value::Color(color) => Some(color),
            Value::Number(_) => None,
        }
    }

    pub fn add(&self, rhs: &Value) -> LessResult<Value> {
        self.apply('+', rhs)
    }

    pub fn subtract(&self, rhs: &Value) -> LessResult<Value> {
        self.apply('-', rhs)
    }

    pub fn multiply(&self, rhs: &Value) -> LessResult<Value> {
        self.apply('*', rhs)
    }

    pub fn divide(&self, rhs: &Value) -> LessResult<Value> {
        self.apply('/', rhs)
    }

    pub fn apply(&self, op: char, rhs: &Value) -> LessResult<Value> {
        match (self, rhs) {
            (Value::Number(lhs), Value::Number(rhs)) => apply_numbers(lhs, op, rhs).map(Value::Number),
            (Value::Color(lhs), Value::Color(rhs)) => {
                apply_channels(lhs, op, [rhs.r, rhs.g, rhs.b]).map(Value::Color)
            }
            (Value::Color(lhs), Value::Number(rhs)) => {
                let n = rhs.value;
                apply_channels(lhs, op, [n, n, n]).map(Value::Color)
            }
            (Value::Number(lhs), Value::Color(rhs)) => {
                let n = lhs.value;
                let base = Color::rgb(n, n, n, rhs.alpha);
                apply_channels(&base, op, [rhs.r, rhs.g, rhs.b]).map(Value::Color)
            }
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Value::Number(number) => number.to_string(),
            Value::Color(color) => color.to_css(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

pub fn parse_number(input: &str) -> Option<Number> {
    let caps = NUMBER_RE.captures(input.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).map_or("", |m| m.as_str());
    Some(Number::new(value, unit))
}

fn apply_numbers(lhs: &Number, op: char, rhs: &Number) -> LessResult<Number> {
    let mismatch = || LessError::UnitMismatch {
        op,
        left: lhs.to_string(),
        right: rhs.to_string(),
    };
    match op {
        '+' | '-' => {
            let unit = match (lhs.is_unitless(), rhs.is_unitless()) {
                (true, _) => rhs.unit.clone(),
                (false, true) => lhs.unit.clone(),
                (false, false) if lhs.unit == rhs.unit => lhs.unit.clone(),
                _ => return Err(mismatch()),
            };
            let value = if op == '+' {
                lhs.value + rhs.value
            } else {
                lhs.value - rhs.value
            };
            Ok(Number::new(value, unit))
        }
        '*' => {
            if !lhs.is_unitless() && !rhs.is_unitless() {
                return Err(mismatch());
            }
            let unit = if lhs.is_unitless() {
                rhs.unit.clone()
            } else {
                lhs.unit.clone()
            };
            Ok(Number::new(lhs.value * rhs.value, unit))
        }
        '/' => {
            if rhs.value == 0.0 {
                return Err(LessError::DivisionByZero);
            }
            let unit = if rhs.is_unitless() {
                lhs.unit.clone()
            } else if rhs.unit == lhs.unit {
                String::new()
            } else {
                return Err(mismatch());
            };
            Ok(Number::new(lhs.value / rhs.value, unit))
        }
        _ => Err(LessError::eval(format!("未知的运算符 {op}"))),
    }
}

fn apply_channels(lhs: &Color, op: char, rhs: [f64; 3]) -> LessResult<Color> {
    let channel = |a: f64, b: f64| -> LessResult<f64> {
        match op {
            '+' => Ok(a + b),
            '-' => Ok(a - b),
            '*' => Ok(a * b),
            '/' if b == 0.0 => Err(LessError::DivisionByZero),
            '/' => Ok(a / b),
            _ => Err(LessError::eval(format!("未知的运算符 {op}"))),
        }
    };
    Ok(Color::rgb(
        channel(lhs.r, rhs[0])?,
        channel(lhs.g, rhs[1])?,
        channel(lhs.b, rhs[2])?,
        lhs.alpha,
    ))
}

/// 输出数值：最多 8 位小数，去掉多余的零。
pub fn format_number(value: f64) -> String {
    let mut value = value;
    if value.abs() < 1e-9 {
        value = 0.0;
    }
    let mut formatted = format!("{value:.8}");
    while formatted.contains('.') && formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }
    if formatted == "-0" {
        formatted = "0".to_string();
    }
    formatted
}

/// 同类单位之间的换算，不可换算时返回 `None`。
pub fn convert_unit(value: f64, from: &str, to: &str) -> Option<f64> {
    const LENGTH: &[(&str, f64)] = &[
        ("m", 1.0),
        ("cm", 0.01),
        ("mm", 0.001),
        ("q", 0.00025),
        ("in", 0.0254),
        ("px", 0.0254 / 96.0),
        ("pt", 0.0254 / 72.0),
        ("pc", 0.0254 / 72.0 * 12.0),
    ];
    const DURATION: &[(&str, f64)] = &[("s", 1.0), ("ms", 0.001)];
    const ANGLE: &[(&str, f64)] = &[
        ("rad", 1.0 / (2.0 * std::f64::consts::PI)),
        ("deg", 1.0 / 360.0),
        ("grad", 1.0 / 400.0),
        ("turn", 1.0),
    ];
    let from = from.to_ascii_lowercase();
    let to = to.to_ascii_lowercase();
    if from == to {
        return Some(value);
    }
    for group in [LENGTH, DURATION, ANGLE] {
        let factor = |unit: &str| group.iter().find(|(u, _)| *u == unit).map(|(_, f)| *f);
        if let (Some(a), Some(b)) = (factor(&from), factor(&to)) {
            return Some(value * a / b);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn px(value: f64) -> Value {
        Value::number(value, "px")
    }

    #[test]
    fn parses_numbers_and_colors() {
        assert_eq!(Value::parse("10px"), Some(px(10.0)));
        assert_eq!(Value::parse("-.5em"), Some(Value::number(-0.5, "em")));
        assert_eq!(Value::parse("50%"), Some(Value::number(50.0, "%")));
        assert!(matches!(Value::parse("#fff"), Some(Value::Color(_))));
        assert_eq!(Value::parse("solid"), None);
        assert_eq!(Value::parse("10px 2px"), None);
    }

    #[test]
    fn addition_takes_the_non_empty_unit() {
        assert_eq!(px(10.0).add(&Value::unitless(5.0)).unwrap(), px(15.0));
        assert_eq!(Value::unitless(5.0).add(&px(1.0)).unwrap(), px(6.0));
    }

    #[test]
    fn mismatched_units_fail() {
        let err = px(10.0).add(&Value::number(1.0, "em")).unwrap_err();
        assert!(matches!(err, LessError::UnitMismatch { op: '+', .. }));
        let err = px(10.0).multiply(&px(2.0)).unwrap_err();
        assert!(matches!(err, LessError::UnitMismatch { op: '*', .. }));
        let err = px(10.0).divide(&Value::number(2.0, "em")).unwrap_err();
        assert!(matches!(err, LessError::UnitMismatch { op: '/', .. }));
    }

    #[test]
    fn division_cancels_matching_units() {
        assert_eq!(px(12.0).divide(&px(4.0)).unwrap(), Value::unitless(3.0));
        assert_eq!(px(12.0).divide(&Value::unitless(2.0)).unwrap(), px(6.0));
    }

    #[test]
    fn division_by_zero_fails() {
        assert!(matches!(
            px(1.0).divide(&Value::unitless(0.0)),
            Err(LessError::DivisionByZero)
        ));
    }

    #[test]
    fn color_arithmetic_is_per_channel() {
        let sum = Value::parse("#111").unwrap().add(&Value::parse("#222").unwrap());
        assert_eq!(sum.unwrap().to_css(), "#333333");
        let doubled = Value::parse("#101010").unwrap().multiply(&Value::unitless(2.0));
        assert_eq!(doubled.unwrap().to_css(), "#202020");
    }

    #[test]
    fn formats_numbers_compactly() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(100.0 / 3.0), "33.33333333");
        assert_eq!(format_number(-0.0000000001), "0");
    }

    #[test]
    fn converts_compatible_units() {
        assert_eq!(convert_unit(1.0, "s", "ms"), Some(1000.0));
        assert!((convert_unit(1.0, "in", "px").unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(convert_unit(1.0, "px", "s"), None);
    }

    fn unit_strategy() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["", "px", "em", "%", "s"])
    }

    proptest! {
        #[test]
        fn add_then_subtract_round_trips(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6, unit in unit_strategy()) {
            let a = Value::number(a, unit);
            let b = Value::number(b, unit);
            prop_assert_eq!(a.add(&b).unwrap().subtract(&b).unwrap(), a);
        }

        #[test]
        fn multiply_by_one_is_identity(a in -1.0e6f64..1.0e6, unit in unit_strategy()) {
            let a = Value::number(a, unit);
            prop_assert_eq!(a.multiply(&Value::unitless(1.0)).unwrap(), a);
        }

        #[test]
        fn dividing_by_itself_is_one(a in 1.0e-3f64..1.0e6, negative in any::<bool>(), unit in unit_strategy()) {
            let a = Value::number(if negative { -a } else { a }, unit);
            prop_assert_eq!(a.divide(&a).unwrap(), Value::unitless(1.0));
        }
    }
}
