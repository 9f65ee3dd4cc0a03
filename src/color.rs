use crate::value::format_number;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// HSL 分量：色相为角度，饱和度与亮度为 [0, 1] 的小数。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// 颜色值，通道取值 [0, 255]，透明度 [0, 1]。
///
/// `hsl` 非空表示颜色以 HSL 形式书写，输出时保持 HSL 写法；
/// 这个标记显式携带，不从通道数值推断。
#[derive(Clone, Copy, Debug)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub alpha: f64,
    pub hsl: Option<Hsl>,
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
        close(self.r, other.r)
            && close(self.g, other.g)
            && close(self.b, other.b)
            && close(self.alpha, other.alpha)
            && self.hsl.is_some() == other.hsl.is_some()
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64, alpha: f64) -> Self {
        Self {
            r: r.clamp(0.0, 255.0),
            g: g.clamp(0.0, 255.0),
            b: b.clamp(0.0, 255.0),
            alpha: alpha.clamp(0.0, 1.0),
            hsl: None,
        }
    }

    pub fn from_hsl(hsl: Hsl, alpha: f64) -> Self {
        let hsl = Hsl {
            h: hsl.h.rem_euclid(360.0),
            s: hsl.s.clamp(0.0, 1.0),
            l: hsl.l.clamp(0.0, 1.0),
        };
        let (r, g, b) = hsl_to_rgb(hsl);
        Self {
            r,
            g,
            b,
            alpha: alpha.clamp(0.0, 1.0),
            hsl: Some(hsl),
        }
    }

    pub fn is_hsl(&self) -> bool {
        self.hsl.is_some()
    }

    pub fn to_hsl(&self) -> Hsl {
        self.hsl.unwrap_or_else(|| rgb_to_hsl(self.r, self.g, self.b))
    }

    /// 按原颜色的书写家族重建颜色。
    fn rebuild(&self, hsl: Hsl, alpha: f64) -> Self {
        let color = Self::from_hsl(hsl, alpha);
        if self.is_hsl() {
            color
        } else {
            Self { hsl: None, ..color }
        }
    }

    fn with_alpha(&self, alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..*self
        }
    }

    /// 相对亮度（WCAG 定义），取值 [0, 1]。
    pub fn luma(&self) -> f64 {
        let linear = |c: f64| {
            let c = c / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    pub fn to_css(&self) -> String {
        if let Some(hsl) = self.hsl {
            let h = format_number(hsl.h);
            let s = format_number(hsl.s * 100.0);
            let l = format_number(hsl.l * 100.0);
            if self.alpha < 1.0 {
                return format!("hsla({h}, {s}%, {l}%, {})", format_alpha(self.alpha));
            }
            return format!("hsl({h}, {s}%, {l}%)");
        }
        if self.alpha < 1.0 {
            format_rgba(self)
        } else {
            format_hex(self)
        }
    }
}

pub fn parse_color(input: &str) -> Option<Color> {
    let trimmed = input.trim();
    if let Some(stripped) = trimmed.strip_prefix('#') {
        return parse_hex(stripped);
    }
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("rgb") {
        return parse_rgb_function(&lowered);
    }
    if lowered.starts_with("hsl") {
        return parse_hsl_function(&lowered);
    }
    NAMED_COLORS.get(lowered.as_str()).copied()
}

pub fn is_named_color(input: &str) -> bool {
    NAMED_COLORS.contains_key(input.trim().to_ascii_lowercase().as_str())
}

pub fn lighten(color: Color, amount: f64) -> Color {
    let mut hsl = color.to_hsl();
    hsl.l = (hsl.l + amount).clamp(0.0, 1.0);
    color.rebuild(hsl, color.alpha)
}

pub fn darken(color: Color, amount: f64) -> Color {
    let mut hsl = color.to_hsl();
    hsl.l = (hsl.l - amount).clamp(0.0, 1.0);
    color.rebuild(hsl, color.alpha)
}

pub fn saturate(color: Color, amount: f64) -> Color {
    let mut hsl = color.to_hsl();
    hsl.s = (hsl.s + amount).clamp(0.0, 1.0);
    color.rebuild(hsl, color.alpha)
}

pub fn desaturate(color: Color, amount: f64) -> Color {
    let mut hsl = color.to_hsl();
    hsl.s = (hsl.s - amount).clamp(0.0, 1.0);
    color.rebuild(hsl, color.alpha)
}

pub fn greyscale(color: Color) -> Color {
    desaturate(color, 1.0)
}

/// 旋转色相，`degrees` 可为负数。
pub fn spin(color: Color, degrees: f64) -> Color {
    let mut hsl = color.to_hsl();
    hsl.h = (hsl.h + degrees).rem_euclid(360.0);
    color.rebuild(hsl, color.alpha)
}

pub fn fade(color: Color, amount: f64) -> Color {
    color.with_alpha(amount)
}

pub fn fadein(color: Color, amount: f64) -> Color {
    color.with_alpha(color.alpha + amount)
}

pub fn fadeout(color: Color, amount: f64) -> Color {
    color.with_alpha(color.alpha - amount)
}

/// 按权重混合两个颜色，`weight` 为第一个颜色所占比例。
pub fn mix(first: Color, second: Color, weight: f64) -> Color {
    let p = weight.clamp(0.0, 1.0);
    let w = p * 2.0 - 1.0;
    let a = first.alpha - second.alpha;
    let w1 = if (w * a - -1.0).abs() < f64::EPSILON {
        (w + 1.0) / 2.0
    } else {
        ((w + a) / (1.0 + w * a) + 1.0) / 2.0
    };
    let w2 = 1.0 - w1;
    Color::rgb(
        first.r * w1 + second.r * w2,
        first.g * w1 + second.g * w2,
        first.b * w1 + second.b * w2,
        first.alpha * p + second.alpha * (1.0 - p),
    )
}

pub fn tint(color: Color, weight: f64) -> Color {
    mix(Color::rgb(255.0, 255.0, 255.0, 1.0), color, weight)
}

pub fn shade(color: Color, weight: f64) -> Color {
    mix(Color::rgb(0.0, 0.0, 0.0, 1.0), color, weight)
}

/// 根据亮度在深色与浅色之间选择对比色。
pub fn contrast(color: Color, dark: Color, light: Color, threshold: f64) -> Color {
    let (dark, light) = if dark.luma() > light.luma() {
        (light, dark)
    } else {
        (dark, light)
    };
    if color.luma() < threshold {
        light
    } else {
        dark
    }
}

pub fn multiply(top: Color, bottom: Color) -> Color {
    color_blend(blend_multiply, top, bottom)
}

pub fn screen(top: Color, bottom: Color) -> Color {
    color_blend(blend_screen, top, bottom)
}

pub fn overlay(top: Color, bottom: Color) -> Color {
    color_blend(blend_overlay, top, bottom)
}

pub fn format_hex(color: &Color) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        to_channel(color.r),
        to_channel(color.g),
        to_channel(color.b)
    )
}

pub fn format_rgba(color: &Color) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        to_channel(color.r),
        to_channel(color.g),
        to_channel(color.b),
        format_alpha(color.alpha)
    )
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let short = |idx: usize| hex_value(&hex[idx..idx + 1]).map(|v| f64::from(v * 17));
    let long = |idx: usize| hex_value(&hex[idx..idx + 2]).map(f64::from);
    match hex.len() {
        3 => Some(Color::rgb(short(0)?, short(1)?, short(2)?, 1.0)),
        4 => Some(Color::rgb(
            short(0)?,
            short(1)?,
            short(2)?,
            short(3)? / 255.0,
        )),
        6 => Some(Color::rgb(long(0)?, long(2)?, long(4)?, 1.0)),
        8 => Some(Color::rgb(long(0)?, long(2)?, long(4)?, long(6)? / 255.0)),
        _ => None,
    }
}

fn function_parts(input: &str) -> Option<Vec<&str>> {
    let start = input.find('(')? + 1;
    let end = input.rfind(')')?;
    if end < start {
        return None;
    }
    let body = &input[start..end];
    let parts: Vec<&str> = if body.contains(',') {
        body.split(',').map(str::trim).collect()
    } else {
        body.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|s| !s.is_empty())
            .collect()
    };
    Some(parts)
}

fn parse_rgb_function(input: &str) -> Option<Color> {
    let parts = function_parts(input)?;
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = parse_channel(parts[0])?;
    let g = parse_channel(parts[1])?;
    let b = parse_channel(parts[2])?;
    let a = match parts.get(3) {
        Some(raw) => parse_alpha(raw)?,
        None => 1.0,
    };
    Some(Color::rgb(r, g, b, a))
}

fn parse_hsl_function(input: &str) -> Option<Color> {
    let parts = function_parts(input)?;
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let h: f64 = parts[0].trim_end_matches("deg").parse().ok()?;
    let s = parse_alpha(parts[1])?;
    let l = parse_alpha(parts[2])?;
    let a = match parts.get(3) {
        Some(raw) => parse_alpha(raw)?,
        None => 1.0,
    };
    Some(Color::from_hsl(Hsl { h, s, l }, a))
}

fn parse_channel(input: &str) -> Option<f64> {
    if let Some(value) = input.strip_suffix('%') {
        let num: f64 = value.trim().parse().ok()?;
        return Some(num / 100.0 * 255.0);
    }
    input.trim().parse().ok()
}

fn parse_alpha(input: &str) -> Option<f64> {
    let input = input.trim();
    if let Some(value) = input.strip_suffix('%') {
        let num: f64 = value.parse().ok()?;
        Some((num / 100.0).clamp(0.0, 1.0))
    } else {
        input.parse().ok().map(|v: f64| v.clamp(0.0, 1.0))
    }
}

fn color_blend<F>(mode: F, bottom: Color, top: Color) -> Color
where
    F: Fn(f64, f64) -> f64 + Copy,
{
    let ab = bottom.alpha;
    let at = top.alpha;
    let ar = at + ab * (1.0 - at);
    let bottom_channels = [bottom.r / 255.0, bottom.g / 255.0, bottom.b / 255.0];
    let top_channels = [top.r / 255.0, top.g / 255.0, top.b / 255.0];
    let mut result = [0.0; 3];
    for i in 0..3 {
        let cb = bottom_channels[i];
        let cs = top_channels[i];
        let mut cr = mode(cb, cs);
        if ar > 0.0 {
            cr = (at * cs + ab * (cb - at * (cb + cs - cr))) / ar;
        }
        result[i] = cr * 255.0;
    }
    Color::rgb(result[0], result[1], result[2], ar)
}

fn blend_multiply(a: f64, b: f64) -> f64 {
    a * b
}

fn blend_screen(a: f64, b: f64) -> f64 {
    a + b - a * b
}

fn blend_overlay(base: f64, overlay: f64) -> f64 {
    if base <= 0.5 {
        blend_multiply(base * 2.0, overlay)
    } else {
        blend_screen(base * 2.0 - 1.0, overlay)
    }
}

fn hex_value(hex: &str) -> Option<u8> {
    u8::from_str_radix(hex, 16).ok()
}

fn rgb_to_hsl(r: f64, g: f64, b: f64) -> Hsl {
    let r = r / 255.0;
    let g = g / 255.0;
    let b = b / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < f64::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    } * 60.0;

    Hsl { h, s, l }
}

fn hsl_to_rgb(hsl: Hsl) -> (f64, f64, f64) {
    let Hsl { h, s, l } = hsl;
    if s <= 0.0 {
        return (l * 255.0, l * 255.0, l * 255.0);
    }

    let h = h / 360.0;
    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0) * 255.0,
        hue_to_rgb(p, q, h) * 255.0,
        hue_to_rgb(p, q, h - 1.0 / 3.0) * 255.0,
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    match t {
        _ if t < 1.0 / 6.0 => p + (q - p) * 6.0 * t,
        _ if t < 1.0 / 2.0 => q,
        _ if t < 2.0 / 3.0 => p + (q - p) * (2.0 / 3.0 - t) * 6.0,
        _ => p,
    }
}

fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn format_alpha(value: f64) -> String {
    let mut formatted = format!("{value:.3}");
    while formatted.contains('.') && formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }
    if formatted.is_empty() {
        "0".to_string()
    } else {
        formatted
    }
}

static NAMED_COLORS: Lazy<IndexMap<&'static str, Color>> = Lazy::new(|| {
    let table: [(&str, u32); 42] = [
        ("black", 0x000000),
        ("silver", 0xc0c0c0),
        ("gray", 0x808080),
        ("grey", 0x808080),
        ("white", 0xffffff),
        ("maroon", 0x800000),
        ("red", 0xff0000),
        ("purple", 0x800080),
        ("fuchsia", 0xff00ff),
        ("magenta", 0xff00ff),
        ("green", 0x008000),
        ("lime", 0x00ff00),
        ("olive", 0x808000),
        ("yellow", 0xffff00),
        ("navy", 0x000080),
        ("blue", 0x0000ff),
        ("teal", 0x008080),
        ("aqua", 0x00ffff),
        ("cyan", 0x00ffff),
        ("orange", 0xffa500),
        ("pink", 0xffc0cb),
        ("brown", 0xa52a2a),
        ("gold", 0xffd700),
        ("coral", 0xff7f50),
        ("crimson", 0xdc143c),
        ("indigo", 0x4b0082),
        ("violet", 0xee82ee),
        ("salmon", 0xfa8072),
        ("tomato", 0xff6347),
        ("khaki", 0xf0e68c),
        ("beige", 0xf5f5dc),
        ("ivory", 0xfffff0),
        ("lavender", 0xe6e6fa),
        ("tan", 0xd2b48c),
        ("skyblue", 0x87ceeb),
        ("steelblue", 0x4682b4),
        ("slategray", 0x708090),
        ("darkgray", 0xa9a9a9),
        ("lightgray", 0xd3d3d3),
        ("whitesmoke", 0xf5f5f5),
        ("dodgerblue", 0x1e90ff),
        ("rebeccapurple", 0x663399),
    ];
    let mut map = IndexMap::with_capacity(table.len() + 1);
    for (name, hex) in table {
        let r = f64::from((hex >> 16) & 0xff);
        let g = f64::from((hex >> 8) & 0xff);
        let b = f64::from(hex & 0xff);
        map.insert(name, Color::rgb(r, g, b, 1.0));
    }
    map.insert("transparent", Color::rgb(0.0, 0.0, 0.0, 0.0));
    map
});

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(input: &str) -> Color {
        parse_color(input).unwrap()
    }

    #[test]
    fn lighten_and_darken_stay_in_hex() {
        assert_eq!(lighten(hex("#336699"), 0.2).to_css(), "#6699cc");
        assert_eq!(darken(hex("#6699cc"), 0.2).to_css(), "#336699");
        assert_eq!(lighten(hex("#000"), 0.0).to_css(), "#000000");
    }

    #[test]
    fn lightness_is_clamped() {
        assert_eq!(lighten(hex("#eeeeee"), 0.5).to_css(), "#ffffff");
        assert_eq!(darken(hex("#111111"), 0.9).to_css(), "#000000");
    }

    #[test]
    fn hsl_origin_is_kept_through_operations() {
        let color = hex("hsl(90, 100%, 50%)");
        assert!(color.is_hsl());
        assert_eq!(color.to_css(), "hsl(90, 100%, 50%)");
        assert_eq!(lighten(color, 0.1).to_css(), "hsl(90, 100%, 60%)");
        assert_eq!(spin(color, -100.0).to_css(), "hsl(350, 100%, 50%)");
    }

    #[test]
    fn rgb_origin_never_turns_into_hsl() {
        let grey = hex("#808080");
        assert!(!spin(grey, 30.0).is_hsl());
        assert_eq!(greyscale(hex("#ff0000")).to_css(), "#808080");
    }

    #[test]
    fn fade_switches_to_rgba() {
        assert_eq!(fade(hex("#ffffff"), 0.4).to_css(), "rgba(255, 255, 255, 0.4)");
        assert_eq!(fadeout(hex("rgba(0, 0, 0, 0.5)"), 0.2).to_css(), "rgba(0, 0, 0, 0.3)");
    }

    #[test]
    fn mix_weights_first_color() {
        assert_eq!(mix(hex("#ff0000"), hex("#0000ff"), 0.5).to_css(), "#800080");
        assert_eq!(mix(hex("#ff0000"), hex("#0000ff"), 1.0).to_css(), "#ff0000");
    }

    #[test]
    fn overlay_blend_matches_reference() {
        let blended = overlay(hex("rgba(255, 255, 255, 0.05)"), hex("#2c2c2c"));
        assert_eq!(blended.to_css(), "#373737");
    }

    #[test]
    fn named_colors_parse() {
        assert_eq!(hex("red").to_css(), "#ff0000");
        assert!(is_named_color("White"));
        assert!(parse_color("notacolor").is_none());
    }

    #[test]
    fn contrast_picks_readable_side() {
        let black = hex("#000");
        let white = hex("#fff");
        assert_eq!(contrast(hex("#222"), black, white, 0.43).to_css(), "#ffffff");
        assert_eq!(contrast(hex("#eee"), black, white, 0.43).to_css(), "#000000");
    }
}
