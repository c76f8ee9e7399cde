//! CSS value normalization.
//!
//! Everything the scorer and the conflict detector compare goes through
//! here first, so that `#f00`, `rgb(255,0,0)` and `red` all land on the same
//! literal `rgb(255, 0, 0)`. Values that cannot be normalized are compared
//! as written.

use crate::model::Color;
use winnow::ascii::{digit0, digit1};
use winnow::combinator::opt;
use winnow::prelude::*;

/// Named colors recognized during normalization.
const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("lime", "#00ff00"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("cyan", "#00ffff"),
    ("aqua", "#00ffff"),
    ("magenta", "#ff00ff"),
    ("fuchsia", "#ff00ff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("silver", "#c0c0c0"),
    ("maroon", "#800000"),
    ("navy", "#000080"),
    ("olive", "#808000"),
    ("purple", "#800080"),
    ("teal", "#008080"),
    ("orange", "#ffa500"),
    ("transparent", "#00000000"),
];

/// Format a float the way CSS values are usually written:
/// integers without a fraction, others with at most two decimals.
pub fn format_number(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{rounded:.2}");
        s.trim_end_matches('0').to_string()
    }
}

/// Format a pixel length, e.g. `18px`, `12.5px`.
pub fn format_px(v: f32) -> String {
    format!("{}px", format_number(v))
}

/// Parse a CSS color literal: hex, `rgb()`/`rgba()` or a named color.
pub fn parse_color(value: &str) -> Option<Color> {
    let v = value.trim().to_ascii_lowercase();
    if v.starts_with('#') {
        return Color::from_hex(&v);
    }
    if let Some(args) = v
        .strip_prefix("rgba(")
        .or_else(|| v.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(args);
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == v)
        .and_then(|(_, hex)| Color::from_hex(hex))
}

/// Canonical `rgb(R, G, B)` form of a color literal, or `None` when the
/// value is not a recognizable color.
pub fn normalize_color(value: &str) -> Option<String> {
    parse_color(value).map(|c| c.to_css())
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    // Accept both `r, g, b[, a]` and `r g b[ / a]`.
    let parts: Vec<&str> = args
        .split([',', '/', ' '])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| -> Option<u8> {
        let v = if let Some(pct) = p.strip_suffix('%') {
            parse_number(pct)? / 100.0 * 255.0
        } else {
            parse_number(p)?
        };
        (0.0..=255.0).contains(&v).then(|| v.round() as u8)
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            let a = match p.strip_suffix('%') {
                Some(pct) => parse_number(pct)? / 100.0,
                None => parse_number(p)?,
            };
            (0.0..=1.0).contains(&a).then_some(a)?
        }
        None => 1.0,
    };
    Some(Color::from_rgb8(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn number<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (opt('-'), digit0, opt(('.', digit1)))
        .take()
        .verify(|s: &str| s.bytes().any(|b| b.is_ascii_digit()))
        .parse_next(input)
}

/// Parse a bare decimal number (`12`, `-3.5`, `.5`).
pub fn parse_number(value: &str) -> Option<f32> {
    let text = number.parse(value.trim()).ok()?;
    text.parse::<f32>().ok()
}

/// Parse a pixel length (`18px`) or a unitless number (`18`).
/// Other units (`rem`, `%`, `em`) return `None`.
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let v = v.strip_suffix("px").unwrap_or(v);
    parse_number(v)
}

/// The first family of a `font-family` list, unquoted.
pub fn first_font_family(value: &str) -> String {
    value
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// Parse a `font-weight` value: numeric or the `normal`/`bold` keywords.
pub fn parse_font_weight(value: &str) -> Option<u16> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" => Some(700),
        other => parse_number(other).map(|w| w.round() as u16),
    }
}
