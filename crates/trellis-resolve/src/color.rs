//! Color formatting for text segments

use serde_json::Value;

/// Turns a segment's `color` value into a style string
pub trait ColorFormatter {
    /// `None` when the value is not a color this formatter understands
    fn format(&self, color: &Value) -> Option<String>;
}

/// CSS color strings.
///
/// Accepts strings (passed through), `0xRRGGBB` integers, `[r, g, b]` /
/// `[r, g, b, a]` arrays and `{ r, g, b, a? }` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssColor;

impl ColorFormatter for CssColor {
    fn format(&self, color: &Value) -> Option<String> {
        match color {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => {
                let rgb = n.as_u64().filter(|v| *v <= 0xFF_FF_FF)?;
                Some(format!("#{rgb:06x}"))
            }
            Value::Array(parts) => {
                let channels: Vec<f64> = parts.iter().map(Value::as_f64).collect::<Option<_>>()?;
                match channels.as_slice() {
                    [r, g, b] => Some(rgb(*r, *g, *b)),
                    [r, g, b, a] => Some(rgba(*r, *g, *b, *a)),
                    _ => None,
                }
            }
            Value::Object(map) => {
                let r = map.get("r")?.as_f64()?;
                let g = map.get("g")?.as_f64()?;
                let b = map.get("b")?.as_f64()?;
                match map.get("a").and_then(Value::as_f64) {
                    Some(a) => Some(rgba(r, g, b, a)),
                    None => Some(rgb(r, g, b)),
                }
            }
            _ => None,
        }
    }
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn rgb(r: f64, g: f64, b: f64) -> String {
    format!("rgb({}, {}, {})", channel(r), channel(g), channel(b))
}

fn rgba(r: f64, g: f64, b: f64, a: f64) -> String {
    format!("rgba({}, {}, {}, {})", channel(r), channel(g), channel(b), a.clamp(0.0, 1.0))
}
