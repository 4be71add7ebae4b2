//! 2D transform composition and read-back.
//!
//! Composition order is `translate(x, y) scale(s)`: CSS applies the list
//! right-to-left, so the element scales about its origin first and the
//! translation distance is not scaled.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub tx: f64,
    pub ty: f64,
    pub scale: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        tx: 0.0,
        ty: 0.0,
        scale: 1.0,
    };

    pub fn new(tx: f64, ty: f64, scale: f64) -> Self {
        Self { tx, ty, scale }
    }

    /// Inline CSS value.
    pub fn to_css(&self) -> String {
        compose_transform(self.tx, self.ty, self.scale)
    }

    /// The equivalent computed-style value (`matrix(a, b, c, d, e, f)`).
    pub fn to_matrix(&self) -> String {
        let s = finite_or(self.scale, 1.0);
        format!(
            "matrix({s}, 0, 0, {s}, {}, {})",
            finite_or(self.tx, 0.0),
            finite_or(self.ty, 0.0)
        )
    }

    /// Parse an inline value made of `translate(...)`, `translateX/Y(...)` and
    /// `scale(...)` functions. Returns `None` for anything else.
    pub fn parse_css(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s == "none" {
            return Some(Self::IDENTITY);
        }
        let mut out = Self::IDENTITY;
        let mut rest = s;
        while !rest.trim_start().is_empty() {
            let trimmed = rest.trim_start();
            let open = trimmed.find('(')?;
            let close = trimmed.find(')')?;
            if close < open {
                return None;
            }
            let name = trimmed[..open].trim();
            let args: Vec<&str> = trimmed[open + 1..close].split(',').map(str::trim).collect();
            match name {
                "translate" => {
                    out.tx += parse_px(args.first()?)?;
                    out.ty += match args.get(1) {
                        Some(a) => parse_px(a)?,
                        None => 0.0,
                    };
                }
                "translateX" => out.tx += parse_px(args.first()?)?,
                "translateY" => out.ty += parse_px(args.first()?)?,
                "scale" => out.scale *= args.first()?.parse::<f64>().ok()?,
                _ => return None,
            }
            rest = &trimmed[close + 1..];
        }
        Some(out)
    }
}

/// Build `translate(Xpx, Ypx) scale(S)`, replacing non-finite inputs with the
/// identity values.
pub fn compose_transform(left_px: f64, top_px: f64, scale: f64) -> String {
    format!(
        "translate({}px, {}px) scale({})",
        finite_or(left_px, 0.0),
        finite_or(top_px, 0.0),
        finite_or(scale, 1.0)
    )
}

/// Translation part of a computed transform (`matrix(...)` or
/// `matrix3d(...)`). `none`, a missing value or anything unparseable reads
/// as the origin.
pub fn current_translate(computed: Option<&str>) -> (f64, f64) {
    let Some(t) = computed.map(str::trim) else {
        return (0.0, 0.0);
    };
    let (is_3d, body) = if let Some(b) = t.strip_prefix("matrix3d(") {
        (true, b)
    } else if let Some(b) = t.strip_prefix("matrix(") {
        (false, b)
    } else {
        return (0.0, 0.0);
    };
    let Some(body) = body.strip_suffix(')') else {
        return (0.0, 0.0);
    };
    let vals: Vec<f64> = body
        .split(',')
        .map(|v| v.trim().parse::<f64>().unwrap_or(0.0))
        .collect();
    let (ix, iy) = if is_3d { (12, 13) } else { (4, 5) };
    (
        vals.get(ix).copied().unwrap_or(0.0),
        vals.get(iy).copied().unwrap_or(0.0),
    )
}

fn parse_px(s: &str) -> Option<f64> {
    let s = s.trim();
    let n = s.strip_suffix("px").unwrap_or(s);
    n.trim().parse::<f64>().ok()
}

#[inline]
fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}
