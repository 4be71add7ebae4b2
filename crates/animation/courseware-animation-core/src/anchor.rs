//! Anchor keywords → normalized transform-origin.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    #[default]
    Center,
    Bottom,
}

impl HorizontalAnchor {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    fn percent(self) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => 50.0,
            Self::Right => 100.0,
        }
    }
}

impl VerticalAnchor {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    fn percent(self) -> f32 {
        match self {
            Self::Top => 0.0,
            Self::Center => 50.0,
            Self::Bottom => 100.0,
        }
    }
}

/// Transform origin as percentages of the element box.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x_pct: f32,
    pub y_pct: f32,
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

impl Anchor {
    pub const CENTER: Anchor = Anchor {
        x_pct: 50.0,
        y_pct: 50.0,
    };

    pub fn from_axes(h: HorizontalAnchor, v: VerticalAnchor) -> Self {
        Self {
            x_pct: h.percent(),
            y_pct: v.percent(),
        }
    }

    /// Combined legacy keyword (`top-left`, `bottom-right`, ...). Unknown
    /// keywords, including `center`, resolve to the center.
    pub fn from_legacy(keyword: &str) -> Self {
        let (h, v) = match keyword.trim().to_ascii_lowercase().as_str() {
            "left-top" | "top-left" => (HorizontalAnchor::Left, VerticalAnchor::Top),
            "right-top" | "top-right" => (HorizontalAnchor::Right, VerticalAnchor::Top),
            "left-bottom" | "bottom-left" => (HorizontalAnchor::Left, VerticalAnchor::Bottom),
            "right-bottom" | "bottom-right" => (HorizontalAnchor::Right, VerticalAnchor::Bottom),
            _ => (HorizontalAnchor::Center, VerticalAnchor::Center),
        };
        Self::from_axes(h, v)
    }

    /// Resolve from the raw per-axis and legacy attribute values.
    ///
    /// Per-axis keywords win; the legacy combined anchor is consulted only
    /// when both per-axis values are absent or blank. Unrecognized per-axis
    /// keywords fall back to center on that axis.
    pub fn resolve(horizontal: Option<&str>, vertical: Option<&str>, legacy: Option<&str>) -> Self {
        fn blank(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        let h = blank(horizontal);
        let v = blank(vertical);
        if h.is_none() && v.is_none() {
            if let Some(legacy) = blank(legacy) {
                return Self::from_legacy(legacy);
            }
        }
        Self::from_axes(
            h.and_then(HorizontalAnchor::from_keyword).unwrap_or_default(),
            v.and_then(VerticalAnchor::from_keyword).unwrap_or_default(),
        )
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% {}%", self.x_pct, self.y_pct)
    }
}
