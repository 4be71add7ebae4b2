//! Declarative animation step model.

use serde::{Deserialize, Deserializer, Serialize};

/// One recognized token of a step's `style` string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StyleToken {
    SlideInTop,
    SlideInBottom,
    SlideInLeft,
    SlideInRight,
    SlideOutTop,
    SlideOutBottom,
    SlideOutLeft,
    SlideOutRight,
    SlideTop,
    SlideBottom,
    SlideLeft,
    SlideRight,
    FadeIn,
    FadeOut,
    Typewriter,
    Zoom,
}

impl StyleToken {
    /// Presentation classes consulted, in this order, when an element has no
    /// declarative style. The first class present wins.
    pub const LEGACY_PRIORITY: [StyleToken; 16] = [
        StyleToken::SlideInBottom,
        StyleToken::SlideInRight,
        StyleToken::SlideInTop,
        StyleToken::SlideInLeft,
        StyleToken::SlideRight,
        StyleToken::SlideLeft,
        StyleToken::SlideBottom,
        StyleToken::SlideTop,
        StyleToken::SlideOutLeft,
        StyleToken::SlideOutRight,
        StyleToken::SlideOutTop,
        StyleToken::SlideOutBottom,
        StyleToken::FadeIn,
        StyleToken::FadeOut,
        StyleToken::Typewriter,
        StyleToken::Zoom,
    ];

    /// Case-insensitive keyword match.
    pub fn from_keyword(s: &str) -> Option<Self> {
        let t = match s.to_ascii_lowercase().as_str() {
            "slideintop" => Self::SlideInTop,
            "slideinbottom" => Self::SlideInBottom,
            "slideinleft" => Self::SlideInLeft,
            "slideinright" => Self::SlideInRight,
            "slideouttop" => Self::SlideOutTop,
            "slideoutbottom" => Self::SlideOutBottom,
            "slideoutleft" => Self::SlideOutLeft,
            "slideoutright" => Self::SlideOutRight,
            "slidetop" => Self::SlideTop,
            "slidebottom" => Self::SlideBottom,
            "slideleft" => Self::SlideLeft,
            "slideright" => Self::SlideRight,
            "fadein" => Self::FadeIn,
            "fadeout" => Self::FadeOut,
            "typewriter" => Self::Typewriter,
            "zoom" => Self::Zoom,
            _ => return None,
        };
        Some(t)
    }

    /// The camelCase spelling authors use, which doubles as the class name.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::SlideInTop => "slideInTop",
            Self::SlideInBottom => "slideInBottom",
            Self::SlideInLeft => "slideInLeft",
            Self::SlideInRight => "slideInRight",
            Self::SlideOutTop => "slideOutTop",
            Self::SlideOutBottom => "slideOutBottom",
            Self::SlideOutLeft => "slideOutLeft",
            Self::SlideOutRight => "slideOutRight",
            Self::SlideTop => "slideTop",
            Self::SlideBottom => "slideBottom",
            Self::SlideLeft => "slideLeft",
            Self::SlideRight => "slideRight",
            Self::FadeIn => "fadeIn",
            Self::FadeOut => "fadeOut",
            Self::Typewriter => "typewriter",
            Self::Zoom => "zoom",
        }
    }
}

/// Parsed `style` token set. Unknown tokens are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleSet(Vec<StyleToken>);

impl StyleSet {
    pub fn parse(style: &str) -> Self {
        let mut tokens = Vec::new();
        for t in style.split_whitespace().filter_map(StyleToken::from_keyword) {
            if !tokens.contains(&t) {
                tokens.push(t);
            }
        }
        Self(tokens)
    }

    #[inline]
    pub fn contains(&self, t: StyleToken) -> bool {
        self.0.contains(&t)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_slide_out(&self) -> bool {
        [
            StyleToken::SlideOutLeft,
            StyleToken::SlideOutRight,
            StyleToken::SlideOutTop,
            StyleToken::SlideOutBottom,
        ]
        .iter()
        .any(|t| self.contains(*t))
    }

    pub fn iter(&self) -> impl Iterator<Item = StyleToken> + '_ {
        self.0.iter().copied()
    }
}

/// One declarative unit of motion for one element.
///
/// Numeric fields accept either JSON numbers or numeric strings, since
/// authoring tools emit both. Fields this engine does not know about are kept
/// so the normalized list written back to the element loses nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// CSS transform-origin, e.g. `"50% 50%"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Seconds.
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Seconds.
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_sound: Option<String>,
    /// Typewriter characters per second; overrides `duration` for typing.
    #[serde(default, deserialize_with = "de_opt_number", skip_serializing_if = "Option::is_none")]
    pub cps: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnimationStep {
    pub fn styles(&self) -> StyleSet {
        StyleSet::parse(self.style.as_deref().unwrap_or(""))
    }

    pub fn has_style(&self) -> bool {
        self.style
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    /// True when every field the play path relies on has been resolved.
    pub fn is_normalized(&self) -> bool {
        self.left.is_some()
            && self.top.is_some()
            && self.opacity.is_some()
            && self.duration.is_some()
            && self.delay.is_some()
            && self.anchor.is_some()
    }
}

fn de_opt_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
        Null,
    }
    match Option::<Raw>::deserialize(d)? {
        None | Some(Raw::Null) => Ok(None),
        Some(Raw::Num(n)) => Ok(n.is_finite().then_some(n)),
        Some(Raw::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(|n| n.is_finite().then_some(n))
                .map_err(|_| serde::de::Error::custom(format!("expected a number, got `{s}`")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_tokens_case_insensitive_and_deduped() {
        let s = StyleSet::parse("SlideInRight fadein  slideinright bogus");
        assert!(s.contains(StyleToken::SlideInRight));
        assert!(s.contains(StyleToken::FadeIn));
        assert_eq!(s.iter().count(), 2);
        assert!(!s.is_slide_out());
        assert!(StyleSet::parse("slideOutTop").is_slide_out());
    }

    #[test]
    fn numbers_accept_strings() {
        let step: AnimationStep =
            serde_json::from_str(r#"{"style":"zoom","scale":"1.5","duration":2,"delay":""}"#)
                .expect("parses");
        assert_eq!(step.scale, Some(1.5));
        assert_eq!(step.duration, Some(2.0));
        assert_eq!(step.delay, None);
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let step: AnimationStep =
            serde_json::from_str(r#"{"style":"fadeIn","note":"authored"}"#).expect("parses");
        let back = serde_json::to_value(&step).expect("serializes");
        assert_eq!(back["note"], "authored");
        assert_eq!(back["style"], "fadeIn");
        assert!(back.get("left").is_none());
    }

    #[test]
    fn keyword_round_trip() {
        for t in StyleToken::LEGACY_PRIORITY {
            assert_eq!(StyleToken::from_keyword(t.keyword()), Some(t));
        }
    }
}
