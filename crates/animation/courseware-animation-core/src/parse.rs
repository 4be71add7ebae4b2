//! Declarative attribute → step list.
//!
//! Authoring tools leave artifacts in `data-animation`: HTML-escaped quotes,
//! typographic quotes and `;` between step objects. Those are normalized
//! before the JSON parse. A value with no JSON delimiters may also be the
//! legacy `left|top|opacity` form.

use serde_json::Value as JsonValue;

use crate::error::AnimationError;
use crate::step::AnimationStep;

/// Parse an attribute value, logging and returning an empty list on failure.
pub fn parse_step_list(raw: &str) -> Vec<AnimationStep> {
    match try_parse_step_list(raw) {
        Ok(steps) => steps,
        Err(e) => {
            log::error!("{e}");
            Vec::new()
        }
    }
}

/// Parse an attribute value. A blank value is an empty list, not an error.
pub fn try_parse_step_list(raw: &str) -> Result<Vec<AnimationStep>, AnimationError> {
    let text = normalize_quotes(raw);
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    if !text.contains(['{', '[']) && text.contains('|') {
        return parse_legacy_pipe(text).map(|s| vec![s]);
    }

    let text = join_semicolon_separated(text);
    let parsed: JsonValue = serde_json::from_str(&text).map_err(|e| AnimationError::InvalidJson {
        raw: text.clone(),
        reason: e.to_string(),
    })?;

    match parsed {
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| step_from_value(item, &text))
            .collect(),
        obj @ JsonValue::Object(_) => Ok(vec![step_from_value(obj, &text)?]),
        _ => Err(AnimationError::UnexpectedShape { raw: text }),
    }
}

fn step_from_value(v: JsonValue, raw: &str) -> Result<AnimationStep, AnimationError> {
    if !v.is_object() {
        return Err(AnimationError::UnexpectedShape {
            raw: raw.to_string(),
        });
    }
    serde_json::from_value(v).map_err(|e| AnimationError::InvalidJson {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

fn normalize_quotes(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Rewrite `;` separators that precede an object, array or string into `,`,
/// leaving semicolons inside string literals alone. A bare run of objects is
/// wrapped into an array.
fn join_semicolon_separated(text: &str) -> String {
    if !text.contains(';') {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 2);
    let mut in_string = false;
    let mut escaped = false;
    let mut replaced = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == ';' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && matches!(chars[j], '{' | '[' | '"') {
                out.push(',');
                replaced = true;
                i = j;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    if replaced && out.starts_with('{') {
        format!("[{out}]")
    } else {
        out
    }
}

fn parse_legacy_pipe(text: &str) -> Result<AnimationStep, AnimationError> {
    let field = |s: Option<&str>| -> Result<Option<f64>, AnimationError> {
        match s.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| AnimationError::InvalidLegacyField {
                    raw: text.to_string(),
                    field: s.to_string(),
                }),
        }
    };
    let mut parts = text.split('|');
    Ok(AnimationStep {
        left: field(parts.next())?,
        top: field(parts.next())?,
        opacity: field(parts.next())?,
        ..AnimationStep::default()
    })
}
