//! Core configuration for courseware-animation-core.

use serde::{Deserialize, Serialize};

/// How the auto-advancing step cursor behaves past the last step.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Wrap back to step 0 after the last step.
    #[default]
    Loop,
    /// Stay on the last step once reached.
    Clamp,
}

/// Engine configuration. Every field has a default so adapters can pass a
/// partial JSON object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolve every animation instantly to its final state.
    pub reduced_motion: bool,
    pub cursor_mode: CursorMode,
    /// Pane used for geometry when an element does not name one.
    pub default_pane: String,
    /// Selector matched by the setup pass and the page-hide sweep.
    pub animatable_selector: String,
    /// Slack added to `delay + duration` before a guard timer synthesizes
    /// a transition end.
    pub guard_epsilon_ms: f64,
    /// Step duration (seconds) used by the setup pass when none is given.
    pub setup_duration_s: f64,
    /// Step duration (seconds) used at play time when a step carries none.
    pub play_duration_s: f64,
    pub default_easing: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            cursor_mode: CursorMode::Loop,
            default_pane: "#courseWindow".to_string(),
            animatable_selector: ".animateMe".to_string(),
            guard_epsilon_ms: 50.0,
            setup_duration_s: 1.0,
            play_duration_s: 0.6,
            default_easing: "linear".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "reduced_motion": true, "cursor_mode": "clamp" }"#)
                .expect("config parses");
        assert!(cfg.reduced_motion);
        assert_eq!(cfg.cursor_mode, CursorMode::Clamp);
        assert_eq!(cfg.default_pane, "#courseWindow");
        assert_eq!(cfg.play_duration_s, 0.6);
    }
}
