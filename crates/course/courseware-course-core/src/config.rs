use serde::{Deserialize, Serialize};

/// What next-from-last and previous-from-first do.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Stay on the current page.
    #[default]
    Stay,
    /// Roll over to the first/last page of the course.
    Wrap,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    pub animation: courseware_animation_core::Config,
    pub boundary: BoundaryPolicy,
    /// Duration of the content-row slide between pages.
    pub slide_duration_ms: f64,
    /// Rendered as an alert in the target pane when a page fails to load.
    pub load_error_message: String,
    /// Page-lifecycle hooks called after every arrival.
    pub page_loaded_hook: String,
    pub moved_in_hook: String,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            animation: Default::default(),
            boundary: BoundaryPolicy::Stay,
            slide_duration_ms: 800.0,
            load_error_message: "Sorry, failed to load this page.".to_string(),
            page_loaded_hook: "pageLoaded".to_string(),
            moved_in_hook: "finishedMovingIn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: CourseConfig =
            serde_json::from_str(r#"{"boundary":"wrap","animation":{"reduced_motion":true}}"#)
                .unwrap();
        assert_eq!(cfg.boundary, BoundaryPolicy::Wrap);
        assert!(cfg.animation.reduced_motion);
        assert_eq!(cfg.slide_duration_ms, 800.0);
        assert_eq!(cfg.page_loaded_hook, "pageLoaded");
    }
}
