//! Pane-relative displacement math for slide/fade/zoom steps.

use serde::{Deserialize, Serialize};

use crate::anchor::Anchor;
use crate::step::{AnimationStep, StyleSet, StyleToken};

/// Axis-aligned box in page pixels (natural, pre-transform layout).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Element and pane measurements taken together for one setup call.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PaneGeometry {
    pub pane: Rect,
    pub element: Rect,
}

impl PaneGeometry {
    /// Element offset from the pane's left edge.
    #[inline]
    pub fn dx(&self) -> f64 {
        self.element.left - self.pane.left
    }

    /// Element offset from the pane's top edge.
    #[inline]
    pub fn dy(&self) -> f64 {
        self.element.top - self.pane.top
    }
}

/// Element-level values a step falls back to when it does not set its own.
#[derive(Clone, Debug)]
pub struct StepDefaults {
    pub anchor: Anchor,
    pub duration: Option<f64>,
    pub delay: Option<f64>,
    pub zoom: Option<f64>,
    pub zoom_class: bool,
    pub fallback_duration: f64,
}

/// A normalized step plus the side effects the setup pass must apply to the
/// element before the first play.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedStep {
    pub step: AnimationStep,
    /// Start offset applied through the `left` style, when the step slides in.
    pub start_left: Option<f64>,
    /// Start offset applied through the `top` style, when the step slides in.
    pub start_top: Option<f64>,
    /// The element must start transparent (`fadeIn`).
    pub start_transparent: bool,
}

/// Resolve one step's target offsets, opacity, timing, scale and anchor.
///
/// Slide-in styles place the element just outside the matching pane edge and
/// target the natural position. Partial slides target the opposite pane edge.
/// Slide-out styles are resolved at play time from the live transform and get
/// a zero placeholder here.
pub fn normalize_step(raw: &AnimationStep, geom: &PaneGeometry, defaults: &StepDefaults) -> NormalizedStep {
    let styles = raw.styles();
    let (pw, ph) = (geom.pane.width, geom.pane.height);
    let (ew, eh) = (geom.element.width, geom.element.height);
    let (dx, dy) = (geom.dx(), geom.dy());

    let mut new_top = 0.0;
    let mut new_left = 0.0;
    let mut go_top = 0.0;
    let mut go_left = 0.0;
    let mut go_opacity = 1.0;
    let mut start_transparent = false;

    if styles.contains(StyleToken::SlideInBottom) {
        new_top = ph - dy;
    }
    if styles.contains(StyleToken::SlideInRight) {
        new_left = pw - dx;
    }
    if styles.contains(StyleToken::SlideInTop) {
        new_top = -(dy + eh);
    }
    if styles.contains(StyleToken::SlideInLeft) {
        new_left = -(dx + ew);
    }

    if styles.contains(StyleToken::SlideRight) {
        go_left = pw - ew;
    }
    if styles.contains(StyleToken::SlideLeft) {
        go_left = -(pw - ew);
    }
    if styles.contains(StyleToken::SlideBottom) {
        go_top = ph - eh;
    }
    if styles.contains(StyleToken::SlideTop) {
        go_top = -(ph - eh);
    }

    if styles.contains(StyleToken::FadeIn) {
        start_transparent = true;
        go_opacity = 1.0;
    }
    if styles.contains(StyleToken::FadeOut) {
        go_opacity = 0.0;
    }

    let start_top = (new_top != 0.0).then(|| {
        go_top = -new_top;
        new_top
    });
    let start_left = (new_left != 0.0).then(|| {
        go_left = -new_left;
        new_left
    });

    let mut step = raw.clone();
    step.left.get_or_insert(go_left);
    step.top.get_or_insert(go_top);
    step.opacity.get_or_insert(go_opacity);
    if step.duration.is_none() {
        step.duration = Some(defaults.duration.unwrap_or(defaults.fallback_duration));
    }
    if step.delay.is_none() {
        step.delay = Some(defaults.delay.unwrap_or(0.0));
    }

    let raw_zoom = step.scale.or(defaults.zoom);
    if styles.contains(StyleToken::Zoom) || defaults.zoom_class || raw_zoom.is_some() {
        step.scale = Some(raw_zoom.filter(|z| z.is_finite()).unwrap_or(1.0));
    }
    let anchor_valid = step
        .anchor
        .as_deref()
        .map(|a| !a.trim().is_empty())
        .unwrap_or(false);
    if !anchor_valid {
        step.anchor = Some(defaults.anchor.to_string());
    }

    NormalizedStep {
        step,
        start_left,
        start_top,
        start_transparent,
    }
}

/// Final translate for a slide-out step: push the element fully past the
/// named pane edge from wherever it currently is, keeping the other axis.
pub fn slide_out_target(
    styles: &StyleSet,
    current: (f64, f64),
    pane: (f64, f64),
    element: (f64, f64),
    fallback: (f64, f64),
) -> (f64, f64) {
    let (cx, cy) = current;
    let (pw, ph) = pane;
    let (ew, eh) = element;
    let mut target = fallback;
    if styles.contains(StyleToken::SlideOutLeft) {
        target = (cx - (pw + ew), cy);
    }
    if styles.contains(StyleToken::SlideOutRight) {
        target = (cx + (pw + ew), cy);
    }
    if styles.contains(StyleToken::SlideOutTop) {
        target = (cx, cy - (ph + eh));
    }
    if styles.contains(StyleToken::SlideOutBottom) {
        target = (cx, cy + (ph + eh));
    }
    target
}
