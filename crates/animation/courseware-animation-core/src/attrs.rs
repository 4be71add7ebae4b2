//! Attribute, class and style names shared with authored content.
//!
//! HTML attribute names are case-insensitive; hosts are expected to match
//! these lowercase spellings against `data-horizontalAnchor` and friends.

pub const ANIMATION: &str = "data-animation";
pub const CURRENT_INDEX: &str = "data-currentindex";
pub const ANIMATION_PANE: &str = "data-animationpane";
pub const DURATION: &str = "data-duration";
pub const DELAY: &str = "data-delay";
pub const ZOOM: &str = "data-zoom";
pub const CPS: &str = "data-cps";
pub const START_FUNCTION: &str = "data-startfunction";
pub const END_FUNCTION: &str = "data-endfunction";
pub const CHAIN: &str = "data-chain";
pub const BEGIN_SOUND: &str = "data-beginsound";
pub const END_SOUND: &str = "data-endsound";
pub const HORIZONTAL_ANCHOR: &str = "data-horizontalanchor";
pub const VERTICAL_ANCHOR: &str = "data-verticalanchor";
/// Misspelling used by early course content; accepted alongside the correct one.
pub const VERTICLE_ANCHOR: &str = "data-verticleanchor";
pub const LEGACY_ANCHOR: &str = "data-anchor";
pub const TYPEWRITER_FULL: &str = "data-tw-full";
/// Current sprite frame, mirrored for hosts that draw sheets themselves.
pub const SPRITE_FRAME: &str = "data-sprite-frame";

pub const ARIA_HIDDEN: &str = "aria-hidden";
pub const ARIA_LABEL: &str = "aria-label";
pub const ARIA_LIVE: &str = "aria-live";
pub const TABINDEX: &str = "tabindex";

pub const TYPEWRITER_CLASS: &str = "typewriter";
pub const ZOOM_CLASS: &str = "zoom";
pub const TYPEWRITER_SPAN_CLASS: &str = "tw-txt";

pub mod style {
    pub const TRANSFORM: &str = "transform";
    pub const TRANSFORM_ORIGIN: &str = "transform-origin";
    pub const OPACITY: &str = "opacity";
    pub const VISIBILITY: &str = "visibility";
    pub const LEFT: &str = "left";
    pub const TOP: &str = "top";
    pub const TRANSITION_PROPERTY: &str = "transition-property";
    pub const TRANSITION_DURATION: &str = "transition-duration";
    pub const TRANSITION_TIMING_FUNCTION: &str = "transition-timing-function";
    pub const TRANSITION_DELAY: &str = "transition-delay";
    pub const WILL_CHANGE: &str = "will-change";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const BACKGROUND_IMAGE: &str = "background-image";
    pub const BACKGROUND_REPEAT: &str = "background-repeat";
    pub const BACKGROUND_POSITION: &str = "background-position";
    pub const IMAGE_RENDERING: &str = "image-rendering";

    /// Inline properties stripped once a transition completes.
    pub const TRANSITION_ONLY: [&str; 5] = [
        TRANSITION_PROPERTY,
        TRANSITION_DURATION,
        TRANSITION_TIMING_FUNCTION,
        TRANSITION_DELAY,
        WILL_CHANGE,
    ];
}
