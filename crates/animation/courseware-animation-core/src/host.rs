//! Adapter contracts: the document surface and the sound collaborator.
//!
//! Adapters (wasm, in-memory test document) implement these traits; the
//! engine never touches a real DOM.

use crate::error::SoundError;
use crate::geometry::Rect;
use crate::ids::ElementId;

/// Document access needed by the animation engine.
pub trait AnimationHost {
    /// First element matching `selector`, in document order.
    fn query(&self, selector: &str) -> Option<ElementId>;
    /// First descendant of `root` matching `selector`.
    fn query_within(&self, root: ElementId, selector: &str) -> Option<ElementId>;
    /// Every element matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementId>;

    /// Still attached to the document.
    fn is_connected(&self, el: ElementId) -> bool;
    /// `document.visibilityState === "hidden"`.
    fn document_hidden(&self) -> bool;
    /// Narrow phone layout, where animations are disabled.
    fn is_phone_layout(&self) -> bool {
        false
    }

    /// Outer box in page coordinates, ignoring transforms.
    fn measure(&self, el: ElementId) -> Rect;

    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str);
    fn remove_attribute(&mut self, el: ElementId, name: &str);
    fn has_class(&self, el: ElementId, class: &str) -> bool;

    /// Inline style property value.
    fn style(&self, el: ElementId, prop: &str) -> Option<String>;
    /// Set an inline style property; an empty value clears it.
    fn set_style(&mut self, el: ElementId, prop: &str, value: &str);
    /// Computed `transform` (`matrix(...)`, `matrix3d(...)` or `none`).
    fn computed_transform(&self, el: ElementId) -> Option<String>;
    /// Force a synchronous layout so the current styles become the start of
    /// the next transition.
    fn flush_layout(&mut self, el: ElementId);

    fn text_content(&self, el: ElementId) -> String;
    fn set_text_content(&mut self, el: ElementId, text: &str);
    fn clear_children(&mut self, el: ElementId);
    /// Append a `<span class=...>` with extra attributes; returns the new span.
    fn append_span(&mut self, parent: ElementId, class: &str, attrs: &[(&str, &str)]) -> ElementId;
    /// Keyboard-focusable descendants of `el` (links, enabled controls,
    /// `[tabindex]`, ...).
    fn focusable_descendants(&self, el: ElementId) -> Vec<ElementId>;
}

/// Audio collaborator. Calls are best-effort; callers drop the errors.
pub trait SoundSink {
    fn play_sound(&mut self, name: &str) -> Result<(), SoundError>;
    fn stop_sound(&mut self, name: &str) -> Result<(), SoundError>;
    fn stop_all_sounds(&mut self) -> Result<(), SoundError>;
}

/// A sink that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl SoundSink for Silence {
    fn play_sound(&mut self, _name: &str) -> Result<(), SoundError> {
        Ok(())
    }
    fn stop_sound(&mut self, _name: &str) -> Result<(), SoundError> {
        Ok(())
    }
    fn stop_all_sounds(&mut self) -> Result<(), SoundError> {
        Ok(())
    }
}

/// What `play_animation` animates: an element handle or a selector resolved
/// to its first match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Element(ElementId),
    Selector(String),
}

impl Target {
    pub fn resolve(&self, host: &dyn AnimationHost) -> Option<ElementId> {
        match self {
            Target::Element(el) => Some(*el),
            Target::Selector(sel) => host.query(sel),
        }
    }
}

impl From<ElementId> for Target {
    fn from(el: ElementId) -> Self {
        Target::Element(el)
    }
}

impl From<&str> for Target {
    fn from(sel: &str) -> Self {
        Target::Selector(sel.to_string())
    }
}

impl From<String> for Target {
    fn from(sel: String) -> Self {
        Target::Selector(sel)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Element(el) => write!(f, "element #{}", el.0),
            Target::Selector(sel) => f.write_str(sel),
        }
    }
}
