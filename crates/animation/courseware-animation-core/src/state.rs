//! Per-element bookkeeping, kept in a side table keyed by element handle.
//!
//! Entries are swept with `retain_connected` after the host replaces page
//! content.

use hashbrown::HashMap;

use crate::ids::{ElementId, TimerId};
use crate::step::AnimationStep;

/// End-of-animation side effects captured when a step starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Completion {
    pub token: u64,
    pub opacity: Option<f64>,
    pub end_function: Option<String>,
    pub begin_sound: Option<String>,
    pub end_sound: Option<String>,
    pub chain: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ElementState {
    /// Normalized steps written by the setup pass.
    pub steps: Option<Vec<AnimationStep>>,
    /// Step the next un-indexed play will run.
    pub cursor: usize,
    /// Current run token; bumped on every play and cancel.
    pub token: u64,
    /// Pending fallback guards.
    pub guards: Vec<TimerId>,
    /// Transform-path completions waiting for a transition end.
    pub pending: Vec<Completion>,
    /// Set while the engine holds the element out of the tab order.
    pub tabindex_forced: bool,
    /// Author tabindex to restore when the element is shown again.
    pub saved_tabindex: Option<String>,
    /// Begin sound of the latest run, stopped by the page-hide sweep.
    pub begin_sound: Option<String>,
}

#[derive(Debug, Default)]
pub struct ElementTable {
    items: HashMap<ElementId, ElementState>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, el: ElementId) -> Option<&ElementState> {
        self.items.get(&el)
    }

    pub fn get_mut(&mut self, el: ElementId) -> Option<&mut ElementState> {
        self.items.get_mut(&el)
    }

    pub fn entry(&mut self, el: ElementId) -> &mut ElementState {
        self.items.entry(el).or_default()
    }

    /// Current run token (0 for an element never played).
    pub fn token(&self, el: ElementId) -> u64 {
        self.items.get(&el).map(|s| s.token).unwrap_or(0)
    }

    /// Bump and return the element's run token.
    pub fn bump_token(&mut self, el: ElementId) -> u64 {
        let st = self.entry(el);
        st.token = st.token.wrapping_add(1);
        st.token
    }

    /// Drop every entry whose element fails `keep`; returns the dropped
    /// handles so the caller can release their timers.
    pub fn retain_connected(&mut self, mut keep: impl FnMut(ElementId) -> bool) -> Vec<(ElementId, ElementState)> {
        let gone: Vec<ElementId> = self.items.keys().copied().filter(|el| !keep(*el)).collect();
        gone.into_iter()
            .filter_map(|el| self.items.remove(&el).map(|st| (el, st)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
