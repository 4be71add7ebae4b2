//! In-memory document implementing the animation and navigation host traits.
//!
//! Layout is static: every element carries the rect `measure` returns. The
//! computed transform is the inline `transform` style converted to a
//! `matrix(...)`, so slide-out steps see where the previous step left the
//! element. Fragment fetches queue up until the test completes them.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::Deserialize;

use courseware_animation_core::{AnimationHost, ElementId, Rect, Transform2D};
use courseware_course_core::{FetchTicket, NavigationHost, PageIndicator, PaneSlot};

use crate::selector::{Matchable, Selector};

/// Declarative element tree, used to build documents and page fragments.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub rect: Rect,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn rect(mut self, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.rect = Rect::new(left, top, width, height);
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<ElementId>,
    pub parent: Option<ElementId>,
    pub rect: Rect,
}

impl Matchable for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// A fetch issued through [`NavigationHost::fetch_fragment`].
#[derive(Clone, Debug, PartialEq)]
pub struct PendingFetch {
    pub ticket: FetchTicket,
    pub url: String,
    pub slot: PaneSlot,
}

#[derive(Clone)]
struct Ancestors<'a> {
    doc: &'a MemoryDocument,
    cur: Option<ElementId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let id = self.cur?;
        let parent = self.doc.node(id)?.parent?;
        self.cur = Some(parent);
        self.doc.node(parent)
    }
}

#[derive(Debug)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    root: ElementId,
    /// `document.visibilityState === "hidden"`.
    pub hidden: bool,
    /// Phone breakpoint active.
    pub phone: bool,
    row_left: f64,
    fragments: HashMap<String, Vec<ElementSpec>>,
    fetches: VecDeque<PendingFetch>,
    /// `(to_left, duration_ms)` of every row slide.
    pub slides: Vec<(f64, f64)>,
    pub indicators: Vec<PageIndicator>,
    pub frame_requests: usize,
    pub layout_flushes: usize,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

const FOCUSABLE_WHEN_ENABLED: [&str; 4] = ["button", "input", "select", "textarea"];

impl MemoryDocument {
    /// Empty document with a bare `<body>` root.
    pub fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            ..Default::default()
        };
        Self {
            nodes: vec![body],
            root: ElementId(0),
            hidden: false,
            phone: false,
            row_left: 0.0,
            fragments: HashMap::new(),
            fetches: VecDeque::new(),
            slides: Vec::new(),
            indicators: Vec::new(),
            frame_requests: 0,
            layout_flushes: 0,
        }
    }

    /// The player shell: an 800x600 `#courseWindow` holding the content row
    /// with previous/current/next panes side by side.
    pub fn course_shell() -> Self {
        let mut doc = Self::new();
        let shell = ElementSpec::new("div")
            .id("courseWindow")
            .rect(0.0, 0.0, 800.0, 600.0)
            .child(
                ElementSpec::new("div")
                    .id("wbtContentRow")
                    .rect(-800.0, 0.0, 2400.0, 600.0)
                    .child(ElementSpec::new("div").id("previousPage").rect(-800.0, 0.0, 800.0, 600.0))
                    .child(ElementSpec::new("div").id("currentPage").rect(0.0, 0.0, 800.0, 600.0))
                    .child(ElementSpec::new("div").id("nextPage").rect(800.0, 0.0, 800.0, 600.0)),
            );
        doc.append(doc.root, &shell);
        doc
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(el.0 as usize)
    }

    fn node_mut(&mut self, el: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(el.0 as usize)
    }

    /// Build `spec` under `parent`; returns the new element.
    pub fn append(&mut self, parent: ElementId, spec: &ElementSpec) -> ElementId {
        let mut attrs = spec.attrs.clone();
        if let Some(id) = &spec.id {
            attrs.insert("id".to_string(), id.clone());
        }
        if let Some(class) = &spec.class {
            attrs.insert("class".to_string(), class.clone());
        }
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag: spec.tag.to_ascii_lowercase(),
            attrs,
            styles: BTreeMap::new(),
            text: spec.text.clone(),
            children: Vec::new(),
            parent: Some(parent),
            rect: spec.rect,
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        for child in &spec.children {
            self.append(id, child);
        }
        id
    }

    /// Detach `el` from its parent. The node keeps its id but is no longer
    /// connected.
    pub fn remove(&mut self, el: ElementId) {
        let Some(parent) = self.node(el).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != el);
        }
        if let Some(n) = self.node_mut(el) {
            n.parent = None;
        }
    }

    pub fn set_rect(&mut self, el: ElementId, rect: Rect) {
        if let Some(n) = self.node_mut(el) {
            n.rect = rect;
        }
    }

    /// Element with `id`, or panic: tests only.
    pub fn by_id(&self, id: &str) -> ElementId {
        self.query(&format!("#{id}"))
            .unwrap_or_else(|| panic!("no element #{id}"))
    }

    fn ancestors(&self, el: ElementId) -> Ancestors<'_> {
        Ancestors { doc: self, cur: Some(el) }
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .node(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn select(&self, scope: ElementId, selector: &str) -> Vec<ElementId> {
        let Some(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(scope)
            .into_iter()
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|n| sel.matches(n, self.ancestors(*id)))
            })
            .collect()
    }

    fn is_focusable(node: &Node) -> bool {
        let has = |a: &str| node.attrs.contains_key(a);
        match node.tag.as_str() {
            "a" | "area" if has("href") => true,
            t if FOCUSABLE_WHEN_ENABLED.contains(&t) && !has("disabled") => true,
            "iframe" => true,
            "audio" | "video" if has("controls") => true,
            _ => has("contenteditable") || has("tabindex"),
        }
    }

    fn detach_children(&mut self, el: ElementId) {
        let children = self
            .node_mut(el)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for c in children {
            if let Some(n) = self.node_mut(c) {
                n.parent = None;
            }
        }
    }

    fn clone_subtree(&mut self, src: ElementId, parent: ElementId) {
        let Some(node) = self.node(src).cloned() else {
            return;
        };
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Node {
            children: Vec::new(),
            parent: Some(parent),
            ..node.clone()
        });
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        for child in node.children {
            self.clone_subtree(child, id);
        }
    }

    // ------------------------------------------------------------------
    // Navigation fixtures
    // ------------------------------------------------------------------

    pub fn pane(&self, slot: PaneSlot) -> Option<ElementId> {
        let sel = match slot {
            PaneSlot::Current => "#currentPage",
            PaneSlot::Next => "#nextPage",
            PaneSlot::Previous => "#previousPage",
        };
        self.query(sel)
    }

    /// Serve `elements` as the content of `url`.
    pub fn register_fragment(&mut self, url: &str, elements: Vec<ElementSpec>) {
        self.fragments.insert(url.to_string(), elements);
    }

    pub fn pending_fetches(&self) -> usize {
        self.fetches.len()
    }

    pub fn next_fetch(&self) -> Option<&PendingFetch> {
        self.fetches.front()
    }

    /// Resolve the oldest fetch: insert the registered fragment into its pane
    /// and return the ticket and outcome to hand back to the navigator.
    /// Unregistered URLs fail with `404`.
    pub fn complete_fetch(&mut self) -> Option<(FetchTicket, Result<(), String>)> {
        let fetch = self.fetches.pop_front()?;
        let Some(elements) = self.fragments.get(&fetch.url).cloned() else {
            return Some((fetch.ticket, Err(format!("404 {}", fetch.url))));
        };
        if let Some(pane) = self.pane(fetch.slot) {
            self.detach_children(pane);
            for spec in &elements {
                self.append(pane, spec);
            }
        }
        Some((fetch.ticket, Ok(())))
    }

    /// Text of the element, children included.
    pub fn text_of(&self, el: ElementId) -> String {
        let Some(n) = self.node(el) else {
            return String::new();
        };
        let mut out = n.text.clone();
        for c in &n.children {
            out.push_str(&self.text_of(*c));
        }
        out
    }
}

impl AnimationHost for MemoryDocument {
    fn query(&self, selector: &str) -> Option<ElementId> {
        self.select(self.root, selector).into_iter().next()
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Option<ElementId> {
        self.select(root, selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        self.select(self.root, selector)
    }

    fn is_connected(&self, el: ElementId) -> bool {
        let mut cur = el;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).and_then(|n| n.parent) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    fn document_hidden(&self) -> bool {
        self.hidden
    }

    fn is_phone_layout(&self) -> bool {
        self.phone
    }

    fn measure(&self, el: ElementId) -> Rect {
        self.node(el).map(|n| n.rect).unwrap_or_default()
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.node(el).and_then(|n| n.attrs.get(name).cloned())
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(el) {
            n.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) {
        if let Some(n) = self.node_mut(el) {
            n.attrs.remove(name);
        }
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el).is_some_and(|n| Matchable::has_class(n, class))
    }

    fn style(&self, el: ElementId, prop: &str) -> Option<String> {
        self.node(el).and_then(|n| n.styles.get(prop).cloned())
    }

    fn set_style(&mut self, el: ElementId, prop: &str, value: &str) {
        if let Some(n) = self.node_mut(el) {
            if value.is_empty() {
                n.styles.remove(prop);
            } else {
                n.styles.insert(prop.to_string(), value.to_string());
            }
        }
    }

    fn computed_transform(&self, el: ElementId) -> Option<String> {
        let inline = self.style(el, "transform").unwrap_or_default();
        match Transform2D::parse_css(&inline) {
            Some(t) if t != Transform2D::IDENTITY => Some(t.to_matrix()),
            _ => Some("none".to_string()),
        }
    }

    fn flush_layout(&mut self, _el: ElementId) {
        self.layout_flushes += 1;
    }

    fn text_content(&self, el: ElementId) -> String {
        self.text_of(el)
    }

    fn set_text_content(&mut self, el: ElementId, text: &str) {
        self.detach_children(el);
        if let Some(n) = self.node_mut(el) {
            n.text = text.to_string();
        }
    }

    fn clear_children(&mut self, el: ElementId) {
        self.set_text_content(el, "");
    }

    fn append_span(&mut self, parent: ElementId, class: &str, attrs: &[(&str, &str)]) -> ElementId {
        let mut spec = ElementSpec::new("span").class(class);
        for (k, v) in attrs {
            spec = spec.attr(k, v);
        }
        self.append(parent, &spec)
    }

    fn focusable_descendants(&self, el: ElementId) -> Vec<ElementId> {
        self.descendants(el)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(Self::is_focusable))
            .collect()
    }
}

impl NavigationHost for MemoryDocument {
    fn is_phone_layout(&self) -> bool {
        self.phone
    }

    fn viewport_width(&self) -> f64 {
        self.pane(PaneSlot::Current)
            .map(|p| AnimationHost::measure(self, p).width)
            .unwrap_or(0.0)
    }

    fn row_left(&self) -> f64 {
        self.row_left
    }

    fn fetch_fragment(&mut self, ticket: FetchTicket, url: &str, slot: PaneSlot) {
        self.fetches.push_back(PendingFetch {
            ticket,
            url: url.to_string(),
            slot,
        });
    }

    fn show_load_error(&mut self, slot: PaneSlot, message: &str) {
        if let Some(pane) = self.pane(slot) {
            self.detach_children(pane);
            let alert = ElementSpec::new("p").attr("role", "alert").text(message);
            self.append(pane, &alert);
        }
    }

    fn slide_row(&mut self, to_left: f64, duration_ms: f64) {
        self.slides.push((to_left, duration_ms));
        self.row_left = to_left;
    }

    fn reset_row(&mut self, left: f64) {
        self.row_left = left;
    }

    fn promote_pane(&mut self, from: PaneSlot) {
        let (Some(src), Some(dst)) = (self.pane(from), self.pane(PaneSlot::Current)) else {
            return;
        };
        if src == dst {
            return;
        }
        self.detach_children(dst);
        let children = self.node(src).map(|n| n.children.clone()).unwrap_or_default();
        for c in children {
            self.clone_subtree(c, dst);
        }
        self.detach_children(src);
    }

    fn update_indicator(&mut self, indicator: &PageIndicator) {
        self.indicators.push(*indicator);
    }

    fn request_animation_frame(&mut self) {
        self.frame_requests += 1;
    }
}
