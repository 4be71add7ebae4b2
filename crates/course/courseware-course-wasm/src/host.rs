//! JavaScript-backed host and audio backend.
//!
//! The page supplies a plain object whose methods mirror the host traits in
//! camelCase (`query`, `setStyle`, `fetchFragment`, ...). Elements cross the
//! boundary as numeric handles the page allocates.

use anyhow::{anyhow, Context, Result};
use js_sys::{Array, Function, Object, Reflect};
use serde_wasm_bindgen as swb;
use wasm_bindgen::{JsCast, JsValue};

use courseware_animation_core::{AnimationHost, ElementId, Rect, SoundError};
use courseware_course_core::{
    AudioBackend, FetchTicket, LoadTicket, NavigationHost, PageIndicator, PaneSlot, PreloadHost,
    PreloadTask,
};

fn js_error(e: JsValue) -> anyhow::Error {
    match e.as_string() {
        Some(s) => anyhow!(s),
        None => anyhow!("{e:?}"),
    }
}

fn element(v: &JsValue) -> Option<ElementId> {
    v.as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| ElementId(n as u32))
}

fn handle(el: ElementId) -> JsValue {
    JsValue::from(el.0)
}

/// A JS object whose methods are called with the object as `this`.
#[derive(Clone)]
struct Callee {
    obj: Object,
    role: &'static str,
}

impl Callee {
    fn new(value: JsValue, role: &'static str) -> Result<Self> {
        let obj = value
            .dyn_into::<Object>()
            .map_err(|_| anyhow!("{role} must be an object"))?;
        Ok(Self { obj, role })
    }

    fn has(&self, method: &str) -> bool {
        Reflect::get(&self.obj, &JsValue::from_str(method))
            .map(|f| f.is_function())
            .unwrap_or(false)
    }

    fn call(&self, method: &str, args: &[JsValue]) -> Result<JsValue> {
        let f = Reflect::get(&self.obj, &JsValue::from_str(method)).map_err(js_error)?;
        let f: Function = f
            .dyn_into()
            .map_err(|_| anyhow!("{}.{method} is not a function", self.role))?;
        let argv: Array = args.iter().collect();
        f.apply(&self.obj, &argv)
            .map_err(js_error)
            .with_context(|| format!("{}.{method} threw", self.role))
    }

    /// Call and log failures; a failed call reads as `undefined`.
    fn get(&self, method: &str, args: &[JsValue]) -> JsValue {
        match self.call(method, args) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("{e:#}");
                JsValue::UNDEFINED
            }
        }
    }
}

pub(crate) struct JsHost {
    js: Callee,
}

impl JsHost {
    pub(crate) fn new(value: JsValue) -> Result<Self> {
        Ok(Self {
            js: Callee::new(value, "host")?,
        })
    }

    fn string(&self, method: &str, args: &[JsValue]) -> Option<String> {
        self.js.get(method, args).as_string()
    }

    fn flag(&self, method: &str, args: &[JsValue]) -> bool {
        self.js.get(method, args).as_bool().unwrap_or(false)
    }

    fn number(&self, method: &str) -> f64 {
        self.js.get(method, &[]).as_f64().unwrap_or(0.0)
    }

    fn elements(&self, method: &str, args: &[JsValue]) -> Vec<ElementId> {
        match self.js.get(method, args).dyn_into::<Array>() {
            Ok(arr) => arr.iter().filter_map(|v| element(&v)).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn phone(&self) -> bool {
        self.js.has("isPhoneLayout") && self.flag("isPhoneLayout", &[])
    }
}

impl AnimationHost for JsHost {
    fn query(&self, selector: &str) -> Option<ElementId> {
        element(&self.js.get("query", &[selector.into()]))
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Option<ElementId> {
        element(&self.js.get("queryWithin", &[handle(root), selector.into()]))
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        self.elements("queryAll", &[selector.into()])
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.flag("isConnected", &[handle(el)])
    }

    fn document_hidden(&self) -> bool {
        self.flag("documentHidden", &[])
    }

    fn is_phone_layout(&self) -> bool {
        self.phone()
    }

    fn measure(&self, el: ElementId) -> Rect {
        let v = self.js.get("measure", &[handle(el)]);
        swb::from_value(v).unwrap_or_else(|e| {
            log::warn!("host.measure returned an invalid rect: {e}");
            Rect::default()
        })
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.string("getAttribute", &[handle(el), name.into()])
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        self.js
            .get("setAttribute", &[handle(el), name.into(), value.into()]);
    }

    fn remove_attribute(&mut self, el: ElementId, name: &str) {
        self.js.get("removeAttribute", &[handle(el), name.into()]);
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.flag("hasClass", &[handle(el), class.into()])
    }

    fn style(&self, el: ElementId, prop: &str) -> Option<String> {
        self.string("getStyle", &[handle(el), prop.into()])
            .filter(|s| !s.is_empty())
    }

    fn set_style(&mut self, el: ElementId, prop: &str, value: &str) {
        self.js.get("setStyle", &[handle(el), prop.into(), value.into()]);
    }

    fn computed_transform(&self, el: ElementId) -> Option<String> {
        self.string("computedTransform", &[handle(el)])
    }

    fn flush_layout(&mut self, el: ElementId) {
        self.js.get("flushLayout", &[handle(el)]);
    }

    fn text_content(&self, el: ElementId) -> String {
        self.string("textContent", &[handle(el)]).unwrap_or_default()
    }

    fn set_text_content(&mut self, el: ElementId, text: &str) {
        self.js.get("setTextContent", &[handle(el), text.into()]);
    }

    fn clear_children(&mut self, el: ElementId) {
        self.js.get("clearChildren", &[handle(el)]);
    }

    fn append_span(&mut self, parent: ElementId, class: &str, attrs: &[(&str, &str)]) -> ElementId {
        let obj = Object::new();
        for (k, v) in attrs {
            let _ = Reflect::set(&obj, &JsValue::from_str(k), &JsValue::from_str(v));
        }
        let span = self
            .js
            .get("appendSpan", &[handle(parent), class.into(), obj.into()]);
        element(&span).unwrap_or_else(|| {
            log::error!("host.appendSpan returned no element handle");
            parent
        })
    }

    fn focusable_descendants(&self, el: ElementId) -> Vec<ElementId> {
        self.elements("focusableDescendants", &[handle(el)])
    }
}

impl NavigationHost for JsHost {
    fn is_phone_layout(&self) -> bool {
        self.phone()
    }

    fn viewport_width(&self) -> f64 {
        self.number("viewportWidth")
    }

    fn row_left(&self) -> f64 {
        self.number("rowLeft")
    }

    fn fetch_fragment(&mut self, ticket: FetchTicket, url: &str, slot: PaneSlot) {
        let slot = swb::to_value(&slot).unwrap_or(JsValue::UNDEFINED);
        self.js
            .get("fetchFragment", &[JsValue::from(ticket.0), url.into(), slot]);
    }

    fn show_load_error(&mut self, slot: PaneSlot, message: &str) {
        let slot = swb::to_value(&slot).unwrap_or(JsValue::UNDEFINED);
        self.js.get("showLoadError", &[slot, message.into()]);
    }

    fn slide_row(&mut self, to_left: f64, duration_ms: f64) {
        self.js
            .get("slideRow", &[JsValue::from(to_left), JsValue::from(duration_ms)]);
    }

    fn reset_row(&mut self, left: f64) {
        self.js.get("resetRow", &[JsValue::from(left)]);
    }

    fn promote_pane(&mut self, from: PaneSlot) {
        let slot = swb::to_value(&from).unwrap_or(JsValue::UNDEFINED);
        self.js.get("promotePane", &[slot]);
    }

    fn update_indicator(&mut self, indicator: &PageIndicator) {
        match swb::to_value(indicator) {
            Ok(v) => {
                self.js.get("updateIndicator", &[v]);
            }
            Err(e) => log::warn!("page indicator not serializable: {e}"),
        }
    }

    fn request_animation_frame(&mut self) {
        self.js.get("requestAnimationFrame", &[]);
    }
}

/// Audio backend over a JS object with `play(name, url, volume)`,
/// `stop(name)` and optionally `setVolume(name, volume)`.
pub(crate) struct JsAudio {
    js: Callee,
}

impl JsAudio {
    pub(crate) fn new(value: JsValue) -> Result<Self> {
        Ok(Self {
            js: Callee::new(value, "audio")?,
        })
    }

    fn playback(&self, name: &str, method: &str, args: &[JsValue]) -> Result<(), SoundError> {
        self.js
            .call(method, args)
            .map(|_| ())
            .map_err(|e| SoundError::Playback {
                name: name.to_string(),
                reason: format!("{e:#}"),
            })
    }
}

impl AudioBackend for JsAudio {
    fn play(&mut self, name: &str, url: &str, volume: f64) -> Result<(), SoundError> {
        self.playback(name, "play", &[name.into(), url.into(), JsValue::from(volume)])
    }

    fn stop(&mut self, name: &str) -> Result<(), SoundError> {
        self.playback(name, "stop", &[name.into()])
    }

    fn set_volume(&mut self, name: &str, volume: f64) {
        if self.js.has("setVolume") {
            self.js.get("setVolume", &[name.into(), JsValue::from(volume)]);
        }
    }
}

/// Preload host over a JS object with `load(ticket, kind, key, url)`.
pub(crate) struct JsPreloadHost {
    js: Callee,
}

impl JsPreloadHost {
    pub(crate) fn new(value: JsValue) -> Result<Self> {
        Ok(Self {
            js: Callee::new(value, "preload host")?,
        })
    }
}

impl PreloadHost for JsPreloadHost {
    fn start_load(&mut self, ticket: LoadTicket, task: &PreloadTask) {
        let kind = swb::to_value(&task.kind).unwrap_or(JsValue::UNDEFINED);
        self.js.get(
            "load",
            &[
                JsValue::from(ticket.0),
                kind,
                task.key.as_str().into(),
                task.url.as_str().into(),
            ],
        );
    }
}
