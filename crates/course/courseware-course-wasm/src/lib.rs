use js_sys::{Function, JSON};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use courseware_animation_core::{ElementId, HookContext, SpriteConfig, SpriteId, Target};
use courseware_course_core::{
    AssetKind, AudioBackend, Course, CourseConfig, CourseData, FetchTicket, LoadResult, LoadTicket,
    NavOutcome, NavigationError, NullAudio, PageContext, PreloadManifest, Preloader,
};

mod host;
mod logging;

use host::{JsAudio, JsHost, JsPreloadHost};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// `play_animation` target: a numeric element handle or a selector.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsTarget {
    Element(u32),
    Selector(String),
}

impl From<JsTarget> for Target {
    fn from(t: JsTarget) -> Self {
        match t {
            JsTarget::Element(id) => Target::Element(ElementId(id)),
            JsTarget::Selector(sel) => Target::Selector(sel),
        }
    }
}

#[derive(Deserialize)]
struct JsPlay {
    target: JsTarget,
    #[serde(default)]
    index: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsPlays {
    Many(Vec<JsPlay>),
    One(JsPlay),
}

/// Follow-up plays a JS hook returned: `undefined`, one `{ target, index? }`
/// or an array of them.
fn play_requests(ret: JsValue) -> Vec<JsPlay> {
    if jsvalue_is_undefined_or_null(&ret) {
        return Vec::new();
    }
    match swb::from_value::<JsPlays>(ret) {
        Ok(JsPlays::Many(v)) => v,
        Ok(JsPlays::One(p)) => vec![p],
        Err(e) => {
            log::warn!("hook return value ignored: {e}");
            Vec::new()
        }
    }
}

/// Plain objects rather than `Map`s, so flattened fields read naturally in JS.
fn to_js<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("{what} error: {e}")))
}

/// JSON text as given, or `JSON.stringify` of an object.
fn json_text(v: &JsValue, what: &str) -> Result<String, JsError> {
    match v.as_string() {
        Some(s) => Ok(s),
        None => JSON::stringify(v)
            .map_err(|e| JsError::new(&format!("{what} stringify error: {:?}", e)))?
            .as_string()
            .ok_or_else(|| JsError::new(&format!("{what}: stringify produced non-string"))),
    }
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn target_from_js(v: JsValue) -> Result<Target, JsError> {
    swb::from_value::<JsTarget>(v)
        .map(Target::from)
        .map_err(|_| JsError::new("target must be an element handle or a selector string"))
}

#[derive(Serialize)]
struct NavReply {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticket: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
}

impl NavReply {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            ticket: None,
            module: None,
            page: None,
        }
    }
}

/// Busy is an expected answer for click handlers, not an exception.
fn nav_reply(res: Result<NavOutcome, NavigationError>) -> Result<JsValue, JsError> {
    let reply = match res {
        Ok(NavOutcome::Loading { ticket, target }) => NavReply {
            status: "loading",
            ticket: Some(ticket.0),
            module: Some(target.module),
            page: Some(target.page),
        },
        Ok(NavOutcome::Stayed) => NavReply::status("stayed"),
        Err(NavigationError::Busy) => NavReply::status("busy"),
        Err(e) => return Err(JsError::new(&e.to_string())),
    };
    to_js(&reply, "reply")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageHookArg<'a> {
    module: usize,
    page: usize,
    page_id: Option<&'a str>,
}

#[wasm_bindgen]
pub struct CoursewarePlayer {
    course: Course,
    host: JsHost,
}

#[wasm_bindgen]
impl CoursewarePlayer {
    /// Create a player.
    ///
    /// - `config`: JSON `CourseConfig`, or undefined/null for defaults.
    /// - `course`: the parsed `course.json` object, or its text.
    /// - `host`: object implementing the document surface.
    /// - `audio`: optional object with `play`/`stop`/`setVolume`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        course: JsValue,
        host: JsValue,
        audio: JsValue,
    ) -> Result<CoursewarePlayer, JsError> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();
        logging::init(log::LevelFilter::Warn);

        let cfg: CourseConfig = if jsvalue_is_undefined_or_null(&config) {
            CourseConfig::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        let text = json_text(&course, "course")?;
        let data = CourseData::from_json(&text).map_err(|e| JsError::new(&e.to_string()))?;

        let host = JsHost::new(host).map_err(|e| JsError::new(&format!("{e:#}")))?;
        let audio: Box<dyn AudioBackend> = if jsvalue_is_undefined_or_null(&audio) {
            Box::new(NullAudio)
        } else {
            Box::new(JsAudio::new(audio).map_err(|e| JsError::new(&format!("{e:#}")))?)
        };

        Ok(CoursewarePlayer {
            course: Course::new(cfg, data, audio),
            host,
        })
    }

    /// Console log level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[wasm_bindgen(js_name = set_log_level)]
    pub fn set_log_level(&self, level: &str) -> Result<(), JsError> {
        let level = logging::parse_level(level)
            .ok_or_else(|| JsError::new(&format!("unknown log level `{level}`")))?;
        logging::init(level);
        Ok(())
    }

    // -- navigation ----------------------------------------------------

    /// Measure the viewport and load the first page in place.
    pub fn start(&mut self) -> Result<JsValue, JsError> {
        let res = self.course.start(&mut self.host).map_err(|e| JsError::new(&e.to_string()))?;
        nav_reply(Ok(res))
    }

    #[wasm_bindgen(js_name = goto_next_page)]
    pub fn goto_next_page(&mut self) -> Result<JsValue, JsError> {
        nav_reply(self.course.goto_next_page(&mut self.host))
    }

    #[wasm_bindgen(js_name = goto_previous_page)]
    pub fn goto_previous_page(&mut self) -> Result<JsValue, JsError> {
        nav_reply(self.course.goto_previous_page(&mut self.host))
    }

    #[wasm_bindgen(js_name = goto_page)]
    pub fn goto_page(&mut self, module: usize, page: usize, direction: i32) -> Result<JsValue, JsError> {
        nav_reply(self.course.goto_page(&mut self.host, module, page, direction))
    }

    #[wasm_bindgen(js_name = handle_module_click)]
    pub fn handle_module_click(&mut self, module: usize) -> Result<JsValue, JsError> {
        nav_reply(self.course.handle_module_click(&mut self.host, module))
    }

    /// Report a `fetchFragment` result. Pass an error message when the fetch
    /// failed. Returns `arrived`, `sliding`, `failed` or `ignored`.
    #[wasm_bindgen(js_name = fragment_loaded)]
    pub fn fragment_loaded(&mut self, ticket: u32, error: Option<String>) -> String {
        let result = match error {
            Some(reason) => Err(reason),
            None => Ok(()),
        };
        match self
            .course
            .on_fragment_loaded(&mut self.host, FetchTicket(ticket), result)
        {
            LoadResult::Arrived(_) => "arrived",
            LoadResult::Sliding => "sliding",
            LoadResult::Failed => "failed",
            LoadResult::Ignored => "ignored",
        }
        .to_string()
    }

    /// Report the end of the row slide. Returns whether a page arrived.
    #[wasm_bindgen(js_name = transition_complete)]
    pub fn transition_complete(&mut self) -> bool {
        self.course.on_transition_complete(&mut self.host).is_some()
    }

    pub fn resize(&mut self) {
        self.course.request_resize(&mut self.host);
    }

    #[wasm_bindgen(js_name = animation_frame)]
    pub fn animation_frame(&mut self) {
        self.course.on_animation_frame(&mut self.host);
    }

    // -- animation -----------------------------------------------------

    #[wasm_bindgen(js_name = set_up_animation)]
    pub fn set_up_animation(&mut self) -> usize {
        self.course.set_up_animation(&mut self.host)
    }

    /// Play the next step of `target` (element handle or selector), or step
    /// `index`. Returns whether a step started.
    #[wasm_bindgen(js_name = play_animation)]
    pub fn play_animation(&mut self, target: JsValue, index: Option<i32>) -> Result<bool, JsError> {
        let target = target_from_js(target)?;
        Ok(self
            .course
            .play_animation(&mut self.host, target, index.map(i64::from))
            .started())
    }

    /// Forward a `transitionend` event for element `el`.
    #[wasm_bindgen(js_name = transition_end)]
    pub fn transition_end(&mut self, el: u32, property: Option<String>) {
        self.course
            .on_transition_end(&mut self.host, ElementId(el), property.as_deref());
    }

    /// Drive guard timers and typewriter ticks up to `now_ms`.
    pub fn advance(&mut self, now_ms: f64) {
        self.course.advance_to(&mut self.host, now_ms);
    }

    #[wasm_bindgen(js_name = page_hide)]
    pub fn page_hide(&mut self) {
        self.course.page_hide(&mut self.host);
    }

    #[wasm_bindgen(js_name = set_reduced_motion)]
    pub fn set_reduced_motion(&mut self, on: bool) {
        self.course.set_reduced_motion(on);
    }

    /// Register a `startFunction`/`endFunction` callback. It is called with
    /// the element handle and may return follow-up plays.
    #[wasm_bindgen(js_name = register_hook)]
    pub fn register_hook(&mut self, name: &str, f: Function) {
        self.course
            .animation_hooks()
            .register(name, move |ctx: &mut HookContext| {
                match f.call1(&JsValue::UNDEFINED, &JsValue::from(ctx.element.0)) {
                    Ok(ret) => {
                        for p in play_requests(ret) {
                            ctx.play(p.target, p.index);
                        }
                    }
                    Err(e) => log::warn!("animation hook threw: {e:?}"),
                }
            });
    }

    #[wasm_bindgen(js_name = unregister_hook)]
    pub fn unregister_hook(&mut self, name: &str) -> bool {
        self.course.animation_hooks().unregister(name)
    }

    /// Register a page hook (`pageLoaded`, `finishedMovingIn` or a page's
    /// `onLoad`). It is called with `{ module, page, pageId }`.
    #[wasm_bindgen(js_name = register_page_hook)]
    pub fn register_page_hook(&mut self, name: &str, f: Function) {
        self.course
            .page_hooks()
            .register(name, move |ctx: &mut PageContext| {
                let arg = PageHookArg {
                    module: ctx.position.module,
                    page: ctx.position.page,
                    page_id: ctx.page_id.as_deref(),
                };
                let arg = match arg.serialize(&swb::Serializer::json_compatible()) {
                    Ok(v) => v,
                    Err(e) => {
                        log::warn!("page hook argument error: {e}");
                        return;
                    }
                };
                match f.call1(&JsValue::UNDEFINED, &arg) {
                    Ok(ret) => {
                        for p in play_requests(ret) {
                            ctx.play(p.target, p.index);
                        }
                    }
                    Err(e) => log::warn!("page hook threw: {e:?}"),
                }
            });
    }

    #[wasm_bindgen(js_name = unregister_page_hook)]
    pub fn unregister_page_hook(&mut self, name: &str) -> bool {
        self.course.page_hooks().unregister(name)
    }

    // -- sprites -------------------------------------------------------

    /// Bind a sprite sheet to element `el` once its image has loaded.
    /// `config` is the sheet options object (or its JSON text); returns the
    /// sprite handle.
    #[wasm_bindgen(js_name = load_sprite)]
    pub fn load_sprite(
        &mut self,
        el: u32,
        config: JsValue,
        sheet_width: f64,
        sheet_height: f64,
    ) -> Result<u32, JsError> {
        let cfg = SpriteConfig::from_json(&json_text(&config, "sprite")?).map_err(js_err)?;
        self.course
            .load_sprite(&mut self.host, ElementId(el), cfg, sheet_width, sheet_height)
            .map(|id| id.0)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = play_sprite)]
    pub fn play_sprite(&mut self, id: u32) -> Result<(), JsError> {
        self.course.play_sprite(SpriteId(id)).map_err(js_err)
    }

    #[wasm_bindgen(js_name = pause_sprite)]
    pub fn pause_sprite(&mut self, id: u32) -> Result<(), JsError> {
        self.course.pause_sprite(SpriteId(id)).map_err(js_err)
    }

    #[wasm_bindgen(js_name = stop_sprite)]
    pub fn stop_sprite(&mut self, id: u32) -> Result<(), JsError> {
        self.course
            .stop_sprite(&mut self.host, SpriteId(id))
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = goto_sprite_frame)]
    pub fn goto_sprite_frame(&mut self, id: u32, frame: u32) -> Result<(), JsError> {
        self.course
            .goto_sprite_frame(&mut self.host, SpriteId(id), frame)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = set_sprite_range)]
    pub fn set_sprite_range(&mut self, id: u32, start: u32, end: u32) -> Result<(), JsError> {
        self.course
            .set_sprite_range(&mut self.host, SpriteId(id), start, end)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = set_sprite_fps)]
    pub fn set_sprite_fps(&mut self, id: u32, fps: u32) -> Result<(), JsError> {
        self.course
            .sprite_settings(SpriteId(id), Some(fps), None)
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = set_sprite_loop)]
    pub fn set_sprite_loop(&mut self, id: u32, looping: bool, ping_pong: bool) -> Result<(), JsError> {
        self.course
            .sprite_settings(SpriteId(id), None, Some((looping, ping_pong)))
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = destroy_sprite)]
    pub fn destroy_sprite(&mut self, id: u32) -> bool {
        self.course.destroy_sprite(SpriteId(id))
    }

    // -- sound ---------------------------------------------------------

    #[wasm_bindgen(js_name = add_sound)]
    pub fn add_sound(&mut self, name: &str, url: &str) -> bool {
        self.course.add_sound(name, url)
    }

    #[wasm_bindgen(js_name = play_sound)]
    pub fn play_sound(&mut self, name: &str) -> Result<(), JsError> {
        self.course
            .play_sound(name)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = stop_sound)]
    pub fn stop_sound(&mut self, name: &str) -> Result<(), JsError> {
        self.course
            .stop_sound(name)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = stop_all_sounds)]
    pub fn stop_all_sounds(&mut self) -> Result<(), JsError> {
        self.course
            .stop_all_sounds()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// The audio element for `name` reached its end.
    #[wasm_bindgen(js_name = sound_ended)]
    pub fn sound_ended(&mut self, name: &str) {
        self.course.sound_bank().on_ended(name);
    }

    #[wasm_bindgen(js_name = set_master_volume)]
    pub fn set_master_volume(&mut self, volume: f64) {
        self.course.sound_bank().set_master_volume(volume);
    }

    pub fn mute(&mut self, on: bool) {
        self.course.sound_bank().mute(on);
    }

    // -- lookups -------------------------------------------------------

    /// Committed `{ module, page }`.
    pub fn position(&self) -> Result<JsValue, JsError> {
        to_js(&self.course.position(), "position")
    }

    #[wasm_bindgen(js_name = is_busy)]
    pub fn is_busy(&self) -> bool {
        self.course.navigator().is_busy()
    }

    #[wasm_bindgen(js_name = viewed_count)]
    pub fn viewed_count(&self) -> usize {
        self.course.viewed_count()
    }

    #[wasm_bindgen(js_name = module_count)]
    pub fn module_count(&self) -> usize {
        self.course.module_count()
    }

    #[wasm_bindgen(js_name = page_count)]
    pub fn page_count(&self, module: usize) -> usize {
        self.course.page_count(module)
    }

    #[wasm_bindgen(js_name = page_url)]
    pub fn page_url(&self, module: usize, page: usize) -> Option<String> {
        self.course.page_url(module, page).map(str::to_string)
    }

    #[wasm_bindgen(js_name = is_quiz)]
    pub fn is_quiz(&self, module: usize, page: usize) -> bool {
        self.course.is_quiz(module, page)
    }

    #[wasm_bindgen(js_name = for_quiz_credit)]
    pub fn for_quiz_credit(&self, module: usize, page: usize) -> bool {
        self.course.for_quiz_credit(module, page)
    }

    /// The parsed course tree.
    #[wasm_bindgen(js_name = course_data)]
    pub fn course_data(&self) -> Result<JsValue, JsError> {
        to_js(self.course.data(), "course")
    }

    /// Animation steps currently stored for element `el`, if it was set up.
    pub fn steps(&self, el: u32) -> Result<JsValue, JsError> {
        to_js(&self.course.engine().steps(ElementId(el)), "steps")
    }
}

/// Manifest preloader. The host object's `load(ticket, kind, key, url)`
/// starts one load; the page answers with `finished(ticket, error?)`.
#[wasm_bindgen]
pub struct AssetPreloader {
    inner: Preloader,
    host: JsPreloadHost,
}

#[wasm_bindgen]
impl AssetPreloader {
    /// `manifest` is the manifest object or its JSON text. A missing or zero
    /// `concurrency` uses the default of 4.
    #[wasm_bindgen(constructor)]
    pub fn new(manifest: JsValue, host: JsValue, concurrency: Option<u32>) -> Result<AssetPreloader, JsError> {
        let manifest = PreloadManifest::from_json(&json_text(&manifest, "manifest")?).map_err(js_err)?;
        let host = JsPreloadHost::new(host).map_err(|e| JsError::new(&format!("{e:#}")))?;
        Ok(AssetPreloader {
            inner: Preloader::new(&manifest, concurrency.unwrap_or(0) as usize),
            host,
        })
    }

    /// Start as many loads as the concurrency allows. Returns how many began.
    pub fn start(&mut self) -> usize {
        self.inner.start(&mut self.host)
    }

    /// Report a load result. Returns `{ completed, total, percent, item? }`,
    /// or `undefined` for an unknown ticket or after `abort`.
    pub fn finished(&mut self, ticket: u32, error: Option<String>) -> Result<JsValue, JsError> {
        let result = match error {
            Some(reason) => Err(reason),
            None => Ok(()),
        };
        match self.inner.finished(&mut self.host, LoadTicket(ticket), result) {
            Some(progress) => to_js(&progress, "progress"),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn abort(&mut self) {
        self.inner.abort();
    }

    #[wasm_bindgen(js_name = is_done)]
    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    pub fn progress(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.progress(), "progress")
    }

    /// Whether `key` of `kind` (`image`, `audio` or `video`) loaded.
    #[wasm_bindgen(js_name = is_loaded)]
    pub fn is_loaded(&self, kind: &str, key: &str) -> Result<bool, JsError> {
        let kind: AssetKind = swb::from_value(JsValue::from_str(kind))
            .map_err(|_| JsError::new(&format!("unknown asset kind `{kind}`")))?;
        Ok(self.inner.is_loaded(kind, key))
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
