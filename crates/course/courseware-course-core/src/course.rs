//! Course controller: owns the course data, the navigator, the animation
//! engine and the sound bank, and runs the arrival sequence after every
//! page swap.

use courseware_animation_core::{
    AnimationError, AnimationHost, CallbackRegistry, ElementId, Engine, HookContext, PlayOutcome,
    PlayRequest, SoundError, SpriteConfig, SpriteId, Target,
};

use crate::config::CourseConfig;
use crate::data::CourseData;
use crate::error::{CourseError, NavigationError};
use crate::navigation::{FetchTicket, LoadResult, NavOutcome, NavigationHost, Navigator, Position};
use crate::sound::{AudioBackend, SoundBank};

/// A document that can both animate elements and navigate pages.
pub trait CourseHost: AnimationHost + NavigationHost {}

impl<T: AnimationHost + NavigationHost + ?Sized> CourseHost for T {}

/// Argument handed to page hooks (`onLoad`, `pageLoaded`, `finishedMovingIn`).
#[derive(Debug)]
pub struct PageContext {
    pub position: Position,
    pub page_id: Option<String>,
    requests: Vec<PlayRequest>,
}

impl PageContext {
    pub fn new(position: Position, page_id: Option<String>) -> Self {
        Self {
            position,
            page_id,
            requests: Vec::new(),
        }
    }

    /// Ask for `target` to be played once the hook returns.
    pub fn play(&mut self, target: impl Into<Target>, index: Option<i64>) {
        self.requests.push(PlayRequest {
            target: target.into(),
            index,
        });
    }

    pub fn take_requests(&mut self) -> Vec<PlayRequest> {
        std::mem::take(&mut self.requests)
    }
}

#[derive(Debug)]
pub struct Course {
    cfg: CourseConfig,
    data: CourseData,
    engine: Engine,
    nav: Navigator,
    sound: SoundBank,
    page_hooks: CallbackRegistry<PageContext>,
}

impl Course {
    pub fn new(cfg: CourseConfig, data: CourseData, audio: Box<dyn AudioBackend>) -> Self {
        log::info!(
            "course loaded: {} module(s), {} page(s)",
            data.module_count(),
            data.total_pages()
        );
        Self {
            engine: Engine::new(cfg.animation.clone()),
            nav: Navigator::new(&cfg),
            sound: SoundBank::new(audio),
            page_hooks: CallbackRegistry::new(),
            data,
            cfg,
        }
    }

    pub fn from_json(
        cfg: CourseConfig,
        course_json: &str,
        audio: Box<dyn AudioBackend>,
    ) -> Result<Self, CourseError> {
        Ok(Self::new(cfg, CourseData::from_json(course_json)?, audio))
    }

    /// Measure the viewport and load the first page in place.
    pub fn start<H: CourseHost>(&mut self, host: &mut H) -> Result<NavOutcome, CourseError> {
        self.nav.init(host);
        let Some((module, page)) = self.data.first_position() else {
            log::warn!("course has no pages");
            return Ok(NavOutcome::Stayed);
        };
        Ok(self
            .nav
            .request_in_place(host, &self.data, Position::new(module, page))?)
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn goto_next_page<H: CourseHost>(&mut self, host: &mut H) -> Result<NavOutcome, NavigationError> {
        self.nav.request_step(host, &self.data, 1)
    }

    pub fn goto_previous_page<H: CourseHost>(&mut self, host: &mut H) -> Result<NavOutcome, NavigationError> {
        self.nav.request_step(host, &self.data, -1)
    }

    pub fn goto_page<H: CourseHost>(
        &mut self,
        host: &mut H,
        module: usize,
        page: usize,
        direction: i32,
    ) -> Result<NavOutcome, NavigationError> {
        self.nav
            .request_page(host, &self.data, Position::new(module, page), direction)
    }

    /// Module menu: go to the first page of `module`, sliding backwards when
    /// it precedes the current one.
    pub fn handle_module_click<H: CourseHost>(
        &mut self,
        host: &mut H,
        module: usize,
    ) -> Result<NavOutcome, NavigationError> {
        let direction = if module < self.nav.position().module { -1 } else { 1 };
        self.goto_page(host, module, 0, direction)
    }

    /// Host callback for a fragment fetch.
    pub fn on_fragment_loaded<H: CourseHost>(
        &mut self,
        host: &mut H,
        ticket: FetchTicket,
        result: Result<(), String>,
    ) -> LoadResult {
        let res = self.nav.on_fragment_loaded(host, ticket, result);
        if let LoadResult::Arrived(pos) = res {
            self.arrive(host, pos);
        }
        res
    }

    /// Host callback for the end of the row slide.
    pub fn on_transition_complete<H: CourseHost>(&mut self, host: &mut H) -> Option<Position> {
        let pos = self.nav.on_transition_complete(host)?;
        self.arrive(host, pos);
        Some(pos)
    }

    pub fn request_resize<H: CourseHost>(&mut self, host: &mut H) {
        self.nav.request_resize(host);
    }

    pub fn on_animation_frame<H: CourseHost>(&mut self, host: &mut H) {
        self.nav.on_animation_frame(host);
    }

    /// New content is visible: set it up for animation, refresh the
    /// indicator and run the page hooks.
    fn arrive<H: CourseHost>(&mut self, host: &mut H, pos: Position) {
        self.engine.forget_detached(host);
        self.engine.set_up_animation(host);
        let indicator = self.nav.indicator(&self.data);
        host.update_indicator(&indicator);

        let page = self.data.page(pos.module, pos.page);
        let page_id = page.map(|p| p.id.clone());
        let mut names: Vec<String> = Vec::with_capacity(3);
        if let Some(on_load) = page.and_then(|p| p.on_load.clone()) {
            names.push(on_load);
        }
        names.push(self.cfg.page_loaded_hook.clone());
        names.push(self.cfg.moved_in_hook.clone());

        for name in names {
            let mut ctx = PageContext::new(pos, page_id.clone());
            if self.page_hooks.call(&name, &mut ctx) {
                for req in ctx.take_requests() {
                    self.engine
                        .play_animation(host, &mut self.sound, req.target, req.index);
                }
            }
        }
        log::info!("arrived at module {} page {}", pos.module, pos.page);
    }

    // ------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------

    pub fn set_up_animation<H: CourseHost>(&mut self, host: &mut H) -> usize {
        self.engine.set_up_animation(host)
    }

    pub fn play_animation<H: CourseHost>(
        &mut self,
        host: &mut H,
        target: impl Into<Target>,
        index: Option<i64>,
    ) -> PlayOutcome {
        self.engine.play_animation(host, &mut self.sound, target, index)
    }

    pub fn on_transition_end<H: CourseHost>(&mut self, host: &mut H, el: ElementId, property: Option<&str>) {
        self.engine
            .on_transition_end(host, &mut self.sound, el, property);
    }

    pub fn advance_to<H: CourseHost>(&mut self, host: &mut H, now_ms: f64) {
        self.engine.advance_to(host, &mut self.sound, now_ms);
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        self.engine.set_reduced_motion(on);
    }

    /// Page hide/unload.
    pub fn page_hide<H: CourseHost>(&mut self, host: &mut H) {
        self.engine.on_page_hide(host, &mut self.sound);
    }

    /// `startFunction`/`endFunction` callbacks.
    pub fn animation_hooks(&mut self) -> &mut CallbackRegistry<HookContext> {
        self.engine.hooks()
    }

    /// Per-page `onLoad` and the global page-lifecycle hooks.
    pub fn page_hooks(&mut self) -> &mut CallbackRegistry<PageContext> {
        &mut self.page_hooks
    }

    // ------------------------------------------------------------------
    // Sprites
    // ------------------------------------------------------------------

    pub fn load_sprite<H: CourseHost>(
        &mut self,
        host: &mut H,
        el: ElementId,
        cfg: SpriteConfig,
        sheet_width: f64,
        sheet_height: f64,
    ) -> Result<SpriteId, AnimationError> {
        self.engine
            .load_sprite(host, el, cfg, sheet_width, sheet_height)
    }

    pub fn play_sprite(&mut self, id: SpriteId) -> Result<(), AnimationError> {
        self.engine.play_sprite(id)
    }

    pub fn pause_sprite(&mut self, id: SpriteId) -> Result<(), AnimationError> {
        self.engine.pause_sprite(id)
    }

    pub fn stop_sprite<H: CourseHost>(&mut self, host: &mut H, id: SpriteId) -> Result<(), AnimationError> {
        self.engine.stop_sprite(host, id)
    }

    pub fn goto_sprite_frame<H: CourseHost>(
        &mut self,
        host: &mut H,
        id: SpriteId,
        index: u32,
    ) -> Result<(), AnimationError> {
        self.engine.goto_sprite_frame(host, id, index)
    }

    pub fn set_sprite_range<H: CourseHost>(
        &mut self,
        host: &mut H,
        id: SpriteId,
        start: u32,
        end: u32,
    ) -> Result<(), AnimationError> {
        self.engine.set_sprite_range(host, id, start, end)
    }

    /// fps and loop flags of a loaded sprite.
    pub fn sprite_settings(
        &mut self,
        id: SpriteId,
        fps: Option<u32>,
        looping: Option<(bool, bool)>,
    ) -> Result<(), AnimationError> {
        let sheet = self
            .engine
            .sprite_mut(id)
            .ok_or(AnimationError::UnknownSprite(id.0))?;
        if let Some(fps) = fps {
            sheet.set_fps(fps);
        }
        if let Some((looping, ping_pong)) = looping {
            sheet.set_loop(looping, ping_pong);
        }
        Ok(())
    }

    pub fn destroy_sprite(&mut self, id: SpriteId) -> bool {
        self.engine.destroy_sprite(id)
    }

    // ------------------------------------------------------------------
    // Sound
    // ------------------------------------------------------------------

    pub fn add_sound(&mut self, name: &str, url: &str) -> bool {
        self.sound.add(name, url)
    }

    pub fn play_sound(&mut self, name: &str) -> Result<(), SoundError> {
        self.sound.play(name)
    }

    pub fn stop_sound(&mut self, name: &str) -> Result<(), SoundError> {
        self.sound.stop(name)
    }

    pub fn stop_all_sounds(&mut self) -> Result<(), SoundError> {
        self.sound.stop_all()
    }

    pub fn sound_bank(&mut self) -> &mut SoundBank {
        &mut self.sound
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn data(&self) -> &CourseData {
        &self.data
    }

    pub fn config(&self) -> &CourseConfig {
        &self.cfg
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn position(&self) -> Position {
        self.nav.position()
    }

    pub fn module_count(&self) -> usize {
        self.data.module_count()
    }

    pub fn page_count(&self, module: usize) -> usize {
        self.data.page_count(module)
    }

    pub fn page_url(&self, module: usize, page: usize) -> Option<&str> {
        self.data.page_url(module, page)
    }

    pub fn is_quiz(&self, module: usize, page: usize) -> bool {
        self.data.is_quiz(module, page)
    }

    pub fn for_quiz_credit(&self, module: usize, page: usize) -> bool {
        self.data.for_quiz_credit(module, page)
    }

    pub fn viewed_count(&self) -> usize {
        self.nav.viewed_count()
    }
}
