//! Engine: setup pass, play method, completion handling and cancellation.
//!
//! Methods:
//! - new, set_up_animation (after every page swap), play_animation,
//!   on_transition_end (host event), advance_to (host clock), cancel_anim,
//!   on_page_hide, forget_detached
//! - sprites: load_sprite, play_sprite, pause_sprite, stop_sprite,
//!   goto_sprite_frame, set_sprite_range, destroy_sprite

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::a11y;
use crate::anchor::Anchor;
use crate::attrs::{self, style};
use crate::config::{Config, CursorMode};
use crate::error::{AnimationError, SoundError};
use crate::geometry::{normalize_step, slide_out_target, PaneGeometry, Rect, StepDefaults};
use crate::hooks::{CallbackRegistry, HookContext, PlayRequest};
use crate::host::{AnimationHost, SoundSink, Target};
use crate::ids::{ElementId, IdAllocator, RunId, SpriteId};
use crate::parse::{parse_step_list, try_parse_step_list};
use crate::sprite::{SpriteConfig, SpriteEvent, SpriteSheet};
use crate::state::{Completion, ElementTable};
use crate::step::{AnimationStep, StyleSet, StyleToken};
use crate::timers::{TimerQueue, TimerTask};
use crate::transform::{compose_transform, current_translate};
use crate::typewriter::{TypewriterRun, TypewriterTiming};

/// Most chain and hook plays one outermost engine call runs; anything
/// queued past this is dropped with a warning.
const MAX_FOLLOW_UPS: usize = 256;

/// Why a play request did nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    PhoneLayout,
    TargetNotFound,
    NoSteps,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    Started { element: ElementId, step: usize },
    Skipped(SkipReason),
}

impl PlayOutcome {
    pub fn started(&self) -> bool {
        matches!(self, PlayOutcome::Started { .. })
    }
}

/// Everything `play_animation` resolves from one step before branching.
struct Resolved {
    styles: StyleSet,
    left: f64,
    top: f64,
    opacity: Option<f64>,
    scale: f64,
    duration: f64,
    delay: f64,
    easing: String,
    origin: String,
    start_function: Option<String>,
    cps: Option<f64>,
    typewriter: bool,
}

#[derive(Debug)]
struct TypewriterSlot {
    run: TypewriterRun,
    completion: Completion,
}

#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    elements: ElementTable,
    timers: TimerQueue,
    ids: IdAllocator,
    typewriters: HashMap<RunId, TypewriterSlot>,
    sprites: HashMap<SpriteId, SpriteSheet>,
    hooks: CallbackRegistry<HookContext>,
    follow_ups: VecDeque<PlayRequest>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn quietly(what: &str, name: &str, res: Result<(), SoundError>) {
    if let Err(e) = res {
        log::debug!("{what} `{name}` ignored: {e}");
    }
}

fn parse_number(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn seconds(v: f64) -> String {
    format!("{v}s")
}

impl Engine {
    /// Create a new engine with the given config.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            elements: ElementTable::new(),
            timers: TimerQueue::new(),
            ids: IdAllocator::new(),
            typewriters: HashMap::new(),
            sprites: HashMap::new(),
            hooks: CallbackRegistry::new(),
            follow_ups: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        self.cfg.reduced_motion = on;
    }

    /// Named `startFunction`/`endFunction` callbacks.
    pub fn hooks(&mut self) -> &mut CallbackRegistry<HookContext> {
        &mut self.hooks
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    /// Step the next un-indexed play will run, once the element is known.
    pub fn next_index(&self, el: ElementId) -> Option<usize> {
        self.elements.get(el).map(|s| s.cursor)
    }

    /// Normalized steps stored by the setup pass.
    pub fn steps(&self, el: ElementId) -> Option<&[AnimationStep]> {
        self.elements.get(el).and_then(|s| s.steps.as_deref())
    }

    /// Guard timers and typewriter ticks still scheduled.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn tracked_elements(&self) -> usize {
        self.elements.len()
    }

    // ------------------------------------------------------------------
    // Setup pass
    // ------------------------------------------------------------------

    /// Prepare every animatable element of freshly inserted content.
    /// Returns how many elements were set up.
    pub fn set_up_animation(&mut self, host: &mut dyn AnimationHost) -> usize {
        if host.is_phone_layout() {
            return 0;
        }
        let els = host.query_all(&self.cfg.animatable_selector);
        for el in &els {
            self.set_up_element(host, *el);
        }
        log::debug!("animation setup: {} element(s)", els.len());
        els.len()
    }

    /// Setup for a single element: measure, parse, normalize, persist, show.
    pub fn set_up_element(&mut self, host: &mut dyn AnimationHost, el: ElementId) {
        host.set_style(el, style::TRANSFORM, "");
        {
            let st = self.elements.entry(el);
            st.cursor = 0;
            st.steps = None;
        }
        host.set_attribute(el, attrs::CURRENT_INDEX, "0");

        let geom = PaneGeometry {
            pane: self.pane_rect(host, el),
            element: host.measure(el),
        };

        let anchor = read_anchor(host, el);
        host.set_style(el, style::TRANSFORM_ORIGIN, &anchor.to_string());

        let raw = host.attribute(el, attrs::ANIMATION).unwrap_or_default();
        let mut configs = match try_parse_step_list(&raw) {
            Ok(configs) => configs,
            Err(e) => {
                // Broken config: the element shows but never animates.
                log::error!("{e}");
                self.elements.entry(el).steps = Some(Vec::new());
                host.set_style(el, style::VISIBILITY, "visible");
                return;
            }
        };
        if configs.is_empty() {
            configs.push(AnimationStep::default());
        }
        if !configs[0].has_style() {
            if let Some(t) = StyleToken::LEGACY_PRIORITY
                .iter()
                .find(|t| host.has_class(el, t.keyword()))
            {
                configs[0].style = Some(t.keyword().to_string());
            }
        }

        let wants_typewriter = host.has_class(el, attrs::TYPEWRITER_CLASS)
            || configs
                .iter()
                .any(|c| c.styles().contains(StyleToken::Typewriter));
        if wants_typewriter {
            prepare_typewriter(host, el);
        }

        let defaults = StepDefaults {
            anchor,
            duration: parse_number(host.attribute(el, attrs::DURATION)),
            delay: parse_number(host.attribute(el, attrs::DELAY)),
            zoom: parse_number(host.attribute(el, attrs::ZOOM)),
            zoom_class: host.has_class(el, attrs::ZOOM_CLASS),
            fallback_duration: self.cfg.setup_duration_s,
        };

        let mut normalized = Vec::with_capacity(configs.len());
        for raw in &configs {
            let n = normalize_step(raw, &geom, &defaults);
            if n.start_transparent {
                host.set_style(el, style::OPACITY, "0");
            }
            if let Some(top) = n.start_top {
                host.set_style(el, style::TOP, &format!("{top}px"));
            }
            if let Some(left) = n.start_left {
                host.set_style(el, style::LEFT, &format!("{left}px"));
            }
            normalized.push(n.step);
        }

        let stored = if normalized.len() == 1 {
            serde_json::to_string(&normalized[0])
        } else {
            serde_json::to_string(&normalized)
        };
        match stored {
            Ok(json) => host.set_attribute(el, attrs::ANIMATION, &json),
            Err(e) => log::error!("cannot persist normalized steps: {e}"),
        }
        self.elements.entry(el).steps = Some(normalized);

        host.set_style(el, style::VISIBILITY, "visible");
    }

    fn pane_rect(&self, host: &dyn AnimationHost, el: ElementId) -> Rect {
        let selector = host
            .attribute(el, attrs::ANIMATION_PANE)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.cfg.default_pane.clone());
        match host.query(&selector) {
            Some(pane) => host.measure(pane),
            None => {
                log::warn!("animation pane `{selector}` not found; using an empty pane");
                Rect::default()
            }
        }
    }

    // ------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------

    /// Play the next step of `target`, or step `index` (clamped into range).
    ///
    /// Chains and hook requests triggered along the way run after this play
    /// has been set up, in the order they were raised.
    pub fn play_animation(
        &mut self,
        host: &mut dyn AnimationHost,
        sound: &mut dyn SoundSink,
        target: impl Into<Target>,
        index: Option<i64>,
    ) -> PlayOutcome {
        let outcome = self.play_one(host, sound, target.into(), index);
        self.drain_follow_ups(host, sound);
        outcome
    }

    fn play_one(
        &mut self,
        host: &mut dyn AnimationHost,
        sound: &mut dyn SoundSink,
        target: Target,
        index: Option<i64>,
    ) -> PlayOutcome {
        if host.is_phone_layout() {
            return PlayOutcome::Skipped(SkipReason::PhoneLayout);
        }
        let Some(el) = target.resolve(host) else {
            log::warn!("playAnimation: target `{target}` not found");
            return PlayOutcome::Skipped(SkipReason::TargetNotFound);
        };

        let steps = self.steps_for(host, el);
        if steps.is_empty() {
            log::warn!("playAnimation: `{target}` has no animation steps");
            return PlayOutcome::Skipped(SkipReason::NoSteps);
        }

        let step_index = self.advance_cursor(host, el, steps.len(), index);
        let step = &steps[step_index];
        let r = self.resolve_step(host, el, step);

        let end_function = step
            .end_function
            .clone()
            .or_else(|| host.attribute(el, attrs::END_FUNCTION));
        let chain = step.chain.clone().or_else(|| host.attribute(el, attrs::CHAIN));
        let begin_sound = step
            .begin_sound
            .clone()
            .or_else(|| host.attribute(el, attrs::BEGIN_SOUND));
        let end_sound = step
            .end_sound
            .clone()
            .or_else(|| host.attribute(el, attrs::END_SOUND));

        host.set_style(el, style::TRANSFORM_ORIGIN, &r.origin);

        if r.opacity.map_or(true, |o| o > 0.0) {
            host.set_style(el, style::VISIBILITY, "visible");
            a11y::set_hidden(host, &mut self.elements, el, false);
        }

        let token = self.elements.bump_token(el);
        self.elements.entry(el).begin_sound = begin_sound.clone();
        if let Some(name) = &begin_sound {
            quietly("begin sound", name, sound.play_sound(name));
        }

        let completion = Completion {
            token,
            opacity: r.opacity,
            end_function,
            begin_sound,
            end_sound,
            chain,
        };
        let outcome = PlayOutcome::Started {
            element: el,
            step: step_index,
        };

        if self.cfg.reduced_motion {
            self.run_hook(r.start_function.as_deref(), el);
            if r.typewriter {
                reveal_all(host, el);
            }
            let (tx, ty) = self.final_translate(host, el, &r);
            host.set_style(el, style::TRANSFORM, &compose_transform(tx, ty, r.scale));
            if let Some(o) = r.opacity {
                host.set_style(el, style::OPACITY, &o.to_string());
            }
            self.finish_run(host, sound, el, completion, false);
            return outcome;
        }

        if r.typewriter {
            self.run_hook(r.start_function.as_deref(), el);
            if let Some(o) = r.opacity {
                host.set_style(el, style::TRANSITION_PROPERTY, "opacity");
                host.set_style(el, style::TRANSITION_DURATION, &seconds(r.duration));
                host.set_style(el, style::TRANSITION_TIMING_FUNCTION, &r.easing);
                host.set_style(el, style::TRANSITION_DELAY, &seconds(r.delay));
                host.set_style(el, style::WILL_CHANGE, "opacity");
                host.flush_layout(el);
                host.set_style(el, style::OPACITY, &o.to_string());
            }
            let cps = r
                .cps
                .or_else(|| parse_number(host.attribute(el, attrs::CPS)));
            self.start_typewriter(host, sound, el, r.duration, r.delay, cps, completion);
            return outcome;
        }

        let props = if r.opacity.is_none() {
            "transform"
        } else {
            "transform, opacity"
        };
        host.set_style(el, style::TRANSITION_PROPERTY, props);
        host.set_style(el, style::TRANSITION_DURATION, &seconds(r.duration));
        host.set_style(el, style::TRANSITION_TIMING_FUNCTION, &r.easing);
        host.set_style(el, style::TRANSITION_DELAY, &seconds(r.delay));
        host.set_style(el, style::WILL_CHANGE, "transform, opacity");
        host.set_style(el, style::TRANSFORM_ORIGIN, &r.origin);

        self.run_hook(r.start_function.as_deref(), el);
        host.flush_layout(el);

        let (tx, ty) = self.final_translate(host, el, &r);
        host.set_style(el, style::TRANSFORM, &compose_transform(tx, ty, r.scale));
        if let Some(o) = r.opacity {
            host.set_style(el, style::OPACITY, &o.to_string());
        }

        let guard_ms = (r.delay + r.duration) * 1000.0 + self.cfg.guard_epsilon_ms;
        let guard = self.timers.schedule(guard_ms, TimerTask::Guard { element: el, token });
        let st = self.elements.entry(el);
        st.guards.push(guard);
        st.pending.push(completion);
        outcome
    }

    fn steps_for(&self, host: &dyn AnimationHost, el: ElementId) -> Vec<AnimationStep> {
        if let Some(steps) = self.elements.get(el).and_then(|s| s.steps.clone()) {
            return steps;
        }
        parse_step_list(&host.attribute(el, attrs::ANIMATION).unwrap_or_default())
    }

    /// Pick the step to run and persist the cursor for the following call.
    fn advance_cursor(
        &mut self,
        host: &mut dyn AnimationHost,
        el: ElementId,
        len: usize,
        index: Option<i64>,
    ) -> usize {
        let last = len - 1;
        let st = self.elements.entry(el);
        let step_index = match index {
            Some(i) => i.clamp(0, last as i64) as usize,
            None if st.cursor > last => 0,
            None => st.cursor,
        };
        let next = match self.cfg.cursor_mode {
            CursorMode::Loop => (step_index + 1) % len,
            CursorMode::Clamp => (step_index + 1).min(last),
        };
        st.cursor = next;
        host.set_attribute(el, attrs::CURRENT_INDEX, &next.to_string());
        step_index
    }

    fn resolve_step(&self, host: &dyn AnimationHost, el: ElementId, step: &AnimationStep) -> Resolved {
        let styles = step.styles();
        let typewriter =
            host.has_class(el, attrs::TYPEWRITER_CLASS) || styles.contains(StyleToken::Typewriter);
        let origin = step
            .anchor
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| read_anchor(host, el).to_string());
        Resolved {
            left: step.left.unwrap_or(0.0),
            top: step.top.unwrap_or(0.0),
            opacity: step.opacity,
            scale: step.scale.unwrap_or(1.0),
            duration: step.duration.unwrap_or(self.cfg.play_duration_s).max(0.0),
            delay: step.delay.unwrap_or(0.0).max(0.0),
            easing: step
                .easing
                .clone()
                .unwrap_or_else(|| self.cfg.default_easing.clone()),
            origin,
            start_function: step
                .start_function
                .clone()
                .or_else(|| host.attribute(el, attrs::START_FUNCTION)),
            cps: step.cps,
            typewriter,
            styles,
        }
    }

    /// Slide-out steps leave from the live translate; everything else goes
    /// to the step's resolved offsets.
    fn final_translate(&self, host: &dyn AnimationHost, el: ElementId, r: &Resolved) -> (f64, f64) {
        if !r.styles.is_slide_out() {
            return (r.left, r.top);
        }
        let current = current_translate(host.computed_transform(el).as_deref());
        let pane = self.pane_rect(host, el);
        let elem = host.measure(el);
        slide_out_target(
            &r.styles,
            current,
            (pane.width, pane.height),
            (elem.width, elem.height),
            (r.left, r.top),
        )
    }

    // ------------------------------------------------------------------
    // Typewriter
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn start_typewriter(
        &mut self,
        host: &mut dyn AnimationHost,
        sound: &mut dyn SoundSink,
        el: ElementId,
        duration: f64,
        delay: f64,
        cps: Option<f64>,
        completion: Completion,
    ) {
        let span = host.query_within(el, &format!(".{}", attrs::TYPEWRITER_SPAN_CLASS));
        let full = host.attribute(el, attrs::TYPEWRITER_FULL).unwrap_or_default();
        let Some(span) = span.filter(|_| !full.is_empty()) else {
            if let Some(span) = span {
                host.set_text_content(span, &full);
            }
            self.finish_run(host, sound, el, completion, true);
            return;
        };

        let run = TypewriterRun::new(
            el,
            span,
            &full,
            TypewriterTiming::new(full.chars().count(), duration, delay, cps),
        );
        host.set_text_content(span, "");
        let id = self.ids.alloc_run();
        self.timers
            .schedule(run.timing.delay_ms, TimerTask::TypewriterTick { run: id });
        self.typewriters.insert(id, TypewriterSlot { run, completion });
    }

    fn typewriter_tick(&mut self, host: &mut dyn AnimationHost, sound: &mut dyn SoundSink, id: RunId) {
        let Some(slot) = self.typewriters.get_mut(&id) else {
            return;
        };
        let text = slot.run.tick();
        host.set_text_content(slot.run.span, &text);
        if !slot.run.is_done() {
            self.timers
                .schedule(slot.run.timing.tick_ms, TimerTask::TypewriterTick { run: id });
            return;
        }
        if let Some(slot) = self.typewriters.remove(&id) {
            self.finish_run(host, sound, slot.run.element, slot.completion, true);
        }
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Host notification: a CSS transition on `el` ended. `property` is the
    /// transitioned property; anything but `transform`/`opacity` is ignored.
    pub fn on_transition_end(
        &mut self,
        host: &mut dyn AnimationHost,
        sound: &mut dyn SoundSink,
        el: ElementId,
        property: Option<&str>,
    ) {
        if let Some(p) = property {
            if p != style::TRANSFORM && p != style::OPACITY {
                return;
            }
        }
        let Some(st) = self.elements.get_mut(el) else {
            return;
        };
        if st.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut st.pending);
        for guard in std::mem::take(&mut st.guards) {
            self.timers.cancel(guard);
        }
        for completion in pending {
            self.finish_run(host, sound, el, completion, true);
        }
        self.drain_follow_ups(host, sound);
    }

    /// End of a run. Superseded runs do nothing; current runs clean up,
    /// apply the end-of-animation visibility and, if the element is still
    /// live, fire the end hook, end sound and chain.
    fn finish_run(
        &mut self,
        host: &mut dyn AnimationHost,
        sound: &mut dyn SoundSink,
        el: ElementId,
        completion: Completion,
        strip_transition: bool,
    ) {
        if self.elements.token(el) != completion.token {
            return;
        }
        if strip_transition {
            for prop in style::TRANSITION_ONLY {
                host.set_style(el, prop, "");
            }
        }
        if completion.opacity == Some(0.0) {
            host.set_style(el, style::VISIBILITY, "hidden");
            a11y::set_hidden(host, &mut self.elements, el, true);
        }

        let live = self.should_still_play(host, el, completion.token);
        self.cancel_anim(host, sound, el, false);
        if !live {
            return;
        }

        self.run_hook(completion.end_function.as_deref(), el);
        if let Some(end) = &completion.end_sound {
            if let Some(begin) = &completion.begin_sound {
                quietly("stop begin sound", begin, sound.stop_sound(begin));
            }
            quietly("end sound", end, sound.play_sound(end));
        }
        if let Some(chain) = completion.chain {
            self.follow_ups.push_back(PlayRequest {
                target: Target::Selector(chain),
                index: None,
            });
        }
    }

    /// A completion may fire its side effects only while its token is
    /// current, the element is attached and the document is visible.
    fn should_still_play(&self, host: &dyn AnimationHost, el: ElementId, token: u64) -> bool {
        self.elements.token(el) == token && host.is_connected(el) && !host.document_hidden()
    }

    fn run_hook(&mut self, name: Option<&str>, el: ElementId) {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return;
        };
        let mut ctx = HookContext::new(el);
        if self.hooks.call(name, &mut ctx) {
            self.follow_ups.extend(ctx.take_requests());
        }
    }

    /// Run queued chain and hook plays. Plays started here queue their own
    /// follow-ups onto the same queue, so nothing recurses.
    fn drain_follow_ups(&mut self, host: &mut dyn AnimationHost, sound: &mut dyn SoundSink) {
        let mut budget = MAX_FOLLOW_UPS;
        while let Some(req) = self.follow_ups.pop_front() {
            if budget == 0 {
                log::warn!(
                    "dropping {} follow-up play(s) starting at `{}`: more than {MAX_FOLLOW_UPS} in one pass (chain cycle?)",
                    self.follow_ups.len() + 1,
                    req.target
                );
                self.follow_ups.clear();
                return;
            }
            budget -= 1;
            self.play_one(host, sound, req.target, req.index);
        }
    }

    /// Chain and hook plays waiting to run.
    pub fn queued_follow_ups(&self) -> usize {
        self.follow_ups.len()
    }

    // ------------------------------------------------------------------
    // Clock and cancellation
    // ------------------------------------------------------------------

    /// Run every timer due at or before `now_ms`.
    pub fn advance_to(&mut self, host: &mut dyn AnimationHost, sound: &mut dyn SoundSink, now_ms: f64) {
        while let Some((id, task)) = self.timers.pop_due(now_ms) {
            match task {
                TimerTask::Guard { element, token } => {
                    if let Some(st) = self.elements.get_mut(element) {
                        st.guards.retain(|g| *g != id);
                    }
                    if self.should_still_play(host, element, token) {
                        self.on_transition_end(host, sound, element, None);
                    }
                }
                TimerTask::TypewriterTick { run } => self.typewriter_tick(host, sound, run),
                TimerTask::SpriteTick { sprite } => self.sprite_tick(host, sprite),
            }
            self.drain_follow_ups(host, sound);
        }
        self.timers.settle(now_ms);
    }

    /// Advance the clock by `dt_ms`.
    pub fn advance_by(&mut self, host: &mut dyn AnimationHost, sound: &mut dyn SoundSink, dt_ms: f64) {
        let now = self.timers.now_ms() + dt_ms.max(0.0);
        self.advance_to(host, sound, now);
    }

    /// Clear guard timers and invalidate in-flight completions for `el`.
    /// With `stop_sounds`, also stop the element's begin sound.
    pub fn cancel_anim(
        &mut self,
        host: &mut dyn AnimationHost,
        sound: &mut dyn SoundSink,
        el: ElementId,
        stop_sounds: bool,
    ) {
        let st = self.elements.entry(el);
        st.token = st.token.wrapping_add(1);
        st.pending.clear();
        let guards = std::mem::take(&mut st.guards);
        let begin = st.begin_sound.take();
        for g in guards {
            self.timers.cancel(g);
        }
        if stop_sounds {
            if let Some(name) = begin.or_else(|| host.attribute(el, attrs::BEGIN_SOUND)) {
                quietly("stop begin sound", &name, sound.stop_sound(&name));
            }
        }
    }

    /// Page hide/unload: cancel every animatable element, stop begin sounds
    /// and pause sprites.
    pub fn on_page_hide(&mut self, host: &mut dyn AnimationHost, sound: &mut dyn SoundSink) {
        for el in host.query_all(&self.cfg.animatable_selector) {
            self.cancel_anim(host, sound, el, true);
        }
        let ids: Vec<SpriteId> = self.sprites.keys().copied().collect();
        for id in ids {
            let _ = self.pause_sprite(id);
        }
    }

    /// Drop bookkeeping for elements no longer in the document.
    pub fn forget_detached(&mut self, host: &dyn AnimationHost) -> usize {
        let gone = self.elements.retain_connected(|el| host.is_connected(el));
        for (_, st) in &gone {
            for g in &st.guards {
                self.timers.cancel(*g);
            }
        }
        self.typewriters
            .retain(|_, slot| host.is_connected(slot.run.element));
        let timers = &mut self.timers;
        self.sprites.retain(|_, sheet| {
            let keep = host.is_connected(sheet.element);
            if let (false, Some(t)) = (keep, sheet.timer) {
                timers.cancel(t);
            }
            keep
        });
        gone.len()
    }

    // ------------------------------------------------------------------
    // Sprites
    // ------------------------------------------------------------------

    /// Bind a sprite sheet to `el` once the host has loaded its image
    /// (`sheet_width` x `sheet_height` pixels), and show the first frame.
    pub fn load_sprite(
        &mut self,
        host: &mut dyn AnimationHost,
        el: ElementId,
        cfg: SpriteConfig,
        sheet_width: f64,
        sheet_height: f64,
    ) -> Result<SpriteId, AnimationError> {
        let sheet = SpriteSheet::new(el, cfg, sheet_width, sheet_height)?;
        let c = sheet.config();
        host.set_style(el, style::WIDTH, &format!("{}px", c.frame_width));
        host.set_style(el, style::HEIGHT, &format!("{}px", c.frame_height));
        host.set_style(el, style::BACKGROUND_IMAGE, &format!("url(\"{}\")", c.src));
        host.set_style(el, style::BACKGROUND_REPEAT, "no-repeat");
        host.set_style(el, style::IMAGE_RENDERING, "pixelated");
        render_sprite(host, &sheet);

        let id = self.ids.alloc_sprite();
        self.sprites.insert(id, sheet);
        log::debug!("sprite {id:?} bound to element {el:?}");
        Ok(id)
    }

    pub fn sprite(&self, id: SpriteId) -> Option<&SpriteSheet> {
        self.sprites.get(&id)
    }

    /// Adjust fps or loop flags; takes effect from the next frame.
    pub fn sprite_mut(&mut self, id: SpriteId) -> Option<&mut SpriteSheet> {
        self.sprites.get_mut(&id)
    }

    fn sprite_entry(&mut self, id: SpriteId) -> Result<&mut SpriteSheet, AnimationError> {
        self.sprites
            .get_mut(&id)
            .ok_or(AnimationError::UnknownSprite(id.0))
    }

    /// Start stepping frames. A sprite already playing is left alone.
    pub fn play_sprite(&mut self, id: SpriteId) -> Result<(), AnimationError> {
        let sheet = self
            .sprites
            .get_mut(&id)
            .ok_or(AnimationError::UnknownSprite(id.0))?;
        if sheet.is_playing() {
            return Ok(());
        }
        sheet.set_playing(true);
        let tick = self
            .timers
            .schedule(sheet.frame_ms(), TimerTask::SpriteTick { sprite: id });
        sheet.timer = Some(tick);
        Ok(())
    }

    /// Stop stepping and stay on the current frame.
    pub fn pause_sprite(&mut self, id: SpriteId) -> Result<(), AnimationError> {
        let sheet = self
            .sprites
            .get_mut(&id)
            .ok_or(AnimationError::UnknownSprite(id.0))?;
        sheet.set_playing(false);
        if let Some(t) = sheet.timer.take() {
            self.timers.cancel(t);
        }
        Ok(())
    }

    /// Pause and return to the first frame of the window.
    pub fn stop_sprite(&mut self, host: &mut dyn AnimationHost, id: SpriteId) -> Result<(), AnimationError> {
        self.pause_sprite(id)?;
        let sheet = self.sprite_entry(id)?;
        sheet.rewind();
        render_sprite(host, sheet);
        Ok(())
    }

    pub fn goto_sprite_frame(
        &mut self,
        host: &mut dyn AnimationHost,
        id: SpriteId,
        index: u32,
    ) -> Result<(), AnimationError> {
        let sheet = self.sprite_entry(id)?;
        sheet.goto(index);
        render_sprite(host, sheet);
        Ok(())
    }

    /// Narrow playback to `[start, end]` and show `start`.
    pub fn set_sprite_range(
        &mut self,
        host: &mut dyn AnimationHost,
        id: SpriteId,
        start: u32,
        end: u32,
    ) -> Result<(), AnimationError> {
        let sheet = self.sprite_entry(id)?;
        sheet.set_range(start, end);
        render_sprite(host, sheet);
        Ok(())
    }

    /// Pause and forget the sprite. Returns whether it existed.
    pub fn destroy_sprite(&mut self, id: SpriteId) -> bool {
        let _ = self.pause_sprite(id);
        self.sprites.remove(&id).is_some()
    }

    fn sprite_tick(&mut self, host: &mut dyn AnimationHost, id: SpriteId) {
        let Some(sheet) = self.sprites.get_mut(&id) else {
            return;
        };
        sheet.timer = None;
        if !sheet.is_playing() {
            return;
        }
        let event = sheet.advance();
        render_sprite(host, sheet);
        if sheet.is_playing() {
            let tick = self
                .timers
                .schedule(sheet.frame_ms(), TimerTask::SpriteTick { sprite: id });
            sheet.timer = Some(tick);
        }
        let hook = match event {
            Some(SpriteEvent::Looped) => sheet.config().on_loop.clone(),
            Some(SpriteEvent::Completed) => sheet.config().on_complete.clone(),
            None => None,
        };
        let el = sheet.element;
        self.run_hook(hook.as_deref(), el);
    }
}

fn render_sprite(host: &mut dyn AnimationHost, sheet: &SpriteSheet) {
    host.set_style(sheet.element, style::BACKGROUND_POSITION, &sheet.background_position());
    host.set_attribute(sheet.element, attrs::SPRITE_FRAME, &sheet.current().to_string());
}

/// Anchor from the element's per-axis attributes, falling back to the
/// combined legacy attribute.
fn read_anchor(host: &dyn AnimationHost, el: ElementId) -> Anchor {
    let h = host.attribute(el, attrs::HORIZONTAL_ANCHOR);
    let v = host
        .attribute(el, attrs::VERTICLE_ANCHOR)
        .or_else(|| host.attribute(el, attrs::VERTICAL_ANCHOR));
    let legacy = host.attribute(el, attrs::LEGACY_ANCHOR);
    Anchor::resolve(h.as_deref(), v.as_deref(), legacy.as_deref())
}

/// Swap the element's text for an empty live span, keeping the full text as
/// the accessible label. Running setup again reuses the stored text.
fn prepare_typewriter(host: &mut dyn AnimationHost, el: ElementId) {
    let span_selector = format!(".{}", attrs::TYPEWRITER_SPAN_CLASS);
    let prepared = host.query_within(el, &span_selector).is_some();
    let full = match host.attribute(el, attrs::TYPEWRITER_FULL) {
        Some(full) if prepared => full,
        _ => host.text_content(el),
    };
    host.set_attribute(el, attrs::ARIA_LABEL, &full);
    host.set_attribute(el, attrs::ARIA_LIVE, "off");
    host.clear_children(el);
    host.append_span(
        el,
        attrs::TYPEWRITER_SPAN_CLASS,
        &[(attrs::ARIA_HIDDEN, "true")],
    );
    host.set_attribute(el, attrs::TYPEWRITER_FULL, &full);
}

/// Reduced-motion typewriter: show the whole text at once.
fn reveal_all(host: &mut dyn AnimationHost, el: ElementId) {
    let Some(full) = host.attribute(el, attrs::TYPEWRITER_FULL) else {
        return;
    };
    match host.query_within(el, &format!(".{}", attrs::TYPEWRITER_SPAN_CLASS)) {
        Some(span) => host.set_text_content(span, &full),
        None => host.set_text_content(el, &full),
    }
}
