use std::cell::RefCell;
use std::rc::Rc;

use courseware_animation_core::{
    AnimationError, AnimationHost, ElementId, Engine, SpriteConfig, SpriteId,
};
use courseware_test_fixtures::{ElementSpec, MemoryDocument, RecordingSound};

/// Sheet of 4 x 2 frames, 32px square.
const SHEET: (f64, f64) = (128.0, 64.0);

fn sprite_page() -> (MemoryDocument, ElementId) {
    let mut doc = MemoryDocument::course_shell();
    let pane = doc.by_id("currentPage");
    let el = doc.append(pane, &ElementSpec::new("div").id("walker"));
    (doc, el)
}

fn load(engine: &mut Engine, doc: &mut MemoryDocument, el: ElementId, json: &str) -> SpriteId {
    let cfg = SpriteConfig::from_json(json).expect("sprite config");
    engine
        .load_sprite(doc, el, cfg, SHEET.0, SHEET.1)
        .expect("sprite loads")
}

#[test]
fn load_styles_the_element_and_shows_the_first_frame() {
    let (mut doc, el) = sprite_page();
    let mut engine = Engine::default();
    let id = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32,"startFrame":5}"#,
    );

    assert_eq!(doc.style(el, "width").as_deref(), Some("32px"));
    assert_eq!(doc.style(el, "height").as_deref(), Some("32px"));
    assert_eq!(doc.style(el, "background-image").as_deref(), Some("url(\"walk.png\")"));
    assert_eq!(doc.style(el, "background-position").as_deref(), Some("-32px -32px"));
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("5"));
    assert_eq!(engine.sprite(id).map(|s| s.total_frames()), Some(8));
    assert_eq!(engine.pending_timers(), 0);
}

#[test]
fn frames_step_on_the_engine_clock_and_loop() {
    let (mut doc, el) = sprite_page();
    let mut sound = RecordingSound::new();
    let mut engine = Engine::default();
    let loops = Rc::new(RefCell::new(0));
    let l = loops.clone();
    engine.hooks().register("walker.looped", move |_| *l.borrow_mut() += 1);
    let id = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32,"fps":10,"endFrame":2,"onLoop":"walker.looped"}"#,
    );

    engine.play_sprite(id).unwrap();
    engine.play_sprite(id).unwrap();
    assert_eq!(engine.pending_timers(), 1);

    engine.advance_to(&mut doc, &mut sound, 99.0);
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("0"));
    engine.advance_to(&mut doc, &mut sound, 200.0);
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("2"));
    assert_eq!(doc.style(el, "background-position").as_deref(), Some("-64px 0px"));
    engine.advance_to(&mut doc, &mut sound, 300.0);
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("0"));
    assert_eq!(*loops.borrow(), 1);

    engine.pause_sprite(id).unwrap();
    assert_eq!(engine.pending_timers(), 0);
    engine.advance_to(&mut doc, &mut sound, 1_000.0);
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("0"));
}

#[test]
fn one_shot_run_completes_and_can_chain_a_play() {
    let (mut doc, el) = sprite_page();
    let pane = doc.by_id("currentPage");
    let caption = doc.append(
        pane,
        &ElementSpec::new("p")
            .id("caption")
            .class("animateMe")
            .rect(0.0, 0.0, 100.0, 20.0)
            .attr("data-animation", r#"{"style":"fadeIn"}"#),
    );
    let mut sound = RecordingSound::new();
    let mut engine = Engine::default();
    engine.set_up_animation(&mut doc);
    engine
        .hooks()
        .register("walker.done", |ctx| ctx.play("#caption", None));
    let id = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32,"frames":3,"fps":20,"loop":false,"onComplete":"walker.done"}"#,
    );

    engine.play_sprite(id).unwrap();
    engine.advance_to(&mut doc, &mut sound, 150.0);
    assert_eq!(engine.sprite(id).map(|s| s.current()), Some(2));
    assert_eq!(engine.sprite(id).map(|s| s.is_playing()), Some(false));
    assert_eq!(doc.style(caption, "opacity").as_deref(), Some("1"));
    assert_eq!(engine.next_index(caption), Some(0));
}

#[test]
fn stop_goto_and_range_render_immediately() {
    let (mut doc, el) = sprite_page();
    let mut sound = RecordingSound::new();
    let mut engine = Engine::default();
    let id = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32,"fps":10}"#,
    );

    engine.goto_sprite_frame(&mut doc, id, 6).unwrap();
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("6"));

    engine.set_sprite_range(&mut doc, id, 7, 4).unwrap();
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("4"));

    engine.play_sprite(id).unwrap();
    engine.advance_to(&mut doc, &mut sound, 250.0);
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("6"));
    engine.stop_sprite(&mut doc, id).unwrap();
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("4"));
    assert_eq!(engine.pending_timers(), 0);

    if let Some(sheet) = engine.sprite_mut(id) {
        sheet.set_fps(50);
    }
    engine.play_sprite(id).unwrap();
    engine.advance_to(&mut doc, &mut sound, 270.0);
    assert_eq!(doc.attribute(el, "data-sprite-frame").as_deref(), Some("5"));
}

#[test]
fn detached_and_destroyed_sprites_stop_ticking() {
    let (mut doc, el) = sprite_page();
    let mut sound = RecordingSound::new();
    let mut engine = Engine::default();
    let id = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32}"#,
    );
    engine.play_sprite(id).unwrap();
    assert!(engine.destroy_sprite(id));
    assert!(!engine.destroy_sprite(id));
    assert_eq!(engine.pending_timers(), 0);
    assert_eq!(engine.play_sprite(id), Err(AnimationError::UnknownSprite(id.0)));

    let again = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32}"#,
    );
    engine.play_sprite(again).unwrap();
    doc.remove(el);
    engine.forget_detached(&doc);
    assert!(engine.sprite(again).is_none());
    assert_eq!(engine.pending_timers(), 0);
    engine.advance_to(&mut doc, &mut sound, 1_000.0);
}

#[test]
fn page_hide_pauses_sprites() {
    let (mut doc, el) = sprite_page();
    let mut sound = RecordingSound::new();
    let mut engine = Engine::default();
    let id = load(
        &mut engine,
        &mut doc,
        el,
        r#"{"src":"walk.png","frameWidth":32,"frameHeight":32}"#,
    );
    engine.play_sprite(id).unwrap();
    engine.on_page_hide(&mut doc, &mut sound);
    assert_eq!(engine.sprite(id).map(|s| s.is_playing()), Some(false));
    assert_eq!(engine.pending_timers(), 0);
}
