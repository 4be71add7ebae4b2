use std::cell::RefCell;
use std::rc::Rc;

use courseware_animation_core::AnimationHost;
use courseware_animation_core::Rect;
use courseware_course_core::{
    BoundaryPolicy, Course, CourseConfig, FetchTicket, LoadResult, NavOutcome, NavPhase, NavigationError,
    NavigationHost, NullAudio, PageIndicator, PaneSlot, Position,
};
use courseware_test_fixtures::{courses, pages, AudioCall, MemoryDocument, RecordingAudio};

fn document() -> MemoryDocument {
    let mut doc = MemoryDocument::course_shell();
    pages::register_all(&mut doc).unwrap();
    doc
}

fn course_with(cfg: CourseConfig) -> Course {
    Course::from_json(cfg, &courses::json("sample").unwrap(), Box::new(NullAudio)).unwrap()
}

/// Hand the oldest pending fetch back to the course.
fn deliver(course: &mut Course, doc: &mut MemoryDocument) -> LoadResult {
    let (ticket, result) = doc.complete_fetch().expect("a fetch is pending");
    course.on_fragment_loaded(doc, ticket, result)
}

/// Started course showing module 0 page 0.
fn started(cfg: CourseConfig) -> (Course, MemoryDocument) {
    let mut doc = document();
    let mut course = course_with(cfg);
    course.start(&mut doc).unwrap();
    assert_eq!(deliver(&mut course, &mut doc), LoadResult::Arrived(Position::new(0, 0)));
    (course, doc)
}

#[test]
fn start_loads_first_page_in_place() {
    let mut doc = document();
    let mut course = course_with(CourseConfig::default());
    let outcome = course.start(&mut doc).unwrap();
    assert!(matches!(outcome, NavOutcome::Loading { target, .. } if target == Position::new(0, 0)));
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Current);
    assert_eq!(doc.next_fetch().unwrap().url, "content/mod0/page0.html");

    assert_eq!(deliver(&mut course, &mut doc), LoadResult::Arrived(Position::new(0, 0)));
    assert!(doc.slides.is_empty());
    assert_eq!(
        doc.indicators.last(),
        Some(&PageIndicator {
            module: 0,
            page: 0,
            module_count: 2,
            page_count: 2
        })
    );

    let intro = doc.by_id("intro");
    assert_eq!(course.engine().steps(intro).map(<[_]>::len), Some(2));
    assert_eq!(doc.style(intro, "visibility").as_deref(), Some("visible"));
    assert_eq!(doc.attribute(intro, "data-currentindex").as_deref(), Some("0"));
    assert_eq!(course.viewed_count(), 1);
}

#[test]
fn next_page_slides_then_commits() {
    let (mut course, mut doc) = started(CourseConfig::default());

    course.goto_next_page(&mut doc).unwrap();
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Next);
    assert_eq!(deliver(&mut course, &mut doc), LoadResult::Sliding);
    assert_eq!(doc.slides, vec![(-800.0, 800.0)]);
    assert!(matches!(
        course.navigator().phase(),
        NavPhase::Transitioning { target, slot: PaneSlot::Next } if target == Position::new(0, 1)
    ));
    assert_eq!(course.position(), Position::new(0, 0));

    assert_eq!(course.on_transition_complete(&mut doc), Some(Position::new(0, 1)));
    assert_eq!(course.position(), Position::new(0, 1));
    assert_eq!(NavigationHost::row_left(&doc), 0.0);

    let diagram = doc.by_id("diagram");
    assert!(doc.is_connected(diagram));
    assert_eq!(doc.query("#nextPage #diagram"), None);
    assert_eq!(doc.style(diagram, "opacity").as_deref(), Some("0"));
    assert_eq!(doc.query("#intro"), None);
    assert_eq!(course.viewed_count(), 2);
}

#[test]
fn previous_page_slides_the_other_way() {
    let (mut course, mut doc) = started(CourseConfig::default());
    course.goto_page(&mut doc, 1, 1, 1).unwrap();
    deliver(&mut course, &mut doc);
    course.on_transition_complete(&mut doc);

    course.goto_previous_page(&mut doc).unwrap();
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Previous);
    assert_eq!(deliver(&mut course, &mut doc), LoadResult::Sliding);
    assert_eq!(doc.slides.last(), Some(&(800.0, 800.0)));
    course.on_transition_complete(&mut doc);
    assert_eq!(course.position(), Position::new(1, 0));
}

#[test]
fn requests_while_busy_are_rejected() {
    let (mut course, mut doc) = started(CourseConfig::default());
    course.goto_next_page(&mut doc).unwrap();
    assert_eq!(course.goto_next_page(&mut doc), Err(NavigationError::Busy));
    assert_eq!(course.goto_previous_page(&mut doc), Err(NavigationError::Busy));
    assert_eq!(doc.pending_fetches(), 1);

    deliver(&mut course, &mut doc);
    assert_eq!(course.handle_module_click(&mut doc, 1), Err(NavigationError::Busy));
    course.on_transition_complete(&mut doc);
    assert!(course.goto_next_page(&mut doc).is_ok());
}

#[test]
fn stale_results_are_ignored() {
    let (mut course, mut doc) = started(CourseConfig::default());
    assert_eq!(course.on_transition_complete(&mut doc), None);

    let NavOutcome::Loading { ticket, .. } = course.goto_next_page(&mut doc).unwrap() else {
        panic!("expected a load");
    };
    let stale = FetchTicket(ticket.0.wrapping_add(7));
    assert_eq!(course.on_fragment_loaded(&mut doc, stale, Ok(())), LoadResult::Ignored);
    assert!(course.navigator().is_busy());
}

#[test]
fn load_failure_shows_alert_and_keeps_position() {
    let mut doc = MemoryDocument::course_shell();
    doc.register_fragment(
        "content/mod0/page0.html",
        pages::load("content/mod0/page0.html").unwrap(),
    );
    let mut course = course_with(CourseConfig::default());
    course.start(&mut doc).unwrap();
    deliver(&mut course, &mut doc);

    course.goto_next_page(&mut doc).unwrap();
    assert_eq!(deliver(&mut course, &mut doc), LoadResult::Failed);
    assert_eq!(course.position(), Position::new(0, 0));
    assert!(!course.navigator().is_busy());
    assert!(doc.slides.is_empty());

    let next = doc.pane(PaneSlot::Next).unwrap();
    assert_eq!(doc.text_of(next), "Sorry, failed to load this page.");
    assert!(doc.query("#nextPage [role=alert]").is_some());
}

#[test]
fn phone_layout_loads_into_current_pane() {
    let (mut course, mut doc) = started(CourseConfig::default());
    doc.phone = true;
    course.goto_next_page(&mut doc).unwrap();
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Current);
    assert_eq!(deliver(&mut course, &mut doc), LoadResult::Arrived(Position::new(0, 1)));
    assert!(doc.slides.is_empty());
    assert_eq!(course.position(), Position::new(0, 1));
    let diagram = doc.by_id("diagram");
    assert_eq!(course.engine().steps(diagram), None);
}

#[test]
fn boundary_policy_stay_and_wrap() {
    let (mut course, mut doc) = started(CourseConfig::default());
    assert_eq!(course.goto_previous_page(&mut doc), Ok(NavOutcome::Stayed));
    assert_eq!(doc.pending_fetches(), 0);

    let cfg = CourseConfig {
        boundary: BoundaryPolicy::Wrap,
        ..Default::default()
    };
    let (mut course, mut doc) = started(cfg);
    let outcome = course.goto_previous_page(&mut doc).unwrap();
    assert!(matches!(outcome, NavOutcome::Loading { target, .. } if target == Position::new(1, 1)));
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Previous);
}

#[test]
fn next_rolls_into_following_module() {
    let (mut course, mut doc) = started(CourseConfig::default());
    course.goto_page(&mut doc, 0, 1, 1).unwrap();
    deliver(&mut course, &mut doc);
    course.on_transition_complete(&mut doc);

    let outcome = course.goto_next_page(&mut doc).unwrap();
    assert!(matches!(outcome, NavOutcome::Loading { target, .. } if target == Position::new(1, 0)));
}

#[test]
fn module_click_picks_direction() {
    let (mut course, mut doc) = started(CourseConfig::default());
    course.handle_module_click(&mut doc, 1).unwrap();
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Next);
    deliver(&mut course, &mut doc);
    course.on_transition_complete(&mut doc);
    assert_eq!(course.position(), Position::new(1, 0));

    course.handle_module_click(&mut doc, 0).unwrap();
    assert_eq!(doc.next_fetch().unwrap().slot, PaneSlot::Previous);
    assert_eq!(course.goto_page(&mut doc, 5, 0, 1), Err(NavigationError::Busy));
}

#[test]
fn missing_page_is_an_error() {
    let (mut course, mut doc) = started(CourseConfig::default());
    assert_eq!(
        course.goto_page(&mut doc, 5, 0, 1),
        Err(NavigationError::NoSuchPage { module: 5, page: 0 })
    );
    assert!(!course.navigator().is_busy());
}

#[test]
fn page_hooks_run_in_order_and_can_play() {
    let mut doc = document();
    let mut course = course_with(CourseConfig::default());
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in ["Lesson1Init", "pageLoaded", "finishedMovingIn"] {
        let l = log.clone();
        course.page_hooks().register(name, move |ctx| {
            l.borrow_mut()
                .push(format!("{name} {}", ctx.page_id.as_deref().unwrap_or("")));
            if name == "finishedMovingIn" && ctx.position == Position::new(0, 0) {
                ctx.play("#intro", None);
            }
        });
    }

    course.start(&mut doc).unwrap();
    deliver(&mut course, &mut doc);
    assert_eq!(
        *log.borrow(),
        vec!["Lesson1Init m0p0", "pageLoaded m0p0", "finishedMovingIn m0p0"]
    );
    let intro = doc.by_id("intro");
    assert_eq!(course.engine().next_index(intro), Some(1));
    assert_eq!(doc.style(intro, "left").as_deref(), Some("750px"));
    assert_eq!(
        doc.style(intro, "transform").as_deref(),
        Some("translate(-750px, 0px) scale(1)")
    );

    log.borrow_mut().clear();
    course.goto_next_page(&mut doc).unwrap();
    deliver(&mut course, &mut doc);
    assert!(log.borrow().is_empty());
    course.on_transition_complete(&mut doc);
    assert_eq!(*log.borrow(), vec!["pageLoaded m0p1", "finishedMovingIn m0p1"]);
}

#[test]
fn chained_class_animation_plays_through_course() {
    let (mut course, mut doc) = started(CourseConfig::default());
    course.goto_next_page(&mut doc).unwrap();
    deliver(&mut course, &mut doc);
    course.on_transition_complete(&mut doc);

    let diagram = doc.by_id("diagram");
    let caption = doc.by_id("caption");
    assert!(course.play_animation(&mut doc, diagram, None).started());
    assert_eq!(doc.style(diagram, "transition-duration").as_deref(), Some("0.8s"));
    assert_eq!(doc.style(caption, "top").as_deref(), Some("220px"));

    course.on_transition_end(&mut doc, diagram, Some("opacity"));
    assert_eq!(doc.style(diagram, "opacity").as_deref(), Some("1"));
    assert_eq!(doc.style(diagram, "transition-duration"), None);
    assert_eq!(
        doc.style(caption, "transform").as_deref(),
        Some("translate(0px, -220px) scale(1)")
    );
    assert!(doc.style(caption, "transition-duration").is_some());

    course.advance_to(&mut doc, 5_000.0);
    assert_eq!(doc.style(caption, "transition-duration"), None);
    assert_eq!(course.engine().pending_timers(), 0);
}

#[test]
fn resize_is_coalesced_into_one_frame() {
    let (mut course, mut doc) = started(CourseConfig::default());
    course.request_resize(&mut doc);
    course.request_resize(&mut doc);
    assert_eq!(doc.frame_requests, 1);

    let current = doc.pane(PaneSlot::Current).unwrap();
    doc.set_rect(current, Rect::new(0.0, 0.0, 640.0, 600.0));
    course.on_animation_frame(&mut doc);
    assert_eq!(course.navigator().viewport_width(), 640.0);

    course.goto_next_page(&mut doc).unwrap();
    deliver(&mut course, &mut doc);
    assert_eq!(doc.slides.last(), Some(&(-640.0, 800.0)));

    course.request_resize(&mut doc);
    assert_eq!(doc.frame_requests, 2);
}

#[test]
fn sounds_route_through_the_bank() {
    let audio = RecordingAudio::new();
    let mut doc = document();
    let mut course = Course::from_json(
        CourseConfig::default(),
        &courses::json("sample").unwrap(),
        Box::new(audio.clone()),
    )
    .unwrap();
    assert!(course.add_sound("whoosh", "audio/whoosh.mp3"));
    course.start(&mut doc).unwrap();
    deliver(&mut course, &mut doc);

    course.goto_page(&mut doc, 1, 0, 1).unwrap();
    deliver(&mut course, &mut doc);
    course.on_transition_complete(&mut doc);
    let summary = doc.by_id("summary");
    course.play_animation(&mut doc, summary, None);
    assert_eq!(
        audio.calls().first(),
        Some(&AudioCall::Play {
            name: "whoosh".into(),
            url: "audio/whoosh.mp3".into(),
            volume: 1.0
        })
    );
    assert!(course.sound_bank().is_playing("whoosh"));

    course.page_hide(&mut doc);
    assert!(!course.sound_bank().is_playing("whoosh"));
    assert!(audio.calls().contains(&AudioCall::Stop("whoosh".into())));

    course.sound_bank().set_master_volume(0.5);
    assert!(audio.calls().contains(&AudioCall::Volume {
        name: "whoosh".into(),
        volume: 0.5
    }));
}

#[test]
fn quiz_lookups() {
    let course = course_with(CourseConfig::default());
    assert_eq!(course.module_count(), 2);
    assert_eq!(course.page_count(1), 2);
    assert_eq!(course.page_count(9), 0);
    assert_eq!(course.page_url(1, 1), Some("content/mod1/page1.html"));
    assert!(course.is_quiz(1, 1));
    assert!(course.for_quiz_credit(1, 1));
    assert!(!course.is_quiz(0, 0));
    assert!(!course.for_quiz_credit(7, 7));
}
