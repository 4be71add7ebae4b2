#![cfg(target_arch = "wasm32")]
use courseware_course_wasm::{abi_version, AssetPreloader, CoursewarePlayer};
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const COURSE: &str = r#"{
  "modules": [
    { "title": "Intro", "pages": [
      { "id": "a", "url": "a.html" },
      { "id": "b", "url": "b.html" }
    ] },
    { "title": "Quiz", "pages": [
      { "id": "q", "url": "q.html", "quiz": { "credit": true, "q1": "a" } }
    ] }
  ]
}"#;

/// Host with no elements that records fetches and slides on itself.
fn stub_host() -> JsValue {
    js_sys::eval(
        r#"({
          fetches: [], slides: [], indicators: [],
          query() { return null; },
          queryWithin() { return null; },
          queryAll() { return []; },
          isConnected() { return false; },
          documentHidden() { return false; },
          isPhoneLayout() { return false; },
          measure() { return { left: 0, top: 0, width: 0, height: 0 }; },
          getAttribute() { return null; },
          setAttribute() {}, removeAttribute() {},
          hasClass() { return false; },
          getStyle() { return ""; }, setStyle() {},
          computedTransform() { return "none"; },
          flushLayout() {},
          textContent() { return ""; }, setTextContent() {}, clearChildren() {},
          appendSpan() { return 0; },
          focusableDescendants() { return []; },
          viewportWidth() { return 800; },
          rowLeft() { return 0; },
          fetchFragment(t, url, slot) { this.fetches.push([t, url, slot]); },
          showLoadError() {},
          slideRow(to, ms) { this.slides.push([to, ms]); },
          resetRow() {}, promotePane() {},
          updateIndicator(i) { this.indicators.push(i); },
          requestAnimationFrame() {}
        })"#,
    )
    .unwrap()
}

fn field(obj: &JsValue, name: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(name)).unwrap()
}

fn player(host: &JsValue) -> CoursewarePlayer {
    CoursewarePlayer::new(
        JsValue::UNDEFINED,
        JsValue::from_str(COURSE),
        host.clone(),
        JsValue::UNDEFINED,
    )
    .unwrap()
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn invalid_course_is_rejected() {
    let res = CoursewarePlayer::new(
        JsValue::NULL,
        JsValue::from_str("{ nope"),
        stub_host(),
        JsValue::UNDEFINED,
    );
    assert!(res.is_err());
    let res = CoursewarePlayer::new(
        JsValue::NULL,
        JsValue::from_str(COURSE),
        JsValue::from_f64(3.0),
        JsValue::UNDEFINED,
    );
    assert!(res.is_err());
}

#[wasm_bindgen_test]
fn start_then_slide_to_next_page() {
    let host = stub_host();
    let mut p = player(&host);

    let reply = p.start().unwrap();
    assert_eq!(field(&reply, "status").as_string().as_deref(), Some("loading"));
    let ticket = field(&reply, "ticket").as_f64().unwrap() as u32;
    assert_eq!(p.fragment_loaded(ticket, None), "arrived");
    assert_eq!(js_sys::Array::from(&field(&host, "indicators")).length(), 1);

    let reply = p.goto_next_page().unwrap();
    let ticket = field(&reply, "ticket").as_f64().unwrap() as u32;
    let busy = p.goto_next_page().unwrap();
    assert_eq!(field(&busy, "status").as_string().as_deref(), Some("busy"));

    assert_eq!(p.fragment_loaded(ticket, None), "sliding");
    let fetches = js_sys::Array::from(&field(&host, "fetches"));
    let last = js_sys::Array::from(&fetches.get(1));
    assert_eq!(last.get(2).as_string().as_deref(), Some("next"));
    assert!(p.transition_complete());

    let pos = p.position().unwrap();
    assert_eq!(field(&pos, "module").as_f64(), Some(0.0));
    assert_eq!(field(&pos, "page").as_f64(), Some(1.0));
    assert_eq!(p.viewed_count(), 2);
}

#[wasm_bindgen_test]
fn failed_load_and_lookups() {
    let host = stub_host();
    let mut p = player(&host);
    let reply = p.start().unwrap();
    let ticket = field(&reply, "ticket").as_f64().unwrap() as u32;
    assert_eq!(p.fragment_loaded(ticket, Some("404".into())), "failed");
    assert!(!p.is_busy());

    assert_eq!(p.module_count(), 2);
    assert!(p.is_quiz(1, 0));
    assert!(p.for_quiz_credit(1, 0));
    assert_eq!(p.page_url(0, 1).as_deref(), Some("b.html"));
    assert!(p.play_animation(JsValue::from_str("#missing"), None).map(|s| !s).unwrap());
    assert!(p.play_animation(JsValue::TRUE, None).is_err());
}

#[wasm_bindgen_test]
fn sprite_handles_round_trip() {
    let host = stub_host();
    let mut p = player(&host);
    let cfg = JsValue::from_str(r#"{"src":"walk.png","frameWidth":32,"frameHeight":32,"fps":10}"#);
    let id = p.load_sprite(7, cfg, 128.0, 64.0).unwrap();
    p.play_sprite(id).unwrap();
    p.set_sprite_loop(id, true, true).unwrap();
    p.advance(250.0);
    p.goto_sprite_frame(id, 3).unwrap();
    assert!(p.play_sprite(id + 1).is_err());
    assert!(p.destroy_sprite(id));

    let bad = JsValue::from_str(r#"{"src":"walk.png","frameWidth":512,"frameHeight":32}"#);
    assert!(p.load_sprite(7, bad, 128.0, 64.0).is_err());
}

#[wasm_bindgen_test]
fn preloader_reports_progress() {
    let loads = js_sys::eval(
        r#"({ calls: [], load(t, kind, key, url) { this.calls.push([t, kind, key, url]); } })"#,
    )
    .unwrap();
    let manifest = JsValue::from_str(r#"{"images":{"a":"a.png"},"audio":{"b":"b.mp3"}}"#);
    let mut pre = AssetPreloader::new(manifest, loads.clone(), Some(1)).unwrap();
    assert_eq!(pre.start(), 1);
    let calls = js_sys::Array::from(&field(&loads, "calls"));
    let first = js_sys::Array::from(&calls.get(0));
    assert_eq!(first.get(1).as_string().as_deref(), Some("image"));

    let progress = pre.finished(0, None).unwrap();
    assert_eq!(field(&progress, "percent").as_f64(), Some(50.0));
    let progress = pre.finished(1, Some("404".into())).unwrap();
    assert_eq!(field(&progress, "percent").as_f64(), Some(100.0));
    assert!(pre.finished(1, None).unwrap().is_undefined());
    assert!(pre.is_done());
    assert!(pre.is_loaded("image", "a").unwrap());
    assert!(!pre.is_loaded("audio", "b").unwrap());
    assert!(pre.is_loaded("font", "a").is_err());
}
