//! Named sound registry over a pluggable audio backend.

use hashbrown::{HashMap, HashSet};

use courseware_animation_core::{SoundError, SoundSink};

/// Audio output. The wasm adapter forwards to `HTMLAudioElement`s; tests
/// record calls.
pub trait AudioBackend {
    /// Start `name` (loaded from `url`) from the beginning at `volume`.
    fn play(&mut self, name: &str, url: &str, volume: f64) -> Result<(), SoundError>;
    /// Pause `name` and rewind it.
    fn stop(&mut self, name: &str) -> Result<(), SoundError>;
    /// Apply a new effective volume to an already-loaded sound.
    fn set_volume(&mut self, _name: &str, _volume: f64) {}
}

/// Backend that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioBackend for NullAudio {
    fn play(&mut self, _name: &str, _url: &str, _volume: f64) -> Result<(), SoundError> {
        Ok(())
    }
    fn stop(&mut self, _name: &str) -> Result<(), SoundError> {
        Ok(())
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

pub struct SoundBank {
    urls: HashMap<String, String>,
    playing: HashSet<String>,
    master_volume: f64,
    muted: bool,
    backend: Box<dyn AudioBackend>,
}

impl std::fmt::Debug for SoundBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundBank")
            .field("sounds", &self.urls.len())
            .field("playing", &self.playing)
            .field("master_volume", &self.master_volume)
            .field("muted", &self.muted)
            .finish()
    }
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::new(Box::new(NullAudio))
    }
}

impl SoundBank {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            urls: HashMap::new(),
            playing: HashSet::new(),
            master_volume: 1.0,
            muted: false,
            backend,
        }
    }

    /// Register `name`. An existing registration is kept; returns whether
    /// `name` was new.
    pub fn add(&mut self, name: &str, url: &str) -> bool {
        if self.urls.contains_key(name) {
            return false;
        }
        self.urls.insert(name.to_string(), url.to_string());
        true
    }

    pub fn url(&self, name: &str) -> Option<&str> {
        self.urls.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Play a registered name, or treat `name_or_url` as a URL and register
    /// it under itself.
    pub fn play(&mut self, name_or_url: &str) -> Result<(), SoundError> {
        self.play_with_volume(name_or_url, 1.0)
    }

    /// Play at `volume` (0..1), scaled by the master volume.
    pub fn play_with_volume(&mut self, name_or_url: &str, volume: f64) -> Result<(), SoundError> {
        self.add(name_or_url, name_or_url);
        let url = self.urls.get(name_or_url).cloned().unwrap_or_default();
        let effective = self.effective_volume(volume);
        self.backend.play(name_or_url, &url, effective)?;
        self.playing.insert(name_or_url.to_string());
        Ok(())
    }

    /// Stop a sound. Unknown names are ignored.
    pub fn stop(&mut self, name: &str) -> Result<(), SoundError> {
        if !self.urls.contains_key(name) {
            return Ok(());
        }
        self.playing.remove(name);
        self.backend.stop(name)
    }

    /// Stop every registered sound; the first backend error is returned after
    /// all stops have been attempted.
    pub fn stop_all(&mut self) -> Result<(), SoundError> {
        let mut first_err = None;
        let mut names: Vec<&String> = self.urls.keys().collect();
        names.sort();
        for name in names {
            if let Err(e) = self.backend.stop(name) {
                first_err.get_or_insert(e);
            }
        }
        self.playing.clear();
        first_err.map_or(Ok(()), Err)
    }

    /// Host notification: `name` played to its end.
    pub fn on_ended(&mut self, name: &str) {
        self.playing.remove(name);
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.playing.contains(name)
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, v: f64) {
        self.master_volume = clamp_unit(v);
        self.push_volume();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn mute(&mut self, on: bool) {
        self.muted = on;
        self.push_volume();
    }

    /// Volume a sound at `child` volume actually plays at.
    pub fn effective_volume(&self, child: f64) -> f64 {
        if self.muted {
            return 0.0;
        }
        clamp_unit(self.master_volume * child)
    }

    fn push_volume(&mut self) {
        let v = self.effective_volume(1.0);
        for name in self.urls.keys() {
            self.backend.set_volume(name, v);
        }
    }
}

impl SoundSink for SoundBank {
    fn play_sound(&mut self, name: &str) -> Result<(), SoundError> {
        self.play(name)
    }

    fn stop_sound(&mut self, name: &str) -> Result<(), SoundError> {
        self.stop(name)
    }

    fn stop_all_sounds(&mut self) -> Result<(), SoundError> {
        self.stop_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log(Rc<RefCell<Vec<String>>>);

    impl AudioBackend for Log {
        fn play(&mut self, name: &str, url: &str, volume: f64) -> Result<(), SoundError> {
            if url.ends_with(".missing") {
                return Err(SoundError::Playback {
                    name: name.into(),
                    reason: "404".into(),
                });
            }
            self.0.borrow_mut().push(format!("play {name} {url} {volume}"));
            Ok(())
        }
        fn stop(&mut self, name: &str) -> Result<(), SoundError> {
            self.0.borrow_mut().push(format!("stop {name}"));
            Ok(())
        }
    }

    fn bank() -> (SoundBank, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (SoundBank::new(Box::new(Log(log.clone()))), log)
    }

    #[test]
    fn first_registration_wins() {
        let (mut b, _) = bank();
        assert!(b.add("click", "a.mp3"));
        assert!(!b.add("click", "b.mp3"));
        assert_eq!(b.url("click"), Some("a.mp3"));
    }

    #[test]
    fn unregistered_name_plays_as_url() {
        let (mut b, log) = bank();
        b.play("content/audio/wow.mp3").unwrap();
        assert_eq!(b.url("content/audio/wow.mp3"), Some("content/audio/wow.mp3"));
        assert!(b.is_playing("content/audio/wow.mp3"));
        assert_eq!(log.borrow()[0], "play content/audio/wow.mp3 content/audio/wow.mp3 1");
    }

    #[test]
    fn volume_is_clamped_and_muted() {
        let (mut b, log) = bank();
        b.add("bell", "bell.mp3");
        b.set_master_volume(3.0);
        assert_eq!(b.master_volume(), 1.0);
        b.set_master_volume(f64::NAN);
        assert_eq!(b.master_volume(), 0.0);
        b.set_master_volume(0.5);
        b.play_with_volume("bell", 0.5).unwrap();
        b.mute(true);
        assert_eq!(b.effective_volume(1.0), 0.0);
        assert_eq!(log.borrow()[0], "play bell bell.mp3 0.25");
    }

    #[test]
    fn failed_playback_is_reported_and_not_marked_playing() {
        let (mut b, _) = bank();
        b.add("gone", "x.missing");
        assert!(b.play("gone").is_err());
        assert!(!b.is_playing("gone"));
    }

    #[test]
    fn stop_unknown_is_ok_and_stop_all_clears() {
        let (mut b, log) = bank();
        assert!(b.stop("nope").is_ok());
        b.add("a", "a.mp3");
        b.add("b", "b.mp3");
        b.play("a").unwrap();
        b.stop_all().unwrap();
        assert!(!b.is_playing("a"));
        let log = log.borrow();
        assert_eq!(&log[1..], ["stop a", "stop b"]);
    }
}
