//! Recording sound collaborators.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use courseware_animation_core::{SoundError, SoundSink};
use courseware_course_core::AudioBackend;

#[derive(Clone, Debug, PartialEq)]
pub enum SoundCall {
    Play(String),
    Stop(String),
    StopAll,
}

/// `SoundSink` that records every call. Names in `failing` reject playback.
#[derive(Debug, Default)]
pub struct RecordingSound {
    pub calls: Vec<SoundCall>,
    pub failing: HashSet<String>,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SoundCall::Play(n) => Some(n.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SoundCall::Stop(n) => Some(n.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SoundSink for RecordingSound {
    fn play_sound(&mut self, name: &str) -> Result<(), SoundError> {
        self.calls.push(SoundCall::Play(name.to_string()));
        if self.failing.contains(name) {
            return Err(SoundError::Playback {
                name: name.to_string(),
                reason: "autoplay blocked".to_string(),
            });
        }
        Ok(())
    }

    fn stop_sound(&mut self, name: &str) -> Result<(), SoundError> {
        self.calls.push(SoundCall::Stop(name.to_string()));
        Ok(())
    }

    fn stop_all_sounds(&mut self) -> Result<(), SoundError> {
        self.calls.push(SoundCall::StopAll);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCall {
    Play { name: String, url: String, volume: f64 },
    Stop(String),
    Volume { name: String, volume: f64 },
}

/// `AudioBackend` whose log stays readable after the backend is boxed into a
/// `SoundBank`: keep a clone.
#[derive(Clone, Debug, Default)]
pub struct RecordingAudio {
    log: Rc<RefCell<Vec<AudioCall>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.log.borrow().clone()
    }

    pub fn played_names(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                AudioCall::Play { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl AudioBackend for RecordingAudio {
    fn play(&mut self, name: &str, url: &str, volume: f64) -> Result<(), SoundError> {
        self.log.borrow_mut().push(AudioCall::Play {
            name: name.to_string(),
            url: url.to_string(),
            volume,
        });
        Ok(())
    }

    fn stop(&mut self, name: &str) -> Result<(), SoundError> {
        self.log.borrow_mut().push(AudioCall::Stop(name.to_string()));
        Ok(())
    }

    fn set_volume(&mut self, name: &str, volume: f64) {
        self.log.borrow_mut().push(AudioCall::Volume {
            name: name.to_string(),
            volume,
        });
    }
}
