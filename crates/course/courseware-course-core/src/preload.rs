//! Manifest-driven asset preloading.
//!
//! The manifest names images, audio and video by key. [`Preloader`] hands
//! at most `concurrency` loads to the [`PreloadHost`] at a time and reports
//! progress as each one settles. A failed load still counts towards
//! progress; it is logged and left out of the loaded set.

use std::collections::{BTreeMap, VecDeque};

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::error::CourseError;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
    Video,
}

/// `{ "images": {key: url}, "audio": {...}, "video": {...} }`.
/// Loads are issued per kind in that order, keys sorted within a kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreloadManifest {
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    #[serde(default)]
    pub audio: BTreeMap<String, String>,
    #[serde(default)]
    pub video: BTreeMap<String, String>,
}

impl PreloadManifest {
    pub fn from_json(raw: &str) -> Result<Self, CourseError> {
        serde_json::from_str(raw).map_err(|e| CourseError::InvalidManifest(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.audio.len() + self.video.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tasks(&self) -> Vec<PreloadTask> {
        let groups = [
            (AssetKind::Image, &self.images),
            (AssetKind::Audio, &self.audio),
            (AssetKind::Video, &self.video),
        ];
        groups
            .into_iter()
            .flat_map(|(kind, entries)| {
                entries.iter().map(move |(key, url)| PreloadTask {
                    kind,
                    key: key.clone(),
                    url: url.clone(),
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadTask {
    pub kind: AssetKind,
    pub key: String,
    pub url: String,
}

/// Matches a host's load result to the request that started it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket(pub u32);

/// Loads assets on the preloader's behalf. Every `start_load` must be
/// answered with [`Preloader::finished`] carrying the same ticket.
pub trait PreloadHost {
    fn start_load(&mut self, ticket: LoadTicket, task: &PreloadTask);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadItem {
    pub kind: AssetKind,
    pub key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadProgress {
    pub completed: usize,
    pub total: usize,
    /// Rounded percentage; 100 for an empty manifest.
    pub percent: u32,
    /// The asset that just loaded; `None` after a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<PreloadItem>,
}

#[derive(Debug)]
pub struct Preloader {
    concurrency: usize,
    queue: VecDeque<PreloadTask>,
    in_flight: HashMap<LoadTicket, PreloadTask>,
    next_ticket: u32,
    total: usize,
    completed: usize,
    failed: usize,
    loaded: HashSet<(AssetKind, String)>,
    aborted: bool,
}

impl Preloader {
    /// A concurrency of 0 means [`DEFAULT_CONCURRENCY`].
    pub fn new(manifest: &PreloadManifest, concurrency: usize) -> Self {
        let concurrency = if concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            concurrency
        };
        let queue: VecDeque<PreloadTask> = manifest.tasks().into();
        Self {
            concurrency,
            total: queue.len(),
            queue,
            in_flight: HashMap::new(),
            next_ticket: 0,
            completed: 0,
            failed: 0,
            loaded: HashSet::new(),
            aborted: false,
        }
    }

    /// Fill free load slots. Returns how many loads were started.
    pub fn start(&mut self, host: &mut dyn PreloadHost) -> usize {
        let mut started = 0;
        while !self.aborted && self.in_flight.len() < self.concurrency {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            let ticket = LoadTicket(self.next_ticket);
            self.next_ticket = self.next_ticket.wrapping_add(1);
            host.start_load(ticket, &task);
            self.in_flight.insert(ticket, task);
            started += 1;
        }
        started
    }

    /// Host report for `ticket`. Starts the next queued load and returns the
    /// new progress, or `None` for an unknown ticket or after `abort`.
    pub fn finished(
        &mut self,
        host: &mut dyn PreloadHost,
        ticket: LoadTicket,
        result: Result<(), String>,
    ) -> Option<PreloadProgress> {
        let task = self.in_flight.remove(&ticket)?;
        if self.aborted {
            return None;
        }
        self.completed += 1;
        let item = match result {
            Ok(()) => {
                self.loaded.insert((task.kind, task.key.clone()));
                Some(PreloadItem {
                    kind: task.kind,
                    key: task.key,
                })
            }
            Err(reason) => {
                log::warn!("preload failed for {:?}:{} -> {}: {reason}", task.kind, task.key, task.url);
                self.failed += 1;
                None
            }
        };
        self.start(host);
        let mut progress = self.progress();
        progress.item = item;
        if self.is_done() {
            log::info!(
                "preload finished: {} loaded, {} failed",
                self.loaded.len(),
                self.failed
            );
        }
        Some(progress)
    }

    /// Drop everything still queued; results still in flight are ignored.
    pub fn abort(&mut self) {
        if !self.aborted {
            log::debug!("preload aborted with {} queued", self.queue.len());
        }
        self.aborted = true;
        self.queue.clear();
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn progress(&self) -> PreloadProgress {
        let percent = if self.total == 0 {
            100
        } else {
            (self.completed as f64 / self.total as f64 * 100.0).round() as u32
        };
        PreloadProgress {
            completed: self.completed,
            total: self.total,
            percent,
            item: None,
        }
    }

    pub fn is_loaded(&self, kind: AssetKind, key: &str) -> bool {
        self.loaded.contains(&(kind, key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        started: Vec<(LoadTicket, String)>,
    }

    impl PreloadHost for Recorder {
        fn start_load(&mut self, ticket: LoadTicket, task: &PreloadTask) {
            self.started.push((ticket, task.key.clone()));
        }
    }

    fn manifest() -> PreloadManifest {
        PreloadManifest::from_json(
            r#"{
              "images": { "logo": "img/logo.png", "bg": "img/bg.jpg" },
              "audio": { "click": "snd/click.mp3" },
              "video": { "intro": "vid/intro.mp4" }
            }"#,
        )
        .expect("manifest")
    }

    #[test]
    fn tasks_follow_kind_then_key_order() {
        let keys: Vec<(AssetKind, String)> = manifest()
            .tasks()
            .into_iter()
            .map(|t| (t.kind, t.key))
            .collect();
        assert_eq!(
            keys,
            vec![
                (AssetKind::Image, "bg".to_string()),
                (AssetKind::Image, "logo".to_string()),
                (AssetKind::Audio, "click".to_string()),
                (AssetKind::Video, "intro".to_string()),
            ]
        );
        assert!(PreloadManifest::from_json("{}").expect("empty").is_empty());
        assert!(PreloadManifest::from_json("[1]").is_err());
    }

    #[test]
    fn concurrency_bounds_loads_in_flight() {
        let mut host = Recorder::default();
        let mut p = Preloader::new(&manifest(), 2);
        assert_eq!(p.start(&mut host), 2);
        assert_eq!(p.start(&mut host), 0);
        assert_eq!(p.in_flight(), 2);

        let first = host.started[0].0;
        let progress = p.finished(&mut host, first, Ok(())).expect("known ticket");
        assert_eq!((progress.completed, progress.total, progress.percent), (1, 4, 25));
        assert_eq!(
            progress.item,
            Some(PreloadItem {
                kind: AssetKind::Image,
                key: "bg".into()
            })
        );
        assert_eq!(host.started.len(), 3);
        assert_eq!(p.in_flight(), 2);
        assert!(p.finished(&mut host, first, Ok(())).is_none());
    }

    #[test]
    fn failures_count_towards_progress() {
        let mut host = Recorder::default();
        let mut p = Preloader::new(&manifest(), 0);
        assert_eq!(p.start(&mut host), 4);
        let tickets: Vec<LoadTicket> = host.started.iter().map(|(t, _)| *t).collect();

        let mut last = None;
        for (i, t) in tickets.into_iter().enumerate() {
            let result = if i == 2 { Err("404".to_string()) } else { Ok(()) };
            last = p.finished(&mut host, t, result);
        }
        let last = last.expect("progress");
        assert_eq!(last.percent, 100);
        assert!(p.is_done());
        assert_eq!(p.failed(), 1);
        assert!(p.is_loaded(AssetKind::Image, "logo"));
        assert!(!p.is_loaded(AssetKind::Audio, "click"));
    }

    #[test]
    fn abort_drops_the_queue_and_late_results() {
        let mut host = Recorder::default();
        let mut p = Preloader::new(&manifest(), 1);
        p.start(&mut host);
        p.abort();
        let ticket = host.started[0].0;
        assert!(p.finished(&mut host, ticket, Ok(())).is_none());
        assert_eq!(host.started.len(), 1);
        assert!(p.is_done());
        assert!(p.is_aborted());
        assert_eq!(p.progress().completed, 0);
    }

    #[test]
    fn empty_manifest_is_done_immediately() {
        let mut host = Recorder::default();
        let mut p = Preloader::new(&PreloadManifest::default(), 4);
        assert_eq!(p.start(&mut host), 0);
        assert!(p.is_done());
        assert_eq!(p.progress().percent, 100);
    }
}
