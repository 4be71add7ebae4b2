//! Sprite-sheet frame sequencer.
//!
//! A sheet is a grid of equally sized frames. Playback steps one frame per
//! `1 / fps` seconds through the inclusive `[start_frame, end_frame]` window,
//! either wrapping (`loop`) or bouncing (`pingPong`). The engine drives the
//! clock and renders through the host as a CSS background offset.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::ids::{ElementId, TimerId};

fn default_fps() -> u32 {
    12
}

fn default_true() -> bool {
    true
}

/// Authored sprite options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    /// Sheet image URL.
    pub src: String,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Total frames; computed from the sheet size when absent.
    #[serde(default)]
    pub frames: Option<u32>,
    /// Frames per row; computed from the sheet width when absent.
    #[serde(default)]
    pub columns: Option<u32>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_true", rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub ping_pong: bool,
    #[serde(default)]
    pub start_frame: u32,
    /// Last frame, inclusive. Defaults to the final frame of the sheet.
    #[serde(default)]
    pub end_frame: Option<u32>,
    /// Callback name fired when a non-looping run finishes.
    #[serde(default)]
    pub on_complete: Option<String>,
    /// Callback name fired each time a loop wraps or bounces.
    #[serde(default)]
    pub on_loop: Option<String>,
}

impl SpriteConfig {
    pub fn from_json(raw: &str) -> Result<Self, AnimationError> {
        serde_json::from_str(raw).map_err(|e| AnimationError::InvalidSprite {
            reason: e.to_string(),
        })
    }
}

/// What a single frame step crossed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpriteEvent {
    Looped,
    Completed,
}

#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub element: ElementId,
    cfg: SpriteConfig,
    columns: u32,
    total_frames: u32,
    start: u32,
    end: u32,
    current: u32,
    forward: bool,
    playing: bool,
    pub(crate) timer: Option<TimerId>,
}

impl SpriteSheet {
    /// Lay the config over a loaded sheet of `sheet_width` x `sheet_height`
    /// pixels.
    pub fn new(
        element: ElementId,
        cfg: SpriteConfig,
        sheet_width: f64,
        sheet_height: f64,
    ) -> Result<Self, AnimationError> {
        let invalid = |reason: &str| AnimationError::InvalidSprite {
            reason: reason.to_string(),
        };
        if cfg.frame_width == 0 || cfg.frame_height == 0 {
            return Err(invalid("frame size must be non-zero"));
        }
        let columns = match cfg.columns.filter(|c| *c > 0) {
            Some(c) => c,
            None => (sheet_width.max(0.0) / f64::from(cfg.frame_width)).floor() as u32,
        };
        if columns == 0 {
            return Err(invalid("sheet is narrower than one frame"));
        }
        let total_frames = match cfg.frames.filter(|f| *f > 0) {
            Some(f) => f,
            None => {
                let rows = (sheet_height.max(0.0) / f64::from(cfg.frame_height)).floor() as u32;
                columns * rows
            }
        };
        if total_frames == 0 {
            return Err(invalid("sheet holds no frames"));
        }

        let last = total_frames - 1;
        let mut start = cfg.start_frame.min(last);
        let mut end = cfg.end_frame.unwrap_or(last).min(last);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        let mut cfg = cfg;
        cfg.fps = cfg.fps.max(1);
        Ok(Self {
            element,
            cfg,
            columns,
            total_frames,
            start,
            end,
            current: start,
            forward: true,
            playing: false,
            timer: None,
        })
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.cfg
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn range(&self) -> (u32, u32) {
        (self.start, self.end)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn frame_ms(&self) -> f64 {
        1000.0 / f64::from(self.cfg.fps)
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.cfg.fps = fps.max(1);
    }

    pub fn set_loop(&mut self, looping: bool, ping_pong: bool) {
        self.cfg.looping = looping;
        self.cfg.ping_pong = ping_pong;
    }

    /// Narrow playback to `[start, end]` (swapped if reversed) and jump to
    /// `start`.
    pub fn set_range(&mut self, start: u32, end: u32) {
        let last = self.total_frames - 1;
        let (a, b) = (start.min(last), end.min(last));
        (self.start, self.end) = if a <= b { (a, b) } else { (b, a) };
        self.current = self.start;
    }

    /// Jump to `index`, clamped into the playback window.
    pub fn goto(&mut self, index: u32) {
        self.current = index.clamp(self.start, self.end);
    }

    /// Back to the first frame, moving forward.
    pub fn rewind(&mut self) {
        self.forward = true;
        self.current = self.start;
    }

    /// Pixel offset of frame `index` within the sheet.
    pub fn offset(&self, index: u32) -> (i64, i64) {
        let col = index % self.columns;
        let row = index / self.columns;
        (
            i64::from(col) * i64::from(self.cfg.frame_width),
            i64::from(row) * i64::from(self.cfg.frame_height),
        )
    }

    /// CSS `background-position` showing the current frame.
    pub fn background_position(&self) -> String {
        let (x, y) = self.offset(self.current);
        format!("{}px {}px", -x, -y)
    }

    /// Step one frame. A finished non-looping run stops on its last frame
    /// and reports `Completed`.
    pub fn advance(&mut self) -> Option<SpriteEvent> {
        let (start, end) = (self.start, self.end);
        let at_edge = self.current == start || self.current == end;
        let mut event = None;

        let next = if self.cfg.ping_pong {
            let out_of_range = if self.forward {
                self.current >= end
            } else {
                self.current <= start
            };
            if out_of_range {
                self.forward = !self.forward;
                if at_edge {
                    if !self.cfg.looping {
                        self.playing = false;
                        return Some(SpriteEvent::Completed);
                    }
                    event = Some(SpriteEvent::Looped);
                }
            }
            if self.forward {
                self.current.saturating_add(1)
            } else {
                self.current.saturating_sub(1)
            }
        } else if self.current >= end {
            if !self.cfg.looping {
                self.playing = false;
                return Some(SpriteEvent::Completed);
            }
            event = Some(SpriteEvent::Looped);
            start
        } else {
            self.current + 1
        };

        self.current = next.clamp(start, end);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(json: &str) -> SpriteSheet {
        let cfg = SpriteConfig::from_json(json).expect("config");
        SpriteSheet::new(ElementId(1), cfg, 256.0, 128.0).expect("sheet")
    }

    fn walk(s: &mut SpriteSheet, n: usize) -> Vec<(u32, Option<SpriteEvent>)> {
        (0..n)
            .map(|_| {
                let ev = s.advance();
                (s.current(), ev)
            })
            .collect()
    }

    #[test]
    fn grid_is_derived_from_the_sheet() {
        let s = sheet(r#"{"src":"s.png","frameWidth":64,"frameHeight":64}"#);
        assert_eq!(s.total_frames(), 8);
        assert_eq!(s.range(), (0, 7));
        assert_eq!(s.config().fps, 12);
        assert!(s.config().looping);
        assert_eq!(s.offset(5), (64, 64));
        assert_eq!(s.background_position(), "0px 0px");
    }

    #[test]
    fn loop_wraps_to_the_window_start() {
        let mut s = sheet(r#"{"src":"s.png","frameWidth":64,"frameHeight":64,"startFrame":2,"endFrame":4}"#);
        let steps = walk(&mut s, 4);
        assert_eq!(
            steps,
            vec![
                (3, None),
                (4, None),
                (2, Some(SpriteEvent::Looped)),
                (3, None)
            ]
        );
    }

    #[test]
    fn once_stops_on_the_last_frame() {
        let mut s = sheet(r#"{"src":"s.png","frameWidth":64,"frameHeight":64,"frames":3,"loop":false}"#);
        s.set_playing(true);
        let steps = walk(&mut s, 3);
        assert_eq!(steps[1], (2, None));
        assert_eq!(steps[2], (2, Some(SpriteEvent::Completed)));
        assert!(!s.is_playing());
    }

    #[test]
    fn ping_pong_bounces_at_both_ends() {
        let mut s = sheet(r#"{"src":"s.png","frameWidth":64,"frameHeight":64,"frames":3,"pingPong":true}"#);
        let frames: Vec<u32> = walk(&mut s, 6).into_iter().map(|(f, _)| f).collect();
        assert_eq!(frames, vec![1, 2, 1, 0, 1, 2]);

        let mut once = sheet(
            r#"{"src":"s.png","frameWidth":64,"frameHeight":64,"frames":3,"pingPong":true,"loop":false}"#,
        );
        let steps = walk(&mut once, 3);
        assert_eq!(steps[2], (2, Some(SpriteEvent::Completed)));
    }

    #[test]
    fn range_and_goto_stay_inside_the_sheet() {
        let mut s = sheet(r#"{"src":"s.png","frameWidth":64,"frameHeight":64}"#);
        s.set_range(9, 3);
        assert_eq!(s.range(), (3, 7));
        assert_eq!(s.current(), 3);
        s.goto(1);
        assert_eq!(s.current(), 3);
        s.set_fps(0);
        assert_eq!(s.frame_ms(), 1000.0);
    }

    #[test]
    fn degenerate_sheets_are_rejected() {
        let cfg = SpriteConfig::from_json(r#"{"src":"s.png","frameWidth":512,"frameHeight":64}"#).unwrap();
        assert!(SpriteSheet::new(ElementId(1), cfg, 256.0, 128.0).is_err());
        assert!(SpriteConfig::from_json(r#"{"src":"s.png"}"#).is_err());
    }
}
