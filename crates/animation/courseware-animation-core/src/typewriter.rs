//! Typewriter reveal: timing and per-run progress.
//!
//! A run reveals one character per tick into a dedicated span. The engine
//! schedules the ticks on its timer queue; this module only knows how far a
//! run has got and how long each tick is.

use crate::ids::ElementId;

/// Shortest interval between two revealed characters.
pub const MIN_TICK_MS: f64 = 8.0;
/// Shortest total typing time when no `cps` is given.
pub const MIN_TOTAL_MS: f64 = 50.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TypewriterTiming {
    pub delay_ms: f64,
    pub total_ms: f64,
    pub tick_ms: f64,
}

impl TypewriterTiming {
    /// `cps` (characters per second) wins over `duration_s` when positive.
    pub fn new(char_count: usize, duration_s: f64, delay_s: f64, cps: Option<f64>) -> Self {
        let len = char_count.max(1) as f64;
        let total_ms = match cps.filter(|c| c.is_finite() && *c > 0.0) {
            Some(cps) => (char_count as f64 / cps * 1000.0).ceil(),
            None => (duration_s * 1000.0).max(MIN_TOTAL_MS),
        };
        let tick_ms = (total_ms / len).floor().max(MIN_TICK_MS);
        Self {
            delay_ms: (delay_s * 1000.0).max(0.0),
            total_ms,
            tick_ms,
        }
    }
}

/// Progress of one reveal.
#[derive(Clone, Debug)]
pub struct TypewriterRun {
    pub element: ElementId,
    pub span: ElementId,
    chars: Vec<char>,
    revealed: usize,
    pub timing: TypewriterTiming,
}

impl TypewriterRun {
    pub fn new(element: ElementId, span: ElementId, full: &str, timing: TypewriterTiming) -> Self {
        Self {
            element,
            span,
            chars: full.chars().collect(),
            revealed: 0,
            timing,
        }
    }

    pub fn is_done(&self) -> bool {
        self.revealed >= self.chars.len()
    }

    /// Reveal one more character and return the visible prefix.
    pub fn tick(&mut self) -> String {
        self.revealed = (self.revealed + 1).min(self.chars.len());
        self.visible()
    }

    pub fn visible(&self) -> String {
        self.chars[..self.revealed].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cps_sets_total_time() {
        let t = TypewriterTiming::new(20, 5.0, 0.0, Some(10.0));
        assert_eq!(t.total_ms, 2000.0);
        assert_eq!(t.tick_ms, 100.0);
    }

    #[test]
    fn duration_with_floor_and_min_tick() {
        let t = TypewriterTiming::new(10, 0.01, 0.5, None);
        assert_eq!(t.total_ms, 50.0);
        assert_eq!(t.tick_ms, 8.0);
        assert_eq!(t.delay_ms, 500.0);

        let t = TypewriterTiming::new(4, 1.0, -1.0, Some(0.0));
        assert_eq!(t.total_ms, 1000.0);
        assert_eq!(t.tick_ms, 250.0);
        assert_eq!(t.delay_ms, 0.0);
    }

    #[test]
    fn reveals_by_character_in_order() {
        let timing = TypewriterTiming::new(3, 1.0, 0.0, None);
        let mut run = TypewriterRun::new(ElementId(1), ElementId(2), "añb", timing);
        assert_eq!(run.tick(), "a");
        assert_eq!(run.tick(), "añ");
        assert!(!run.is_done());
        assert_eq!(run.tick(), "añb");
        assert!(run.is_done());
        assert_eq!(run.tick(), "añb");
    }
}
