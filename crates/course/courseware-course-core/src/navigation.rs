//! Page navigation: Idle -> Loading -> (Transitioning ->) Idle.
//!
//! The navigator never touches the document itself. It asks a
//! [`NavigationHost`] to fetch fragments into panes and to slide the content
//! row, and the host reports back with [`Navigator::on_fragment_loaded`] and
//! [`Navigator::on_transition_complete`].

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::config::{BoundaryPolicy, CourseConfig};
use crate::data::CourseData;
use crate::error::NavigationError;

/// Module/page pair, both 0-based.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub module: usize,
    pub page: usize,
}

impl Position {
    pub const fn new(module: usize, page: usize) -> Self {
        Self { module, page }
    }
}

/// The three content panes of the row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneSlot {
    Current,
    Next,
    Previous,
}

/// Matches a fragment result to the request that started it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTicket(pub u32);

/// Page-number/module-menu state handed to the host after each arrival.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIndicator {
    pub module: usize,
    pub page: usize,
    pub module_count: usize,
    pub page_count: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavPhase {
    Idle,
    Loading {
        ticket: FetchTicket,
        target: Position,
        slot: PaneSlot,
        direction: i32,
        slide: bool,
    },
    Transitioning {
        target: Position,
        slot: PaneSlot,
    },
}

/// Result of a navigation request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    /// A fetch was issued for `target`.
    Loading { ticket: FetchTicket, target: Position },
    /// At a course boundary under [`BoundaryPolicy::Stay`].
    Stayed,
}

/// What a fragment result did to the state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadResult {
    /// Content is visible at `Position` (phone layout or in-place load).
    Arrived(Position),
    /// The row slide toward the loaded pane has started.
    Sliding,
    /// The fetch failed; the error message is in the pane.
    Failed,
    /// Unknown or stale ticket.
    Ignored,
}

/// Document surface needed by the navigator.
pub trait NavigationHost {
    /// Narrow phone layout: pages load straight into the visible pane.
    fn is_phone_layout(&self) -> bool;
    /// Outer width of the visible page pane.
    fn viewport_width(&self) -> f64;
    /// Resting `left` offset of the content row.
    fn row_left(&self) -> f64;
    /// Start loading `url` into `slot`; report back with the same ticket.
    fn fetch_fragment(&mut self, ticket: FetchTicket, url: &str, slot: PaneSlot);
    /// Replace `slot`'s content with an alert carrying `message`.
    fn show_load_error(&mut self, slot: PaneSlot, message: &str);
    /// Animate the content row's `left` to `to_left`.
    fn slide_row(&mut self, to_left: f64, duration_ms: f64);
    /// Jump the content row back to `left` without animating.
    fn reset_row(&mut self, left: f64);
    /// Move `from`'s content into the current pane.
    fn promote_pane(&mut self, from: PaneSlot);
    fn update_indicator(&mut self, indicator: &PageIndicator);
    /// Ask for one `on_animation_frame` callback.
    fn request_animation_frame(&mut self);
}

#[derive(Debug)]
pub struct Navigator {
    position: Position,
    phase: NavPhase,
    boundary: BoundaryPolicy,
    slide_duration_ms: f64,
    load_error_message: String,
    width: f64,
    origin_left: f64,
    next_ticket: u32,
    frame_requested: bool,
    visited: HashSet<Position>,
}

impl Navigator {
    pub fn new(cfg: &CourseConfig) -> Self {
        Self {
            position: Position::default(),
            phase: NavPhase::Idle,
            boundary: cfg.boundary,
            slide_duration_ms: cfg.slide_duration_ms,
            load_error_message: cfg.load_error_message.clone(),
            width: 0.0,
            origin_left: 0.0,
            next_ticket: 0,
            frame_requested: false,
            visited: HashSet::new(),
        }
    }

    /// Measure the viewport and the row's resting offset.
    pub fn init(&mut self, host: &dyn NavigationHost) {
        self.width = host.viewport_width();
        self.origin_left = host.row_left();
        log::info!("navigation initialized (viewport {}px)", self.width);
    }

    /// Committed position: the page currently visible.
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != NavPhase::Idle
    }

    pub fn viewport_width(&self) -> f64 {
        self.width
    }

    /// Distinct pages shown so far.
    pub fn viewed_count(&self) -> usize {
        self.visited.len()
    }

    /// Neighbour of the committed position in `direction`, rolling into the
    /// adjacent non-empty module. `None` at a boundary under `Stay`.
    pub fn neighbour(&self, data: &CourseData, direction: i32) -> Option<Position> {
        let Position { module, page } = self.position;
        if direction >= 0 {
            if page + 1 < data.page_count(module) {
                return Some(Position::new(module, page + 1));
            }
            let next = (module + 1..data.module_count()).find(|m| data.page_count(*m) > 0);
            match (next, self.boundary) {
                (Some(m), _) => Some(Position::new(m, 0)),
                (None, BoundaryPolicy::Wrap) => data.first_position().map(|(m, p)| Position::new(m, p)),
                (None, BoundaryPolicy::Stay) => None,
            }
        } else {
            if page > 0 && page <= data.page_count(module) {
                return Some(Position::new(module, page - 1));
            }
            let prev = (0..module.min(data.module_count()))
                .rev()
                .find(|m| data.page_count(*m) > 0);
            match (prev, self.boundary) {
                (Some(m), _) => Some(Position::new(m, data.page_count(m) - 1)),
                (None, BoundaryPolicy::Wrap) => data.last_position().map(|(m, p)| Position::new(m, p)),
                (None, BoundaryPolicy::Stay) => None,
            }
        }
    }

    /// Step one page forward (`direction > 0`) or back.
    pub fn request_step(
        &mut self,
        host: &mut dyn NavigationHost,
        data: &CourseData,
        direction: i32,
    ) -> Result<NavOutcome, NavigationError> {
        if self.is_busy() {
            return Err(NavigationError::Busy);
        }
        match self.neighbour(data, direction) {
            Some(target) => self.request_page(host, data, target, direction),
            None => {
                log::info!(
                    "already at the {} of the course; staying on module {}, page {}",
                    if direction > 0 { "end" } else { "start" },
                    self.position.module,
                    self.position.page
                );
                Ok(NavOutcome::Stayed)
            }
        }
    }

    /// Load `target`, sliding in from the right when `direction > 0` and from
    /// the left otherwise.
    pub fn request_page(
        &mut self,
        host: &mut dyn NavigationHost,
        data: &CourseData,
        target: Position,
        direction: i32,
    ) -> Result<NavOutcome, NavigationError> {
        let phone = host.is_phone_layout();
        let slot = if phone {
            PaneSlot::Current
        } else if direction > 0 {
            PaneSlot::Next
        } else {
            PaneSlot::Previous
        };
        self.begin_load(host, data, target, slot, direction, !phone)
    }

    /// Load `target` straight into the visible pane, without a slide.
    pub fn request_in_place(
        &mut self,
        host: &mut dyn NavigationHost,
        data: &CourseData,
        target: Position,
    ) -> Result<NavOutcome, NavigationError> {
        self.begin_load(host, data, target, PaneSlot::Current, 0, false)
    }

    fn begin_load(
        &mut self,
        host: &mut dyn NavigationHost,
        data: &CourseData,
        target: Position,
        slot: PaneSlot,
        direction: i32,
        slide: bool,
    ) -> Result<NavOutcome, NavigationError> {
        if self.is_busy() {
            return Err(NavigationError::Busy);
        }
        let Some(url) = data.page_url(target.module, target.page) else {
            return Err(NavigationError::NoSuchPage {
                module: target.module,
                page: target.page,
            });
        };
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.phase = NavPhase::Loading {
            ticket,
            target,
            slot,
            direction,
            slide,
        };
        log::debug!(
            "loading module {} page {} ({url}) into {slot:?}",
            target.module,
            target.page
        );
        host.fetch_fragment(ticket, url, slot);
        Ok(NavOutcome::Loading { ticket, target })
    }

    /// Host callback: the fetch for `ticket` finished. `result` is `Err`
    /// with a reason when the fragment could not be loaded.
    pub fn on_fragment_loaded(
        &mut self,
        host: &mut dyn NavigationHost,
        ticket: FetchTicket,
        result: Result<(), String>,
    ) -> LoadResult {
        let NavPhase::Loading {
            ticket: expected,
            target,
            slot,
            direction,
            slide,
        } = self.phase
        else {
            log::debug!("fragment result {ticket:?} ignored: not loading");
            return LoadResult::Ignored;
        };
        if ticket != expected {
            log::debug!("stale fragment result {ticket:?} ignored");
            return LoadResult::Ignored;
        }

        if let Err(reason) = result {
            log::error!(
                "load error for module {} page {}: {reason}",
                target.module,
                target.page
            );
            host.show_load_error(slot, &self.load_error_message);
            self.phase = NavPhase::Idle;
            return LoadResult::Failed;
        }

        if !slide {
            self.arrive(target);
            return LoadResult::Arrived(target);
        }

        let to_left = if direction > 0 {
            self.origin_left - self.width
        } else {
            self.origin_left + self.width
        };
        host.slide_row(to_left, self.slide_duration_ms);
        self.phase = NavPhase::Transitioning { target, slot };
        LoadResult::Sliding
    }

    /// Host callback: the row slide finished. Swaps the loaded pane into view
    /// and returns the new position.
    pub fn on_transition_complete(&mut self, host: &mut dyn NavigationHost) -> Option<Position> {
        let NavPhase::Transitioning { target, slot } = self.phase else {
            log::debug!("row transition end ignored: not transitioning");
            return None;
        };
        host.promote_pane(slot);
        host.reset_row(self.origin_left);
        self.arrive(target);
        Some(target)
    }

    fn arrive(&mut self, target: Position) {
        self.position = target;
        self.phase = NavPhase::Idle;
        self.visited.insert(target);
    }

    pub fn indicator(&self, data: &CourseData) -> PageIndicator {
        PageIndicator {
            module: self.position.module,
            page: self.position.page,
            module_count: data.module_count(),
            page_count: data.page_count(self.position.module),
        }
    }

    /// Window resize: coalesce into one animation-frame callback.
    pub fn request_resize(&mut self, host: &mut dyn NavigationHost) {
        if self.frame_requested {
            return;
        }
        self.frame_requested = true;
        host.request_animation_frame();
    }

    /// Animation-frame callback: re-measure the viewport width.
    pub fn on_animation_frame(&mut self, host: &dyn NavigationHost) {
        if !self.frame_requested {
            return;
        }
        self.frame_requested = false;
        self.width = host.viewport_width();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(pages: &[usize]) -> CourseData {
        let modules = pages
            .iter()
            .enumerate()
            .map(|(m, n)| {
                let pages: Vec<_> = (0..*n)
                    .map(|p| serde_json::json!({ "id": format!("m{m}p{p}"), "url": format!("m{m}/p{p}.html") }))
                    .collect();
                serde_json::json!({ "title": format!("M{m}"), "pages": pages })
            })
            .collect::<Vec<_>>();
        serde_json::from_value(serde_json::json!({ "modules": modules })).unwrap()
    }

    fn nav_at(boundary: BoundaryPolicy, pos: Position) -> Navigator {
        let cfg = CourseConfig {
            boundary,
            ..Default::default()
        };
        let mut n = Navigator::new(&cfg);
        n.position = pos;
        n
    }

    #[test]
    fn rollover_uses_real_page_counts() {
        let data = course(&[2, 0, 3]);
        let n = nav_at(BoundaryPolicy::Stay, Position::new(0, 1));
        assert_eq!(n.neighbour(&data, 1), Some(Position::new(2, 0)));
        let n = nav_at(BoundaryPolicy::Stay, Position::new(2, 0));
        assert_eq!(n.neighbour(&data, -1), Some(Position::new(0, 1)));
        let n = nav_at(BoundaryPolicy::Stay, Position::new(2, 1));
        assert_eq!(n.neighbour(&data, -1), Some(Position::new(2, 0)));
    }

    #[test]
    fn boundaries_stay_or_wrap() {
        let data = course(&[2, 3]);
        let last = Position::new(1, 2);
        let first = Position::new(0, 0);
        assert_eq!(nav_at(BoundaryPolicy::Stay, last).neighbour(&data, 1), None);
        assert_eq!(nav_at(BoundaryPolicy::Stay, first).neighbour(&data, -1), None);
        assert_eq!(nav_at(BoundaryPolicy::Wrap, last).neighbour(&data, 1), Some(first));
        assert_eq!(nav_at(BoundaryPolicy::Wrap, first).neighbour(&data, -1), Some(last));
    }

    #[test]
    fn empty_course_has_no_neighbours() {
        let data = course(&[]);
        let n = nav_at(BoundaryPolicy::Wrap, Position::default());
        assert_eq!(n.neighbour(&data, 1), None);
        assert_eq!(n.neighbour(&data, -1), None);
    }
}
