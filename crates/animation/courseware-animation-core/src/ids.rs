//! Identifiers and simple allocators for engine entities.

use serde::{Deserialize, Serialize};

/// Opaque handle for a document element, issued by the host.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ElementId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TimerId(pub u32);

/// Identifies one typewriter reveal in flight.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SpriteId(pub u32);

/// Monotonic allocator for TimerId, RunId and SpriteId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_timer: u32,
    next_run: u32,
    next_sprite: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_timer(&mut self) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer = self.next_timer.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_run(&mut self) -> RunId {
        let id = RunId(self.next_run);
        self.next_run = self.next_run.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_sprite(&mut self) -> SpriteId {
        let id = SpriteId(self.next_sprite);
        self.next_sprite = self.next_sprite.wrapping_add(1);
        id
    }
}
