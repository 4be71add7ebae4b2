//! Courseware Animation Core (host-agnostic)
//!
//! Declarative per-element animation engine for the course player. Authored
//! content attaches a JSON step list to an element (`data-animation`); the
//! setup pass resolves every step against the element's pane, and
//! `Engine::play_animation` walks the steps one call at a time, driving CSS
//! transitions through an [`AnimationHost`] and guarding every asynchronous
//! completion with a per-element run token. Sprite sheets step through their
//! frames on the same host-driven clock.

pub mod a11y;
pub mod anchor;
pub mod attrs;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hooks;
pub mod host;
pub mod ids;
pub mod parse;
pub mod sprite;
pub mod state;
pub mod step;
pub mod timers;
pub mod transform;
pub mod typewriter;

// Re-exports for consumers (adapters)
pub use anchor::{Anchor, HorizontalAnchor, VerticalAnchor};
pub use config::{Config, CursorMode};
pub use engine::{Engine, PlayOutcome, SkipReason};
pub use error::{AnimationError, SoundError};
pub use geometry::{PaneGeometry, Rect};
pub use hooks::{CallbackRegistry, HookContext, PlayRequest};
pub use host::{AnimationHost, Silence, SoundSink, Target};
pub use ids::{ElementId, RunId, SpriteId, TimerId};
pub use parse::{parse_step_list, try_parse_step_list};
pub use sprite::{SpriteConfig, SpriteEvent, SpriteSheet};
pub use step::{AnimationStep, StyleSet, StyleToken};
pub use transform::{compose_transform, current_translate, Transform2D};
pub use typewriter::TypewriterTiming;
