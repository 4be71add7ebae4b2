//! Courseware Course Core (host-agnostic)
//!
//! Course data loaded from JSON, the page navigation state machine, the
//! sound bank and the [`Course`] controller that ties them to the animation
//! engine from `courseware-animation-core`. [`Preloader`] warms the asset
//! cache from a manifest before the first page is shown.

pub mod config;
pub mod course;
pub mod data;
pub mod error;
pub mod navigation;
pub mod preload;
pub mod sound;

pub use config::{BoundaryPolicy, CourseConfig};
pub use course::{Course, CourseHost, PageContext};
pub use data::{CourseData, ModuleData, PageData, QuizData};
pub use error::{CourseError, NavigationError};
pub use navigation::{
    FetchTicket, LoadResult, NavOutcome, NavPhase, NavigationHost, Navigator, PageIndicator, PaneSlot,
    Position,
};
pub use preload::{
    AssetKind, LoadTicket, PreloadHost, PreloadItem, PreloadManifest, PreloadProgress, PreloadTask,
    Preloader,
};
pub use sound::{AudioBackend, NullAudio, SoundBank};
