//! Error types for course loading and navigation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    /// A fetch or slide is still in flight.
    #[error("navigation already in progress")]
    Busy,

    #[error("no page at module {module}, page {page}")]
    NoSuchPage { module: usize, page: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("invalid course data: {0}")]
    InvalidCourse(String),

    #[error("invalid preload manifest: {0}")]
    InvalidManifest(String),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}
