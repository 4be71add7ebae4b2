//! Error types for the animation engine

/// Failures surfaced by the step parser and the engine's fallible helpers.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    /// The declarative attribute is not valid JSON after normalization.
    #[error("invalid data-animation JSON `{raw}`: {reason}")]
    InvalidJson { raw: String, reason: String },

    /// The attribute parsed, but to something other than an object or array.
    #[error("data-animation must be an object or an array, got `{raw}`")]
    UnexpectedShape { raw: String },

    /// Legacy `left|top|opacity` form with a non-numeric field.
    #[error("invalid legacy animation field `{field}` in `{raw}`")]
    InvalidLegacyField { raw: String, field: String },

    /// Sprite options that cannot describe any frame.
    #[error("invalid sprite sheet: {reason}")]
    InvalidSprite { reason: String },

    #[error("no sprite with id {0}")]
    UnknownSprite(u32),
}

/// Failures reported by a sound collaborator. The engine never propagates
/// these; they are logged at debug level and dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SoundError {
    #[error("playback rejected for {name}: {reason}")]
    Playback { name: String, reason: String },
}
