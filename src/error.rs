use thiserror::Error;

/// Errors surfaced by the synthesis engine and its input adapters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// Every voice slot is sounding and none is releasing, so nothing can be stolen.
    #[error("all {max} voices are busy and none is releasing")]
    VoicesExhausted { max: usize },

    /// A note name such as `C#4` could not be parsed.
    #[error("invalid note name '{0}'")]
    InvalidNoteName(String),
}

pub type Result<T> = std::result::Result<T, SynthError>;
