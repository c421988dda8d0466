/// Error types shared by the three contexts
use thiserror::Error;

/// A failure reported by one of the browser collaborators
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    #[error("storage request failed: {0}")]
    Storage(String),

    #[error("history search failed: {0}")]
    History(String),

    #[error("message delivery failed: {0}")]
    Messaging(String),

    #[error("could not decode {what}: {detail}")]
    Decode { what: &'static str, detail: String },

    #[error("could not encode {what}: {detail}")]
    Encode { what: &'static str, detail: String },
}

/// Why an action in the settings popup did not go through.
///
/// The `Display` text is what the popup shows in its status line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid start date format")]
    InvalidStart,

    #[error("Invalid end date format")]
    InvalidEnd,

    #[error("Start date must be before end date")]
    StartAfterEnd,

    #[error("Failed to fetch history")]
    FetchFailed,

    #[error("Could not save settings: {0}")]
    SaveFailed(PlatformError),
}
