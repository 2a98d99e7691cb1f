use thiserror::Error;

/// Everything that can go wrong while collecting or exporting profiles.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Profile count {0} is out of range, it must be between 1 and 100")]
    InvalidCount(u32),
    #[error("Invalid selector '{0}'")]
    Selector(String),
    #[error("Navigation to {target} failed with status {status}")]
    Navigation { target: String, status: u16 },
    /// A required field was not present on the page. Only the profile being
    /// processed is lost.
    #[error("Missing required field '{field}' for {profile} during {step}")]
    MissingField {
        profile: String,
        step: &'static str,
        field: &'static str,
    },
    #[error("No company found for '{0}'")]
    CompanyNotFound(String),
    #[error("Summarizer failed: {0}")]
    Summarizer(String),
    #[error("Login failed: {0}")]
    Login(String),
}

impl ScrapeError {
    /// True when the error only invalidates the current profile and the batch
    /// may carry on with the next one.
    pub fn is_profile_fatal(&self) -> bool {
        matches!(self, ScrapeError::MissingField { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
