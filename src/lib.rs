pub mod aggregator;
pub mod competency;
pub mod config;
pub mod delay_manager;
pub mod duration;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fragment;
pub mod logger;
pub mod page_session;
pub mod profile;
pub mod search_engine;
pub mod session;

// Exporting types for convenience
pub use aggregator::{collect, Candidate, Pager};
pub use competency::{GeminiSummarizer, NoopSummarizer, Summarizer};
pub use config::{Overrides, RunConfig};
pub use duration::{format_duration, parse_duration, sum_durations, DurationSpan};
pub use error::{Result, ScrapeError};
pub use extractor::Extractor;
pub use fragment::{FragmentSource, Locator};
pub use page_session::PageSession;
pub use profile::{ContactInfo, EducationEntry, ExperienceEntry, Profile};
pub use search_engine::SearchEngine;
pub use session::SessionStore;
