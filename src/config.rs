use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::delay_manager::Delays;
use crate::error::{Result, ScrapeError};

pub const MAX_PROFILES: u32 = 100;

/// Settings for one run. Built once in `main` and only read afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub company: String,
    pub search_query: String,
    pub profile_count: u32,
    pub email: String,
    pub password: String,
    pub api_key: String,
    pub model: String,
    pub cookie_file: PathBuf,
    pub output_dir: PathBuf,
    pub base_url: String,
    pub delays: Delays,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            company: String::new(),
            search_query: String::new(),
            profile_count: 2,
            email: String::new(),
            password: String::new(),
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            cookie_file: PathBuf::from("cookies.json"),
            output_dir: PathBuf::from("."),
            base_url: "https://www.linkedin.com".to_string(),
            delays: Delays::default(),
        }
    }
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub company: Option<String>,
    pub search_query: Option<String>,
    pub profile_count: Option<u32>,
    pub cookie_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub no_delay: bool,
}

impl RunConfig {
    /// Defaults, then the TOML file (when it exists), then environment, then
    /// command line. The result is validated.
    pub fn load(path: &Path, overrides: &Overrides) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let text = fs::read_to_string(path)?;
            Self::from_toml(&text)?
        } else {
            info!("No configuration file at {}, using defaults", path.display());
            RunConfig::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    /// Credentials usually live in the environment (or a `.env` file).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |slot: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        };
        set(&mut self.email, "LINKEDIN_EMAIL");
        set(&mut self.password, "LINKEDIN_PASSWORD");
        set(&mut self.api_key, "GEMINI_API_KEY");
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(company) = &overrides.company {
            self.company = company.clone();
        }
        if let Some(query) = &overrides.search_query {
            self.search_query = query.clone();
        }
        if let Some(count) = overrides.profile_count {
            self.profile_count = count;
        }
        if let Some(cookie_file) = &overrides.cookie_file {
            self.cookie_file = cookie_file.clone();
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.output_dir = output_dir.clone();
        }
        if overrides.no_delay {
            self.delays.enabled = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(ScrapeError::Config("company must not be empty".into()));
        }
        if self.search_query.trim().is_empty() {
            return Err(ScrapeError::Config("search_query must not be empty".into()));
        }
        if self.profile_count < 1 || self.profile_count > MAX_PROFILES {
            return Err(ScrapeError::InvalidCount(self.profile_count));
        }
        Ok(())
    }
}
