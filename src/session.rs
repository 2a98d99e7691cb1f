use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::error::Result;

/// One browser cookie as kept between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
}

fn root_path() -> String {
    "/".to_string()
}

impl StoredCookie {
    /// Parses the first part of a `Set-Cookie` header ("name=value; Domain=..").
    pub fn from_set_cookie(header: &str, default_domain: &str) -> Option<Self> {
        let mut parts = header.split(';').map(str::trim);
        let (name, value) = parts.next()?.split_once('=')?;
        if name.is_empty() {
            return None;
        }
        let mut cookie = StoredCookie {
            name: name.to_string(),
            value: value.trim_matches('"').to_string(),
            domain: default_domain.to_string(),
            path: root_path(),
        };
        for attr in parts {
            if let Some((key, val)) = attr.split_once('=') {
                match key.trim().to_ascii_lowercase().as_str() {
                    "domain" => cookie.domain = val.trim().to_string(),
                    "path" => cookie.path = val.trim().to_string(),
                    _ => {}
                }
            }
        }
        Some(cookie)
    }

    /// Back into a `Set-Cookie` string for a cookie jar.
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if !self.domain.is_empty() {
            header.push_str(&format!("; Domain={}", self.domain));
        }
        header
    }
}

/// The cookie file. When it exists the interactive login is skipped.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Saved cookies, or `None` when there is no usable file.
    pub fn load(&self) -> Option<Vec<StoredCookie>> {
        if !self.exists() {
            info!("No cookie file found at {}.", self.path.display());
            return None;
        }
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open cookie file: {}", e);
                return None;
            }
        };
        let mut content = String::new();
        if let Err(e) = file.read_to_string(&mut content) {
            error!("Failed to read cookie file: {}", e);
            return None;
        }
        match serde_json::from_str::<Vec<StoredCookie>>(&content) {
            Ok(cookies) => {
                info!("Loaded {} cookies from {}", cookies.len(), self.path.display());
                Some(cookies)
            }
            Err(e) => {
                error!("Failed to parse cookie file: {}. Logging in again.", e);
                None
            }
        }
    }

    pub fn save(&self, cookies: &[StoredCookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(cookies)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(json.as_bytes())?;
        info!("Saved {} cookies to {}", cookies.len(), self.path.display());
        Ok(())
    }
}
