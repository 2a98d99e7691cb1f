use log::info;
use rand::Rng;
use serde::Deserialize;
use std::thread;
use std::time::Duration;

/// The points in a run where we slow down to look less like a bot. Every
/// pause comes right before a request to the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    LoginPage,
    SecurityCheck,
    Search,
    SearchResults,
    PeoplePage,
    SearchQuery,
    LoadMore,
    Profile,
    Education,
    Experience,
}

/// Base wait in seconds for each pause, plus up to `jitter` random seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Delays {
    pub enabled: bool,
    pub jitter: u64,
    pub login_page: u64,
    pub security_check: u64,
    pub search: u64,
    pub search_results: u64,
    pub people_page: u64,
    pub search_query: u64,
    pub load_more: u64,
    pub profile: u64,
    pub education: u64,
    pub experience: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Delays {
            enabled: true,
            jitter: 2,
            login_page: 3,
            security_check: 20,
            search: 3,
            search_results: 3,
            people_page: 3,
            search_query: 3,
            load_more: 2,
            profile: 4,
            education: 3,
            experience: 3,
        }
    }
}

impl Delays {
    pub fn disabled() -> Self {
        Delays {
            enabled: false,
            ..Delays::default()
        }
    }

    fn base_secs(&self, pause: Pause) -> u64 {
        match pause {
            Pause::LoginPage => self.login_page,
            Pause::SecurityCheck => self.security_check,
            Pause::Search => self.search,
            Pause::SearchResults => self.search_results,
            Pause::PeoplePage => self.people_page,
            Pause::SearchQuery => self.search_query,
            Pause::LoadMore => self.load_more,
            Pause::Profile => self.profile,
            Pause::Education => self.education,
            Pause::Experience => self.experience,
        }
    }

    /// Seconds `wait` would sleep for, or `None` when pacing is off.
    pub fn pick(&self, pause: Pause) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        let mut rng = rand::thread_rng();
        Some(self.base_secs(pause) + rng.gen_range(0..=self.jitter))
    }

    pub fn wait(&self, pause: Pause) {
        if let Some(delay_secs) = self.pick(pause) {
            if delay_secs == 0 {
                return;
            }
            info!("Waiting for {} seconds ({:?} delay)...", delay_secs, pause);
            thread::sleep(Duration::from_secs(delay_secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_never_sleeps() {
        let delays = Delays::disabled();
        assert_eq!(delays.pick(Pause::SecurityCheck), None);
    }

    #[test]
    fn test_pick_stays_within_jitter() {
        let delays = Delays::default();
        for _ in 0..50 {
            let secs = delays.pick(Pause::Profile).unwrap();
            assert!((4..=6).contains(&secs));
        }
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let delays: Delays = toml::from_str("profile = 9\njitter = 0").unwrap();
        assert_eq!(delays.pick(Pause::Profile), Some(9));
        assert_eq!(delays.pick(Pause::Education), Some(3));
    }
}
