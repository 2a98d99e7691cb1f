use log::{debug, info, warn};
use std::collections::HashSet;
use url::Url;

use crate::delay_manager::{Delays, Pause};
use crate::error::Result;

/// "Load more" attempts in a row that may leave the next position empty
/// before we give up on the result list.
const MAX_STALLED_LOADS: usize = 3;

/// A result card. Cards of people outside the viewer's network carry no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub link: Option<String>,
}

/// A result list that is revealed a page at a time.
pub trait Pager {
    /// `Ok(None)` when nothing is displayed at `position` yet.
    fn candidate_at(&mut self, position: usize) -> Result<Option<Candidate>>;

    /// Asks for more results. `Ok(false)` when there are none.
    fn load_more(&mut self) -> Result<bool>;
}

/// Profile identity is the URL without query string or fragment.
pub fn canonical_link(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw
            .trim()
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Gathers up to `cap` distinct profile links in the order they are shown.
/// A failing pager ends the walk early and the links found so far are kept.
pub fn collect<P: Pager + ?Sized>(cap: usize, pager: &mut P, delays: &Delays) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut position = 0;
    let mut stalled = 0;

    while links.len() < cap {
        let shown = match pager.candidate_at(position) {
            Ok(shown) => shown,
            Err(e) => {
                warn!("Could not read result {}: {}", position, e);
                break;
            }
        };
        match shown {
            Some(candidate) => {
                position += 1;
                stalled = 0;
                let Some(raw) = candidate.link else {
                    debug!("Result {} has no profile link, skipping", position - 1);
                    continue;
                };
                let link = canonical_link(&raw);
                if seen.insert(link.clone()) {
                    links.push(link);
                    info!("Collected {} / {}: {}", links.len(), cap, raw);
                } else {
                    debug!("Duplicate result {}", link);
                }
            }
            None => {
                if stalled >= MAX_STALLED_LOADS {
                    warn!("Result list stopped growing at position {}", position);
                    break;
                }
                delays.wait(Pause::LoadMore);
                match pager.load_more() {
                    Ok(true) => stalled += 1,
                    Ok(false) => {
                        info!("No more results after {} profiles", links.len());
                        break;
                    }
                    Err(e) => {
                        warn!("Could not load more results: {}", e);
                        break;
                    }
                }
            }
        }
    }
    links
}
