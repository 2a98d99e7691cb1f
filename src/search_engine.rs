use log::{info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::aggregator::canonical_link;
use crate::delay_manager::Pause;
use crate::error::{Result, ScrapeError};
use crate::fragment::FragmentSource;
use crate::page_session::PageSession;

/// Finds a company's people page and filters it by keyword.
pub struct SearchEngine;

/// First company link among the search results.
pub fn pick_company_link(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    // Result titles sit in nested spans; fall back to any company link.
    let selectors = ["div span span a", "a[href*=\"/company/\"]"];

    for sel_str in selectors {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(url) = base.join(href) else {
                continue;
            };
            if url.domain() == base.domain() && url.path().starts_with("/company/") {
                info!("Found company page using selector '{}': {}", sel_str, url);
                return Some(canonical_link(url.as_str()));
            }
        }
    }
    warn!("No company link found in the search results.");
    None
}

/// "https://www.linkedin.com/company/acme/" + "rust" ->
/// "https://www.linkedin.com/company/acme/people/?keywords=rust"
pub fn people_url(company_url: &str, query: &str) -> String {
    format!(
        "{}/people/?keywords={}",
        company_url.trim_end_matches('/'),
        urlencoding::encode(query.trim())
    )
}

impl SearchEngine {
    pub fn new() -> Self {
        SearchEngine
    }

    pub fn search_company(&self, session: &mut PageSession, company: &str) -> Result<Option<String>> {
        let target = format!(
            "/search/results/companies/?keywords={}",
            urlencoding::encode(company.trim())
        );
        info!("Searching for company: '{}'", company);
        session.delays().wait(Pause::Search);
        session.navigate(&target)?;
        session.delays().wait(Pause::SearchResults);

        let html = session.current_html().unwrap_or_default();
        Ok(pick_company_link(&html, session.base_url()))
    }

    /// Leaves `session` on the filtered people list, ready for paging.
    pub fn open_people(&self, session: &mut PageSession, company: &str, query: &str) -> Result<()> {
        let company_url = self
            .search_company(session, company)?
            .ok_or_else(|| ScrapeError::CompanyNotFound(company.to_string()))?;

        session.delays().wait(Pause::PeoplePage);
        let target = people_url(&company_url, query);
        info!("Filtering people by '{}': {}", query, target);
        session.delays().wait(Pause::SearchQuery);
        session.open_results(&target)
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}
