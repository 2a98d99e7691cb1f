use log::{debug, info, warn};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::aggregator::{Candidate, Pager};
use crate::delay_manager::{Delays, Pause};
use crate::error::{Result, ScrapeError};
use crate::fragment::{FragmentSource, Locator};
use crate::session::StoredCookie;

const EXPERIENCE_ITEM: &str =
    "main section > div:nth-of-type(2) > div > div:nth-of-type(1) > ul > li";
const CONTACT_SECTION: &str = "section > div > section";
const LOAD_MORE_BUTTON: &str = "button.scaffold-finite-scroll__load-button";

/// CSS for a locator on the page it belongs to. These follow LinkedIn's
/// current markup and are expected to need updates when it changes.
pub fn selector_for(locator: Locator) -> String {
    match locator {
        Locator::Name => "span > a > h1".to_string(),
        Locator::Title => "section div.text-body-medium".to_string(),
        Locator::Location => "span.text-body-small.inline".to_string(),
        Locator::About => "#about ~ div .inline-show-more-text span[aria-hidden=\"true\"]".to_string(),

        Locator::ContactHeading(n) => format!("{CONTACT_SECTION}:nth-of-type({n}) > h3"),
        Locator::ContactLink(n) => format!("{CONTACT_SECTION}:nth-of-type({n}) > div > a"),
        Locator::ContactText(n) => format!("{CONTACT_SECTION}:nth-of-type({n}) > div > span"),
        Locator::ContactListItem(n) => {
            format!("{CONTACT_SECTION}:nth-of-type({n}) > ul > li > span:nth-of-type(1)")
        }

        Locator::Institute(n) => format!(
            "li:nth-of-type({n}) > div > div > div:nth-of-type(2) > div:nth-of-type(1) > a > div > div > div > div > span:nth-of-type(1)"
        ),
        Locator::Qualification(n) => format!(
            "li:nth-of-type({n}) > div > div > div:nth-of-type(2) > div:nth-of-type(1) > a > span > span"
        ),

        Locator::Role(n) => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({n}) > div > div > div:nth-of-type(2) > div > a > div > div > div > div > span:nth-of-type(1)"
        ),
        Locator::Company(n) => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({n}) > div > div > div:nth-of-type(2) > div > a > span:nth-of-type(1) > span:nth-of-type(1)"
        ),
        Locator::Period(n) => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({n}) > div > div > div:nth-of-type(2) > div > a > span:nth-of-type(2) > span:nth-of-type(1)"
        ),
        Locator::Skills(n) => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({n}) > div > div > div:nth-of-type(2) > div:nth-of-type(2) > ul > li:nth-of-type(2) > div > ul > li > div > div > div > span"
        ),
        Locator::GroupCompany(n) => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({n}) > div > div > div:nth-of-type(2) > div:nth-of-type(1) > a > div > div > div > div > span:nth-of-type(1)"
        ),
        Locator::GroupPeriod(n) => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({n}) > div > div > div:nth-of-type(2) > div:nth-of-type(1) > a > span > span:nth-of-type(1)"
        ),
        Locator::NestedSkills { slot, sub } => format!(
            "{EXPERIENCE_ITEM}:nth-of-type({slot}) > div > div > div:nth-of-type(2) > div:nth-of-type(2) > ul > li > div > div > div:nth-of-type(1) > ul > li:nth-of-type({sub}) > div > div > div:nth-of-type(2) > div:nth-of-type(2) > ul > li:nth-of-type(2) > div > ul > li > div > div > div > span:nth-of-type(1)"
        ),
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Text of the first element matching `css`. Blank text counts as absent.
pub fn first_text(document: &Html, css: &str) -> Result<Option<String>> {
    let selector = parse_selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .map(collapsed_text)
        .filter(|t| !t.is_empty()))
}

pub fn first_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>> {
    let selector = parse_selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string))
}

/// The people cards on one results page, in id order.
pub fn parse_cards(document: &Html, base: &Url) -> Result<Vec<Candidate>> {
    let mut cards = Vec::new();
    for position in 0.. {
        let css = format!("#org-people-profile-card__profile-image-{position}");
        let selector = parse_selector(&css)?;
        let Some(card) = document.select(&selector).next() else {
            break;
        };
        let link = card
            .value()
            .attr("href")
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string());
        cards.push(Candidate { link });
    }
    Ok(cards)
}

/// Result list of a people search, grown page by page.
#[derive(Default)]
struct ResultsView {
    url: String,
    page: usize,
    cards: Vec<Candidate>,
    has_more: bool,
}

/// A logged-in HTTP session that holds one current page at a time.
pub struct PageSession {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    delays: Delays,
    current: Option<Html>,
    current_raw: String,
    current_url: String,
    results: ResultsView,
}

impl PageSession {
    pub fn new(base_url: &str, delays: Delays) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ScrapeError::Config(format!("base_url: {}", e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .build()?;

        Ok(PageSession {
            client,
            jar,
            base_url,
            delays,
            current: None,
            current_raw: String::new(),
            current_url: String::new(),
            results: ResultsView::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn delays(&self) -> &Delays {
        &self.delays
    }

    fn get_random_user_agent(&self) -> &'static str {
        let uas = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];
        let mut rng = rand::thread_rng();
        uas[rng.gen_range(0..uas.len())]
    }

    fn absolute(&self, target: &str) -> Result<Url> {
        self.base_url
            .join(target)
            .map_err(|e| ScrapeError::Config(format!("bad target {}: {}", target, e)))
    }

    fn fetch(&self, target: &str) -> Result<String> {
        let url = self.absolute(target)?;
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.get_random_user_agent())
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Navigation {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text()?)
    }

    /// Puts saved cookies back into the jar.
    pub fn restore(&self, cookies: &[StoredCookie]) {
        for cookie in cookies {
            self.jar.add_cookie_str(&cookie.to_set_cookie(), &self.base_url);
        }
        info!("Restored {} cookies into the session", cookies.len());
    }

    /// Cookies the jar would send to the site right now.
    pub fn cookies(&self) -> Vec<StoredCookie> {
        let domain = self.base_url.host_str().unwrap_or_default().to_string();
        let Some(header) = self.jar.cookies(&self.base_url) else {
            return Vec::new();
        };
        let Ok(header) = header.to_str() else {
            return Vec::new();
        };
        header
            .split(';')
            .filter_map(|pair| StoredCookie::from_set_cookie(pair.trim(), &domain))
            .collect()
    }

    /// Submits the sign-in form with the given credentials.
    pub fn login(&mut self, email: &str, password: &str) -> Result<()> {
        if email.is_empty() || password.is_empty() {
            return Err(ScrapeError::Login("no credentials configured".into()));
        }
        info!("Logging in as {}", email);
        self.navigate("/login")?;
        self.delays.wait(Pause::LoginPage);

        let csrf = self
            .current
            .as_ref()
            .map(|doc| first_attr(doc, "input[name=\"loginCsrfParam\"]", "value"))
            .transpose()?
            .flatten()
            .ok_or_else(|| ScrapeError::Login("login form not found".into()))?;

        let url = self.absolute("/checkpoint/lg/login-submit")?;
        let resp = self
            .client
            .post(url)
            .header(USER_AGENT, self.get_random_user_agent())
            .form(&[
                ("session_key", email),
                ("session_password", password),
                ("loginCsrfParam", csrf.as_str()),
            ])
            .send()?;

        let landed = resp.url().path().to_string();
        if landed.contains("checkpoint/challenge") {
            warn!("Security check requested, waiting before continuing");
            self.delays.wait(Pause::SecurityCheck);
        }
        if !self.cookies().iter().any(|c| c.name == "li_at") {
            return Err(ScrapeError::Login(format!("no session cookie after sign-in (landed on {})", landed)));
        }
        info!("Logged in");
        Ok(())
    }

    /// Markup of the page last opened with `navigate`.
    pub fn current_html(&self) -> Option<String> {
        self.current.as_ref().map(|_| self.current_raw.clone())
    }

    /// Opens a people search and reads its first page of cards.
    pub fn open_results(&mut self, target: &str) -> Result<()> {
        let html = self.fetch(target)?;
        let document = Html::parse_document(&html);
        let cards = parse_cards(&document, &self.base_url)?;
        info!("Results page 1 shows {} people", cards.len());
        self.results = ResultsView {
            url: self.absolute(target)?.to_string(),
            page: 1,
            has_more: first_attr(&document, LOAD_MORE_BUTTON, "class")?.is_some(),
            cards,
        };
        Ok(())
    }
}

impl FragmentSource for PageSession {
    fn navigate(&mut self, target: &str) -> Result<()> {
        info!("Visiting: {}", target);
        let html = self.fetch(target)?;
        self.current = Some(Html::parse_document(&html));
        self.current_raw = html;
        self.current_url = target.to_string();
        Ok(())
    }

    fn text(&mut self, locator: Locator) -> Result<Option<String>> {
        let Some(doc) = &self.current else {
            return Ok(None);
        };
        let found = first_text(doc, &selector_for(locator))?;
        if found.is_none() {
            debug!("{:?} not found on {}", locator, self.current_url);
        }
        Ok(found)
    }
}

impl Pager for PageSession {
    fn candidate_at(&mut self, position: usize) -> Result<Option<Candidate>> {
        Ok(self.results.cards.get(position).cloned())
    }

    fn load_more(&mut self) -> Result<bool> {
        if !self.results.has_more {
            return Ok(false);
        }
        let mut next = Url::parse(&self.results.url)
            .map_err(|e| ScrapeError::Config(format!("results url: {}", e)))?;
        let page = self.results.page + 1;
        let kept: Vec<(String, String)> = next
            .query_pairs()
            .filter(|(k, _)| k != "page")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        next.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("page", &page.to_string());

        let html = self.fetch(next.as_str())?;
        let document = Html::parse_document(&html);
        let cards = parse_cards(&document, &self.base_url)?;
        info!("Results page {} shows {} more people", page, cards.len());

        self.results.page = page;
        self.results.has_more = first_attr(&document, LOAD_MORE_BUTTON, "class")?.is_some();
        if cards.is_empty() {
            self.results.has_more = false;
            return Ok(false);
        }
        self.results.cards.extend(cards);
        Ok(true)
    }
}
