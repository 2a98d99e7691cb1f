use log::{debug, error, info, warn};

use crate::aggregator::canonical_link;
use crate::competency::Summarizer;
use crate::delay_manager::{Delays, Pause};
use crate::duration::{parse_duration, sum_durations, DurationSpan};
use crate::error::{Result, ScrapeError};
use crate::fragment::{positional, FragmentSource, Locator};
use crate::profile::{ContactInfo, EducationEntry, ExperienceEntry, Profile};

/// Roles listed under one employer that we look at for skills.
const MAX_NESTED_ROLES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub name: String,
    pub title: String,
    pub location: String,
    pub about: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExperienceSummary {
    pub entries: Vec<ExperienceEntry>,
    pub total: DurationSpan,
}

/// Turns the pages of one profile into a `Profile` record.
pub struct Extractor {
    delays: Delays,
}

fn contact_page(link: &str) -> String {
    format!("{}/overlay/contact-info", link.trim_end_matches('/'))
}

fn education_page(link: &str) -> String {
    format!("{}/details/education", link.trim_end_matches('/'))
}

fn experience_page(link: &str) -> String {
    format!("{}/details/experience", link.trim_end_matches('/'))
}

/// "Acme Corp · Full-time" -> "Acme Corp"
fn company_name(text: &str) -> String {
    text.split('·').next().unwrap_or_default().trim().to_string()
}

/// "Skills: Rust · SQL · Docker" -> ["Rust", "SQL", "Docker"]
fn split_skills(text: &str) -> Vec<String> {
    let list = text.split_once(':').map(|(_, rest)| rest).unwrap_or(text);
    list.split('·')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn optional<S: FragmentSource + ?Sized>(source: &mut S, locator: Locator) -> Result<String> {
    let value = source.text(locator)?;
    if value.is_none() {
        debug!("{:?} not present, leaving it empty", locator);
    }
    Ok(value.unwrap_or_default())
}

impl Extractor {
    pub fn new(delays: Delays) -> Self {
        Extractor { delays }
    }

    pub fn extract_identity<S: FragmentSource + ?Sized>(
        &self,
        link: &str,
        source: &mut S,
    ) -> Result<Identity> {
        source.navigate(link)?;
        self.delays.wait(Pause::Profile);

        let name = source.text(Locator::Name)?.ok_or_else(|| ScrapeError::MissingField {
            profile: link.to_string(),
            step: "identity",
            field: "name",
        })?;
        Ok(Identity {
            name,
            title: optional(source, Locator::Title)?,
            location: optional(source, Locator::Location)?,
            about: optional(source, Locator::About)?,
        })
    }

    pub fn extract_contact_info<S: FragmentSource + ?Sized>(
        &self,
        link: &str,
        source: &mut S,
    ) -> Result<ContactInfo> {
        source.navigate(&contact_page(link))?;

        let sections = positional(1, |section| {
            let Some(heading) = source.text(Locator::ContactHeading(section))? else {
                return Ok(None);
            };
            let strategies = [
                Locator::ContactLink(section),
                Locator::ContactText(section),
                Locator::ContactListItem(section),
            ];
            let mut value = String::new();
            for locator in strategies {
                if let Some(text) = source.text(locator)? {
                    value = text;
                    break;
                }
            }
            Ok(Some((heading, value)))
        });
        sections.collect()
    }

    pub fn extract_education<S: FragmentSource + ?Sized>(
        &self,
        link: &str,
        source: &mut S,
    ) -> Result<Vec<EducationEntry>> {
        source.navigate(&education_page(link))?;
        self.delays.wait(Pause::Education);

        positional(1, |slot| {
            let Some(institute) = source.text(Locator::Institute(slot))? else {
                return Ok(None);
            };
            let qualification = optional(source, Locator::Qualification(slot))?;
            Ok(Some(EducationEntry { institute, qualification }))
        })
        .collect()
    }

    pub fn extract_experience<S: FragmentSource + ?Sized>(
        &self,
        link: &str,
        source: &mut S,
    ) -> Result<ExperienceSummary> {
        source.navigate(&experience_page(link))?;
        self.delays.wait(Pause::Experience);

        let entries: Vec<ExperienceEntry> =
            positional(1, |slot| self.experience_slot(source, slot)).collect::<Result<_>>()?;
        let total = sum_durations(entries.iter().map(|e| parse_duration(&e.period)));
        Ok(ExperienceSummary { entries, total })
    }

    fn experience_slot<S: FragmentSource + ?Sized>(
        &self,
        source: &mut S,
        slot: usize,
    ) -> Result<Option<ExperienceEntry>> {
        if let Some(entry) = self.single_role(source, slot)? {
            return Ok(Some(entry));
        }

        let Some(company) = source.text(Locator::GroupCompany(slot))? else {
            return Ok(None);
        };
        let Some(period) = source.text(Locator::GroupPeriod(slot))? else {
            return Ok(None);
        };
        let mut skills = Vec::new();
        for sub in 1..=MAX_NESTED_ROLES {
            if let Some(text) = source.text(Locator::NestedSkills { slot, sub })? {
                skills.extend(split_skills(&text));
            }
        }
        Ok(Some(ExperienceEntry {
            role: String::new(),
            company: company_name(&company),
            period: period.trim().to_string(),
            skills,
        }))
    }

    fn single_role<S: FragmentSource + ?Sized>(
        &self,
        source: &mut S,
        slot: usize,
    ) -> Result<Option<ExperienceEntry>> {
        let Some(role) = source.text(Locator::Role(slot))? else {
            return Ok(None);
        };
        let Some(company) = source.text(Locator::Company(slot))? else {
            return Ok(None);
        };
        let Some(period) = source.text(Locator::Period(slot))? else {
            return Ok(None);
        };
        let skills = source
            .text(Locator::Skills(slot))?
            .map(|t| split_skills(&t))
            .unwrap_or_default();
        Ok(Some(ExperienceEntry {
            role,
            company: company_name(&company),
            period: period.trim().to_string(),
            skills,
        }))
    }

    /// Runs every extraction step for one profile. Only a missing name (or a
    /// broken session) is an error; other steps fall back to empty values.
    pub fn assemble_profile<S: FragmentSource + ?Sized>(
        &self,
        link: &str,
        source: &mut S,
        summarizer: &dyn Summarizer,
    ) -> Result<Profile> {
        let link = canonical_link(link);
        let identity = self.extract_identity(&link, source)?;
        info!("Scraping started for profile: {}", identity.name);

        let contact_info = self
            .extract_contact_info(&link, source)
            .unwrap_or_else(|e| step_failed(&link, "contact info", e));
        let education = self
            .extract_education(&link, source)
            .unwrap_or_else(|e| step_failed(&link, "education", e));
        let experience = self
            .extract_experience(&link, source)
            .unwrap_or_else(|e| step_failed(&link, "experience", e));

        let competency = match summarizer.infer(&experience.entries, &identity.about, &identity.title) {
            Ok(text) => text.trim().to_string(),
            Err(e) => step_failed(&link, "competency", e),
        };

        info!("Scraping completed for profile: {}", identity.name);
        Ok(Profile {
            profile_link: link,
            title: identity.title,
            name: identity.name,
            location: identity.location,
            contact_info,
            education,
            total_experience: experience.total,
            experience: experience.entries,
            competency,
        })
    }
}

/// What came out of a batch of profile links.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub profiles: Vec<Profile>,
    pub skipped: Vec<String>,
    /// Set when the batch stopped before the last link.
    pub aborted: Option<ScrapeError>,
}

impl Extractor {
    /// Extracts every link in order. A profile without a name is skipped;
    /// any other error ends the batch and keeps what was done so far.
    pub fn scrape_all<S: FragmentSource + ?Sized>(
        &self,
        links: &[String],
        source: &mut S,
        summarizer: &dyn Summarizer,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (i, link) in links.iter().enumerate() {
            info!("Processing {} / {} : {}", i + 1, links.len(), link);
            match self.assemble_profile(link, source, summarizer) {
                Ok(profile) => outcome.profiles.push(profile),
                Err(e) if e.is_profile_fatal() => {
                    error!("Skipping {}: {}", link, e);
                    outcome.skipped.push(link.clone());
                }
                Err(e) => {
                    error!("Stopping at {} ({} of {}): {}", link, i + 1, links.len(), e);
                    outcome.aborted = Some(e);
                    break;
                }
            }
        }
        outcome
    }
}

fn step_failed<T: Default>(link: &str, step: &str, err: ScrapeError) -> T {
    warn!("{} step failed for {}: {}. Leaving it empty.", step, link, err);
    T::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    /// Answers locators from a fixed table and remembers where it was sent.
    #[derive(Default)]
    struct FakePage {
        fragments: HashMap<Locator, String>,
        visited: Vec<String>,
        asked: Vec<Locator>,
    }

    impl FakePage {
        fn with(mut self, locator: Locator, text: &str) -> Self {
            self.fragments.insert(locator, text.to_string());
            self
        }
    }

    impl FragmentSource for FakePage {
        fn navigate(&mut self, target: &str) -> Result<()> {
            self.visited.push(target.to_string());
            Ok(())
        }

        fn text(&mut self, locator: Locator) -> Result<Option<String>> {
            self.asked.push(locator);
            Ok(self.fragments.get(&locator).cloned())
        }
    }

    struct FixedSummarizer(&'static str);

    impl Summarizer for FixedSummarizer {
        fn infer(&self, _e: &[ExperienceEntry], _a: &str, _t: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn infer(&self, _e: &[ExperienceEntry], _a: &str, _t: &str) -> Result<String> {
            Err(ScrapeError::Summarizer("quota exceeded".into()))
        }
    }

    fn extractor() -> Extractor {
        Extractor::new(Delays::disabled())
    }

    const LINK: &str = "https://www.linkedin.com/in/ada";

    #[test]
    fn test_identity_defaults_optional_fields() {
        let mut page = FakePage::default().with(Locator::Name, "Ada Lovelace");
        let identity = extractor().extract_identity(LINK, &mut page).unwrap();
        assert_eq!(identity.name, "Ada Lovelace");
        assert_eq!(identity.title, "");
        assert_eq!(identity.location, "");
        assert_eq!(identity.about, "");
        assert_eq!(page.visited, vec![LINK.to_string()]);
    }

    #[test]
    fn test_identity_without_name_is_fatal() {
        let mut page = FakePage::default().with(Locator::Title, "Engineer");
        let err = extractor().extract_identity(LINK, &mut page).unwrap_err();
        assert!(err.is_profile_fatal());
        assert!(matches!(err, ScrapeError::MissingField { field: "name", .. }));
    }

    #[test]
    fn test_education_empty_when_no_slots() {
        let mut page = FakePage::default();
        let education = extractor().extract_education(LINK, &mut page).unwrap();
        assert!(education.is_empty());
        assert_eq!(page.visited, vec![format!("{}/details/education", LINK)]);
    }

    #[test]
    fn test_education_qualification_is_optional() {
        let mut page = FakePage::default()
            .with(Locator::Institute(1), "MIT")
            .with(Locator::Qualification(1), "BSc, Physics")
            .with(Locator::Institute(2), "Springfield High")
            // slot 3 missing, slot 4 must never be reached
            .with(Locator::Institute(4), "Ghost School");
        let education = extractor().extract_education(LINK, &mut page).unwrap();
        assert_eq!(
            education,
            vec![
                EducationEntry { institute: "MIT".into(), qualification: "BSc, Physics".into() },
                EducationEntry { institute: "Springfield High".into(), qualification: "".into() },
            ]
        );
        assert!(!page.asked.contains(&Locator::Institute(4)));
    }

    #[test]
    fn test_experience_mixes_layouts_and_sums_periods() {
        let mut page = FakePage::default()
            .with(Locator::Role(1), "Senior Engineer")
            .with(Locator::Company(1), "Acme Corp · Full-time")
            .with(Locator::Period(1), "Jan 2022 - Present · 1 yr 8 mos")
            .with(Locator::Skills(1), "Skills: Rust · PostgreSQL")
            .with(Locator::GroupCompany(2), "Initech · 3 yrs")
            .with(Locator::GroupPeriod(2), "Full-time · 6 mos")
            .with(Locator::NestedSkills { slot: 2, sub: 1 }, "Skills: Java")
            .with(Locator::NestedSkills { slot: 2, sub: 3 }, "Skills: Kotlin · Gradle");
        let summary = extractor().extract_experience(LINK, &mut page).unwrap();

        assert_eq!(summary.entries.len(), 2);
        let first = &summary.entries[0];
        assert_eq!(first.role, "Senior Engineer");
        assert_eq!(first.company, "Acme Corp");
        assert_eq!(first.skills, vec!["Rust", "PostgreSQL"]);

        let grouped = &summary.entries[1];
        assert_eq!(grouped.role, "");
        assert_eq!(grouped.company, "Initech");
        assert_eq!(grouped.skills, vec!["Java", "Kotlin", "Gradle"]);

        assert_eq!(summary.total, DurationSpan { years: 2, months: 2 });
    }

    #[test]
    fn test_experience_pauses_once_per_page_not_per_entry() {
        let delays = Delays { jitter: 0, profile: 0, education: 0, experience: 0, ..Delays::default() };
        let mut page = FakePage::default();
        for slot in 1..=5 {
            page = page
                .with(Locator::Role(slot), "Engineer")
                .with(Locator::Company(slot), "Acme Corp")
                .with(Locator::Period(slot), "1 yr")
                .with(Locator::Skills(slot), "Skills: Rust");
        }
        let started = Instant::now();
        let summary = Extractor::new(delays).extract_experience(LINK, &mut page).unwrap();
        assert_eq!(summary.entries.len(), 5);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_experience_nested_skills_are_bounded() {
        let mut page = FakePage::default()
            .with(Locator::GroupCompany(1), "Globex")
            .with(Locator::GroupPeriod(1), "2 yrs");
        extractor().extract_experience(LINK, &mut page).unwrap();
        let nested: Vec<_> = page
            .asked
            .iter()
            .filter(|l| matches!(l, Locator::NestedSkills { .. }))
            .collect();
        assert_eq!(nested.len(), MAX_NESTED_ROLES);
    }

    #[test]
    fn test_experience_missing_skills_keep_entry() {
        let mut page = FakePage::default()
            .with(Locator::Role(1), "Intern")
            .with(Locator::Company(1), "Hooli")
            .with(Locator::Period(1), "Jun 2019 - Aug 2019 · 3 mos");
        let summary = extractor().extract_experience(LINK, &mut page).unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert!(summary.entries[0].skills.is_empty());
        assert_eq!(summary.total, DurationSpan { years: 0, months: 3 });
    }

    #[test]
    fn test_contact_info_strategies_in_order() {
        let mut page = FakePage::default()
            .with(Locator::ContactHeading(1), "Your Profile")
            .with(Locator::ContactLink(1), "linkedin.com/in/ada")
            .with(Locator::ContactText(1), "ignored")
            .with(Locator::ContactHeading(2), "Email")
            .with(Locator::ContactText(2), "ada@example.com")
            .with(Locator::ContactHeading(3), "Phone")
            .with(Locator::ContactListItem(3), "+1 555 0100")
            .with(Locator::ContactHeading(4), "Birthday");
        let info = extractor().extract_contact_info(LINK, &mut page).unwrap();
        assert_eq!(info.len(), 4);
        assert_eq!(info["Your Profile"], "linkedin.com/in/ada");
        assert_eq!(info["Email"], "ada@example.com");
        assert_eq!(info["Phone"], "+1 555 0100");
        assert_eq!(info["Birthday"], "");
        let labels: Vec<&str> = info.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["Your Profile", "Email", "Phone", "Birthday"]);
        assert_eq!(page.visited, vec![format!("{}/overlay/contact-info", LINK)]);
    }

    #[test]
    fn test_assemble_profile_full_run() {
        let mut page = FakePage::default()
            .with(Locator::Name, "Ada Lovelace")
            .with(Locator::Title, "Analyst")
            .with(Locator::About, "Engines")
            .with(Locator::ContactHeading(1), "Email")
            .with(Locator::ContactLink(1), "ada@example.com")
            .with(Locator::Institute(1), "University of London")
            .with(Locator::Role(1), "Analyst")
            .with(Locator::Company(1), "Babbage & Co")
            .with(Locator::Period(1), "1842 - 1843 · 1 yr");
        let profile = extractor()
            .assemble_profile(&format!("{}?miniProfileUrn=xyz", LINK), &mut page, &FixedSummarizer("  Math, Ada \n"))
            .unwrap();

        assert_eq!(profile.profile_link, LINK);
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.location, "");
        assert_eq!(profile.contact_info["Email"], "ada@example.com");
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.experience.len(), 1);
        assert_eq!(profile.total_experience, DurationSpan { years: 1, months: 0 });
        assert_eq!(profile.competency, "Math, Ada");
        assert_eq!(
            page.visited,
            vec![
                LINK.to_string(),
                format!("{}/overlay/contact-info", LINK),
                format!("{}/details/education", LINK),
                format!("{}/details/experience", LINK),
            ]
        );
    }

    #[test]
    fn test_assemble_profile_softens_summarizer_failure() {
        let mut page = FakePage::default().with(Locator::Name, "Grace Hopper");
        let profile = extractor().assemble_profile(LINK, &mut page, &FailingSummarizer).unwrap();
        assert_eq!(profile.competency, "");
        assert!(profile.experience.is_empty());
    }

    /// Fails navigation to one chosen link; otherwise behaves like `FakePage`.
    struct FlakyPage {
        inner: FakePage,
        broken: &'static str,
        nameless: &'static str,
        current: String,
    }

    impl FragmentSource for FlakyPage {
        fn navigate(&mut self, target: &str) -> Result<()> {
            if target == self.broken {
                return Err(ScrapeError::Navigation { target: target.to_string(), status: 429 });
            }
            self.current = target.to_string();
            self.inner.navigate(target)
        }

        fn text(&mut self, locator: Locator) -> Result<Option<String>> {
            if locator == Locator::Name && self.current == self.nameless {
                return Ok(None);
            }
            self.inner.text(locator)
        }
    }

    #[test]
    fn test_scrape_all_skips_nameless_and_stops_on_session_error() {
        let mut page = FlakyPage {
            inner: FakePage::default().with(Locator::Name, "Someone"),
            broken: "https://www.linkedin.com/in/c",
            nameless: "https://www.linkedin.com/in/b",
            current: String::new(),
        };
        let links: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|id| format!("https://www.linkedin.com/in/{}", id))
            .collect();
        let outcome = extractor().scrape_all(&links, &mut page, &FixedSummarizer("Rust"));

        assert_eq!(outcome.profiles.len(), 1);
        assert_eq!(outcome.profiles[0].profile_link, "https://www.linkedin.com/in/a");
        assert_eq!(outcome.skipped, vec!["https://www.linkedin.com/in/b".to_string()]);
        assert!(matches!(outcome.aborted, Some(ScrapeError::Navigation { status: 429, .. })));
        assert!(!page.inner.visited.iter().any(|v| v.contains("/in/d")));
    }

    #[test]
    fn test_split_skills_without_prefix() {
        assert_eq!(split_skills("Go · gRPC"), vec!["Go", "gRPC"]);
        assert!(split_skills("Skills:").is_empty());
    }
}
