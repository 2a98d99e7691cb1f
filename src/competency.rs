use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, ScrapeError};
use crate::profile::ExperienceEntry;

const INSTRUCTION: &str = "from the given data tell me the area of expertise and what programming language this person uses the most, if not able to determine then return the most relevant programming language according to the data and reply in 2-3 words only";

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Maps what we know about a person to a short competency phrase.
pub trait Summarizer {
    fn infer(&self, experience: &[ExperienceEntry], about: &str, title: &str) -> Result<String>;
}

/// Used when no API key is configured.
pub struct NoopSummarizer;

impl Summarizer for NoopSummarizer {
    fn infer(&self, _experience: &[ExperienceEntry], _about: &str, _title: &str) -> Result<String> {
        Ok(String::new())
    }
}

pub struct GeminiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(GeminiSummarizer {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }
}

impl Summarizer for GeminiSummarizer {
    fn infer(&self, experience: &[ExperienceEntry], about: &str, title: &str) -> Result<String> {
        let prompt = build_prompt(experience, about, title)?;
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        info!("Asking {} for a competency summary", self.model);
        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;

        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(ScrapeError::Summarizer(format!("status {}: {}", status, text)));
        }
        let answer = extract_answer(&text)?;
        debug!("Competency answer: {}", answer);
        Ok(answer)
    }
}

fn build_prompt(experience: &[ExperienceEntry], about: &str, title: &str) -> Result<String> {
    let experience = serde_json::to_string(experience)?;
    Ok(format!("{} {} {} ------- {}", experience, about, title, INSTRUCTION))
}

fn extract_answer(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
        .ok_or_else(|| ScrapeError::Summarizer("response had no candidates".into()))?;
    Ok(text.trim().to_string())
}
